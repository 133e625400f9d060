/// Database models for JobTrack
///
/// # Models
///
/// - `user`: accounts, profile data, resume and picture URLs
/// - `session`: refresh-token registry
/// - `application_status`: seeded status lookup and per-user counts
/// - `job_application`: applications and their status history
/// - `schedule`: calendar reminders

pub mod application_status;
pub mod job_application;
pub mod schedule;
pub mod session;
pub mod user;
