/// Middleware for the API server
///
/// - `security`: security response headers
///
/// The session-backed auth gate lives in [`crate::app::require_auth`]
/// since it needs the application state.

pub mod security;
