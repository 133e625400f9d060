//! # JobTrack Shared Library
//!
//! Domain types, persistence and the authentication core shared by the
//! JobTrack API server.
//!
//! ## Module Organization
//!
//! - `auth`: token issuing, password hashing, session lifecycle
//! - `store`: credential store over the `users` and `sessions` tables
//! - `models`: database models and their queries
//! - `db`: connection pool and migrations
//! - `storage`: resume and profile picture files

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;
pub mod store;

/// Current version of the JobTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
