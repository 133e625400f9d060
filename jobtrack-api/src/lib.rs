//! # JobTrack API Server Library
//!
//! HTTP surface of the job application tracker.
//!
//! ## Modules
//!
//! - `app`: application state, router builder, auth gate
//! - `config`: configuration management
//! - `error`: error handling and HTTP response mapping
//! - `extract`: extractors that reject with the standard envelope
//! - `middleware`: security headers
//! - `response`: the response envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
