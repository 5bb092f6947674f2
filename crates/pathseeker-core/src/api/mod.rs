//! REST API client module for the PathSeeker backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! PathSeeker API: account registration, the current user, and profiles.
//!
//! The API uses JWT bearer token authentication. Tokens are attached and
//! renewed by the session manager in `crate::auth`.

pub mod client;
pub mod error;
pub mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use request::{ApiRequest, RetryableRequest};
