//! PathSeeker core library.
//!
//! Session management with automatic token renewal, the REST API client,
//! data models, the career quiz, and configuration shared by front ends.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod quiz;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionManager, TokenStore};
pub use config::Config;
