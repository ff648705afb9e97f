//! Keybridge Server - HTTP boundary for the biometric login ceremonies
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod bridge;
pub mod config;
pub mod error;
pub mod handlers;
pub mod login;
pub mod openapi;
pub mod routes;
pub mod state;

pub use config::{Config, StorefrontConfig};
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
