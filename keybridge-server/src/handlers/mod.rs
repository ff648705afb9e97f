//! Request handlers

pub mod health;
pub mod passkey;

pub use crate::state::AppState;
