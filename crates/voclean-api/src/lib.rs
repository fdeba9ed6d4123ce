//! Voclean API Library
//!
//! HTTP surface for the cleaning coordinator: recording registration and
//! reads, job submission, status polling, and the processor webhook.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use error::ErrorResponse;
pub use state::AppState;
