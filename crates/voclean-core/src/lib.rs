//! Voclean Core
//!
//! Domain model, configuration, and shared constants for the voclean
//! audio-cleaning coordination service.

pub mod config;
pub mod constants;
pub mod models;

pub use config::Config;
pub use models::{Recording, RecordingResponse, RecordingStatus};
