//! Voclean Processor
//!
//! Client-side interface to the external noise-reduction service. The
//! coordinator only sees the narrow `JobProcessor` trait; the HTTP client
//! for the denoise vendor API lives behind it.

pub mod denoise_http;
pub mod processor;

pub use denoise_http::{DenoiseHttpClient, DenoiseHttpConfig};
pub use processor::{JobProcessor, JobState, ProcessorError};
