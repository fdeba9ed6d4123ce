//! Voclean Coordinator
//!
//! Owns the state-transition logic for turning a raw recording into a
//! cleaned one via the external denoise service: guarded job submission,
//! re-entrant status polling, and the shared reconciliation routine that
//! both polling and the webhook drive. Also provides the per-recording
//! polling loop used while a job is in flight.

mod coordinator;
mod error;
mod poller;

pub use coordinator::{CleaningCoordinator, PollOutcome};
pub use error::CoordinatorError;
pub use poller::{JobPoller, JobPollerConfig};
