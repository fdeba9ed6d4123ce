//! Voclean Database Layer
//!
//! Storage access for recordings. The only mutation primitive is an atomic
//! compare-and-set on `status`; every lifecycle transition goes through it
//! so concurrent writers cannot lose updates.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryRecordingStore;
pub use postgres::PgRecordingStore;
pub use store::{RecordingStore, StoreError, TransitionUpdate};
