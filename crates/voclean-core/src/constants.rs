//! Shared constants

/// Default interval between status polls against the external processor.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Number of consecutive failed polls before the poller logs a warning.
/// At the default interval this is roughly a minute of unreachability.
pub const DEFAULT_POLL_FAILURE_WARN_THRESHOLD: u32 = 6;

/// Default request timeout for calls to the denoise API.
pub const DEFAULT_PROCESSOR_TIMEOUT_SECS: u64 = 30;

/// Header carrying the caller's account id on API requests.
pub const CALLER_ID_HEADER: &str = "x-caller-id";
