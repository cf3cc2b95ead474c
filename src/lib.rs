pub mod config;
pub mod coordinator;
pub mod error;
pub mod launcher;
pub mod probe;
pub mod retry;
pub mod utils;

pub use config::PackagerConfig;
pub use coordinator::{LaunchDecision, Packager};
pub use error::PackagerError;
pub use probe::{PackagerStatus, ProbeOutcome, StatusProbe, STATUS_RUNNING};
pub use retry::{retry_async, RetryError, RetryPolicy};
