//! Reconnect supervision
//!
//! The supervisor is the only component that retries. Connections, the
//! resolver and the transport fail fast and report once.

pub mod retry;
pub mod runner;

pub use retry::RetryPolicy;
pub use runner::{Supervisor, SupervisorHandle};
