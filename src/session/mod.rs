//! Per-attempt session state
//!
//! A session is the state of one connection attempt: the lifecycle phase,
//! the resolved endpoint, the handshake tickets and the traffic counters.
//! Nothing here outlives the attempt.

pub mod state;
pub mod stats;

pub use state::{ConnectionState, SessionState};
pub use stats::{SessionStats, StatsSnapshot};
