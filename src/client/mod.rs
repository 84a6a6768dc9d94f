//! Chat client
//!
//! [`ChatConnection`] runs a single connection attempt; handlers receive
//! what it parses. Use [`Supervisor`](crate::supervisor::Supervisor) for
//! automatic reconnects.

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod handler;
pub mod keepalive;
pub mod transport;

pub use config::ClientConfig;
pub use connection::{ChatConnection, ConnectionHandle};
pub use dispatch::{dispatch, Inbound};
pub use handler::{ChatEvent, ChatHandler, EventSender};
