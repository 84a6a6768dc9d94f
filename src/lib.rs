//! # soop-chat
//!
//! Client library for the SOOP (formerly AfreecaTV) live chat protocol.
//!
//! The crate resolves a streamer's chat endpoint, performs the login and
//! join handshake over a websocket, keeps the socket alive and turns inbound
//! frames into typed events: chat lines, user lists, balloon and ad-balloon
//! gifts, subscriptions, admin notices and missions.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use soop_chat::{ChatEvent, ClientConfig, EventSender, HttpResolver, Supervisor};
//!
//! # async fn example() -> soop_chat::Result<()> {
//! let resolver = Arc::new(HttpResolver::new()?);
//! let (sender, mut events) = EventSender::new();
//! let supervisor = Supervisor::new(ClientConfig::new("streamer_id"), resolver, sender);
//!
//! tokio::spawn(supervisor.run());
//!
//! while let Some(event) = events.recv().await {
//!     if let ChatEvent::Balloon(balloon) = event {
//!         println!("{} sent {} balloons", balloon.user.name, balloon.count);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Sessions without an auth ticket join as guests and are read-only.

pub mod client;
pub mod error;
pub mod message;
pub mod protocol;
pub mod resolver;
pub mod session;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ChatConnection, ChatEvent, ChatHandler, ClientConfig, ConnectionHandle, EventSender};
pub use error::{Error, ProtocolError, ResolveError, Result, TransportError};
pub use message::{
    Adballoon, Balloon, ChatMessage, Mission, Subscription, User, UserFlag, UserListEntry,
};
pub use protocol::{ServiceCode, Tickets};
pub use resolver::{Endpoint, EndpointResolver, HttpResolver};
pub use session::{ConnectionState, SessionStats, StatsSnapshot};
pub use supervisor::{RetryPolicy, Supervisor, SupervisorHandle};
