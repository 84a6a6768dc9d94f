//! Endpoint resolution
//!
//! Turns a streamer id into the chat socket URL and room number. One lookup
//! per call; retrying is left to the supervisor.

pub mod http;

use async_trait::async_trait;

use crate::error::ResolveError;

pub use http::HttpResolver;

/// Where to connect for one streamer's chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Socket URL (`wss://host:port/Websocket`)
    pub socket_url: String,
    /// Chat room number
    pub room_id: String,
}

/// Streamer id to chat endpoint lookup
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Resolve `streamer_id` to its chat endpoint
    async fn resolve(&self, streamer_id: &str) -> Result<Endpoint, ResolveError>;
}
