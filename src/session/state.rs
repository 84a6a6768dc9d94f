//! Session state machine
//!
//! Tracks one connection attempt from `connect()` to teardown.
//!
//! ```text
//! Idle -> Resolving -> SocketConnecting -> AwaitingLoginAck -> AwaitingJoinAck -> Joined
//!   \__________\______________\___________________\__________________\___________\--> Closed
//! ```
//!
//! Transitions only move forward. A session that reached `Closed` is never
//! reused; reconnecting builds a new one.

use std::fmt;
use std::time::{Duration, Instant};

use crate::protocol::Tickets;
use crate::resolver::Endpoint;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConnectionState {
    /// Created, `connect()` not called yet
    Idle,
    /// Looking up the chat endpoint
    Resolving,
    /// Opening the socket
    SocketConnecting,
    /// Login frame sent
    AwaitingLoginAck,
    /// Join frame sent
    AwaitingJoinAck,
    /// Join acknowledged; domain events flow
    Joined,
    /// Torn down (terminal)
    Closed,
}

impl ConnectionState {
    /// Whether a socket is (or may be) open in this state
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::AwaitingLoginAck
                | ConnectionState::AwaitingJoinAck
                | ConnectionState::Joined
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Resolving => "resolving",
            ConnectionState::SocketConnecting => "socket-connecting",
            ConnectionState::AwaitingLoginAck => "awaiting-login-ack",
            ConnectionState::AwaitingJoinAck => "awaiting-join-ack",
            ConnectionState::Joined => "joined",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Complete per-attempt session state
#[derive(Debug)]
pub struct SessionState {
    /// Streamer whose chat this session follows
    pub streamer_id: String,

    /// Resolved endpoint (after `Resolving`)
    pub endpoint: Option<Endpoint>,

    /// Tickets sent in the handshake
    pub tickets: Tickets,

    /// Join result reported by the server
    pub join_accepted: Option<bool>,

    state: ConnectionState,

    /// Creation time
    created_at: Instant,

    /// Time the join ack arrived
    joined_at: Option<Instant>,
}

impl SessionState {
    /// Create a new session in `Idle`
    pub fn new(streamer_id: impl Into<String>, tickets: Tickets) -> Self {
        Self {
            streamer_id: streamer_id.into(),
            endpoint: None,
            tickets,
            join_accepted: None,
            state: ConnectionState::Idle,
            created_at: Instant::now(),
            joined_at: None,
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move forward to `next`
    ///
    /// Returns `false` (and leaves the state unchanged) for backward or
    /// repeated transitions, and for anything after `Closed`.
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if next <= self.state {
            return false;
        }
        self.state = next;
        if next == ConnectionState::Joined {
            self.joined_at = Some(Instant::now());
        }
        true
    }

    /// Record a resolved endpoint
    pub fn set_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoint = Some(endpoint);
    }

    /// Room id of the resolved endpoint (empty before resolution)
    pub fn room_id(&self) -> &str {
        self.endpoint.as_ref().map_or("", |e| e.room_id.as_str())
    }

    /// Record the join ack and move to `Joined`
    pub fn on_join_ack(&mut self, accepted: bool) -> bool {
        self.join_accepted = Some(accepted);
        self.advance(ConnectionState::Joined)
    }

    /// Tear down. Returns `false` if already closed.
    pub fn close(&mut self) -> bool {
        self.advance(ConnectionState::Closed)
    }

    /// Time since creation
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time spent joined, if the join ack arrived
    pub fn joined_for(&self) -> Option<Duration> {
        self.joined_at.map(|t| t.elapsed())
    }
}
