//! Client configuration

use std::time::Duration;

use crate::protocol::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEEPALIVE_INTERVAL};
use crate::protocol::Tickets;

/// Chat client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Streamer whose chat to join
    pub streamer_id: String,

    /// Channel password, sent as the `pwd` join key when set
    pub channel_password: Option<String>,

    /// Handshake tickets (empty for guest sessions)
    pub tickets: Tickets,

    /// Period between keepalive frames
    pub keepalive_interval: Duration,

    /// Socket open must complete within this time
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            streamer_id: String::new(),
            channel_password: None,
            tickets: Tickets::default(),
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a guest config for `streamer_id`
    pub fn new(streamer_id: impl Into<String>) -> Self {
        Self {
            streamer_id: streamer_id.into(),
            ..Default::default()
        }
    }

    /// Set the channel password
    pub fn channel_password(mut self, password: impl Into<String>) -> Self {
        self.channel_password = Some(password.into());
        self
    }

    /// Supply an auth ticket (enables chat send)
    pub fn auth_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.tickets.auth = ticket.into();
        self
    }

    /// Supply a fan ticket
    pub fn fan_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.tickets.fan = ticket.into();
        self
    }

    /// Supply the login channel flag
    pub fn channel_flag(mut self, flag: impl Into<String>) -> Self {
        self.tickets.channel_flag = flag.into();
        self
    }

    /// Set the keepalive period
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set the socket open timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
