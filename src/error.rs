//! Error types
//!
//! Errors are grouped by the layer that produces them so callers can
//! decide how to react:
//!
//! - [`ResolveError`]: the endpoint lookup failed; ends the current attempt
//! - [`TransportError`]: the socket failed or was closed; ends the current attempt
//! - [`ProtocolError`]: a single frame could not be parsed; the receive loop continues
//!
//! Only the [`Supervisor`](crate::supervisor::Supervisor) turns any of these
//! into a terminal failure.

use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Endpoint lookup failed
    Resolve(ResolveError),
    /// Socket-level failure
    Transport(TransportError),
    /// Frame-level parse failure
    Protocol(ProtocolError),
    /// Operation requires an open socket
    NotConnected,
    /// Sending chat requires an auth ticket (guest sessions are read-only)
    NotAuthenticated,
    /// Supervisor gave up after the configured number of attempts
    RetriesExhausted {
        /// Attempts made before giving up
        attempts: u32,
    },
}

impl Error {
    /// Whether the supervisor must stop instead of scheduling another attempt
    pub fn is_permanent(&self) -> bool {
        matches!(self, Error::Resolve(ResolveError::NotLive))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Resolve(e) => write!(f, "Resolve error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::NotConnected => write!(f, "Not connected"),
            Error::NotAuthenticated => write!(f, "Chat requires an auth ticket"),
            Error::RetriesExhausted { attempts } => {
                write!(f, "Gave up after {} connection attempts", attempts)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Resolve(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResolveError> for Error {
    fn from(e: ResolveError) -> Self {
        Error::Resolve(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

/// Endpoint lookup failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The streamer has no active broadcast
    NotLive,
    /// The broadcast is login-gated
    AuthRequired,
    /// The lookup response carried no routing data
    EndpointUnavailable,
    /// The lookup request itself failed
    Http(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotLive => write!(f, "Streamer is not live"),
            ResolveError::AuthRequired => write!(f, "Broadcast requires login"),
            ResolveError::EndpointUnavailable => write!(f, "Chat endpoint unavailable"),
            ResolveError::Http(msg) => write!(f, "Lookup request failed: {}", msg),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        ResolveError::Http(e.to_string())
    }
}

/// Socket-level failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open the socket (DNS, TCP, TLS or websocket upgrade)
    Connect(String),
    /// Socket open did not finish in time
    ConnectTimeout,
    /// Read failed
    Read(String),
    /// Write failed
    Write(String),
    /// Remote closed the socket
    Closed {
        /// Websocket close code (1006 when the stream ended without a close frame)
        code: u16,
        /// Close reason sent by the remote
        reason: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "Connect failed: {}", msg),
            TransportError::ConnectTimeout => write!(f, "Connect timed out"),
            TransportError::Read(msg) => write!(f, "Read failed: {}", msg),
            TransportError::Write(msg) => write!(f, "Write failed: {}", msg),
            TransportError::Closed { code, reason } => {
                write!(f, "Connection closed: code={}, reason={}", code, reason)
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Frame-level parse failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer body fields than the service code requires
    MalformedFrame {
        /// Service code of the offending frame
        service: u16,
        /// Fields present
        fields: usize,
        /// Fields required
        required: usize,
    },
    /// Embedded JSON could not be decoded
    MalformedPayload {
        /// Service code of the offending frame
        service: u16,
        /// Decoder message
        reason: String,
    },
    /// Body does not fit the 6-digit length field
    BodyTooLarge {
        /// Service code of the frame being built
        service: u16,
        /// Body length in bytes
        len: usize,
    },
    /// Frame header could not be decoded
    InvalidHeader(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedFrame {
                service,
                fields,
                required,
            } => write!(
                f,
                "Malformed frame [{}]: {} fields, need {}",
                service, fields, required
            ),
            ProtocolError::MalformedPayload { service, reason } => {
                write!(f, "Malformed payload [{}]: {}", service, reason)
            }
            ProtocolError::BodyTooLarge { service, len } => write!(
                f,
                "Frame body too large [{}]: {} bytes, limit {}",
                service,
                len,
                crate::protocol::constants::MAX_BODY_LEN
            ),
            ProtocolError::InvalidHeader(msg) => write!(f, "Invalid header: {}", msg),
        }
    }
}

impl std::error::Error for ProtocolError {}
