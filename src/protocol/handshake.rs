//! Handshake and outbound frame builders
//!
//! A session is established with two exchanges:
//!
//! ```text
//! Client                                   Server
//!   |                                        |
//!   |------- LOGIN (ticket, flag) --------->|
//!   |<------ LOGIN ack ----------------------|
//!   |                                        |
//!   |------- JOIN (room, fan ticket,        |
//!   |              log block, info block) ->|
//!   |<------ JOIN ack (success phrase) -----|
//!   |                                        |
//!   |          [Domain events flow]          |
//! ```
//!
//! The join body embeds two nested key/value encodings that the server
//! checks byte for byte:
//!
//! - log block: `"log" 11 06 26 { 06 key 06 3D 06 value 06 26 }* 12`
//! - info block: `{ key 11 value 12 }*`
//!
//! Pairs with an empty value are left out of both blocks.

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::{
    BLOCK_CLOSE, BLOCK_OPEN, DEFAULT_JOIN_LOG, FIELD_DELIMITER, LOG_AMPERSAND, LOG_EQUALS,
    LOG_QUOTE,
};
use super::frame::encode_frame;
use super::service::ServiceCode;
use crate::error::ProtocolError;

/// Keepalive frame: service 0000, one-byte body
const KEEPALIVE_FRAME: &[u8] = b"\x1b\x09000000000100\x0c";

/// Values threaded through the login/join frames
///
/// All three are opaque. A guest session leaves them empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tickets {
    /// Auth ticket sent in the login frame
    pub auth: String,
    /// Fan ticket sent in the join frame
    pub fan: String,
    /// Channel flag sent in the login frame
    pub channel_flag: String,
}

impl Tickets {
    /// Whether this is an anonymous (guest) session
    pub fn is_guest(&self) -> bool {
        self.auth.is_empty()
    }
}

/// Build the login frame: `\f ticket \f \f flag \f`
pub fn login_frame(tickets: &Tickets) -> Result<Bytes, ProtocolError> {
    let mut body = BytesMut::new();
    put_fields(&mut body, &["", &tickets.auth, "", &tickets.channel_flag, ""]);
    encode_frame(ServiceCode::Login, &body)
}

/// Build the join frame
///
/// Body: `\f room \f \f fanTicket"0" \f "" \f` + log block + info block + `\f`
pub fn join_frame(
    room_id: &str,
    tickets: &Tickets,
    channel_password: Option<&str>,
) -> Result<Bytes, ProtocolError> {
    let fan = format!("{}0", tickets.fan);

    let mut body = BytesMut::new();
    put_fields(&mut body, &["", room_id, "", &fan, "", ""]);
    put_log_block(&mut body, &DEFAULT_JOIN_LOG);
    put_info_block(&mut body, &join_info(channel_password));
    body.put_u8(FIELD_DELIMITER);

    encode_frame(ServiceCode::JoinChannel, &body)
}

/// Build the keepalive frame (body is a single delimiter)
pub fn keepalive_frame() -> Bytes {
    Bytes::from_static(KEEPALIVE_FRAME)
}

/// Build a chat-send frame: `\f message \f 0 \f`
///
/// Messages that push the body past the length field are rejected.
pub fn chat_frame(message: &str) -> Result<Bytes, ProtocolError> {
    let mut body = BytesMut::new();
    put_fields(&mut body, &["", message, "0", ""]);
    encode_frame(ServiceCode::ChatMessage, &body)
}

/// Join info pairs: `pwd` only when a password is set, then `auth_info`
fn join_info(channel_password: Option<&str>) -> Vec<(&str, &str)> {
    let mut info = Vec::with_capacity(2);
    if let Some(pwd) = channel_password.filter(|p| !p.is_empty()) {
        info.push(("pwd", pwd));
    }
    info.push(("auth_info", "undefined"));
    info
}

/// Write `fields` joined by the delimiter
fn put_fields(buf: &mut BytesMut, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buf.put_u8(FIELD_DELIMITER);
        }
        buf.put_slice(field.as_bytes());
    }
}

fn put_log_block(buf: &mut BytesMut, pairs: &[(&str, &str)]) {
    buf.put_slice(b"log");
    buf.put_u8(BLOCK_OPEN);
    buf.put_slice(&[LOG_QUOTE, LOG_AMPERSAND]);
    for (key, value) in pairs.iter().filter(|(_, v)| !v.is_empty()) {
        buf.put_u8(LOG_QUOTE);
        buf.put_slice(key.as_bytes());
        buf.put_slice(&[LOG_QUOTE, LOG_EQUALS, LOG_QUOTE]);
        buf.put_slice(value.as_bytes());
        buf.put_slice(&[LOG_QUOTE, LOG_AMPERSAND]);
    }
    buf.put_u8(BLOCK_CLOSE);
}

fn put_info_block(buf: &mut BytesMut, pairs: &[(&str, &str)]) {
    for (key, value) in pairs.iter().filter(|(_, v)| !v.is_empty()) {
        buf.put_slice(key.as_bytes());
        buf.put_u8(BLOCK_OPEN);
        buf.put_slice(value.as_bytes());
        buf.put_u8(BLOCK_CLOSE);
    }
}
