//! Wire constants

use std::time::Duration;

/// First two bytes of every frame
pub const FRAME_MAGIC: [u8; 2] = [0x1B, 0x09];

/// Header size: magic (2) + service (4) + body length (6) + option (2)
pub const HEADER_SIZE: usize = 14;

/// Bytes needed to read the service code (magic + 4 digits)
pub const SERVICE_CODE_END: usize = 6;

/// Largest body length the 6-digit header field can carry
pub const MAX_BODY_LEN: u32 = 999_999;

/// Largest service code the 4-digit header field can carry
pub const MAX_SERVICE_CODE: u16 = 9_999;

/// Largest option value the 2-digit header field can carry
pub const MAX_OPTION: u8 = 99;

/// Body field separator (form feed)
pub const FIELD_DELIMITER: u8 = 0x0C;

/// Separator between the two flag masks inside a flag field
pub const FLAG_SEPARATOR: char = '|';

/// Join-ack text the server sends when the channel password is wrong
pub const JOIN_REJECTED_PHRASE: &str = "비밀번호가 틀렸습니다.";

/// Websocket sub-protocol token
pub const CHAT_SUBPROTOCOL: &str = "chat";

/// Default keepalive period
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(20);

/// Default socket open timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Join handshake sub-block control bytes
pub(crate) const BLOCK_OPEN: u8 = 0x11;
pub(crate) const BLOCK_CLOSE: u8 = 0x12;
pub(crate) const LOG_QUOTE: u8 = 0x06;
pub(crate) const LOG_EQUALS: u8 = 0x3D;
pub(crate) const LOG_AMPERSAND: u8 = 0x26;

/// Key/value pairs of the join log block, in wire order
pub const DEFAULT_JOIN_LOG: [(&str, &str); 9] = [
    ("set_bps", "undefined"),
    ("view_bps", "NaN"),
    ("quality", "ori"),
    ("geo_cc", "undefined"),
    ("geo_rc", "undefined"),
    ("acpt_lang", "undefined"),
    ("svc_lang", "undefined"),
    ("join_cc", "410"),
    ("subscribe", "1"),
];
