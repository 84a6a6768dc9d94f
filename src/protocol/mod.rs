//! Wire protocol
//!
//! - Frame header encoding/decoding and field splitting
//! - Service code table
//! - Login/join handshake, keepalive and chat-send frame builders

pub mod constants;
pub mod frame;
pub mod handshake;
pub mod service;

pub use frame::{encode_frame, frame_text, service_code, split_fields, FrameHeader};
pub use handshake::{chat_frame, join_frame, keepalive_frame, login_frame, Tickets};
pub use service::ServiceCode;
