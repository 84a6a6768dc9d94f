//! Frame dispatch
//!
//! Maps a raw inbound frame to what the connection should do with it. The
//! mapping is pure; the connection applies the result (state transitions,
//! handler calls, error reporting).

use super::handler::ChatEvent;
use crate::error::ProtocolError;
use crate::message::parse;
use crate::protocol::{frame_text, service_code, split_fields, ServiceCode};

/// Outcome of dispatching one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Too short, unreadable, or an unknown service code
    Ignored,
    /// Server keepalive echo
    Keepalive,
    /// Login acknowledged; send the join frame
    LoginAck,
    /// Join acknowledged with the given result
    JoinAck(bool),
    /// Parsed domain event
    Event(ChatEvent),
    /// Domain frame that failed to parse
    Failed(ProtocolError),
}

/// Route one raw frame to its parser
pub fn dispatch(frame: &[u8]) -> Inbound {
    let Some(code) = service_code(frame) else {
        return Inbound::Ignored;
    };
    let Some(service) = ServiceCode::from_code(code) else {
        tracing::trace!(service = code, "Unhandled service code");
        return Inbound::Ignored;
    };

    let text = frame_text(frame);
    let fields = split_fields(&text);

    let parsed = match service {
        ServiceCode::Keepalive => return Inbound::Keepalive,
        ServiceCode::Login => return Inbound::LoginAck,
        ServiceCode::JoinChannel => return Inbound::JoinAck(parse::parse_join_ack(&fields)),
        ServiceCode::ChannelUser => Ok(ChatEvent::UserList(parse::parse_user_list(&fields))),
        ServiceCode::ChatMessage => parse::parse_chat_message(&fields).map(ChatEvent::Chat),
        ServiceCode::SendBalloon => parse::parse_balloon(&fields).map(ChatEvent::Balloon),
        ServiceCode::AdminNotice => parse::parse_admin_notice(&fields).map(ChatEvent::AdminNotice),
        ServiceCode::AdballoonEffect => parse::parse_adballoon(&fields).map(ChatEvent::Adballoon),
        ServiceCode::FollowItem | ServiceCode::FollowItemEffect => {
            parse::parse_subscription(service, &fields).map(ChatEvent::Subscription)
        }
        ServiceCode::Mission => parse::parse_mission(&fields).map(ChatEvent::Mission),
    };

    match parsed {
        Ok(event) => Inbound::Event(event),
        Err(e) => Inbound::Failed(e),
    }
}
