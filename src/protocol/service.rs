//! Service codes
//!
//! The 4-digit header field selects what a frame means. Codes not listed
//! here are valid on the wire but carry nothing this client consumes.

use std::fmt;

/// Known service codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCode {
    /// Liveness frame, both directions
    Keepalive,
    /// Client login / server login-ack
    Login,
    /// Client join / server join-ack
    JoinChannel,
    /// User joined or left (single or batch)
    ChannelUser,
    /// Chat message, both directions
    ChatMessage,
    /// Balloon gift
    SendBalloon,
    /// Operator notice
    AdminNotice,
    /// Ad-balloon gift
    AdballoonEffect,
    /// Subscription (layout A)
    FollowItem,
    /// Subscription (layout B)
    FollowItemEffect,
    /// Challenge mission gift
    Mission,
}

impl ServiceCode {
    /// Every known code, in ascending numeric order
    pub const ALL: [ServiceCode; 11] = [
        ServiceCode::Keepalive,
        ServiceCode::Login,
        ServiceCode::JoinChannel,
        ServiceCode::ChannelUser,
        ServiceCode::ChatMessage,
        ServiceCode::SendBalloon,
        ServiceCode::AdminNotice,
        ServiceCode::AdballoonEffect,
        ServiceCode::FollowItem,
        ServiceCode::FollowItemEffect,
        ServiceCode::Mission,
    ];

    /// Numeric value as carried in the header
    pub const fn code(self) -> u16 {
        match self {
            ServiceCode::Keepalive => 0,
            ServiceCode::Login => 1,
            ServiceCode::JoinChannel => 2,
            ServiceCode::ChannelUser => 4,
            ServiceCode::ChatMessage => 5,
            ServiceCode::SendBalloon => 18,
            ServiceCode::AdminNotice => 58,
            ServiceCode::AdballoonEffect => 87,
            ServiceCode::FollowItem => 91,
            ServiceCode::FollowItemEffect => 93,
            ServiceCode::Mission => 121,
        }
    }

    /// Look up a numeric code
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|svc| svc.code() == code)
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.code())
    }
}
