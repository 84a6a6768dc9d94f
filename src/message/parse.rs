//! Per-service frame parsers
//!
//! Each parser takes the fields of a whole frame split on the delimiter
//! (index 0 is the header text) and returns a typed event.
//!
//! | Service | Min fields | Layout |
//! |---|---|---|
//! | JoinChannel | - | `[1]` result phrase |
//! | ChannelUser | - | batch (>10 fields): `id, name, flags` triplets from `[2]`; else single entry |
//! | ChatMessage | 9 | `[1]` text, `[2]` id, `[6]` name, `[7]` flags, `[8]` months |
//! | SendBalloon | 5 | `[2]` id, `[3]` name, `[4]` count |
//! | AdballoonEffect | 11 | `[3]` id, `[4]` name, `[10]` count |
//! | FollowItem | 8 | `[3]` id, `[4]` name, `[5]` count |
//! | FollowItemEffect | 8 | `[2]` id, `[3]` name, `[4]` count |
//! | AdminNotice | 2 | `[1]` text |
//! | Mission | 2 | `[1]` JSON object |

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::flags::UserFlag;
use super::types::{Adballoon, Balloon, ChatMessage, Mission, Subscription, User, UserListEntry};
use crate::error::ProtocolError;
use crate::protocol::constants::JOIN_REJECTED_PHRASE;
use crate::protocol::ServiceCode;

/// Above this many fields a user-list frame is a batch
const USER_LIST_BATCH_THRESHOLD: usize = 10;

/// Remove a parenthesized suffix: `"abc(123)"` becomes `"abc"`
pub fn strip_parenthetical(id: &str) -> &str {
    match id.find('(') {
        Some(idx) => &id[..idx],
        None => id,
    }
}

/// Subscription months: `-1` (and anything negative or non-numeric) means 0
pub fn parse_subscribe_month(field: &str) -> u32 {
    field
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|months| *months > 0)
        .map_or(0, |months| months.min(i64::from(u32::MAX)) as u32)
}

fn parse_count(field: &str, default: u32) -> u32 {
    field.trim().parse::<u32>().unwrap_or(default)
}

fn require(service: ServiceCode, fields: &[&str], required: usize) -> Result<(), ProtocolError> {
    if fields.len() < required {
        return Err(ProtocolError::MalformedFrame {
            service: service.code(),
            fields: fields.len(),
            required,
        });
    }
    Ok(())
}

/// Join-ack: `true` unless the server sent the wrong-password phrase
pub fn parse_join_ack(fields: &[&str]) -> bool {
    fields
        .get(1)
        .map_or(true, |phrase| *phrase != JOIN_REJECTED_PHRASE)
}

/// User joined/left, either as a batch (initial roster) or a single entry
pub fn parse_user_list(fields: &[&str]) -> Vec<UserListEntry> {
    if fields.len() > USER_LIST_BATCH_THRESHOLD {
        parse_user_batch(fields)
    } else {
        vec![parse_user_single(fields)]
    }
}

fn parse_user_batch(fields: &[&str]) -> Vec<UserListEntry> {
    fields[2..]
        .chunks_exact(3)
        .filter(|triplet| triplet[0] != "-1")
        .map(|triplet| {
            let mut user = User::new(triplet[0], triplet[1]);
            user.flag = UserFlag::parse(triplet[2]);
            UserListEntry { user, joined: true }
        })
        .collect()
}

fn parse_user_single(fields: &[&str]) -> UserListEntry {
    let joined = fields.get(1).map_or(true, |status| *status == "1");

    let flag = match fields.get(4) {
        Some(flags) if joined => UserFlag::parse(flags),
        _ => UserFlag::default(),
    };

    let id = fields.get(2).map_or("", |id| strip_parenthetical(id));
    let name = fields.get(3).copied().unwrap_or_default();

    let mut user = User::new(id, name);
    user.flag = flag;
    UserListEntry { user, joined }
}

/// Chat line (service 5)
pub fn parse_chat_message(fields: &[&str]) -> Result<ChatMessage, ProtocolError> {
    require(ServiceCode::ChatMessage, fields, 9)?;

    let user = User {
        id: strip_parenthetical(fields[2].trim()).to_string(),
        name: fields[6].trim().to_string(),
        subscribe_month: parse_subscribe_month(fields[8]),
        flag: UserFlag::parse(fields[7]),
    };

    Ok(ChatMessage {
        user,
        message: fields[1].trim().to_string(),
    })
}

/// Balloon gift (service 18)
pub fn parse_balloon(fields: &[&str]) -> Result<Balloon, ProtocolError> {
    require(ServiceCode::SendBalloon, fields, 5)?;

    Ok(Balloon {
        user: User::new(fields[2], fields[3]),
        count: parse_count(fields[4], 0),
    })
}

/// Ad-balloon gift (service 87)
pub fn parse_adballoon(fields: &[&str]) -> Result<Adballoon, ProtocolError> {
    require(ServiceCode::AdballoonEffect, fields, 11)?;

    Ok(Adballoon {
        user: User::new(fields[3], fields[4]),
        count: parse_count(fields[10], 0),
    })
}

/// Subscription (services 91 and 93, which place the user at different offsets)
pub fn parse_subscription(
    service: ServiceCode,
    fields: &[&str],
) -> Result<Subscription, ProtocolError> {
    require(service, fields, 8)?;

    let offset = match service {
        ServiceCode::FollowItem => 3,
        _ => 2,
    };

    Ok(Subscription {
        user: User::new(strip_parenthetical(fields[offset]), fields[offset + 1]),
        count: parse_count(fields[offset + 2], 1),
    })
}

/// Operator notice (service 58)
pub fn parse_admin_notice(fields: &[&str]) -> Result<String, ProtocolError> {
    require(ServiceCode::AdminNotice, fields, 2)?;
    Ok(fields[1].to_string())
}

/// Mission JSON body
///
/// Fields are optional and loosely typed: `null` or a value of the wrong
/// type falls back to the empty default, numbers are accepted as ids and
/// numeric strings as counts.
#[derive(Debug, Deserialize)]
struct MissionPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    user_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    user_nick: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_count")]
    gift_count: f64,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Challenge mission (service 121), carried as JSON in field 1
pub fn parse_mission(fields: &[&str]) -> Result<Mission, ProtocolError> {
    require(ServiceCode::Mission, fields, 2)?;

    let payload: MissionPayload =
        serde_json::from_str(fields[1]).map_err(|e| ProtocolError::MalformedPayload {
            service: ServiceCode::Mission.code(),
            reason: e.to_string(),
        })?;

    Ok(Mission {
        user: User::new(payload.user_id, payload.user_nick),
        title: payload.title,
        // Float-to-int `as` truncates and saturates (NaN becomes 0)
        count: payload.gift_count as u32,
    })
}
