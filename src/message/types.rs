//! Parsed event types
//!
//! All values are built fresh per frame. Absent wire fields become empty
//! strings or zero, never `Option`.

use super::flags::UserFlag;

/// A chat participant as described by one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// User id with any parenthesized suffix removed
    pub id: String,
    /// Display name
    pub name: String,
    /// Months subscribed (0 when not a subscriber)
    pub subscribe_month: u32,
    /// Capability flags
    pub flag: UserFlag,
}

impl User {
    /// Create a user with no flags
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Chat line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessage {
    pub user: User,
    pub message: String,
}

/// User joined (`joined == true`) or left
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListEntry {
    pub user: User,
    pub joined: bool,
}

/// Balloon gift
///
/// Any chat text sent with the gift arrives as a separate chat frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balloon {
    pub user: User,
    pub count: u32,
}

/// Ad-balloon gift
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adballoon {
    pub user: User,
    pub count: u32,
}

/// Subscription or renewal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    pub user: User,
    /// Renewal count (months)
    pub count: u32,
}

/// Challenge mission gift
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mission {
    pub user: User,
    pub title: String,
    pub count: u32,
}
