//! Chat domain events
//!
//! This module provides:
//! - Event value types (users, chat lines, gifts, subscriptions, missions)
//! - User capability flag decoding
//! - One parser per service code

pub mod flags;
pub mod parse;
pub mod types;

pub use flags::{Flag1, Flag2, UserFlag};
pub use types::{Adballoon, Balloon, ChatMessage, Mission, Subscription, User, UserListEntry};
