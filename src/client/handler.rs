//! Event handler interface
//!
//! Applications either implement [`ChatHandler`] directly or use
//! [`EventSender`] to receive every callback as a [`ChatEvent`] on a channel.
//!
//! Handlers run inside the receive loop. A slow handler delays the next
//! frame; handlers are never called concurrently for one connection.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::message::{Adballoon, Balloon, ChatMessage, Mission, Subscription, UserListEntry};
use crate::session::ConnectionState;

/// Callbacks for one chat session
///
/// Every method has an empty default, so implementors only override the
/// events they care about.
#[allow(unused_variables)]
pub trait ChatHandler: Send {
    /// Lifecycle transition
    fn on_state_change(&mut self, state: ConnectionState) {}

    /// `true` when the login ack arrives, `false` once when the connection closes
    fn on_connect(&mut self, connected: bool) {}

    /// Join result (`false` for a wrong channel password)
    fn on_join_channel(&mut self, joined: bool) {}

    /// Every inbound frame, before dispatch
    fn on_raw_message(&mut self, frame: &[u8]) {}

    /// Chat line
    fn on_chat_message(&mut self, message: ChatMessage) {}

    /// Users joined or left
    fn on_user_list(&mut self, users: Vec<UserListEntry>) {}

    /// Balloon gift
    fn on_balloon(&mut self, balloon: Balloon) {}

    /// Ad-balloon gift
    fn on_adballoon(&mut self, adballoon: Adballoon) {}

    /// Subscription
    fn on_subscription(&mut self, subscription: Subscription) {}

    /// Operator notice
    fn on_admin_notice(&mut self, notice: String) {}

    /// Challenge mission gift
    fn on_mission(&mut self, mission: Mission) {}

    /// Any failure: parse errors (the loop continues) and the error that
    /// ended the connection
    fn on_error(&mut self, error: &Error) {}
}

impl<H: ChatHandler + ?Sized> ChatHandler for Box<H> {
    fn on_state_change(&mut self, state: ConnectionState) {
        (**self).on_state_change(state)
    }
    fn on_connect(&mut self, connected: bool) {
        (**self).on_connect(connected)
    }
    fn on_join_channel(&mut self, joined: bool) {
        (**self).on_join_channel(joined)
    }
    fn on_raw_message(&mut self, frame: &[u8]) {
        (**self).on_raw_message(frame)
    }
    fn on_chat_message(&mut self, message: ChatMessage) {
        (**self).on_chat_message(message)
    }
    fn on_user_list(&mut self, users: Vec<UserListEntry>) {
        (**self).on_user_list(users)
    }
    fn on_balloon(&mut self, balloon: Balloon) {
        (**self).on_balloon(balloon)
    }
    fn on_adballoon(&mut self, adballoon: Adballoon) {
        (**self).on_adballoon(adballoon)
    }
    fn on_subscription(&mut self, subscription: Subscription) {
        (**self).on_subscription(subscription)
    }
    fn on_admin_notice(&mut self, notice: String) {
        (**self).on_admin_notice(notice)
    }
    fn on_mission(&mut self, mission: Mission) {
        (**self).on_mission(mission)
    }
    fn on_error(&mut self, error: &Error) {
        (**self).on_error(error)
    }
}

/// Every handler callback as a value
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    StateChanged(ConnectionState),
    Connected(bool),
    Joined(bool),
    Raw(Bytes),
    Chat(ChatMessage),
    UserList(Vec<UserListEntry>),
    Balloon(Balloon),
    Adballoon(Adballoon),
    Subscription(Subscription),
    AdminNotice(String),
    Mission(Mission),
    /// Rendered error message
    Error(String),
}

impl ChatEvent {
    /// Invoke the matching callback on `handler`
    ///
    /// `Error` events carry only the message and are not re-delivered.
    pub fn deliver<H: ChatHandler + ?Sized>(self, handler: &mut H) {
        match self {
            ChatEvent::StateChanged(state) => handler.on_state_change(state),
            ChatEvent::Connected(connected) => handler.on_connect(connected),
            ChatEvent::Joined(joined) => handler.on_join_channel(joined),
            ChatEvent::Raw(frame) => handler.on_raw_message(&frame),
            ChatEvent::Chat(message) => handler.on_chat_message(message),
            ChatEvent::UserList(users) => handler.on_user_list(users),
            ChatEvent::Balloon(balloon) => handler.on_balloon(balloon),
            ChatEvent::Adballoon(adballoon) => handler.on_adballoon(adballoon),
            ChatEvent::Subscription(subscription) => handler.on_subscription(subscription),
            ChatEvent::AdminNotice(notice) => handler.on_admin_notice(notice),
            ChatEvent::Mission(mission) => handler.on_mission(mission),
            ChatEvent::Error(_) => {}
        }
    }
}

/// Handler that forwards every callback into an unbounded channel
///
/// Sends never block the receive loop. Events are dropped once the
/// receiver is gone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ChatEvent>,
    raw_frames: bool,
}

impl EventSender {
    /// Create a sender and its receiver. Raw frames are not forwarded.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                raw_frames: false,
            },
            rx,
        )
    }

    /// Also forward every raw frame as [`ChatEvent::Raw`]
    pub fn with_raw_frames(mut self) -> Self {
        self.raw_frames = true;
        self
    }

    fn send(&self, event: ChatEvent) {
        let _ = self.tx.send(event);
    }
}

impl ChatHandler for EventSender {
    fn on_state_change(&mut self, state: ConnectionState) {
        self.send(ChatEvent::StateChanged(state));
    }

    fn on_connect(&mut self, connected: bool) {
        self.send(ChatEvent::Connected(connected));
    }

    fn on_join_channel(&mut self, joined: bool) {
        self.send(ChatEvent::Joined(joined));
    }

    fn on_raw_message(&mut self, frame: &[u8]) {
        if self.raw_frames {
            self.send(ChatEvent::Raw(Bytes::copy_from_slice(frame)));
        }
    }

    fn on_chat_message(&mut self, message: ChatMessage) {
        self.send(ChatEvent::Chat(message));
    }

    fn on_user_list(&mut self, users: Vec<UserListEntry>) {
        self.send(ChatEvent::UserList(users));
    }

    fn on_balloon(&mut self, balloon: Balloon) {
        self.send(ChatEvent::Balloon(balloon));
    }

    fn on_adballoon(&mut self, adballoon: Adballoon) {
        self.send(ChatEvent::Adballoon(adballoon));
    }

    fn on_subscription(&mut self, subscription: Subscription) {
        self.send(ChatEvent::Subscription(subscription));
    }

    fn on_admin_notice(&mut self, notice: String) {
        self.send(ChatEvent::AdminNotice(notice));
    }

    fn on_mission(&mut self, mission: Mission) {
        self.send(ChatEvent::Mission(mission));
    }

    fn on_error(&mut self, error: &Error) {
        self.send(ChatEvent::Error(error.to_string()));
    }
}
