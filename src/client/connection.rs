//! Chat connection
//!
//! One [`ChatConnection`] drives one attempt through the whole lifecycle:
//! resolve the endpoint, open the socket, run the login/join handshake and
//! then receive frames until the socket closes or the connection is
//! cancelled. A keepalive task shares the socket writer for the lifetime of
//! the socket.
//!
//! A connection is consumed by [`ChatConnection::run`]. Reconnecting means
//! building a new one; nothing carries over between attempts.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use super::config::ClientConfig;
use super::dispatch::{dispatch, Inbound};
use super::handler::ChatHandler;
use super::keepalive::spawn_keepalive;
use super::transport::{self, SharedWriter};
use crate::error::{Error, Result, TransportError};
use crate::protocol::{chat_frame, join_frame, login_frame};
use crate::resolver::EndpointResolver;
use crate::session::{ConnectionState, SessionState, SessionStats, StatsSnapshot};

/// Upper bound on the close handshake during teardown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle for controlling a running connection from other tasks
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    writer: SharedWriter,
    cancel: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    stats: Arc<SessionStats>,
    can_chat: bool,
}

impl ConnectionHandle {
    /// Send a chat line
    ///
    /// Requires an auth ticket in the config and an open socket. Messages too
    /// long for one frame fail with [`ProtocolError::BodyTooLarge`] and
    /// nothing is sent.
    ///
    /// [`ProtocolError::BodyTooLarge`]: crate::error::ProtocolError::BodyTooLarge
    pub async fn send_chat(&self, message: &str) -> Result<()> {
        if !self.can_chat {
            return Err(Error::NotAuthenticated);
        }
        let frame = chat_frame(message)?;

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(Error::NotConnected)?;
        writer.send(frame).await?;
        Ok(())
    }

    /// Stop the connection
    ///
    /// The keepalive stops at once and the receive loop closes the socket
    /// and returns `Ok(())`.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Wait until the connection reaches `target` or a later state
    ///
    /// Returns the state actually reached.
    pub async fn wait_for(&self, target: ConnectionState) -> ConnectionState {
        let mut rx = self.state.clone();
        let reached = match rx.wait_for(|state| *state >= target).await {
            Ok(state) => *state,
            Err(_) => ConnectionState::Closed,
        };
        reached
    }

    /// Traffic counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// A single connection attempt
pub struct ChatConnection {
    config: ClientConfig,
    resolver: Arc<dyn EndpointResolver>,
    session: SessionState,
    writer: SharedWriter,
    stats: Arc<SessionStats>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    keepalive_cancel: CancellationToken,
}

impl ChatConnection {
    /// Create a connection in `Idle`
    pub fn new(config: ClientConfig, resolver: Arc<dyn EndpointResolver>) -> Self {
        Self::with_cancel(config, resolver, CancellationToken::new())
    }

    /// Create a connection that also stops when `cancel` fires
    pub fn with_cancel(
        config: ClientConfig,
        resolver: Arc<dyn EndpointResolver>,
        cancel: CancellationToken,
    ) -> Self {
        let session = SessionState::new(config.streamer_id.clone(), config.tickets.clone());
        let (state_tx, _) = watch::channel(session.state());
        let keepalive_cancel = cancel.child_token();

        Self {
            config,
            resolver,
            session,
            writer: Arc::new(Mutex::new(None)),
            stats: Arc::new(SessionStats::new()),
            state_tx,
            cancel,
            keepalive_cancel,
        }
    }

    /// Get a handle for this connection
    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            writer: Arc::clone(&self.writer),
            cancel: self.cancel.clone(),
            state: self.state_tx.subscribe(),
            stats: Arc::clone(&self.stats),
            can_chat: !self.session.tickets.is_guest(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// Run the connection to completion
    ///
    /// Returns `Ok(())` after [`ConnectionHandle::disconnect`] (or the
    /// parent token) stopped it, and the error that ended it otherwise.
    /// Either way the handler sees `on_connect(false)` exactly once.
    pub async fn run<H: ChatHandler + ?Sized>(mut self, handler: &mut H) -> Result<()> {
        let cancel = self.cancel.clone();

        let result = tokio::select! {
            _ = cancel.cancelled() => Ok(()),
            result = self.drive(handler) => result,
        };
        // A failure caused by our own teardown is not an error
        let result = if cancel.is_cancelled() { Ok(()) } else { result };

        self.keepalive_cancel.cancel();
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, writer.close()).await;
        }

        let last_state = self.session.state();
        if let Err(ref e) = result {
            if last_state.is_connected() {
                tracing::warn!(
                    streamer = %self.session.streamer_id,
                    state = %last_state,
                    error = %e,
                    "Connection lost"
                );
            } else {
                tracing::warn!(
                    streamer = %self.session.streamer_id,
                    state = %last_state,
                    error = %e,
                    "Connection failed"
                );
            }
            handler.on_error(e);
        }

        let joined_secs = self.session.joined_for().map(|d| d.as_secs());
        self.transition(ConnectionState::Closed, handler);
        handler.on_connect(false);

        let stats = self.stats.snapshot();
        tracing::info!(
            streamer = %self.session.streamer_id,
            frames = stats.frames_received,
            events = stats.events_dispatched,
            parse_errors = stats.parse_errors,
            duration_secs = self.session.age().as_secs(),
            joined_secs = ?joined_secs,
            "Connection closed"
        );

        result
    }

    async fn drive<H: ChatHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        self.transition(ConnectionState::Resolving, handler);
        let endpoint = self.resolver.resolve(&self.session.streamer_id).await?;
        tracing::info!(
            streamer = %self.session.streamer_id,
            room = %endpoint.room_id,
            socket = %endpoint.socket_url,
            "Chat endpoint resolved"
        );
        let socket_url = endpoint.socket_url.clone();
        self.session.set_endpoint(endpoint);

        self.transition(ConnectionState::SocketConnecting, handler);
        let (writer, mut reader) =
            tokio::time::timeout(self.config.connect_timeout, transport::connect(&socket_url))
                .await
                .map_err(|_| TransportError::ConnectTimeout)??;
        *self.writer.lock().await = Some(writer);

        self.send(login_frame(&self.session.tickets)?).await?;
        self.transition(ConnectionState::AwaitingLoginAck, handler);

        let mut keepalive = spawn_keepalive(
            Arc::clone(&self.writer),
            self.config.keepalive_interval,
            Arc::clone(&self.stats),
            self.keepalive_cancel.clone(),
        );

        loop {
            let frame = tokio::select! {
                frame = reader.recv() => frame?,
                done = &mut keepalive => {
                    return match done {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(e.into()),
                        Err(e) => Err(TransportError::Write(format!("keepalive task: {}", e)).into()),
                    };
                }
            };

            self.stats.record_frame(frame.len());
            handler.on_raw_message(&frame);
            self.handle_frame(&frame, handler).await?;
        }
    }

    async fn handle_frame<H: ChatHandler + ?Sized>(
        &mut self,
        frame: &[u8],
        handler: &mut H,
    ) -> Result<()> {
        match dispatch(frame) {
            Inbound::Ignored => {}
            Inbound::Keepalive => tracing::trace!("Keepalive echo"),
            Inbound::LoginAck => {
                if self.session.state() != ConnectionState::AwaitingLoginAck {
                    tracing::debug!(state = %self.session.state(), "Ignoring repeated login ack");
                    return Ok(());
                }

                let join = join_frame(
                    self.session.room_id(),
                    &self.session.tickets,
                    self.config.channel_password.as_deref(),
                )?;
                self.send(join).await?;
                self.transition(ConnectionState::AwaitingJoinAck, handler);
                handler.on_connect(true);
            }
            Inbound::JoinAck(accepted) => {
                if self.session.state() != ConnectionState::AwaitingJoinAck {
                    tracing::debug!(state = %self.session.state(), "Ignoring repeated join ack");
                    return Ok(());
                }

                self.session.on_join_ack(accepted);
                self.publish_state(handler);
                if accepted {
                    tracing::info!(room = %self.session.room_id(), "Joined chat room");
                } else {
                    tracing::warn!(room = %self.session.room_id(), "Join rejected");
                }
                handler.on_join_channel(accepted);
            }
            Inbound::Event(event) => {
                self.stats.record_event();
                event.deliver(handler);
            }
            Inbound::Failed(e) => {
                self.stats.record_parse_error();
                tracing::warn!(error = %e, "Dropping malformed frame");
                handler.on_error(&Error::Protocol(e));
            }
        }
        Ok(())
    }

    async fn send(&self, frame: Bytes) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(Error::NotConnected)?;
        writer.send(frame).await?;
        Ok(())
    }

    fn transition<H: ChatHandler + ?Sized>(&mut self, next: ConnectionState, handler: &mut H) {
        if self.session.advance(next) {
            self.publish_state(handler);
        }
    }

    fn publish_state<H: ChatHandler + ?Sized>(&mut self, handler: &mut H) {
        let state = self.session.state();
        tracing::debug!(streamer = %self.session.streamer_id, state = %state, "State changed");
        self.state_tx.send_replace(state);
        handler.on_state_change(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::handler::{ChatEvent, EventSender};
    use crate::error::{ProtocolError, ResolveError};
    use crate::message::{Balloon, User};
    use crate::protocol::{service_code, ServiceCode};
    use crate::testing::{events_until, recv_frame, send_frame, FakeServer, ScriptedResolver};
    use tokio_test::assert_ok;

    /// Drive the server side of the login/join exchange
    async fn server_handshake(
        ws: &mut crate::testing::ServerSocket,
        expected_room: &str,
        join_reply: &str,
    ) {
        let login = recv_frame(ws).await.unwrap();
        assert_eq!(service_code(&login), Some(1));
        send_frame(ws, ServiceCode::Login, "\x0cguest\x0c").await;

        let join = recv_frame(ws).await.unwrap();
        assert_eq!(service_code(&join), Some(2));
        let prefix = format!("\x0c{}\x0c", expected_room);
        assert!(join[14..].starts_with(prefix.as_bytes()));
        send_frame(ws, ServiceCode::JoinChannel, join_reply).await;
    }

    #[tokio::test]
    async fn test_handshake_then_events() {
        let server = FakeServer::bind().await;
        let resolver = Arc::new(ScriptedResolver::new(Ok(server.endpoint("555"))));
        let connection = ChatConnection::new(ClientConfig::new("streamer"), resolver);
        let handle = connection.handle();
        let (mut sender, mut events) = EventSender::new();

        let server_task = tokio::spawn(async move {
            let mut ws = server.accept().await;
            server_handshake(&mut ws, "555", "\x0cok\x0c").await;
            // Chat frame with 3 fields, then a valid balloon
            send_frame(&mut ws, ServiceCode::ChatMessage, "\x0chi\x0cuser").await;
            send_frame(&mut ws, ServiceCode::SendBalloon, "\x0cmeta\x0cu123\x0cNick\x0c100").await;
            ws
        });
        let client_task = tokio::spawn(async move { connection.run(&mut sender).await });

        let seen = events_until(&mut events, |e| matches!(e, ChatEvent::Balloon(_))).await;
        assert_eq!(
            seen,
            vec![
                ChatEvent::StateChanged(ConnectionState::Resolving),
                ChatEvent::StateChanged(ConnectionState::SocketConnecting),
                ChatEvent::StateChanged(ConnectionState::AwaitingLoginAck),
                ChatEvent::StateChanged(ConnectionState::AwaitingJoinAck),
                ChatEvent::Connected(true),
                ChatEvent::StateChanged(ConnectionState::Joined),
                ChatEvent::Joined(true),
                ChatEvent::Error(
                    Error::Protocol(ProtocolError::MalformedFrame {
                        service: 5,
                        fields: 3,
                        required: 9,
                    })
                    .to_string()
                ),
                ChatEvent::Balloon(Balloon {
                    user: User::new("u123", "Nick"),
                    count: 100,
                }),
            ]
        );

        // The malformed frame did not end the session
        assert_eq!(handle.state(), ConnectionState::Joined);
        let stats = handle.stats();
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.events_dispatched, 1);

        let _ws = server_task.await.unwrap();
        handle.disconnect();
        assert_ok!(client_task.await.unwrap());

        let rest = events_until(&mut events, |e| matches!(e, ChatEvent::Connected(false))).await;
        assert_eq!(
            rest,
            vec![
                ChatEvent::StateChanged(ConnectionState::Closed),
                ChatEvent::Connected(false),
            ]
        );
        assert!(events.recv().await.is_none());
        assert_eq!(handle.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_rejected_join_keeps_socket_open() {
        let server = FakeServer::bind().await;
        let resolver = Arc::new(ScriptedResolver::new(Ok(server.endpoint("1"))));
        let connection = ChatConnection::new(
            ClientConfig::new("streamer").channel_password("wrong"),
            resolver,
        );
        let handle = connection.handle();
        let (mut sender, mut events) = EventSender::new();

        let (close_tx, close_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            let mut ws = server.accept().await;
            server_handshake(&mut ws, "1", "\x0c비밀번호가 틀렸습니다.\x0c").await;
            let _ = close_rx.await;
            drop(ws);
        });
        let client_task = tokio::spawn(async move { connection.run(&mut sender).await });

        events_until(&mut events, |e| matches!(e, ChatEvent::Joined(false))).await;
        assert_eq!(handle.state(), ConnectionState::Joined);
        assert!(!client_task.is_finished());

        // Remote drops the socket: the attempt ends with a transport error
        close_tx.send(()).unwrap();
        let result = client_task.await.unwrap();
        assert!(matches!(result, Err(Error::Transport(_))));

        let rest = events_until(&mut events, |e| matches!(e, ChatEvent::Connected(false))).await;
        assert!(matches!(rest[0], ChatEvent::Error(_)));
        assert_eq!(rest[1], ChatEvent::StateChanged(ConnectionState::Closed));
        assert_eq!(rest.len(), 3);
    }

    #[tokio::test]
    async fn test_resolution_failure_closes_once() {
        let resolver = Arc::new(ScriptedResolver::new(Err(ResolveError::NotLive)));
        let connection = ChatConnection::new(ClientConfig::new("offline"), resolver);
        let (mut sender, mut events) = EventSender::new();

        let result = connection.run(&mut sender).await;
        assert!(matches!(result, Err(Error::Resolve(ResolveError::NotLive))));
        drop(sender);

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                ChatEvent::StateChanged(ConnectionState::Resolving),
                ChatEvent::Error("Resolve error: Streamer is not live".into()),
                ChatEvent::StateChanged(ConnectionState::Closed),
                ChatEvent::Connected(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_keepalive_frames_sent() {
        let server = FakeServer::bind().await;
        let resolver = Arc::new(ScriptedResolver::new(Ok(server.endpoint("7"))));
        let config = ClientConfig::new("streamer").keepalive_interval(Duration::from_millis(30));
        let connection = ChatConnection::new(config, resolver);
        let handle = connection.handle();

        let server_task = tokio::spawn(async move {
            let mut ws = server.accept().await;
            server_handshake(&mut ws, "7", "\x0cok\x0c").await;
            let mut keepalives = 0;
            while keepalives < 2 {
                let frame = recv_frame(&mut ws).await.unwrap();
                if service_code(&frame) == Some(0) {
                    assert_eq!(&frame[..], b"\x1b\x09000000000100\x0c");
                    keepalives += 1;
                }
            }
            ws
        });
        let client_task = tokio::spawn(async move {
            let mut handler = EventSender::new().0;
            connection.run(&mut handler).await
        });

        let _ws = server_task.await.unwrap();
        assert!(handle.stats().keepalives_sent >= 2);

        handle.disconnect();
        assert_ok!(client_task.await.unwrap());
    }

    #[tokio::test]
    async fn test_send_chat() {
        let server = FakeServer::bind().await;
        let resolver = Arc::new(ScriptedResolver::new(Ok(server.endpoint("8"))));
        let config = ClientConfig::new("streamer").auth_ticket("TICKET");
        let connection = ChatConnection::new(config, resolver);
        let handle = connection.handle();

        // Nothing is open yet
        assert!(matches!(handle.send_chat("early").await, Err(Error::NotConnected)));

        let server_task = tokio::spawn(async move {
            let mut ws = server.accept().await;

            let login = recv_frame(&mut ws).await.unwrap();
            assert_eq!(&login[14..], b"\x0cTICKET\x0c\x0c\x0c");
            send_frame(&mut ws, ServiceCode::Login, "\x0c").await;
            let _join = recv_frame(&mut ws).await.unwrap();
            send_frame(&mut ws, ServiceCode::JoinChannel, "\x0cok\x0c").await;

            loop {
                let frame = recv_frame(&mut ws).await.unwrap();
                if service_code(&frame) == Some(5) {
                    return frame;
                }
            }
        });
        let client_task = tokio::spawn(async move {
            let mut handler = EventSender::new().0;
            connection.run(&mut handler).await
        });

        assert_eq!(
            handle.wait_for(ConnectionState::Joined).await,
            ConnectionState::Joined
        );
        assert_ok!(handle.send_chat("hello").await);

        let frame = server_task.await.unwrap();
        assert_eq!(&frame[14..], b"\x0chello\x0c0\x0c");

        handle.disconnect();
        assert_ok!(client_task.await.unwrap());
        assert!(matches!(handle.send_chat("late").await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_guest_cannot_chat() {
        let resolver = Arc::new(ScriptedResolver::new(Err(ResolveError::NotLive)));
        let connection = ChatConnection::new(ClientConfig::new("streamer"), resolver);
        let handle = connection.handle();

        assert!(matches!(
            handle.send_chat("hi").await,
            Err(Error::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_oversized_chat_rejected_before_send() {
        let resolver = Arc::new(ScriptedResolver::new(Err(ResolveError::NotLive)));
        let config = ClientConfig::new("streamer").auth_ticket("TICKET");
        let connection = ChatConnection::new(config, resolver);
        let handle = connection.handle();

        // Length is checked before the socket, so no connection is needed
        let result = handle.send_chat(&"a".repeat(1_000_000)).await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::BodyTooLarge {
                service: 5,
                len: 1_000_004,
            }))
        ));
        assert_eq!(handle.stats().frames_received, 0);
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let resolver = Arc::new(ScriptedResolver::new(Err(ResolveError::EndpointUnavailable)));
        let cancel = CancellationToken::new();
        let connection = ChatConnection::with_cancel(ClientConfig::new("s"), resolver, cancel.clone());
        cancel.cancel();

        let mut handler = EventSender::new().0;
        assert_ok!(connection.run(&mut handler).await);
    }
}
