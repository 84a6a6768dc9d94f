//! Reconnecting driver
//!
//! Runs one fresh [`ChatConnection`] per attempt for a single streamer.
//! Nothing carries over between attempts: every attempt resolves the endpoint
//! again and performs the full handshake.
//!
//! Stop conditions:
//! - the connection ended cleanly (stopped through a handle)
//! - the streamer is not live
//! - the policy's attempt ceiling was reached

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::retry::RetryPolicy;
use crate::client::{ChatConnection, ChatHandler, ClientConfig, ConnectionHandle};
use crate::error::{Error, Result};
use crate::resolver::EndpointResolver;

/// Handle for stopping a running [`Supervisor`]
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    cancel: CancellationToken,
    current: Arc<RwLock<Option<ConnectionHandle>>>,
}

impl SupervisorHandle {
    /// Stop the live connection and any pending backoff wait
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether [`stop`](Self::stop) was called
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Handle of the connection attempt in progress, if any
    pub async fn current(&self) -> Option<ConnectionHandle> {
        self.current.read().await.clone()
    }
}

/// Retry driver for one streamer's chat
pub struct Supervisor<H> {
    config: ClientConfig,
    resolver: Arc<dyn EndpointResolver>,
    handler: H,
    policy: RetryPolicy,
    cancel: CancellationToken,
    current: Arc<RwLock<Option<ConnectionHandle>>>,
}

impl<H: ChatHandler> Supervisor<H> {
    /// Create a supervisor with the default [`RetryPolicy`]
    pub fn new(config: ClientConfig, resolver: Arc<dyn EndpointResolver>, handler: H) -> Self {
        Self {
            config,
            resolver,
            handler,
            policy: RetryPolicy::default(),
            cancel: CancellationToken::new(),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get a handle for stopping the supervisor
    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            cancel: self.cancel.clone(),
            current: Arc::clone(&self.current),
        }
    }

    /// Run attempts until a stop condition
    ///
    /// Returns `Ok(())` when stopped through a handle, the permanent error
    /// when the streamer is not live, and [`Error::RetriesExhausted`] once
    /// the attempt ceiling is reached.
    pub async fn run(mut self) -> Result<()> {
        let streamer = self.config.streamer_id.clone();
        let mut failures: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            let connection = ChatConnection::with_cancel(
                self.config.clone(),
                Arc::clone(&self.resolver),
                self.cancel.child_token(),
            );
            *self.current.write().await = Some(connection.handle());

            tracing::info!(streamer = %streamer, attempt = failures + 1, "Starting chat connection");
            let result = connection.run(&mut self.handler).await;
            *self.current.write().await = None;

            let err = match result {
                Ok(()) => {
                    tracing::info!(streamer = %streamer, "Chat connection stopped");
                    return Ok(());
                }
                Err(e) => e,
            };

            if err.is_permanent() {
                tracing::error!(streamer = %streamer, error = %err, "Giving up");
                return Err(err);
            }

            failures += 1;
            if self.policy.is_exhausted(failures) {
                tracing::error!(
                    streamer = %streamer,
                    attempts = failures,
                    error = %err,
                    "Retry limit reached"
                );
                return Err(Error::RetriesExhausted { attempts: failures });
            }

            let delay = self.policy.delay(failures);
            tracing::warn!(
                streamer = %streamer,
                attempt = failures,
                delay_secs = delay.as_secs_f64(),
                error = %err,
                "Chat connection lost, reconnecting"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(streamer = %streamer, "Stopped during backoff");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::client::{ChatEvent, EventSender};
    use crate::error::ResolveError;
    use crate::message::{Balloon, User};
    use crate::protocol::{service_code, ServiceCode};
    use crate::session::ConnectionState;
    use crate::testing::{events_until, recv_frame, send_frame, FakeServer, ScriptedResolver};
    use tokio_test::assert_ok;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .max_attempts(max_attempts)
            .base_step(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_not_live_stops_after_one_attempt() {
        let resolver = Arc::new(ScriptedResolver::new(Err(ResolveError::NotLive)));
        let (sender, _events) = EventSender::new();
        let supervisor = Supervisor::new(ClientConfig::new("offline"), resolver.clone(), sender)
            .with_policy(fast_policy(10));

        let result = supervisor.run().await;
        assert!(matches!(result, Err(Error::Resolve(ResolveError::NotLive))));
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let resolver = Arc::new(ScriptedResolver::new(Err(ResolveError::EndpointUnavailable)));
        let (sender, _events) = EventSender::new();
        let supervisor = Supervisor::new(ClientConfig::new("s"), resolver.clone(), sender)
            .with_policy(fast_policy(3));

        let result = supervisor.run().await;
        assert!(matches!(result, Err(Error::RetriesExhausted { attempts: 3 })));
        assert_eq!(resolver.calls(), 3);
    }

    #[tokio::test]
    async fn test_not_live_after_transient_failures() {
        let resolver = Arc::new(
            ScriptedResolver::new(Err(ResolveError::NotLive))
                .then(Err(ResolveError::AuthRequired))
                .then(Err(ResolveError::Http("timeout".into()))),
        );
        let (sender, _events) = EventSender::new();
        let supervisor = Supervisor::new(ClientConfig::new("s"), resolver.clone(), sender)
            .with_policy(fast_policy(10));

        assert!(supervisor.run().await.unwrap_err().is_permanent());
        assert_eq!(resolver.calls(), 3);
    }

    #[tokio::test]
    async fn test_stop_cancels_backoff() {
        let resolver = Arc::new(ScriptedResolver::new(Err(ResolveError::EndpointUnavailable)));
        let (sender, mut events) = EventSender::new();
        let policy = RetryPolicy::default().base_step(Duration::from_secs(60));
        let supervisor =
            Supervisor::new(ClientConfig::new("s"), resolver.clone(), sender).with_policy(policy);
        let handle = supervisor.handle();

        let task = tokio::spawn(supervisor.run());

        // First attempt fails, then the supervisor sleeps for a minute
        events_until(&mut events, |e| matches!(e, ChatEvent::Connected(false))).await;
        handle.stop();

        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("stop did not interrupt backoff")
            .unwrap();
        assert_ok!(result);
        assert!(handle.is_stopped());
        assert_eq!(resolver.calls(), 1);
        assert!(handle.current().await.is_none());
    }

    #[tokio::test]
    async fn test_reconnect_starts_fresh_session() {
        let server = FakeServer::bind().await;
        let resolver = Arc::new(
            ScriptedResolver::new(Ok(server.endpoint("1002"))).then(Ok(server.endpoint("1001"))),
        );
        let (sender, mut events) = EventSender::new();
        let supervisor = Supervisor::new(ClientConfig::new("streamer"), resolver.clone(), sender)
            .with_policy(fast_policy(5));
        let handle = supervisor.handle();

        let server_task = tokio::spawn(async move {
            let mut rooms = Vec::new();
            let mut last = None;
            for attempt in 0..2 {
                let mut ws = server.accept().await;

                let login = recv_frame(&mut ws).await.unwrap();
                assert_eq!(service_code(&login), Some(1));
                send_frame(&mut ws, ServiceCode::Login, "\x0c").await;

                let join = recv_frame(&mut ws).await.unwrap();
                let text = String::from_utf8_lossy(&join).into_owned();
                rooms.push(text.split('\x0c').nth(1).unwrap_or_default().to_string());
                send_frame(&mut ws, ServiceCode::JoinChannel, "\x0cok\x0c").await;

                // First socket drops right after the join; the second stays
                if attempt == 0 {
                    drop(ws);
                } else {
                    last = Some(ws);
                }
            }
            if let Some(ws) = last.as_mut() {
                send_frame(ws, ServiceCode::SendBalloon, "\x0cmeta\x0cfan\x0cFan\x0c5").await;
            }
            (rooms, last)
        });

        let task = tokio::spawn(supervisor.run());

        let first = events_until(&mut events, |e| matches!(e, ChatEvent::Connected(false))).await;
        assert!(first.contains(&ChatEvent::Joined(true)));
        assert!(first.iter().any(|e| matches!(e, ChatEvent::Error(_))));

        let second = events_until(&mut events, |e| matches!(e, ChatEvent::Balloon(_))).await;
        assert_eq!(second[0], ChatEvent::StateChanged(ConnectionState::Resolving));
        assert!(second.contains(&ChatEvent::Joined(true)));
        assert_eq!(
            second.last(),
            Some(&ChatEvent::Balloon(Balloon {
                user: User::new("fan", "Fan"),
                count: 5,
            }))
        );

        let current = handle.current().await.expect("live connection");
        assert_eq!(current.state(), ConnectionState::Joined);

        let (rooms, _ws) = server_task.await.unwrap();
        assert_eq!(rooms, vec!["1001".to_string(), "1002".to_string()]);
        assert_eq!(resolver.calls(), 2);

        handle.stop();
        assert_ok!(task.await.unwrap());
    }
}
