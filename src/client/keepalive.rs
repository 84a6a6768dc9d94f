//! Keepalive ticker
//!
//! Writes one keepalive frame per interval until cancelled. Cancellation is
//! immediate: no final frame is sent.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::transport::SharedWriter;
use crate::error::TransportError;
use crate::protocol::keepalive_frame;
use crate::session::SessionStats;

/// Spawn the keepalive task
///
/// The task ends with `Ok(())` when `cancel` fires, or with the write error
/// that stopped it. The first frame goes out one full `period` after start.
pub fn spawn_keepalive(
    writer: SharedWriter,
    period: Duration,
    stats: Arc<SessionStats>,
    cancel: CancellationToken,
) -> JoinHandle<Result<(), TransportError>> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            let mut guard = writer.lock().await;
            let Some(sink) = guard.as_mut() else {
                return Err(TransportError::Write("socket closed".into()));
            };
            sink.send(keepalive_frame()).await?;
            drop(guard);

            stats.record_keepalive();
            tracing::debug!("Keepalive sent");
        }
    })
}
