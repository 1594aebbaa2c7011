//! Centralized realtime fan-out.
//!
//! [`RealtimeFanout`] owns the application's single subscription to the car
//! change feed. Each notification is translated into one
//! [`CarChangeEvent`](crate::change::CarChangeEvent) and handed to the
//! injected [`EventSink`]; consumers never open their own subscription.
//!
//! The service has one initialization point ([`RealtimeFanout::start`]) and
//! one teardown point ([`RealtimeFanout::stop`]). When the subscription
//! fails or drops it is re-established with exponential backoff until the
//! service is stopped.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::EventSink;
use crate::change::CarChangeEvent;
use crate::feed::{ChangeFeed, ChangeStream, FeedError};
use crate::reconnect::ReconnectConfig;

/// How long [`RealtimeFanout::stop`] waits for the pump task to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection state of the fan-out's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Stopped,
    Connecting,
    Connected,
    Reconnecting,
}

/// Errors from the fan-out lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("Realtime fan-out is already running")]
    AlreadyRunning,
}

/// Handle to the running pump task.
struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// The single shared subscription to the car change feed.
pub struct RealtimeFanout {
    feed: Arc<dyn ChangeFeed>,
    sink: Arc<dyn EventSink>,
    config: ReconnectConfig,
    status: Arc<watch::Sender<FeedStatus>>,
    running: Option<Running>,
}

impl RealtimeFanout {
    /// Create a stopped fan-out pumping `feed` into `sink`.
    pub fn new(
        feed: Arc<dyn ChangeFeed>,
        sink: Arc<dyn EventSink>,
        config: ReconnectConfig,
    ) -> Self {
        let (status, _) = watch::channel(FeedStatus::Stopped);
        Self {
            feed,
            sink,
            config,
            status: Arc::new(status),
            running: None,
        }
    }

    /// Start the pump task. Must be called from within a tokio runtime.
    ///
    /// Fails with [`FanoutError::AlreadyRunning`] if the fan-out was
    /// already started and not stopped since.
    pub fn start(&mut self) -> Result<(), FanoutError> {
        if self.running.is_some() {
            return Err(FanoutError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.feed),
            Arc::clone(&self.sink),
            self.config.clone(),
            Arc::clone(&self.status),
            cancel.clone(),
        ));

        self.running = Some(Running { cancel, handle });
        tracing::info!("Realtime fan-out started");
        Ok(())
    }

    /// Cancel the subscription and wait for the pump task to exit.
    ///
    /// Stopping a fan-out that is not running is a no-op.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.cancel.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, running.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Realtime fan-out task failed"),
            Err(_) => tracing::warn!("Realtime fan-out did not stop in time"),
        }
        self.status.send_replace(FeedStatus::Stopped);
        tracing::info!("Realtime fan-out stopped");
    }

    /// Whether [`start`](Self::start) has been called without a matching
    /// [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Watch the subscription's connection state.
    pub fn status(&self) -> watch::Receiver<FeedStatus> {
        self.status.subscribe()
    }
}

/// Why a live subscription stopped being pumped.
#[derive(Debug, PartialEq, Eq)]
enum PumpExit {
    Cancelled,
    Dropped,
}

/// Subscribe, pump, and resubscribe with backoff until cancelled.
async fn run(
    feed: Arc<dyn ChangeFeed>,
    sink: Arc<dyn EventSink>,
    config: ReconnectConfig,
    status: Arc<watch::Sender<FeedStatus>>,
    cancel: CancellationToken,
) {
    let mut backoff = config.backoff();
    let mut attempt = 0u32;

    status.send_replace(FeedStatus::Connecting);

    loop {
        attempt += 1;

        let subscribed = tokio::select! {
            _ = cancel.cancelled() => break,
            result = feed.subscribe() => result,
        };

        match subscribed {
            Ok(stream) => {
                tracing::info!(attempt, "Subscribed to car change feed");
                status.send_replace(FeedStatus::Connected);
                backoff.reset();
                attempt = 0;

                if pump(stream, sink.as_ref(), &cancel).await == PumpExit::Cancelled {
                    break;
                }
                tracing::warn!("Car change feed dropped, reconnecting");
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "Car change feed subscription failed");
            }
        }

        let delay = backoff.next_delay();
        status.send_replace(FeedStatus::Reconnecting);
        tracing::info!(delay_ms = delay.as_millis() as u64, "Waiting before resubscribing");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    status.send_replace(FeedStatus::Stopped);
}

/// Forward every notification of one subscription to the sink.
async fn pump(
    mut stream: ChangeStream,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> PumpExit {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return PumpExit::Cancelled,
            next = stream.next() => next,
        };

        let notification = match next {
            Some(Ok(notification)) => notification,
            Some(Err(FeedError::Malformed(msg))) => {
                tracing::warn!(error = %msg, "Skipping malformed car change notification");
                continue;
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Car change feed error");
                return PumpExit::Dropped;
            }
            None => return PumpExit::Dropped,
        };

        match CarChangeEvent::from_notification(notification) {
            Ok(event) => {
                tracing::debug!(
                    car_id = event.record.id,
                    change = ?event.change_kind,
                    floor = %event.affected_floor,
                    "Car change received"
                );
                sink.publish(event);
            }
            Err(e) => tracing::warn!(error = %e, "Skipping car change notification"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
