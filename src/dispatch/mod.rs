//! Event dispatch to the HTTP endpoints
//!
//! The dispatcher drains the gesture queue on the async runtime. Every failure
//! (transport error, timeout, non-2xx status, missing endpoint) is logged and
//! dropped: the gesture already happened and cannot be detected again, and the
//! sampling loop must keep running regardless of downstream reachability.

pub mod event_sink;

pub use event_sink::EventSink;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::gesture::{Gesture, GestureEvent};

// Dispatch errors, never fatal
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No endpoint configured for {0}")]
    MissingEndpoint(Gesture),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint answered {status} for {gesture}")]
    Status { gesture: Gesture, status: u16 },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

// Delivery counters returned when the dispatcher stops
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
}

pub struct DispatchHandle {
    task: JoinHandle<DispatchStats>,
}

impl DispatchHandle {
    /// Spawns the dispatcher. It runs until every sender of `receiver` is dropped.
    pub fn spawn(sink: EventSink, mut receiver: mpsc::Receiver<GestureEvent>) -> Self {
        info!("Spawning dispatcher for {}", sink.base_url());

        let task = tokio::spawn(async move {
            let mut stats = DispatchStats::default();

            while let Some(event) = receiver.recv().await {
                match sink.deliver(&event).await {
                    Ok(status) => {
                        stats.delivered += 1;
                        info!("{} sent: {}", event.gesture, status.as_u16());
                    }
                    Err(DispatchError::Status { gesture, status }) => {
                        stats.failed += 1;
                        warn!("{} rejected by endpoint: {}", gesture, status);
                    }
                    Err(e) => {
                        stats.failed += 1;
                        error!("Failed to send {}: {}", event.gesture, e);
                    }
                }
            }

            info!(
                "Dispatcher stopped: {} delivered, {} failed",
                stats.delivered, stats.failed
            );
            stats
        });

        Self { task }
    }

    pub async fn join(self) -> DispatchStats {
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Dispatcher task failed: {}", e);
                DispatchStats::default()
            }
        }
    }
}
