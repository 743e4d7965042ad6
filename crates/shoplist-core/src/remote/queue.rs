//! ============================================================================
//! Sync Queue - Fire-and-forget notification delivery
//! ============================================================================
//! Local state is already mutated when a notification is submitted. Delivery
//! is at-most-once: failures are logged and dropped, never retried and never
//! reported back to the caller.
//! ============================================================================

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{RemoteBackend, SyncNotification};

/// Anything that accepts notifications without blocking
pub trait NotificationSink: Send + Sync {
    fn submit(&self, notification: SyncNotification);
}

/// Delivery counters reported on shutdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Unbounded queue drained by one background task
pub struct SyncQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<SyncNotification>>>,
    worker: Mutex<Option<JoinHandle<SyncStats>>>,
}

impl SyncQueue {
    /// Start the delivery worker. Must be called inside a tokio runtime.
    pub fn spawn(backend: Arc<dyn RemoteBackend>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SyncNotification>();

        let worker = tokio::spawn(async move {
            let mut stats = SyncStats::default();
            while let Some(notification) = rx.recv().await {
                match backend.notify(&notification).await {
                    Ok(()) => {
                        debug!("Delivered {} notification", notification.kind());
                        stats.delivered += 1;
                    }
                    Err(e) => {
                        warn!("Dropping {} notification: {}", notification.kind(), e);
                        stats.failed += 1;
                    }
                }
            }
            stats
        });

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Stop accepting notifications and wait for the backlog to drain
    pub async fn shutdown(&self) -> SyncStats {
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }

        let worker = self.worker.lock().ok().and_then(|mut w| w.take());
        let Some(worker) = worker else {
            return SyncStats::default();
        };

        match worker.await {
            Ok(stats) => {
                info!(
                    "Sync queue drained: {} delivered, {} failed",
                    stats.delivered, stats.failed
                );
                stats
            }
            Err(e) => {
                warn!("Sync worker ended abnormally: {}", e);
                SyncStats::default()
            }
        }
    }
}

impl NotificationSink for SyncQueue {
    fn submit(&self, notification: SyncNotification) {
        let sent = match self.tx.lock() {
            Ok(tx) => match tx.as_ref() {
                Some(tx) => tx.send(notification).map_err(|e| e.0),
                None => Err(notification),
            },
            Err(poisoned) => {
                warn!("Sync queue lock poisoned: {}", poisoned);
                return;
            }
        };

        if let Err(notification) = sent {
            warn!("Sync queue closed, dropping {} notification", notification.kind());
        }
    }
}
