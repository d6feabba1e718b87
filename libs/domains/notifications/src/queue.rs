//! Fire-and-forget queue and its background consumer.
//!
//! Producers call [`NotificationQueue::send`], which never blocks and never
//! fails. A single [`NotificationWorker`] drains the queue in FIFO order
//! through a [`Dispatch`] implementation. Failed items are logged and dropped;
//! nothing is re-enqueued and nothing survives a process restart.

use crate::models::Notification;
use crate::sender::Dispatch;
use crate::snapshot::{DEFAULT_MAX_DEPTH, snapshot};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Producer handle for the in-memory notification queue.
///
/// Cheap to clone; every clone feeds the same consumer.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    /// Create an unbounded queue and the worker that will drain it.
    pub fn new(dispatcher: Arc<dyn Dispatch>) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, NotificationWorker { rx, dispatcher })
    }

    /// Enqueue a notification without waiting.
    ///
    /// If the consumer is gone the notification is dropped with a warning.
    pub fn send(&self, notification: Notification) {
        let id = notification.id();
        if let Err(mpsc::error::SendError(dropped)) = self.tx.send(notification) {
            warn!(
                notification_id = %id,
                notification = %snapshot(&dropped, DEFAULT_MAX_DEPTH),
                "Notification queue is closed, dropping notification"
            );
            return;
        }
        debug!(notification_id = %id, "Notification queued");
    }

    /// Whether the consumer side has shut down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single consumer draining a [`NotificationQueue`].
pub struct NotificationWorker {
    rx: mpsc::UnboundedReceiver<Notification>,
    dispatcher: Arc<dyn Dispatch>,
}

impl NotificationWorker {
    /// Spawn the consumer loop onto the runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Process notifications until the queue is closed and drained or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Starting notification worker");

        loop {
            let notification = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Received shutdown signal, stopping notification worker");
                    break;
                }
                next = self.rx.recv() => match next {
                    Some(notification) => notification,
                    None => {
                        info!("Notification queue closed and drained, stopping worker");
                        break;
                    }
                },
            };

            match self.dispatcher.send_async(&notification, &cancel).await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {
                    info!(
                        notification_id = %notification.id(),
                        "Notification cancelled during shutdown, stopping worker"
                    );
                    break;
                }
                Err(err) => {
                    error!(
                        notification_id = %notification.id(),
                        kind = %notification.kind(),
                        error = %err,
                        "Queued notification failed"
                    );
                }
            }
        }

        self.rx.close();
    }
}
