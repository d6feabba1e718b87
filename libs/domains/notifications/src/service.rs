//! Caller-facing notification service.

use crate::error::NotificationResult;
use crate::models::Notification;
use crate::queue::{NotificationQueue, NotificationWorker};
use crate::sender::Dispatch;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Entry point for producers: deliver now, or queue and forget.
#[derive(Clone)]
pub struct NotificationService {
    dispatcher: Arc<dyn Dispatch>,
    queue: NotificationQueue,
}

impl NotificationService {
    /// Create the service and the worker that drains its queue.
    ///
    /// The worker does nothing until [`NotificationWorker::spawn`] is called.
    pub fn new(dispatcher: Arc<dyn Dispatch>) -> (Self, NotificationWorker) {
        let (queue, worker) = NotificationQueue::new(Arc::clone(&dispatcher));
        (Self { dispatcher, queue }, worker)
    }

    /// Run the full pipeline and surface every failure.
    pub async fn send_async(
        &self,
        notification: &Notification,
        cancel: &CancellationToken,
    ) -> NotificationResult<()> {
        self.dispatcher.send_async(notification, cancel).await
    }

    /// Queue the notification for background delivery. Never blocks, never fails.
    pub fn send(&self, notification: Notification) {
        self.queue.send(notification);
    }

    pub fn queue(&self) -> &NotificationQueue {
        &self.queue
    }
}
