//! Template rendering for notifications.
//!
//! A renderer declares which notifications it can render; the dispatcher
//! picks the first registered renderer that accepts a notification.

mod catalog;
mod engine;

pub use catalog::{TemplateCatalog, TemplateKey};
pub use engine::{HandlebarsRenderer, TemplateCache};

use crate::error::NotificationResult;
use crate::models::Notification;
use async_trait::async_trait;
use std::sync::Arc;

/// Template identifier rendered verbatim by [`PassthroughRenderer`].
pub const RAW_TEMPLATE: &str = "raw";

/// Turns a notification into deliverable content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Whether this renderer can produce content for the notification.
    fn can_render(&self, notification: &Notification) -> bool;

    /// Render the notification's content.
    async fn render(&self, notification: &Notification) -> NotificationResult<String>;

    /// Renderer name for logging.
    fn name(&self) -> &'static str;
}

/// First registered renderer that accepts the notification.
pub fn select_renderer<'a>(
    renderers: &'a [Arc<dyn TemplateRenderer>],
    notification: &Notification,
) -> Option<&'a Arc<dyn TemplateRenderer>> {
    renderers.iter().find(|r| r.can_render(notification))
}

/// Renders an SMS message body as-is for the `raw` template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRenderer;

#[async_trait]
impl TemplateRenderer for PassthroughRenderer {
    fn can_render(&self, notification: &Notification) -> bool {
        matches!(notification, Notification::Sms(sms) if sms.template == RAW_TEMPLATE)
    }

    async fn render(&self, notification: &Notification) -> NotificationResult<String> {
        match notification {
            Notification::Sms(sms) => Ok(sms.message.clone()),
            other => Err(crate::error::NotificationError::InvalidOperation(format!(
                "PassthroughRenderer cannot render {} notifications",
                other.kind()
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "PassthroughRenderer"
    }
}
