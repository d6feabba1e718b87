//! The dispatch pipeline.
//!
//! ```text
//! notification ─► select channel ─► validate ─► select renderer ─► render ─► channel send ─► log
//! ```
//!
//! Channel and renderer selection are first-match-wins in registration order.
//! Both registration sets are fixed when the dispatcher is built.

use crate::channels::{ChannelNotification, select_channel};
use crate::error::{NotificationError, NotificationResult};
use crate::models::Notification;
use crate::snapshot::{DEFAULT_MAX_DEPTH, snapshot};
use crate::templates::{TemplateRenderer, select_renderer};
use crate::validation::{NotificationValidator, RuleValidator};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs a notification through the full delivery pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Deliver the notification, surfacing every failure to the caller.
    async fn send_async(
        &self,
        notification: &Notification,
        cancel: &CancellationToken,
    ) -> NotificationResult<()>;
}

/// Dispatcher over a fixed set of channels and renderers.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn ChannelNotification>>,
    renderers: Vec<Arc<dyn TemplateRenderer>>,
    validator: Arc<dyn NotificationValidator>,
    snapshot_depth: usize,
}

impl NotificationDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn channels(&self) -> &[Arc<dyn ChannelNotification>] {
        &self.channels
    }

    pub fn renderers(&self) -> &[Arc<dyn TemplateRenderer>] {
        &self.renderers
    }
}

#[async_trait]
impl Dispatch for NotificationDispatcher {
    async fn send_async(
        &self,
        notification: &Notification,
        cancel: &CancellationToken,
    ) -> NotificationResult<()> {
        let channel = select_channel(&self.channels, notification)
            .ok_or(NotificationError::NoChannel(notification.kind()))?;

        self.validator.validate(notification, cancel).await?;

        let renderer = select_renderer(&self.renderers, notification).ok_or_else(|| {
            NotificationError::NoRenderer {
                kind: notification.kind(),
                template: notification.template().to_string(),
            }
        })?;

        debug!(
            notification_id = %notification.id(),
            channel = channel.name(),
            renderer = renderer.name(),
            "Dispatching notification"
        );

        let content = renderer.render(notification).await?;

        match channel.send_notification(notification, &content, cancel).await {
            Ok(()) => {
                info!(
                    channel = channel.name(),
                    notification = %snapshot(notification, self.snapshot_depth),
                    "Notification sent"
                );
                Ok(())
            }
            Err(err) if err.is_cancelled() => {
                warn!(
                    channel = channel.name(),
                    notification = %snapshot(notification, self.snapshot_depth),
                    "Notification send cancelled"
                );
                Err(err)
            }
            Err(err) => {
                error!(
                    channel = channel.name(),
                    notification = %snapshot(notification, self.snapshot_depth),
                    error = %err,
                    "Failed to send notification"
                );
                Err(err)
            }
        }
    }
}

/// Builder for [`NotificationDispatcher`].
pub struct DispatcherBuilder {
    channels: Vec<Arc<dyn ChannelNotification>>,
    renderers: Vec<Arc<dyn TemplateRenderer>>,
    validator: Arc<dyn NotificationValidator>,
    snapshot_depth: usize,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            renderers: Vec::new(),
            validator: Arc::new(RuleValidator::new()),
            snapshot_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DispatcherBuilder {
    /// Register a channel after the ones already registered.
    pub fn with_channel<C: ChannelNotification + 'static>(mut self, channel: C) -> Self {
        self.channels.push(Arc::new(channel));
        self
    }

    /// Register a renderer after the ones already registered.
    pub fn with_renderer<R: TemplateRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderers.push(Arc::new(renderer));
        self
    }

    /// Replace the default [`RuleValidator`].
    pub fn with_validator<V: NotificationValidator + 'static>(mut self, validator: V) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Nesting bound for the notification snapshot in log lines.
    pub fn with_snapshot_depth(mut self, depth: usize) -> Self {
        self.snapshot_depth = depth;
        self
    }

    pub fn build(self) -> NotificationDispatcher {
        NotificationDispatcher {
            channels: self.channels,
            renderers: self.renderers,
            validator: self.validator,
            snapshot_depth: self.snapshot_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{MockChannelNotification, SmsChannel};
    use crate::error::{ProviderError, ValidationErrors};
    use crate::models::{NotificationKind, SmsNotification};
    use crate::providers::MockSmsClient;
    use crate::templates::{HandlebarsRenderer, MockTemplateRenderer};
    use crate::validation::MockNotificationValidator;
    use crate::values::{Locale, PhoneNumber};

    fn sms() -> Notification {
        SmsNotification::new(
            "welcome",
            Locale::new("en-CA").unwrap(),
            PhoneNumber::new("1", "581", "5551234").unwrap(),
        )
        .with_message("Hello")
        .into()
    }

    fn accepting_validator() -> MockNotificationValidator {
        let mut validator = MockNotificationValidator::new();
        validator.expect_validate().returning(|_, _| Ok(()));
        validator
    }

    fn renderer(content: &'static str) -> MockTemplateRenderer {
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_can_render().return_const(true);
        renderer.expect_name().return_const("mock-renderer");
        renderer.expect_render().returning(move |_| Ok(content.to_string()));
        renderer
    }

    fn channel(name: &'static str, matches: bool) -> MockChannelNotification {
        let mut channel = MockChannelNotification::new();
        channel.expect_can_handle().return_const(matches);
        channel.expect_kind().return_const(NotificationKind::Sms);
        channel.expect_name().return_const(name);
        channel
    }

    #[tokio::test]
    async fn test_no_channel_fails_before_validation_and_rendering() {
        let mut validator = MockNotificationValidator::new();
        validator.expect_validate().never();
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_can_render().never();
        renderer.expect_render().never();

        let dispatcher = NotificationDispatcher::builder()
            .with_validator(validator)
            .with_renderer(renderer)
            .build();

        let err = dispatcher
            .send_async(&sms(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::NoChannel(NotificationKind::Sms)));
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let mut validator = MockNotificationValidator::new();
        validator.expect_validate().times(1).returning(|_, _| {
            let mut errors = ValidationErrors::new();
            errors.push("message", "'Message' must not be empty.");
            errors.push("phone", "'Mobile Phone' must be a valid phone number in E.164 format.");
            errors.into_result()
        });

        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_can_render().never();
        renderer.expect_render().never();

        let mut channel = channel("sms", true);
        channel.expect_send_notification().never();

        let dispatcher = NotificationDispatcher::builder()
            .with_channel(channel)
            .with_renderer(renderer)
            .with_validator(validator)
            .build();

        let err = dispatcher
            .send_async(&sms(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            NotificationError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_only_first_matching_channel_sends() {
        let mut first = channel("first", true);
        first
            .expect_send_notification()
            .times(1)
            .withf(|_, content, _| content == "Welcome! Hello")
            .returning(|_, _, _| Ok(()));

        let mut second = MockChannelNotification::new();
        second.expect_can_handle().never();
        second.expect_send_notification().never();

        let dispatcher = NotificationDispatcher::builder()
            .with_channel(first)
            .with_channel(second)
            .with_renderer(renderer("Welcome! Hello"))
            .with_validator(accepting_validator())
            .build();

        dispatcher
            .send_async(&sms(), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_skips_channels_that_cannot_handle() {
        let mut email_only = channel("email", false);
        email_only.expect_send_notification().never();

        let mut sms_channel = channel("sms", true);
        sms_channel
            .expect_send_notification()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let dispatcher = NotificationDispatcher::builder()
            .with_channel(email_only)
            .with_channel(sms_channel)
            .with_renderer(renderer("Welcome! Hello"))
            .with_validator(accepting_validator())
            .build();

        dispatcher
            .send_async(&sms(), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_renderer() {
        let mut renderer = MockTemplateRenderer::new();
        renderer.expect_can_render().return_const(false);

        let mut channel = channel("sms", true);
        channel.expect_send_notification().never();

        let dispatcher = NotificationDispatcher::builder()
            .with_channel(channel)
            .with_renderer(renderer)
            .with_validator(accepting_validator())
            .build();

        let err = dispatcher
            .send_async(&sms(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NotificationError::NoRenderer { kind: NotificationKind::Sms, ref template } if template == "welcome"
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_is_reraised_unchanged() {
        let client = MockSmsClient::failing(ProviderError::http("mock", 401, "Unauthorized"));
        let dispatcher = NotificationDispatcher::builder()
            .with_channel(SmsChannel::new(client.clone()))
            .with_renderer(HandlebarsRenderer::builtin())
            .build();

        let err = dispatcher
            .send_async(&sms(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::Provider(ref e) if e.status() == Some(401)));
        assert_eq!(client.attempts(), 1);
    }

    #[tokio::test]
    async fn test_full_pipeline_with_builtin_templates() {
        let client = MockSmsClient::new();
        let dispatcher = NotificationDispatcher::builder()
            .with_channel(SmsChannel::new(client.clone()))
            .with_renderer(HandlebarsRenderer::builtin())
            .build();

        dispatcher
            .send_async(&sms(), &CancellationToken::new())
            .await
            .unwrap();

        let sent = client.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+15815551234");
        assert_eq!(sent[0].content, "Welcome! Hello");
    }
}
