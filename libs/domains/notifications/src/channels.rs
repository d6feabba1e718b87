//! Delivery channels.
//!
//! A channel adapts a rendered notification onto a provider client. The
//! dispatcher uses the first registered channel whose `can_handle` accepts the
//! notification.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationKind};
use crate::providers::{EmailClient, EmailMessage, SmsClient, SmsMessage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A delivery channel for one kind of notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelNotification: Send + Sync {
    /// Kind of notification this channel delivers.
    fn kind(&self) -> NotificationKind;

    /// Whether this channel accepts the notification.
    fn can_handle(&self, notification: &Notification) -> bool;

    /// Deliver already-rendered `content` for the notification.
    async fn send_notification(
        &self,
        notification: &Notification,
        content: &str,
        cancel: &CancellationToken,
    ) -> NotificationResult<()>;

    /// Channel name for logging.
    fn name(&self) -> &'static str;
}

/// First registered channel that accepts the notification.
pub fn select_channel<'a>(
    channels: &'a [Arc<dyn ChannelNotification>],
    notification: &Notification,
) -> Option<&'a Arc<dyn ChannelNotification>> {
    channels.iter().find(|c| c.can_handle(notification))
}

fn mismatch(channel: &str, notification: &Notification) -> NotificationError {
    NotificationError::InvalidOperation(format!(
        "{} cannot send {} notifications. Always check can_handle before send",
        channel,
        notification.kind()
    ))
}

/// Delivers SMS notifications through an [`SmsClient`].
pub struct SmsChannel<C> {
    client: C,
}

impl<C: SmsClient> SmsChannel<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: SmsClient> ChannelNotification for SmsChannel<C> {
    fn kind(&self) -> NotificationKind {
        NotificationKind::Sms
    }

    fn can_handle(&self, notification: &Notification) -> bool {
        notification.kind() == NotificationKind::Sms
    }

    async fn send_notification(
        &self,
        notification: &Notification,
        content: &str,
        cancel: &CancellationToken,
    ) -> NotificationResult<()> {
        let Notification::Sms(sms) = notification else {
            return Err(mismatch(self.name(), notification));
        };

        debug!(
            notification_id = %sms.id,
            provider = self.client.name(),
            "Handing SMS to provider"
        );
        let message = SmsMessage::new(sms.phone.full_number(), content);
        self.client.send(&message, cancel).await
    }

    fn name(&self) -> &'static str {
        "SmsChannel"
    }
}

/// Delivers email notifications through an [`EmailClient`].
pub struct EmailChannel<C> {
    client: C,
}

impl<C: EmailClient> EmailChannel<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: EmailClient> ChannelNotification for EmailChannel<C> {
    fn kind(&self) -> NotificationKind {
        NotificationKind::Email
    }

    fn can_handle(&self, notification: &Notification) -> bool {
        notification.kind() == NotificationKind::Email
    }

    async fn send_notification(
        &self,
        notification: &Notification,
        content: &str,
        cancel: &CancellationToken,
    ) -> NotificationResult<()> {
        let Notification::Email(email) = notification else {
            return Err(mismatch(self.name(), notification));
        };

        debug!(
            notification_id = %email.id,
            provider = self.client.name(),
            "Handing email to provider"
        );
        let message = EmailMessage::new(email.to.as_str(), email.subject.as_str(), content);
        self.client.send(&message, cancel).await
    }

    fn name(&self) -> &'static str {
        "EmailChannel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailNotification, SmsNotification};
    use crate::providers::{MockEmailClient, MockSmsClient};
    use crate::values::{EmailAddress, Locale, PhoneNumber};

    fn sms() -> Notification {
        SmsNotification::new(
            "welcome",
            Locale::default(),
            PhoneNumber::new("1", "581", "5551234").unwrap(),
        )
        .with_message("Hello")
        .into()
    }

    fn email() -> Notification {
        EmailNotification::new(
            "welcome",
            Locale::default(),
            EmailAddress::new("user@example.com").unwrap(),
            "Welcome",
        )
        .into()
    }

    #[tokio::test]
    async fn test_sms_channel_sends_to_canonical_number() {
        let client = MockSmsClient::new();
        let channel = SmsChannel::new(client.clone());

        assert!(channel.can_handle(&sms()));
        assert!(!channel.can_handle(&email()));

        channel
            .send_notification(&sms(), "Welcome! Hello", &CancellationToken::new())
            .await
            .unwrap();

        let sent = client.sent_messages().await;
        assert_eq!(sent, vec![SmsMessage::new("+15815551234", "Welcome! Hello")]);
    }

    #[tokio::test]
    async fn test_email_channel_sends_subject_and_body() {
        let client = MockEmailClient::new();
        let channel = EmailChannel::new(client.clone());

        channel
            .send_notification(&email(), "<p>Hi</p>", &CancellationToken::new())
            .await
            .unwrap();

        let sent = client.sent_emails().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "user@example.com");
        assert_eq!(sent[0].subject, "Welcome");
        assert_eq!(sent[0].content, "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_mismatched_notification_is_invalid_operation() {
        let client = MockSmsClient::new();
        let channel = SmsChannel::new(client.clone());

        let err = channel
            .send_notification(&email(), "body", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::InvalidOperation(ref m) if m.contains("can_handle")));
        assert_eq!(client.attempts(), 0);
    }

    #[test]
    fn test_select_channel_is_first_match() {
        let channels: Vec<Arc<dyn ChannelNotification>> = vec![
            Arc::new(EmailChannel::new(MockEmailClient::new())),
            Arc::new(SmsChannel::new(MockSmsClient::new())),
            Arc::new(SmsChannel::new(MockSmsClient::new())),
        ];

        let selected = select_channel(&channels, &sms()).unwrap();
        assert!(Arc::ptr_eq(selected, &channels[1]));
        assert_eq!(select_channel(&channels, &email()).unwrap().kind(), NotificationKind::Email);
        assert!(select_channel(&[], &sms()).is_none());
    }
}
