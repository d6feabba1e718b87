//! Provider client implementations.
//!
//! This module contains the `SmsClient` and `EmailClient` traits and
//! implementations for the supported delivery services.

mod folio;
pub mod mock;
mod sendgrid;
mod twilio;

pub use folio::{FolioConfig, FolioSmsClient};
pub use mock::{MockEmailClient, MockSmsClient};
pub use sendgrid::{SendGridConfig, SendGridEmailClient};
pub use twilio::{TwilioConfig, TwilioSmsClient};

use crate::error::NotificationResult;
use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// A text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsMessage {
    /// Recipient phone number in E.164 form.
    pub to: String,
    /// Rendered message body.
    pub content: String,
}

impl SmsMessage {
    pub fn new(to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            content: content.into(),
        }
    }
}

/// An email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    /// Recipient email address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Rendered HTML body.
    pub content: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            content: content.into(),
        }
    }
}

/// Trait for SMS sending providers.
///
/// Implementations include Folio and Twilio.
#[async_trait]
pub trait SmsClient: Send + Sync {
    /// Send a text message.
    async fn send(&self, message: &SmsMessage, cancel: &CancellationToken) -> NotificationResult<()>;

    /// Get the provider name for logging.
    fn name(&self) -> &'static str;
}

/// Trait for email sending providers.
#[async_trait]
pub trait EmailClient: Send + Sync {
    /// Send an email.
    async fn send(&self, message: &EmailMessage, cancel: &CancellationToken) -> NotificationResult<()>;

    /// Get the provider name for logging.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: SmsClient + ?Sized> SmsClient for std::sync::Arc<T> {
    async fn send(&self, message: &SmsMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        (**self).send(message, cancel).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<T: EmailClient + ?Sized> EmailClient for std::sync::Arc<T> {
    async fn send(&self, message: &EmailMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        (**self).send(message, cancel).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Build the shared HTTP client used by the provider clients.
pub(crate) fn http_client(timeout: std::time::Duration) -> NotificationResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| crate::error::NotificationError::Config(format!("HTTP client: {}", e)))
}

/// Race a provider request against cancellation.
pub(crate) async fn cancellable<F, T>(cancel: &CancellationToken, fut: F) -> NotificationResult<T>
where
    F: std::future::Future<Output = NotificationResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(crate::error::NotificationError::Cancelled),
        result = fut => result,
    }
}
