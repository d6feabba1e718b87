//! SendGrid email provider implementation.

use super::{EmailClient, EmailMessage, cancellable, http_client};
use crate::config::{FromEnv, env_or_default, env_parse, env_required};
use crate::error::{NotificationError, NotificationResult, ProviderError};
use crate::values::EmailAddress;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const PROVIDER: &str = "SendGrid";
const MAX_FROM_NAME_LEN: usize = 100;

/// SendGrid API configuration.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    /// SendGrid API key.
    pub api_key: String,
    /// Sender email address.
    pub from_email: EmailAddress,
    /// Sender name.
    pub from_name: String,
    /// SendGrid API base URL (defaults to production).
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SendGridConfig {
    /// Create a new SendGrid configuration.
    pub fn new(
        api_key: impl Into<String>,
        from_email: &str,
        from_name: impl Into<String>,
    ) -> NotificationResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NotificationError::Config("SendGrid ApiKey is required".to_string()));
        }

        let from_email = EmailAddress::new(from_email)
            .map_err(|e| NotificationError::Config(format!("SendGrid FromEmail: {}", e)))?;

        let from_name = from_name.into();
        if from_name.trim().is_empty() || from_name.chars().count() > MAX_FROM_NAME_LEN {
            return Err(NotificationError::Config(format!(
                "SendGrid FromName must be 1-{} characters",
                MAX_FROM_NAME_LEN
            )));
        }

        Ok(Self {
            api_key,
            from_email,
            from_name,
            api_url: "https://api.sendgrid.com/v3".to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl FromEnv for SendGridConfig {
    fn from_env() -> NotificationResult<Self> {
        let api_key = env_required("SENDGRID_API_KEY")?;
        let from_email = env_required("SENDGRID_FROM_EMAIL")?;
        let from_name = env_or_default("SENDGRID_FROM_NAME", "Zerg");
        let api_url = env_or_default("SENDGRID_API_URL", "https://api.sendgrid.com/v3");
        let timeout_secs: u64 = env_parse("SENDGRID_TIMEOUT_SECS", 30)?;

        Ok(Self::new(api_key, &from_email, from_name)?
            .with_api_url(api_url)
            .with_timeout(Duration::from_secs(timeout_secs)))
    }
}

/// SendGrid email client.
pub struct SendGridEmailClient {
    config: SendGridConfig,
    client: Client,
}

impl SendGridEmailClient {
    pub fn new(config: SendGridConfig) -> NotificationResult<Self> {
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> NotificationResult<Self> {
        Self::new(SendGridConfig::from_env()?)
    }

    fn request<'a>(&'a self, message: &'a EmailMessage) -> SendGridRequest<'a> {
        SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: &message.to,
                    name: None,
                }],
            }],
            from: Address {
                email: self.config.from_email.as_str(),
                name: Some(&self.config.from_name),
            },
            subject: &message.subject,
            content: vec![Content {
                content_type: "text/html",
                value: &message.content,
            }],
        }
    }

    async fn post(&self, message: &EmailMessage) -> NotificationResult<()> {
        debug!(to = %message.to, subject = %message.subject, "Sending email via SendGrid");

        let response = self
            .client
            .post(format!("{}/mail/send", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&self.request(message))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status.is_success() {
            info!(
                to = %message.to,
                message_id = ?message_id,
                "Email sent successfully via SendGrid"
            );
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(
            to = %message.to,
            status = %status,
            error = %error_body,
            "Failed to send email via SendGrid"
        );

        let error_message = match serde_json::from_str::<SendGridError>(&error_body) {
            Ok(sg_error) => sg_error
                .errors
                .into_iter()
                .map(|e| match e.field {
                    Some(field) => format!("{}: {}", field, e.message),
                    None => e.message,
                })
                .collect::<Vec<_>>()
                .join(", "),
            Err(_) => error_body,
        };

        Err(ProviderError::http(PROVIDER, status.as_u16(), error_message).into())
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
    field: Option<String>,
}

#[async_trait]
impl EmailClient for SendGridEmailClient {
    async fn send(&self, message: &EmailMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        cancellable(cancel, self.post(message)).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
