//! Twilio SMS provider implementation.

use super::{SmsClient, SmsMessage, cancellable, http_client};
use crate::config::{FromEnv, env_or_default, env_parse, env_required};
use crate::error::{NotificationError, NotificationResult, ProviderError};
use crate::validation::is_e164;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const PROVIDER: &str = "Twilio";

/// Twilio API configuration.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 form.
    pub number_from: String,
    /// Twilio API base URL (defaults to production).
    pub api_url: String,
    pub timeout: Duration,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        number_from: impl Into<String>,
    ) -> NotificationResult<Self> {
        let account_sid = account_sid.into();
        let auth_token = auth_token.into();
        let number_from = number_from.into();

        if account_sid.trim().is_empty() {
            return Err(NotificationError::Config("Twilio AccountSid is required".to_string()));
        }
        if auth_token.trim().is_empty() {
            return Err(NotificationError::Config("Twilio AuthToken is required".to_string()));
        }
        if !is_e164(&number_from) {
            return Err(NotificationError::Config(format!(
                "Twilio NumberFrom must be an E.164 phone number, got '{}'",
                number_from
            )));
        }

        Ok(Self {
            account_sid,
            auth_token,
            number_from,
            api_url: "https://api.twilio.com".to_string(),
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

    /// Message creation endpoint for the configured account.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_url, self.account_sid
        )
    }
}

impl FromEnv for TwilioConfig {
    fn from_env() -> NotificationResult<Self> {
        let account_sid = env_required("TWILIO_ACCOUNT_SID")?;
        let auth_token = env_required("TWILIO_AUTH_TOKEN")?;
        let number_from = env_required("TWILIO_NUMBER_FROM")?;
        let api_url = env_or_default("TWILIO_API_URL", "https://api.twilio.com");
        let timeout_secs: u64 = env_parse("TWILIO_TIMEOUT_SECS", 30)?;

        Ok(Self::new(account_sid, auth_token, number_from)?
            .with_api_url(api_url)
            .with_timeout(Duration::from_secs(timeout_secs)))
    }
}

/// Error body returned by the Twilio REST API.
#[derive(Debug, Deserialize)]
struct TwilioApiError {
    code: i64,
    message: String,
    #[serde(default)]
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: Option<String>,
}

/// Twilio SMS client.
pub struct TwilioSmsClient {
    config: TwilioConfig,
    client: Client,
}

impl TwilioSmsClient {
    pub fn new(config: TwilioConfig) -> NotificationResult<Self> {
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> NotificationResult<Self> {
        Self::new(TwilioConfig::from_env()?)
    }

    async fn post(&self, message: &SmsMessage) -> NotificationResult<()> {
        debug!(to = %message.to, "Sending SMS via Twilio");

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", message.to.as_str()),
                ("From", self.config.number_from.as_str()),
                ("Body", message.content.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            let sid = serde_json::from_str::<TwilioMessage>(&body)
                .ok()
                .and_then(|m| m.sid);
            info!(to = %message.to, sid = ?sid, "SMS sent successfully via Twilio");
            return Ok(());
        }

        error!(
            to = %message.to,
            status = %status,
            error = %body,
            "Failed to send SMS via Twilio"
        );

        Err(api_error(status.as_u16(), &body).into())
    }
}

/// Map a non-success Twilio response onto a provider error.
fn api_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<TwilioApiError>(body) {
        Ok(api) => ProviderError::api(
            PROVIDER,
            api.code,
            Some(api.status.unwrap_or(status)),
            api.message,
        ),
        Err(_) => ProviderError::http(PROVIDER, status, body),
    }
}

#[async_trait]
impl SmsClient for TwilioSmsClient {
    async fn send(&self, message: &SmsMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        cancellable(cancel, self.post(message)).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
