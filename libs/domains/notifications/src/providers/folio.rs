//! Folio SMS provider implementation.

use super::{SmsClient, SmsMessage, cancellable, http_client};
use crate::config::{FromEnv, env_parse, env_required};
use crate::error::{NotificationError, NotificationResult, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const PROVIDER: &str = "Folio";
const API_KEY_HEADER: &str = "FOLIOMEDIAN_API_KEY";

/// Folio API configuration.
#[derive(Debug, Clone)]
pub struct FolioConfig {
    /// Base URL of the Folio API, e.g. `https://api.foliomedian.com/sms/`.
    pub base_url: Url,
    /// Folio API key.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl FolioConfig {
    /// Create a new Folio configuration, validating both fields.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> NotificationResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| NotificationError::Config(format!("Folio BaseUrl must be a valid URL: {}", e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(NotificationError::Config(
                "Folio BaseUrl must use http or https".to_string(),
            ));
        }

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NotificationError::Config("Folio ApiKey is required".to_string()));
        }

        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint messages are posted to.
    pub fn send_url(&self) -> String {
        format!("{}/send", self.base_url.as_str().trim_end_matches('/'))
    }
}

impl FromEnv for FolioConfig {
    fn from_env() -> NotificationResult<Self> {
        let base_url = env_required("FOLIO_BASE_URL")?;
        let api_key = env_required("FOLIO_API_KEY")?;
        let timeout_secs: u64 = env_parse("FOLIO_TIMEOUT_SECS", 30)?;

        Ok(Self::new(&base_url, api_key)?.with_timeout(Duration::from_secs(timeout_secs)))
    }
}

/// Folio SMS client.
pub struct FolioSmsClient {
    config: FolioConfig,
    client: Client,
}

impl FolioSmsClient {
    pub fn new(config: FolioConfig) -> NotificationResult<Self> {
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> NotificationResult<Self> {
        Self::new(FolioConfig::from_env()?)
    }

    async fn post(&self, message: &SmsMessage) -> NotificationResult<()> {
        debug!(to = %message.to, "Sending SMS via Folio");

        let response = self
            .client
            .post(self.config.send_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .form(&[("to", message.to.as_str()), ("message", message.content.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            info!(to = %message.to, "SMS sent successfully via Folio");
            return Ok(());
        }

        error!(
            to = %message.to,
            status = %status.as_u16(),
            response = %body,
            "Folio API request failed"
        );

        Err(ProviderError::http(
            PROVIDER,
            status.as_u16(),
            format!(
                "Folio API returned {} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                body
            ),
        )
        .into())
    }
}

#[async_trait]
impl SmsClient for FolioSmsClient {
    async fn send(&self, message: &SmsMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        cancellable(cancel, self.post(message)).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
