//! Mock provider clients for testing.
//!
//! Both mocks record every message they deliver and can be scripted to fail,
//! either always or for the first N attempts. Clones share state, so a test can
//! keep a handle after moving the client into a channel.

use super::{EmailClient, EmailMessage, SmsClient, SmsMessage};
use crate::error::{NotificationError, NotificationResult, ProviderError};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Failure script shared by the mock clients.
#[derive(Debug, Clone)]
enum Script {
    Succeed,
    FailAlways(ProviderError),
    FailTimes(usize, ProviderError),
}

struct Recorder<M> {
    sent: Arc<Mutex<Vec<M>>>,
    attempts: Arc<AtomicUsize>,
    script: Script,
    delay: Option<Duration>,
}

impl<M> Clone for Recorder<M> {
    fn clone(&self) -> Self {
        Self {
            sent: Arc::clone(&self.sent),
            attempts: Arc::clone(&self.attempts),
            script: self.script.clone(),
            delay: self.delay,
        }
    }
}

impl<M: Clone> Recorder<M> {
    fn new(script: Script) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            script,
            delay: None,
        }
    }

    async fn record(&self, message: &M, cancel: &CancellationToken) -> NotificationResult<()> {
        if cancel.is_cancelled() {
            return Err(NotificationError::Cancelled);
        }

        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(NotificationError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        match &self.script {
            Script::FailAlways(err) => return Err(err.clone().into()),
            Script::FailTimes(times, err) if attempt <= *times => return Err(err.clone().into()),
            _ => {}
        }

        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Mock SMS client that captures sent messages.
#[derive(Clone)]
pub struct MockSmsClient {
    recorder: Recorder<SmsMessage>,
}

impl MockSmsClient {
    /// Create a mock client that always succeeds.
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new(Script::Succeed),
        }
    }

    /// Create a mock client that always fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            recorder: Recorder::new(Script::FailAlways(error)),
        }
    }

    /// Create a mock client whose first `times` attempts fail with `error`.
    pub fn failing_times(times: usize, error: ProviderError) -> Self {
        Self {
            recorder: Recorder::new(Script::FailTimes(times, error)),
        }
    }

    /// Hold every attempt for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.recorder.delay = Some(delay);
        self
    }

    /// Get all delivered messages.
    pub async fn sent_messages(&self) -> Vec<SmsMessage> {
        self.recorder.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.recorder.sent.lock().await.len()
    }

    /// Number of send attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.recorder.attempts.load(Ordering::SeqCst)
    }

    /// Check if a message was delivered to a specific number.
    pub async fn was_sent_to(&self, to: &str) -> bool {
        self.recorder.sent.lock().await.iter().any(|m| m.to == to)
    }
}

impl Default for MockSmsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmsClient for MockSmsClient {
    async fn send(&self, message: &SmsMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        self.recorder.record(message, cancel).await
    }

    fn name(&self) -> &'static str {
        "mock-sms"
    }
}

/// Mock email client that captures sent emails.
#[derive(Clone)]
pub struct MockEmailClient {
    recorder: Recorder<EmailMessage>,
}

impl MockEmailClient {
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new(Script::Succeed),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            recorder: Recorder::new(Script::FailAlways(error)),
        }
    }

    pub fn failing_times(times: usize, error: ProviderError) -> Self {
        Self {
            recorder: Recorder::new(Script::FailTimes(times, error)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.recorder.delay = Some(delay);
        self
    }

    pub async fn sent_emails(&self) -> Vec<EmailMessage> {
        self.recorder.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.recorder.sent.lock().await.len()
    }

    pub fn attempts(&self) -> usize {
        self.recorder.attempts.load(Ordering::SeqCst)
    }

    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.recorder.sent.lock().await.iter().any(|m| m.to == email)
    }
}

impl Default for MockEmailClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailClient for MockEmailClient {
    async fn send(&self, message: &EmailMessage, cancel: &CancellationToken) -> NotificationResult<()> {
        self.recorder.record(message, cancel).await
    }

    fn name(&self) -> &'static str {
        "mock-email"
    }
}
