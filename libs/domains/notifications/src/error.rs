//! Error types for the notifications domain.
//!
//! Errors fall into the following families:
//! - **Routing**: no channel or renderer is registered for a notification
//! - **Validation**: one or more business rules were violated
//! - **Provider**: the external provider call failed (transient or permanent)
//! - **Cancellation**: the caller cancelled the operation

use crate::models::NotificationKind;
use std::fmt;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// A single violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Aggregate of every rule a notification violated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns `true` if any violation concerns the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// `Ok(())` when no rule was violated.
    pub fn into_result(self) -> NotificationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

/// What went wrong while talking to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Connection refused, reset, DNS failure, body read failure.
    Network,
    /// The request did not complete in time.
    Timeout,
    /// The provider answered with a non-success HTTP status.
    Http { status: u16 },
    /// The provider answered with a structured API error.
    Api { code: i64, status: Option<u16> },
}

/// Error returned by a provider client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{provider} error ({kind}): {message}")]
pub struct ProviderError {
    pub provider: &'static str,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: &'static str, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn network(provider: &'static str, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Network, message)
    }

    pub fn timeout(provider: &'static str, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Timeout, message)
    }

    pub fn http(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Http { status }, message)
    }

    pub fn api(
        provider: &'static str,
        code: i64,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(provider, ProviderErrorKind::Api { code, status }, message)
    }

    /// Map a transport error from reqwest onto a provider error.
    pub fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(provider, err.to_string())
        } else if let Some(status) = err.status() {
            Self::http(provider, status.as_u16(), err.to_string())
        } else {
            Self::network(provider, err.to_string())
        }
    }

    /// HTTP status attached to the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ProviderErrorKind::Http { status } => Some(status),
            ProviderErrorKind::Api { status, .. } => status,
            _ => None,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Network => write!(f, "network"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::Http { status } => write!(f, "HTTP {}", status),
            ProviderErrorKind::Api { code, status: Some(status) } => {
                write!(f, "API code {}, HTTP {}", code, status)
            }
            ProviderErrorKind::Api { code, status: None } => write!(f, "API code {}", code),
        }
    }
}

/// Errors that can occur in the notifications domain.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No registered channel accepts this kind of notification.
    #[error("No channel registered for notification type: {0}")]
    NoChannel(NotificationKind),

    /// No registered renderer accepts this notification.
    #[error("No renderer registered for {kind} notification with template '{template}'")]
    NoRenderer {
        kind: NotificationKind,
        template: String,
    },

    /// Business rule validation failed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A channel was asked to send a notification it cannot handle.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The provider call failed (after retries, if it was retryable).
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    /// The provider's circuit breaker is open.
    #[error("Circuit breaker open for provider {provider}")]
    CircuitOpen { provider: &'static str },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    Template(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Invalid phone number component.
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    /// Invalid culture identifier.
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotificationError {
    /// Returns `true` for a cancelled operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NotificationError::Cancelled)
    }

    /// Returns `true` if the failure came from the provider call itself.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            NotificationError::Provider(_) | NotificationError::CircuitOpen { .. }
        )
    }

    /// Returns `true` if the provider failure is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            NotificationError::Provider(err) => crate::resilience::FailureClass::of(err).is_retryable(),
            _ => false,
        }
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(err: handlebars::TemplateError) -> Self {
        NotificationError::Template(err.to_string())
    }
}
