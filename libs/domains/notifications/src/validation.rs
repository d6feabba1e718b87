//! Business-rule validation run before any rendering or provider I/O.

use crate::error::{NotificationError, NotificationResult, ValidationErrors};
use crate::models::Notification;
use crate::values::PhoneNumber;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use validator::{Validate, ValidationError};

static E164_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9][0-9]{1,14}$").expect("valid E.164 regex"));

/// Validates a notification, failing with an aggregate of every violated rule.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationValidator: Send + Sync {
    async fn validate(
        &self,
        notification: &Notification,
        cancel: &CancellationToken,
    ) -> NotificationResult<()>;
}

/// Default validator backed by the `Validate` rules on each variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl RuleValidator {
    pub fn new() -> Self {
        Self
    }

    fn check(notification: &Notification) -> ValidationErrors {
        let result = match notification {
            Notification::Sms(sms) => sms.validate(),
            Notification::Email(email) => email.validate(),
        };

        let mut errors = ValidationErrors::new();
        if let Err(report) = result {
            let mut fields: Vec<_> = report.field_errors().into_iter().collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            for (field, failures) in fields {
                for failure in failures {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    errors.push(field.to_string(), message);
                }
            }
        }
        errors
    }
}

#[async_trait]
impl NotificationValidator for RuleValidator {
    async fn validate(
        &self,
        notification: &Notification,
        cancel: &CancellationToken,
    ) -> NotificationResult<()> {
        if cancel.is_cancelled() {
            return Err(NotificationError::Cancelled);
        }
        Self::check(notification).into_result()
    }
}

/// Whether `number` is an E.164 phone number, with or without the leading `+`.
pub fn is_e164(number: &str) -> bool {
    E164_REGEX.is_match(number)
}

pub(crate) fn validate_e164(phone: &PhoneNumber) -> Result<(), ValidationError> {
    if is_e164(phone.full_number()) {
        Ok(())
    } else {
        Err(ValidationError::new("e164")
            .with_message("'Mobile Phone' must be a valid phone number in E.164 format.".into()))
    }
}
