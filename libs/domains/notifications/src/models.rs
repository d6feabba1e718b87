//! Data models for the notifications domain.

use crate::values::{EmailAddress, Locale, PhoneNumber};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Notification Kinds
// ============================================================================

/// Kinds of notifications that can be dispatched.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Text message sent to a mobile phone.
    Sms,
    /// Email sent to a mailbox.
    Email,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Sms => write!(f, "sms"),
            NotificationKind::Email => write!(f, "email"),
        }
    }
}

// ============================================================================
// Notification Variants
// ============================================================================

/// An SMS notification.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SmsNotification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Culture used to pick the localized template.
    pub locale: Locale,
    /// Template identifier used to select a renderer.
    pub template: String,
    /// Recipient phone number.
    #[validate(custom(function = "crate::validation::validate_e164"))]
    pub phone: PhoneNumber,
    /// Free-form message inserted into the template.
    #[validate(length(min = 1, message = "'Message' must not be empty."))]
    pub message: String,
}

impl SmsNotification {
    /// Create an SMS notification with an empty message.
    pub fn new(template: impl Into<String>, locale: Locale, phone: PhoneNumber) -> Self {
        Self {
            id: Uuid::new_v4(),
            locale,
            template: template.into(),
            phone,
            message: String::new(),
        }
    }

    /// Set the message body.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// An email notification.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct EmailNotification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Culture used to pick the localized template.
    pub locale: Locale,
    /// Template identifier used to select a renderer.
    pub template: String,
    /// Recipient address.
    pub to: EmailAddress,
    /// Subject line.
    #[validate(length(
        min = 1,
        max = 200,
        message = "'Subject' is required and must not exceed 200 characters."
    ))]
    pub subject: String,
}

impl EmailNotification {
    pub fn new(
        template: impl Into<String>,
        locale: Locale,
        to: EmailAddress,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            locale,
            template: template.into(),
            to,
            subject: subject.into(),
        }
    }
}

/// A notification of any supported kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Sms(SmsNotification),
    Email(EmailNotification),
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Sms(_) => NotificationKind::Sms,
            Notification::Email(_) => NotificationKind::Email,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Notification::Sms(sms) => sms.id,
            Notification::Email(email) => email.id,
        }
    }

    pub fn locale(&self) -> &Locale {
        match self {
            Notification::Sms(sms) => &sms.locale,
            Notification::Email(email) => &email.locale,
        }
    }

    pub fn template(&self) -> &str {
        match self {
            Notification::Sms(sms) => &sms.template,
            Notification::Email(email) => &email.template,
        }
    }

    /// Recipient in its canonical string form.
    pub fn recipient(&self) -> &str {
        match self {
            Notification::Sms(sms) => sms.phone.full_number(),
            Notification::Email(email) => email.to.as_str(),
        }
    }
}

impl From<SmsNotification> for Notification {
    fn from(sms: SmsNotification) -> Self {
        Notification::Sms(sms)
    }
}

impl From<EmailNotification> for Notification {
    fn from(email: EmailNotification) -> Self {
        Notification::Email(email)
    }
}
