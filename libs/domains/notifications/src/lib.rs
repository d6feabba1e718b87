//! Notifications Domain
//!
//! This module dispatches outbound SMS and email notifications through
//! pluggable provider channels.
//!
//! # Features
//!
//! - Validated addressing values (phone numbers, email addresses, locales)
//! - Business-rule validation before any rendering or network I/O
//! - Localized Handlebars templates with an explicit compiled-template cache
//! - Folio and Twilio SMS, SendGrid email
//! - Retry with exponential backoff and a circuit breaker per provider
//! - Fire-and-forget in-memory queue drained by a single background worker
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   API Handler   │  ← send_async (await) or send (queue)
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐      ┌──────────────────┐
//! │ NotificationSvc │ ───► │ In-memory queue  │
//! └────────┬────────┘      └────────┬─────────┘
//!          │                        │
//!          │               ┌────────▼─────────┐
//!          │               │ Notification     │
//!          │               │ Worker           │
//!          │               └────────┬─────────┘
//! ┌────────▼────────────────────────▼─────────┐
//! │ Dispatcher: channel → validate → render   │
//! └────────┬──────────────────────────────────┘
//!          │
//! ┌────────▼────────┐
//! │ Resilience      │  ← retry + circuit breaker
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Provider Client │  ← Folio, Twilio, SendGrid
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{
//!     NotificationDispatcher, NotificationService, SmsChannel,
//!     providers::FolioSmsClient,
//!     resilience::{ResilienceConfig, ResilientSmsClient},
//!     templates::HandlebarsRenderer,
//! };
//!
//! let sms = ResilientSmsClient::new(FolioSmsClient::from_env()?, ResilienceConfig::default());
//! let dispatcher = NotificationDispatcher::builder()
//!     .with_channel(SmsChannel::new(sms))
//!     .with_renderer(HandlebarsRenderer::builtin())
//!     .build();
//!
//! let (service, worker) = NotificationService::new(Arc::new(dispatcher));
//! worker.spawn(shutdown.clone());
//!
//! service.send(notification);
//! ```

pub mod channels;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod queue;
pub mod resilience;
pub mod sender;
pub mod service;
pub mod snapshot;
pub mod templates;
pub mod validation;
pub mod values;

// Re-export commonly used types
pub use channels::{ChannelNotification, EmailChannel, SmsChannel, select_channel};
pub use config::{Environment, FromEnv, SmsProviderKind};
pub use error::{NotificationError, NotificationResult, ProviderError, ValidationErrors};
pub use models::{EmailNotification, Notification, NotificationKind, SmsNotification};
pub use providers::{EmailClient, SmsClient};
pub use queue::{NotificationQueue, NotificationWorker};
pub use sender::{Dispatch, DispatcherBuilder, NotificationDispatcher};
pub use service::NotificationService;
pub use templates::{TemplateRenderer, select_renderer};
pub use validation::{NotificationValidator, RuleValidator};
pub use values::{EmailAddress, Locale, PhoneNumber};
