//! Notifier Service
//!
//! HTTP front for the notification dispatcher, plus the background worker
//! that drains its fire-and-forget queue.
//!
//! ## Architecture
//!
//! ```text
//! POST /notifications/{sms,email}
//!   ↓ (?mode=queue)            ↓ (default)
//! NotificationQueue        NotificationDispatcher
//!   ↓                          ↓
//! NotificationWorker ──────► channel → validate → render
//!                              ↓
//!                          retry + circuit breaker
//!                              ↓
//!                          Folio / Twilio / SendGrid
//! ```

pub mod routes;
pub mod telemetry;

use domain_notifications::config::env_parse;
use domain_notifications::providers::{FolioSmsClient, SendGridEmailClient, TwilioSmsClient};
use domain_notifications::resilience::{ResilienceConfig, ResilientEmailClient, ResilientSmsClient};
use domain_notifications::templates::{HandlebarsRenderer, PassthroughRenderer};
use domain_notifications::{
    EmailChannel, Environment, FromEnv, NotificationDispatcher, NotificationService, SmsChannel,
    SmsClient, SmsProviderKind,
};
use eyre::{Result, WrapErr};
use routes::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

fn sms_client(kind: SmsProviderKind) -> Result<Arc<dyn SmsClient>> {
    let client: Arc<dyn SmsClient> = match kind {
        SmsProviderKind::Folio => {
            Arc::new(FolioSmsClient::from_env().wrap_err("Failed to configure Folio")?)
        }
        SmsProviderKind::Twilio => {
            Arc::new(TwilioSmsClient::from_env().wrap_err("Failed to configure Twilio")?)
        }
    };
    Ok(client)
}

/// Assemble the dispatcher from the environment.
///
/// The SMS provider is chosen by `SMS_PROVIDER`. The email channel is only
/// registered when `SENDGRID_API_KEY` is set.
fn build_dispatcher(resilience: &ResilienceConfig) -> Result<NotificationDispatcher> {
    let kind = SmsProviderKind::from_env().wrap_err("Invalid SMS_PROVIDER")?;
    let sms = ResilientSmsClient::new(sms_client(kind)?, *resilience);
    info!(provider = ?kind, "SMS channel configured");

    let mut builder = NotificationDispatcher::builder().with_channel(SmsChannel::new(sms));

    if std::env::var("SENDGRID_API_KEY").is_ok() {
        let email = SendGridEmailClient::from_env().wrap_err("Failed to configure SendGrid")?;
        builder = builder.with_channel(EmailChannel::new(ResilientEmailClient::new(
            email,
            *resilience,
        )));
        info!("Email channel configured");
    } else {
        warn!("SENDGRID_API_KEY not set, email notifications are disabled");
    }

    Ok(builder
        .with_renderer(PassthroughRenderer)
        .with_renderer(HandlebarsRenderer::builtin())
        .build())
}

/// Run the notifier
///
/// 1. Sets up structured logging (JSON for prod, pretty for dev)
/// 2. Builds the dispatcher and starts the queue worker
/// 3. Serves HTTP until SIGINT/SIGTERM, then drains the worker
pub async fn run() -> Result<()> {
    telemetry::install_color_eyre();
    let environment = Environment::from_env();
    telemetry::init_tracing(&environment);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting notifier service");

    let resilience = ResilienceConfig::from_env().wrap_err("Invalid resilience configuration")?;
    let dispatcher = build_dispatcher(&resilience)?;

    let shutdown = CancellationToken::new();
    let (service, worker) = NotificationService::new(Arc::new(dispatcher));
    let worker_handle = worker.spawn(shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error waiting for shutdown signal: {}", e);
        }
        signal_token.cancel();
    });

    let port: u16 = env_parse("NOTIFIER_PORT", 8080).wrap_err("Invalid NOTIFIER_PORT")?;
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind notifier to {}", addr))?;
    info!(port = %port, "Notifier listening");

    let app = routes::router(AppState {
        service,
        shutdown: shutdown.clone(),
    });
    let server_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await
        .wrap_err("Notifier server failed")?;

    // Server may exit without a signal; make sure the worker stops too
    shutdown.cancel();
    worker_handle.await.wrap_err("Queue worker panicked")?;

    info!("Notifier service stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .wrap_err("Failed to install SIGTERM handler")?;

    #[cfg(unix)]
    let terminate = terminate.recv();

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Option<()>>();

    tokio::select! {
        result = signal::ctrl_c() => {
            result.wrap_err("Failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_dispatcher_with_folio_only() {
        temp_env::with_vars(
            [
                ("SMS_PROVIDER", Some("folio")),
                ("FOLIO_BASE_URL", Some("https://sms.example.com")),
                ("FOLIO_API_KEY", Some("key")),
                ("SENDGRID_API_KEY", None),
            ],
            || {
                let dispatcher = build_dispatcher(&ResilienceConfig::default()).unwrap();
                assert_eq!(dispatcher.channels().len(), 1);
                assert_eq!(dispatcher.renderers().len(), 2);
            },
        );
    }

    #[test]
    fn test_build_dispatcher_with_twilio_and_sendgrid() {
        temp_env::with_vars(
            [
                ("SMS_PROVIDER", Some("twilio")),
                ("TWILIO_ACCOUNT_SID", Some("AC123")),
                ("TWILIO_AUTH_TOKEN", Some("secret")),
                ("TWILIO_NUMBER_FROM", Some("+15815550000")),
                ("SENDGRID_API_KEY", Some("SG.key")),
                ("SENDGRID_FROM_EMAIL", Some("noreply@example.com")),
            ],
            || {
                let dispatcher = build_dispatcher(&ResilienceConfig::default()).unwrap();
                assert_eq!(dispatcher.channels().len(), 2);
            },
        );
    }

    #[test]
    fn test_build_dispatcher_missing_folio_key() {
        temp_env::with_vars(
            [
                ("SMS_PROVIDER", None::<&str>),
                ("FOLIO_BASE_URL", Some("https://sms.example.com")),
                ("FOLIO_API_KEY", None),
            ],
            || {
                assert!(build_dispatcher(&ResilienceConfig::default()).is_err());
            },
        );
    }
}
