//! HTTP surface of the notifier.

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use domain_notifications::{
    EmailAddress, EmailNotification, Locale, Notification, NotificationError,
    NotificationService, PhoneNumber, SmsNotification,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Template used for notifications created over HTTP.
const WELCOME_TEMPLATE: &str = "welcome";

#[derive(Clone)]
pub struct AppState {
    pub service: NotificationService,
    /// Shutdown token; requests get a child of it.
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/notifications/sms", post(send_sms))
        .route("/notifications/email", post(send_email))
        .route("/folio/webhook/incoming_sms", post(incoming_sms))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SmsRequest {
    pub country_code: String,
    pub area_code: String,
    pub number: String,
    pub message: String,
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Await delivery and report the outcome.
    #[default]
    Sync,
    /// Queue and return immediately.
    Queue,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryQuery {
    #[serde(default)]
    pub mode: DeliveryMode,
}

/// Problem-style JSON error response.
pub struct ApiError(NotificationError);

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title) = match &self.0 {
            NotificationError::Validation(_)
            | NotificationError::InvalidEmail(_)
            | NotificationError::InvalidPhone(_)
            | NotificationError::InvalidLocale(_) => (StatusCode::BAD_REQUEST, "Invalid notification"),
            NotificationError::Provider(_) => (StatusCode::BAD_GATEWAY, "Provider call failed"),
            NotificationError::CircuitOpen { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "Provider temporarily unavailable")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Notification failed"),
        };

        let mut body = json!({
            "title": title,
            "status": status.as_u16(),
            "detail": self.0.to_string(),
        });
        if let NotificationError::Validation(errors) = &self.0 {
            body["errors"] = errors
                .violations()
                .iter()
                .map(|v| json!({ "field": v.field, "message": v.message }))
                .collect();
        }

        (status, Json(body)).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn locale(raw: Option<&str>) -> Result<Locale, NotificationError> {
    raw.map(Locale::new).transpose().map(Option::unwrap_or_default)
}

async fn deliver(
    state: &AppState,
    notification: Notification,
    mode: DeliveryMode,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = notification.id();
    match mode {
        DeliveryMode::Queue => {
            state.service.send(notification);
            Ok((StatusCode::ACCEPTED, Json(json!({ "id": id, "status": "queued" }))))
        }
        DeliveryMode::Sync => {
            let cancel = state.shutdown.child_token();
            state.service.send_async(&notification, &cancel).await?;
            Ok((StatusCode::OK, Json(json!({ "id": id, "status": "sent" }))))
        }
    }
}

async fn send_sms(
    State(state): State<AppState>,
    Query(query): Query<DeliveryQuery>,
    Json(request): Json<SmsRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let phone = PhoneNumber::new(request.country_code, request.area_code, request.number)?;
    let notification = SmsNotification::new(WELCOME_TEMPLATE, locale(request.locale.as_deref())?, phone)
        .with_message(request.message);

    deliver(&state, notification.into(), query.mode).await
}

async fn send_email(
    State(state): State<AppState>,
    Query(query): Query<DeliveryQuery>,
    Json(request): Json<EmailRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let to = EmailAddress::new(&request.to)?;
    let notification = EmailNotification::new(
        WELCOME_TEMPLATE,
        locale(request.locale.as_deref())?,
        to,
        request.subject,
    );

    deliver(&state, notification.into(), query.mode).await
}

async fn incoming_sms(Json(payload): Json<Value>) -> StatusCode {
    info!(payload = %payload, "Received incoming SMS from Folio");
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use domain_notifications::error::ProviderError;
    use domain_notifications::providers::{MockEmailClient, MockSmsClient};
    use domain_notifications::templates::HandlebarsRenderer;
    use domain_notifications::{EmailChannel, NotificationDispatcher, NotificationWorker, SmsChannel};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app_with_worker(sms: MockSmsClient, email: MockEmailClient) -> (Router, NotificationWorker) {
        let dispatcher = NotificationDispatcher::builder()
            .with_channel(SmsChannel::new(sms))
            .with_channel(EmailChannel::new(email))
            .with_renderer(HandlebarsRenderer::builtin())
            .build();
        let (service, worker) = NotificationService::new(Arc::new(dispatcher));
        let app = router(AppState {
            service,
            shutdown: CancellationToken::new(),
        });
        (app, worker)
    }

    /// Router whose queue worker is dropped; queued notifications are discarded.
    fn app(sms: MockSmsClient, email: MockEmailClient) -> Router {
        app_with_worker(sms, email).0
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn sms_body(message: &str) -> Value {
        json!({
            "country_code": "1",
            "area_code": "581",
            "number": "5551234",
            "message": message,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(MockSmsClient::new(), MockEmailClient::new());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_send_sms_returns_200() {
        let sms = MockSmsClient::new();
        let app = app(sms.clone(), MockEmailClient::new());

        let response = app
            .oneshot(post_json("/notifications/sms", sms_body("Hello")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "sent");
        assert!(sms.was_sent_to("+15815551234").await);
    }

    #[tokio::test]
    async fn test_queue_mode_returns_202() {
        let sms = MockSmsClient::new();
        let (app, worker) = app_with_worker(sms.clone(), MockEmailClient::new());
        let shutdown = CancellationToken::new();
        let handle = worker.spawn(shutdown.clone());

        let response = app
            .oneshot(post_json("/notifications/sms?mode=queue", sms_body("Hello")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await["status"], "queued");

        tokio::time::timeout(Duration::from_secs(5), async {
            while sms.sent_count().await == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("queued notification should be delivered");
        assert!(sms.was_sent_to("+15815551234").await);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_queue_mode_without_worker_drops_notification() {
        let sms = MockSmsClient::new();
        let app = app(sms.clone(), MockEmailClient::new());

        let response = app
            .oneshot(post_json("/notifications/sms?mode=queue", sms_body("Hello")))
            .await
            .unwrap();

        // Still accepted; the closed queue only logs a warning
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(sms.attempts(), 0);
    }

    #[tokio::test]
    async fn test_invalid_phone_returns_400() {
        let app = app(MockSmsClient::new(), MockEmailClient::new());
        let mut body = sms_body("Hello");
        body["number"] = json!("12ab");

        let response = app
            .oneshot(post_json("/notifications/sms", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validation_errors_are_listed() {
        let app = app(MockSmsClient::new(), MockEmailClient::new());

        let response = app
            .oneshot(post_json("/notifications/sms", sms_body("")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["field"], "message");
    }

    #[tokio::test]
    async fn test_provider_failure_returns_502() {
        let email = MockEmailClient::failing(ProviderError::http("mock", 500, "boom"));
        let app = app(MockSmsClient::new(), email);

        let response = app
            .oneshot(post_json(
                "/notifications/email",
                json!({ "to": "user@example.com", "subject": "Hi", "locale": "fr-CA" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_circuit_open_returns_503() {
        let response = ApiError(NotificationError::CircuitOpen { provider: "Folio" }).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_incoming_sms_webhook() {
        let app = app(MockSmsClient::new(), MockEmailClient::new());

        let response = app
            .oneshot(post_json(
                "/folio/webhook/incoming_sms",
                json!({ "from": "+15815551234", "message": "STOP" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
