//! Failure classification for retry and circuit-breaker decisions.

use crate::error::{ProviderError, ProviderErrorKind};

/// HTTP statuses that signal a transient provider condition.
pub const RETRYABLE_HTTP_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Twilio API codes for rate limiting and transient server errors.
pub const RETRYABLE_API_CODES: [i64; 3] = [20429, 20500, 20503];

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Temporary failure - retry with exponential backoff, counts toward the breaker
    Transient,
    /// Malformed request, auth failure, permanent 4xx - surface immediately
    Permanent,
}

impl FailureClass {
    pub fn of(err: &ProviderError) -> Self {
        let transient = match err.kind {
            ProviderErrorKind::Network | ProviderErrorKind::Timeout => true,
            ProviderErrorKind::Http { status } => RETRYABLE_HTTP_STATUSES.contains(&status),
            ProviderErrorKind::Api { code, status } => {
                RETRYABLE_API_CODES.contains(&code)
                    || status.is_some_and(|s| RETRYABLE_HTTP_STATUSES.contains(&s))
            }
        };

        if transient {
            FailureClass::Transient
        } else {
            FailureClass::Permanent
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureClass::Transient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failures_are_transient() {
        assert!(FailureClass::of(&ProviderError::network("Folio", "connection refused")).is_retryable());
        assert!(FailureClass::of(&ProviderError::timeout("Folio", "timed out")).is_retryable());
    }

    #[test]
    fn test_http_status_classification() {
        for status in RETRYABLE_HTTP_STATUSES {
            assert_eq!(
                FailureClass::of(&ProviderError::http("Folio", status, "")),
                FailureClass::Transient,
                "status {status}"
            );
        }

        for status in [400, 401, 403, 404, 422, 501] {
            assert_eq!(
                FailureClass::of(&ProviderError::http("Folio", status, "")),
                FailureClass::Permanent,
                "status {status}"
            );
        }
    }

    #[test]
    fn test_api_code_classification() {
        let rate_limited = ProviderError::api("Twilio", 20429, None, "Too Many Requests");
        assert!(FailureClass::of(&rate_limited).is_retryable());

        let unavailable_by_status = ProviderError::api("Twilio", 30001, Some(503), "Queue overflow");
        assert!(FailureClass::of(&unavailable_by_status).is_retryable());

        let bad_number = ProviderError::api("Twilio", 21211, Some(400), "Invalid 'To' Phone Number");
        assert_eq!(FailureClass::of(&bad_number), FailureClass::Permanent);

        let auth = ProviderError::api("Twilio", 20003, Some(401), "Authenticate");
        assert_eq!(FailureClass::of(&auth), FailureClass::Permanent);
    }
}
