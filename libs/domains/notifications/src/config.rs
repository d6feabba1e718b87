//! Environment-driven configuration.

use crate::error::{NotificationError, NotificationResult};
use std::env;
use std::str::FromStr;

/// Application environment (dev = local/kind, prod = full k8s)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env_or_default("APP_ENV", "development");

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Which SMS provider the host wires in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmsProviderKind {
    #[default]
    Folio,
    Twilio,
}

impl FromStr for SmsProviderKind {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "folio" => Ok(SmsProviderKind::Folio),
            "twilio" => Ok(SmsProviderKind::Twilio),
            other => Err(NotificationError::Config(format!(
                "Unknown SMS provider '{}', expected 'folio' or 'twilio'",
                other
            ))),
        }
    }
}

impl FromEnv for SmsProviderKind {
    fn from_env() -> NotificationResult<Self> {
        env_or_default("SMS_PROVIDER", "folio").parse()
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> NotificationResult<Self>;
}

/// Helper to load an environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load an environment variable or return error
pub fn env_required(key: &str) -> NotificationResult<String> {
    env::var(key).map_err(|_| {
        NotificationError::Config(format!(
            "Environment variable '{}' is required but not set",
            key
        ))
    })
}

/// Helper to parse an environment variable, falling back to `default` when unset
pub fn env_parse<T>(key: &str, default: T) -> NotificationResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            NotificationError::Config(format!(
                "Failed to parse environment variable '{}': {}",
                key, e
            ))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert!(Environment::from_env().is_production());
        });
    }

    #[test]
    fn test_env_or_default_without_value() {
        temp_env::with_var_unset("MISSING_VAR", || {
            assert_eq!(env_or_default("MISSING_VAR", "default_value"), "default_value");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let err = env_required("MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_parse() {
        temp_env::with_var("RETRIES", Some(" 7 "), || {
            assert_eq!(env_parse::<u32>("RETRIES", 3).unwrap(), 7);
        });
        temp_env::with_var_unset("RETRIES", || {
            assert_eq!(env_parse::<u32>("RETRIES", 3).unwrap(), 3);
        });
        temp_env::with_var("RETRIES", Some("many"), || {
            let err = env_parse::<u32>("RETRIES", 3).unwrap_err();
            assert!(err.to_string().contains("RETRIES"));
        });
    }

    #[test]
    fn test_sms_provider_kind() {
        temp_env::with_var_unset("SMS_PROVIDER", || {
            assert_eq!(SmsProviderKind::from_env().unwrap(), SmsProviderKind::Folio);
        });
        temp_env::with_var("SMS_PROVIDER", Some("Twilio"), || {
            assert_eq!(SmsProviderKind::from_env().unwrap(), SmsProviderKind::Twilio);
        });
        assert!("carrier-pigeon".parse::<SmsProviderKind>().is_err());
    }
}
