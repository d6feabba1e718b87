//! Addressing value objects.
//!
//! Values are validated and normalized on construction, so holding one is
//! proof that the raw input was well formed.

use crate::error::{NotificationError, NotificationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static COUNTRY_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,3}$").expect("valid country code regex"));
static AREA_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2,3}$").expect("valid area code regex"));
static NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{7,9}$").expect("valid subscriber number regex"));
static LOCALE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("valid locale regex"));

/// A trimmed, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(address: impl AsRef<str>) -> NotificationResult<Self> {
        let address = address.as_ref();
        if address.trim().is_empty() {
            return Err(NotificationError::InvalidEmail("Email is required".to_string()));
        }

        let normalized = address.trim().to_lowercase();
        if !EMAIL_REGEX.is_match(&normalized) {
            return Err(NotificationError::InvalidEmail(format!(
                "Invalid email format: {}",
                address
            )));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EmailAddress {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A mobile phone number split into its dialing components.
///
/// Equality and hashing use the canonical `+<country><area><number>` form.
#[derive(Debug, Clone)]
pub struct PhoneNumber {
    country_code: String,
    area_code: String,
    number: String,
    full_number: String,
}

impl PhoneNumber {
    pub fn new(
        country_code: impl Into<String>,
        area_code: impl Into<String>,
        number: impl Into<String>,
    ) -> NotificationResult<Self> {
        let country_code = country_code.into();
        let area_code = area_code.into();
        let number = number.into();

        check_component("country code", &country_code, &COUNTRY_CODE_REGEX, "1-3 digits")?;
        check_component("area code", &area_code, &AREA_CODE_REGEX, "2-3 digits")?;
        check_component("number", &number, &NUMBER_REGEX, "7-9 digits")?;

        let full_number = format!("+{}{}{}", country_code, area_code, number);
        Ok(Self {
            country_code,
            area_code,
            number,
            full_number,
        })
    }

    /// Canonical E.164-style form.
    pub fn full_number(&self) -> &str {
        &self.full_number
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn area_code(&self) -> &str {
        &self.area_code
    }

    pub fn number(&self) -> &str {
        &self.number
    }
}

fn check_component(
    name: &str,
    value: &str,
    pattern: &Regex,
    expectation: &str,
) -> NotificationResult<()> {
    if value.trim().is_empty() {
        return Err(NotificationError::InvalidPhone(format!("{} is required", name)));
    }
    if !pattern.is_match(value) {
        return Err(NotificationError::InvalidPhone(format!(
            "{} must be {}",
            name, expectation
        )));
    }
    Ok(())
}

impl PartialEq for PhoneNumber {
    fn eq(&self, other: &Self) -> bool {
        self.full_number == other.full_number
    }
}

impl Eq for PhoneNumber {}

impl Hash for PhoneNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_number.hash(state);
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_number)
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full_number)
    }
}

/// A culture identifier such as `en` or `fr-CA`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl AsRef<str>) -> NotificationResult<Self> {
        let tag = tag.as_ref().trim();
        if !LOCALE_REGEX.is_match(tag) {
            return Err(NotificationError::InvalidLocale(tag.to_string()));
        }
        Ok(Self(tag.to_string()))
    }

    /// Lower-cased language subtag (`fr` for `fr-CA`).
    pub fn language(&self) -> String {
        self.0
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self("en-CA".to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
