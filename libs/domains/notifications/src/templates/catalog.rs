//! Localized template sources.

use crate::models::NotificationKind;
use std::collections::HashMap;

/// Identifies one localized template source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub kind: NotificationKind,
    pub template: String,
    pub language: String,
}

impl TemplateKey {
    pub fn new(kind: NotificationKind, template: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
            language: language.into().to_ascii_lowercase(),
        }
    }

    /// Name the compiled template is registered under.
    pub fn registry_name(&self) -> String {
        format!("{}.{}.{}", self.kind, self.template, self.language.to_ascii_uppercase())
    }
}

/// Template sources keyed by kind, template id and language.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    default_language: String,
    sources: HashMap<TemplateKey, String>,
}

impl TemplateCatalog {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into().to_ascii_lowercase(),
            sources: HashMap::new(),
        }
    }

    /// Add or replace a template source.
    pub fn with_template(
        mut self,
        kind: NotificationKind,
        template: &str,
        language: &str,
        source: impl Into<String>,
    ) -> Self {
        self.sources
            .insert(TemplateKey::new(kind, template, language), source.into());
        self
    }

    /// Resolve a source for `language`, falling back to the default language.
    pub fn resolve(
        &self,
        kind: NotificationKind,
        template: &str,
        language: &str,
    ) -> Option<(TemplateKey, &str)> {
        [language, self.default_language.as_str()]
            .into_iter()
            .map(|lang| TemplateKey::new(kind, template, lang))
            .find_map(|key| {
                let source = self.sources.get(&key)?;
                Some((key, source.as_str()))
            })
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The welcome templates in English and French.
    pub fn builtin() -> Self {
        Self::new("en")
            .with_template(NotificationKind::Sms, "welcome", "en", WELCOME_SMS_EN)
            .with_template(NotificationKind::Sms, "welcome", "fr", WELCOME_SMS_FR)
            .with_template(NotificationKind::Email, "welcome", "en", WELCOME_EMAIL_EN)
            .with_template(NotificationKind::Email, "welcome", "fr", WELCOME_EMAIL_FR)
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Built-in Templates
// ============================================================================

const WELCOME_SMS_EN: &str = "Welcome! {{message}}";

const WELCOME_SMS_FR: &str = "Bienvenue! {{message}}";

const WELCOME_EMAIL_EN: &str = r#"<!DOCTYPE html>
<html lang="en">
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;">
  <h1 style="color: #18181b; font-size: 24px;">{{subject}}</h1>
  <p style="color: #52525b; font-size: 16px;">
    Welcome! Your account for {{to}} has been created successfully.
  </p>
</body>
</html>"#;

const WELCOME_EMAIL_FR: &str = r#"<!DOCTYPE html>
<html lang="fr">
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;">
  <h1 style="color: #18181b; font-size: 24px;">{{subject}}</h1>
  <p style="color: #52525b; font-size: 16px;">
    Bienvenue! Votre compte {{to}} a été créé avec succès.
  </p>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.resolve(NotificationKind::Sms, "welcome", "en").is_some());
        assert!(catalog.resolve(NotificationKind::Email, "welcome", "fr").is_some());
        assert!(catalog.resolve(NotificationKind::Sms, "password_reset", "en").is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_default_language() {
        let catalog = TemplateCatalog::builtin();

        let (key, source) = catalog.resolve(NotificationKind::Sms, "welcome", "fr").unwrap();
        assert_eq!(key.language, "fr");
        assert!(source.starts_with("Bienvenue"));

        let (key, source) = catalog.resolve(NotificationKind::Sms, "welcome", "de").unwrap();
        assert_eq!(key.language, "en");
        assert!(source.starts_with("Welcome"));

        assert!(catalog.resolve(NotificationKind::Sms, "missing", "en").is_none());
    }

    #[test]
    fn test_registry_name() {
        let key = TemplateKey::new(NotificationKind::Email, "welcome", "FR");
        assert_eq!(key.registry_name(), "email.welcome.FR");
    }
}
