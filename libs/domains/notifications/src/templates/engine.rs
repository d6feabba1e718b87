//! Handlebars-based renderer.

use super::{TemplateCatalog, TemplateKey, TemplateRenderer};
use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationKind};
use async_trait::async_trait;
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use tracing::debug;

/// Compiled templates keyed by [`TemplateKey`].
///
/// SMS templates are compiled without HTML escaping, email templates with it.
pub struct TemplateCache {
    text: RwLock<Handlebars<'static>>,
    html: RwLock<Handlebars<'static>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        let mut text = Handlebars::new();
        text.register_escape_fn(handlebars::no_escape);
        Self {
            text: RwLock::new(text),
            html: RwLock::new(Handlebars::new()),
        }
    }

    fn registry(&self, kind: NotificationKind) -> &RwLock<Handlebars<'static>> {
        match kind {
            NotificationKind::Sms => &self.text,
            NotificationKind::Email => &self.html,
        }
    }

    /// Render `key`, compiling `source` first if it is not cached yet.
    pub fn render<T: Serialize>(
        &self,
        key: &TemplateKey,
        source: &str,
        data: &T,
    ) -> NotificationResult<String> {
        let name = key.registry_name();
        let registry = self.registry(key.kind);

        {
            let handlebars = registry.read().unwrap_or_else(PoisonError::into_inner);
            if handlebars.has_template(&name) {
                return Ok(handlebars.render(&name, data)?);
            }
        }

        let mut handlebars = registry.write().unwrap_or_else(PoisonError::into_inner);
        if !handlebars.has_template(&name) {
            debug!(template = %name, "Compiling template");
            handlebars.register_template_string(&name, source)?;
        }
        Ok(handlebars.render(&name, data)?)
    }

    /// Number of compiled templates.
    pub fn len(&self) -> usize {
        [&self.text, &self.html]
            .iter()
            .map(|r| r.read().unwrap_or_else(PoisonError::into_inner).get_templates().len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every compiled template.
    pub fn clear(&self) {
        for registry in [&self.text, &self.html] {
            registry
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clear_templates();
        }
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders notifications from a localized [`TemplateCatalog`].
///
/// Rendering holds the catalog read lock while it resolves and compiles, and
/// `reload` clears the cache under the write lock, so a compiled template
/// always comes from the current catalog.
pub struct HandlebarsRenderer {
    catalog: RwLock<TemplateCatalog>,
    cache: TemplateCache,
}

impl HandlebarsRenderer {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            cache: TemplateCache::new(),
        }
    }

    /// Renderer over the built-in welcome templates.
    pub fn builtin() -> Self {
        Self::new(TemplateCatalog::builtin())
    }

    /// Swap in a new catalog and drop every compiled template.
    pub fn reload(&self, catalog: TemplateCatalog) {
        let mut current = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        *current = catalog;
        self.cache.clear();
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    fn catalog(&self) -> RwLockReadGuard<'_, TemplateCatalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TemplateRenderer for HandlebarsRenderer {
    fn can_render(&self, notification: &Notification) -> bool {
        self.catalog()
            .resolve(
                notification.kind(),
                notification.template(),
                &notification.locale().language(),
            )
            .is_some()
    }

    async fn render(&self, notification: &Notification) -> NotificationResult<String> {
        let catalog = self.catalog();
        let language = notification.locale().language();
        let (key, source) = catalog
            .resolve(notification.kind(), notification.template(), &language)
            .ok_or_else(|| NotificationError::NoRenderer {
                kind: notification.kind(),
                template: notification.template().to_string(),
            })?;

        debug!(
            notification_id = %notification.id(),
            template = %key.registry_name(),
            "Rendering notification"
        );

        match notification {
            Notification::Sms(sms) => self.cache.render(&key, source, sms),
            Notification::Email(email) => self.cache.render(&key, source, email),
        }
    }

    fn name(&self) -> &'static str {
        "HandlebarsRenderer"
    }
}
