//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use pagina_sdk::render::{RenderError, TemplateRenderer};
use serde_json::Value;
use tera::Tera;
use tracing::debug;

use crate::content::FilterPipeline;

/// Templates compiled into the binary, used when no theme directory is set.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("page.html", include_str!("../../templates/page.html")),
    (
        "content/callout.html",
        include_str!("../../templates/content/callout.html"),
    ),
];

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl ThemeEngine {
    /// Create a theme engine loading templates from the given directory.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        Ok(Self::with_tera(tera))
    }

    /// Create a theme engine with the built-in templates.
    pub fn builtin() -> Result<Self> {
        Self::from_templates(BUILTIN_TEMPLATES)
    }

    /// Create a theme engine from in-memory `(name, source)` pairs.
    pub fn from_templates(templates: &[(&str, &str)]) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.iter().copied())
            .context("failed to compile templates")?;
        Ok(Self::with_tera(tera))
    }

    fn with_tera(mut tera: Tera) -> Self {
        Self::register_filters(&mut tera);
        let count = tera.get_template_names().count();
        debug!(count, "loaded templates");
        Self {
            tera,
            suggestion_cache: DashMap::new(),
        }
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        tera.register_filter(
            "text_format",
            |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                let text = tera::try_get_value!("text_format", "value", String, value);
                let format = args
                    .get("format")
                    .and_then(|v| v.as_str())
                    .unwrap_or("plain_text");

                let pipeline = FilterPipeline::for_format(format);
                Ok(tera::Value::String(pipeline.process(&text)))
            },
        );

        // RFC 3339 strings, as stored by the date extensions
        tera.register_filter(
            "format_date",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let formatted = value
                    .as_str()
                    .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.format("%B %-d, %Y").to_string())
                    .unwrap_or_default();
                Ok(tera::Value::String(formatted))
            },
        );
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }
        let cache_key = suggestions.join("|");
        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let name = if suggestion.ends_with(".html") {
                (*suggestion).to_string()
            } else {
                format!("{suggestion}.html")
            };
            if self.tera.get_template(&name).is_ok() {
                self.suggestion_cache.insert(cache_key, name.clone());
                return Some(name);
            }
        }
        None
    }

    /// Layout suggestions for a page, most specific first.
    ///
    /// `page.html` for slug `about` yields `page--about`, then `page`.
    pub fn page_suggestions(layout: &str, slug: &str) -> Vec<String> {
        let stem = layout.strip_suffix(".html").unwrap_or(layout);
        vec![format!("{stem}--{slug}"), stem.to_string()]
    }

    /// Render a page layout with the given context.
    pub fn render_page(&self, layout: &str, slug: &str, context: &Value) -> Result<String, RenderError> {
        let suggestions = Self::page_suggestions(layout, slug);
        let refs: Vec<&str> = suggestions.iter().map(String::as_str).collect();
        let template = self
            .resolve_template(&refs)
            .unwrap_or_else(|| layout.to_string());
        self.render_template(&template, context)
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl TemplateRenderer for ThemeEngine {
    fn render_template(&self, path: &str, context: &Value) -> Result<String, RenderError> {
        let context = tera::Context::from_value(context.clone())
            .map_err(|e| RenderError::template(path, error_chain(&e)))?;
        self.tera
            .render(path, &context)
            .map_err(|e| RenderError::template(path, error_chain(&e)))
    }

    fn has_template(&self, path: &str) -> bool {
        self.tera.get_template(path).is_ok()
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .field("cache_size", &self.suggestion_cache.len())
            .finish()
    }
}

/// Wrap ThemeEngine in Arc for sharing across handlers.
pub type SharedThemeEngine = Arc<ThemeEngine>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_suggestions() {
        assert_eq!(
            ThemeEngine::page_suggestions("page.html", "about"),
            vec!["page--about", "page"]
        );
    }

    #[test]
    fn specific_layout_wins() {
        let engine = ThemeEngine::from_templates(&[
            ("page.html", "generic"),
            ("page--about.html", "about {{ title }}"),
        ])
        .unwrap();
        let about = engine
            .render_page("page.html", "about", &json!({"title": "Us"}))
            .unwrap();
        assert_eq!(about, "about Us");
        let other = engine.render_page("page.html", "home", &json!({})).unwrap();
        assert_eq!(other, "generic");
    }

    #[test]
    fn missing_template_is_render_error() {
        let engine = ThemeEngine::from_templates(&[]).unwrap();
        let err = engine.render_template("nope.html", &json!({})).unwrap_err();
        assert!(err.to_string().contains("nope.html"));
        assert!(!engine.has_template("nope.html"));
    }

    #[test]
    fn test_format_date_filter() {
        let engine =
            ThemeEngine::from_templates(&[("d.html", "{{ ts | format_date }}")]).unwrap();
        let out = engine
            .render_template("d.html", &json!({"ts": "2025-02-15T00:00:00Z"}))
            .unwrap();
        assert_eq!(out, "February 15, 2025");
        let out = engine
            .render_template("d.html", &json!({"ts": "not a date"}))
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn builtin_callout_renders_payload() {
        let engine = ThemeEngine::builtin().unwrap();
        let out = engine
            .render_template(
                "content/callout.html",
                &json!({"region": "main", "content": {"heading": "Note", "body": "<b>x</b>"}}),
            )
            .unwrap();
        assert!(out.contains("callout-main"));
        assert!(out.contains("<h3>Note</h3>"));
    }
}
