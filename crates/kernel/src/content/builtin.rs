//! Built-in content types.
//!
//! Each type renders one content item into semantic HTML:
//! - richtext, markdown, rawhtml: text in a stored format
//! - image, gallery: media with captions (gallery supports excerpts)
//! - code: syntax-highlighted with `syntect`
//! - section: heading plus rich text
//! - template: an arbitrary theme template rendered with the item payload

use std::sync::{Arc, LazyLock};

use pagina_sdk::render::{ContentType, RenderContext, RenderError, html_escape, is_safe_url};
use pagina_sdk::types::{ContentItem, FieldKind, FieldSpec, validate_fields};
use serde_json::{Value, json};

use super::filter::FilterPipeline;

/// All built-in content types, in the order editors see them.
pub fn builtin_content_types() -> Vec<Arc<dyn ContentType>> {
    vec![
        Arc::new(RichTextContent),
        Arc::new(MarkdownContent),
        Arc::new(RawHtmlContent),
        Arc::new(ImageContent),
        Arc::new(GalleryContent),
        Arc::new(CodeContent),
        Arc::new(SectionContent),
        Arc::new(TemplateContent),
    ]
}

fn required_str<'a>(item: &'a ContentItem, key: &str) -> Result<&'a str, RenderError> {
    item.payload_str(key)
        .ok_or_else(|| RenderError::payload(&item.content_type, format!("missing '{key}'")))
}

/// Text formats an editor may store in a rich text item. All of them sanitize;
/// unfiltered HTML belongs in [`RawHtmlContent`].
const RICHTEXT_FORMATS: &[&str] = &["filtered_html", "plain_text", "markdown"];

/// Sanitized rich text. Payload: `{ "text": "...", "format": "filtered_html" }`
///
/// Items stored with any other format render as `filtered_html`.
pub struct RichTextContent;

impl ContentType for RichTextContent {
    fn type_name(&self) -> &str {
        "richtext"
    }

    fn label(&self) -> &str {
        "Rich text"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("text", FieldKind::TextLong).required().label("Text"),
            FieldSpec::new("format", FieldKind::Text).label("Text format"),
        ]
    }

    fn validate(&self, payload: &Value) -> Result<(), String> {
        validate_fields(&self.fields(), payload)?;
        match payload.get("format").and_then(Value::as_str) {
            Some(format) if !RICHTEXT_FORMATS.contains(&format) => Err(format!(
                "format '{format}' is not one of {}",
                RICHTEXT_FORMATS.join(", ")
            )),
            _ => Ok(()),
        }
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let text = required_str(item, "text")?;
        let format = item
            .payload_str("format")
            .filter(|f| RICHTEXT_FORMATS.contains(f))
            .unwrap_or("filtered_html");
        Ok(FilterPipeline::for_format(format).process(text))
    }
}

/// Markdown text. Payload: `{ "text": "..." }`
pub struct MarkdownContent;

impl ContentType for MarkdownContent {
    fn type_name(&self) -> &str {
        "markdown"
    }

    fn label(&self) -> &str {
        "Markdown"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::new("text", FieldKind::TextLong).required().label("Text")]
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        Ok(FilterPipeline::markdown().process(required_str(item, "text")?))
    }
}

/// Unfiltered HTML for trusted editors. Payload: `{ "html": "..." }`
pub struct RawHtmlContent;

impl ContentType for RawHtmlContent {
    fn type_name(&self) -> &str {
        "rawhtml"
    }

    fn label(&self) -> &str {
        "Raw HTML"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::new("html", FieldKind::TextLong).required().label("HTML")]
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        Ok(required_str(item, "html")?.to_string())
    }
}

const IMAGE_POSITIONS: &[&str] = &["default", "left", "right", "block"];

/// An image with caption and position.
/// Payload: `{ "url": "...", "caption": "...", "alt": "...", "position": "left" }`
pub struct ImageContent;

impl ContentType for ImageContent {
    fn type_name(&self) -> &str {
        "image"
    }

    fn label(&self) -> &str {
        "Image"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("url", FieldKind::Text).required().label("Image URL"),
            FieldSpec::new("caption", FieldKind::Text).label("Caption"),
            FieldSpec::new("alt", FieldKind::Text).label("Alternative text"),
            FieldSpec::new("position", FieldKind::Text).label("Position"),
        ]
    }

    fn validate(&self, payload: &Value) -> Result<(), String> {
        validate_fields(&self.fields(), payload)?;
        if let Some(url) = payload.get("url").and_then(|v| v.as_str())
            && !is_safe_url(url)
        {
            return Err(format!("unsafe image url '{url}'"));
        }
        match payload.get("position").and_then(|v| v.as_str()) {
            Some(position) if !IMAGE_POSITIONS.contains(&position) => Err(format!(
                "position must be one of {}",
                IMAGE_POSITIONS.join(", ")
            )),
            _ => Ok(()),
        }
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let url = required_str(item, "url")?;
        if !is_safe_url(url) {
            return Err(RenderError::payload("image", format!("unsafe url '{url}'")));
        }
        let caption = item.payload_str("caption").unwrap_or("");
        let alt = item.payload_str("alt").unwrap_or(caption);
        let position = item.payload_str("position").unwrap_or("default");
        Ok(render_figure(
            &format!("image image-{}", html_escape(position)),
            url,
            alt,
            caption,
        ))
    }
}

fn render_figure(class: &str, url: &str, alt: &str, caption: &str) -> String {
    let mut html = format!(
        "<figure class=\"{class}\"><img src=\"{}\" alt=\"{}\">",
        html_escape(url),
        html_escape(alt)
    );
    if !caption.is_empty() {
        html.push_str(&format!("<figcaption>{}</figcaption>", html_escape(caption)));
    }
    html.push_str("</figure>");
    html
}

/// A gallery, optionally rendered as an excerpt of its first images.
/// Payload: `{ "images": [{ "url": "...", "caption": "..." }], "excerpt": 3, "link": "/gallery/" }`
pub struct GalleryContent;

impl ContentType for GalleryContent {
    fn type_name(&self) -> &str {
        "gallery"
    }

    fn label(&self) -> &str {
        "Gallery"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("excerpt", FieldKind::Integer).label("Images shown"),
            FieldSpec::new("link", FieldKind::Text).label("Full gallery link"),
        ]
    }

    fn validate(&self, payload: &Value) -> Result<(), String> {
        validate_fields(&self.fields(), payload)?;
        let images = payload
            .get("images")
            .and_then(|v| v.as_array())
            .ok_or_else(|| "missing required field 'images'".to_string())?;
        for (i, image) in images.iter().enumerate() {
            match image.get("url").and_then(|v| v.as_str()) {
                Some(url) if is_safe_url(url) => {}
                _ => return Err(format!("image {i} needs a safe 'url'")),
            }
        }
        Ok(())
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let images = item
            .payload
            .get("images")
            .and_then(|v| v.as_array())
            .ok_or_else(|| RenderError::payload("gallery", "missing 'images'"))?;
        let limit = item
            .payload
            .get("excerpt")
            .and_then(|v| v.as_u64())
            .map_or(images.len(), |n| n as usize);

        let mut html = String::from("<div class=\"gallery\">");
        for image in images.iter().take(limit) {
            let url = image.get("url").and_then(|v| v.as_str()).unwrap_or("");
            if !is_safe_url(url) {
                continue;
            }
            let caption = image.get("caption").and_then(|v| v.as_str()).unwrap_or("");
            html.push_str(&render_figure("gallery-image", url, caption, caption));
        }
        if limit < images.len()
            && let Some(link) = item.payload_str("link").filter(|l| is_safe_url(l))
        {
            html.push_str(&format!(
                "<a class=\"gallery-more\" href=\"{}\">{} more</a>",
                html_escape(link),
                images.len() - limit
            ));
        }
        html.push_str("</div>");
        Ok(html)
    }
}

// Pre-loaded syntect resources (avoid reloading per call).
static SYNTAX_SET: LazyLock<syntect::parsing::SyntaxSet> =
    LazyLock::new(syntect::parsing::SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<syntect::highlighting::ThemeSet> =
    LazyLock::new(syntect::highlighting::ThemeSet::load_defaults);

/// A code listing. Payload: `{ "code": "...", "language": "rust" }`
///
/// Unknown or missing languages render as escaped plain text.
pub struct CodeContent;

impl ContentType for CodeContent {
    fn type_name(&self) -> &str {
        "code"
    }

    fn label(&self) -> &str {
        "Code"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("code", FieldKind::TextLong).required().label("Code"),
            FieldSpec::new("language", FieldKind::Text).label("Language"),
        ]
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let code = required_str(item, "code")?;
        let lang = item.payload_str("language").unwrap_or("").trim();
        let plain = || format!("<pre><code>{}</code></pre>", html_escape(code));

        if lang.is_empty() {
            return Ok(plain());
        }

        let ss = &*SYNTAX_SET;
        let Some(syntax) = ss
            .find_syntax_by_token(lang)
            .or_else(|| ss.find_syntax_by_name(lang))
        else {
            return Ok(plain());
        };
        let Some(theme) = THEME_SET
            .themes
            .get("InspiredGitHub")
            .or_else(|| THEME_SET.themes.values().next())
        else {
            return Ok(plain());
        };

        match syntect::html::highlighted_html_for_string(code, ss, syntax, theme) {
            Ok(highlighted) => Ok(format!(
                "<div class=\"code language-{}\">{highlighted}</div>",
                html_escape(lang)
            )),
            Err(_) => Ok(plain()),
        }
    }
}

/// A titled section. Payload: `{ "title": "...", "text": "..." }`
pub struct SectionContent;

impl ContentType for SectionContent {
    fn type_name(&self) -> &str {
        "section"
    }

    fn label(&self) -> &str {
        "Section"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("title", FieldKind::Text).required().label("Title"),
            FieldSpec::new("text", FieldKind::TextLong).label("Text"),
        ]
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let title = required_str(item, "title")?;
        let text = FilterPipeline::filtered_html().process(item.payload_str("text").unwrap_or(""));
        Ok(format!(
            "<section><h2>{}</h2>{text}</section>",
            html_escape(title)
        ))
    }
}

/// Renders a theme template with the payload as context.
/// Payload: `{ "template": "content/cta.html", ...any keys... }`
pub struct TemplateContent;

impl ContentType for TemplateContent {
    fn type_name(&self) -> &str {
        "template"
    }

    fn label(&self) -> &str {
        "Template"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::new("template", FieldKind::Text).required().label("Template")]
    }

    fn render(&self, item: &ContentItem, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let path = required_str(item, "template")?;
        let context = json!({
            "page": ctx.page,
            "region": ctx.region,
            "content": item.payload,
        });
        ctx.renderer.render_template(path, &context)
    }
}
