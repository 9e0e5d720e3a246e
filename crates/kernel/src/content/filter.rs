//! Text format filter pipeline.
//!
//! Text-bearing content types store a `format` next to their text:
//! - plain_text: HTML-escapes all content, newlines become `<br>`
//! - filtered_html: sanitized with ammonia (safe tags only)
//! - markdown: rendered with pulldown-cmark, then sanitized
//! - full_html: no filtering (trusted editors only)

use pagina_sdk::render::html_escape;
use pulldown_cmark::{Options, Parser, html};

/// Trait for text filters in the pipeline.
pub trait TextFilter: Send + Sync {
    /// Filter name for debugging.
    fn name(&self) -> &str;

    /// Process the input text and return filtered output.
    fn process(&self, input: &str) -> String;
}

/// Pipeline of text filters applied in sequence.
pub struct FilterPipeline {
    filters: Vec<Box<dyn TextFilter>>,
}

impl FilterPipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline.
    pub fn add<F: TextFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Create pipeline for a specific format.
    pub fn for_format(format: &str) -> Self {
        match format {
            "plain_text" => Self::plain_text(),
            "filtered_html" => Self::filtered_html(),
            "markdown" => Self::markdown(),
            "full_html" => Self::full_html(),
            _ => Self::plain_text(), // Default to safest option
        }
    }

    /// Create a plain text pipeline (escapes all HTML).
    pub fn plain_text() -> Self {
        Self::new().add(HtmlEscapeFilter).add(NewlineFilter)
    }

    /// Create a filtered HTML pipeline (allows safe tags).
    pub fn filtered_html() -> Self {
        Self::new().add(SanitizeFilter)
    }

    /// Create a markdown pipeline.
    pub fn markdown() -> Self {
        Self::new().add(MarkdownFilter).add(SanitizeFilter)
    }

    /// Create a full HTML pipeline (no filtering).
    pub fn full_html() -> Self {
        Self::new()
    }

    /// Process text through all filters in the pipeline.
    pub fn process(&self, input: &str) -> String {
        self.filters
            .iter()
            .fold(input.to_string(), |acc, filter| filter.process(&acc))
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::plain_text()
    }
}

/// Filter that escapes all HTML characters.
pub struct HtmlEscapeFilter;

impl TextFilter for HtmlEscapeFilter {
    fn name(&self) -> &str {
        "html_escape"
    }

    fn process(&self, input: &str) -> String {
        html_escape(input)
    }
}

/// Filter that converts newlines to <br> tags.
pub struct NewlineFilter;

impl TextFilter for NewlineFilter {
    fn name(&self) -> &str {
        "newline"
    }

    fn process(&self, input: &str) -> String {
        input.replace('\n', "<br>\n")
    }
}

/// Filter that strips dangerous tags and attributes via ammonia.
pub struct SanitizeFilter;

impl TextFilter for SanitizeFilter {
    fn name(&self) -> &str {
        "sanitize"
    }

    fn process(&self, input: &str) -> String {
        ammonia::clean(input)
    }
}

/// Filter that renders CommonMark (with tables and strikethrough) to HTML.
pub struct MarkdownFilter;

impl TextFilter for MarkdownFilter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn process(&self, input: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(input, options);
        let mut output = String::with_capacity(input.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_filter() {
        let filter = HtmlEscapeFilter;
        assert_eq!(
            filter.process("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn newline_filter() {
        let filter = NewlineFilter;
        assert_eq!(filter.process("line1\nline2"), "line1<br>\nline2");
    }

    #[test]
    fn sanitize_removes_scripts_and_handlers() {
        let filter = SanitizeFilter;
        let output = filter.process(
            r#"<p>Safe</p><script>alert('xss')</script><a href="/p" onclick="x()">Link</a>"#,
        );
        assert!(!output.contains("script"));
        assert!(!output.contains("onclick"));
        assert!(output.contains("<p>Safe</p>"));
    }

    #[test]
    fn markdown_pipeline_renders_and_sanitizes() {
        let pipeline = FilterPipeline::markdown();
        let output = pipeline.process("# Title\n\nSome *text*<script>bad()</script>");
        assert!(output.contains("<h1>Title</h1>"));
        assert!(output.contains("<em>text</em>"));
        assert!(!output.contains("<script>"));
    }

    #[test]
    fn full_html_pipeline_no_filtering() {
        let pipeline = FilterPipeline::full_html();
        let input = "<script>alert('test')</script>";
        assert_eq!(pipeline.process(input), input);
    }

    #[test]
    fn unknown_format_defaults_to_plain_text() {
        let pipeline = FilterPipeline::for_format("nonexistent");
        assert!(pipeline.process("<i>italic</i>").contains("&lt;i&gt;"));
    }
}
