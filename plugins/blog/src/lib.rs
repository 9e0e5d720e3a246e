//! Blog plugin for Pagina.
//!
//! Provides a navigation extension that lists a blog page's archive years
//! as pretenders, and a teaser content type for linking to entries.
//! Register both on the site builder at startup.
//!
//! Archive pretenders only appear in navigation. Their `/<blog>/<year>/`
//! URLs are served by nothing in this crate: create a page at each of
//! those URLs (for example with `override_url`) or route them in the host
//! application, otherwise the links answer 404.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike};
use pagina_sdk::prelude::*;
use serde_json::Value;

/// Navigation extension name stored on blog pages.
pub const BLOG_ARCHIVE: &str = "blog_archive";

/// Lists one pretender per publication year, newest first.
///
/// Entries are the blog page's active children; the year comes from
/// `publication_date`, falling back to `creation_date`. Entries with neither
/// are left out of the archive.
///
/// The year URLs have no backing page. See the crate docs.
pub struct BlogArchiveNavigation;

impl NavigationExtension for BlogArchiveNavigation {
    fn name(&self) -> &str {
        BLOG_ARCHIVE
    }

    fn label(&self) -> &str {
        "Blog archive by year"
    }

    fn children<'a>(
        &'a self,
        node: &'a NavigationNode,
        ctx: NavigationContext<'a>,
    ) -> NodeStream<'a> {
        Box::pin(async_stream::stream! {
            let Some(blog) = node.as_page() else {
                return;
            };
            match ctx.store.children(blog.id).await {
                Ok(entries) => {
                    for pretender in archive_years(blog, &entries) {
                        yield Ok(NavigationNode::Pretender(pretender));
                    }
                }
                Err(e) => yield Err(e),
            }
        })
    }
}

fn entry_year(entry: &Page) -> Option<i32> {
    ["publication_date", "creation_date"]
        .iter()
        .filter_map(|field| entry.attribute_str(field))
        .find_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|date| date.year())
}

/// Archive pretenders for `blog`, newest year first.
pub fn archive_years(blog: &Page, entries: &[Page]) -> Vec<Pretender> {
    let years: BTreeSet<i32> = entries
        .iter()
        .filter(|e| e.active)
        .filter_map(entry_year)
        .collect();
    let base = blog.url().trim_end_matches('/');

    years
        .into_iter()
        .rev()
        .enumerate()
        .map(|(position, year)| {
            Pretender::new(year.to_string(), format!("{base}/{year}/"))
                .ordering(i32::try_from(position).unwrap_or(i32::MAX))
        })
        .collect()
}

/// Teaser linking to a blog entry.
/// Payload: `{ "title": "...", "url": "/blog/post/", "summary": "...", "date": "..." }`
pub struct BlogTeaserContent;

impl ContentType for BlogTeaserContent {
    fn type_name(&self) -> &str {
        "blog_teaser"
    }

    fn label(&self) -> &str {
        "Blog teaser"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("title", FieldKind::Text).required().label("Title"),
            FieldSpec::new("url", FieldKind::Text).required().label("Link"),
            FieldSpec::new("summary", FieldKind::TextLong).label("Summary"),
            FieldSpec::new("date", FieldKind::DateTime).label("Date"),
        ]
    }

    fn validate(&self, payload: &Value) -> Result<(), String> {
        validate_fields(&self.fields(), payload)?;
        match payload.get("url").and_then(Value::as_str) {
            Some(url) if !is_safe_url(url) => Err(format!("unsafe teaser url '{url}'")),
            _ => Ok(()),
        }
    }

    fn render(&self, item: &ContentItem, _ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let title = item
            .payload_str("title")
            .ok_or_else(|| RenderError::payload(self.type_name(), "missing 'title'"))?;
        let url = item
            .payload_str("url")
            .ok_or_else(|| RenderError::payload(self.type_name(), "missing 'url'"))?;
        if !is_safe_url(url) {
            return Err(RenderError::payload(self.type_name(), format!("unsafe url '{url}'")));
        }

        let mut html = format!(
            "<article class=\"blog-teaser\"><h3><a href=\"{}\">{}</a></h3>",
            html_escape(url),
            html_escape(title)
        );
        if let Some(date) = item
            .payload_str("date")
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        {
            html.push_str(&format!(
                "<time datetime=\"{}\">{}</time>",
                date.to_rfc3339(),
                date.format("%B %-d, %Y")
            ));
        }
        if let Some(summary) = item.payload_str("summary") {
            html.push_str(&format!("<p>{}</p>", html_escape(summary)));
        }
        html.push_str("</article>");
        Ok(html)
    }
}
