//! Navigation nodes and the navigation extension capability.
//!
//! A page may name a navigation extension; when it does, its navigation
//! children come from that extension instead of its stored sub-pages. The
//! extension can yield real pages or pretenders: synthetic nodes that are
//! not backed by a stored page.

use std::pin::Pin;

use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::store::{PageStore, StoreError};
use crate::types::Page;

/// Attribute holding a page's navigation extension name.
pub const NAVIGATION_EXTENSION_FIELD: &str = "navigation_extension";

/// A synthetic navigation node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pretender {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub ordering: i32,
    /// Extension resolving this node's own children (None = leaf).
    #[serde(default)]
    pub navigation_extension: Option<String>,
}

impl Pretender {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ordering: 0,
            navigation_extension: None,
        }
    }

    pub fn ordering(mut self, ordering: i32) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn navigation_extension(mut self, name: impl Into<String>) -> Self {
        self.navigation_extension = Some(name.into());
        self
    }
}

/// Either a stored page or a pretender.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationNode {
    Page(Page),
    Pretender(Pretender),
}

impl NavigationNode {
    pub fn title(&self) -> &str {
        match self {
            NavigationNode::Page(page) => &page.title,
            NavigationNode::Pretender(p) => &p.title,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            NavigationNode::Page(page) => page.navigation_url(),
            NavigationNode::Pretender(p) => &p.url,
        }
    }

    pub fn ordering(&self) -> i32 {
        match self {
            NavigationNode::Page(page) => page.ordering,
            NavigationNode::Pretender(p) => p.ordering,
        }
    }

    /// Navigation extension assigned to this node, if any.
    pub fn navigation_extension(&self) -> Option<&str> {
        match self {
            NavigationNode::Page(page) => page
                .attribute_str(NAVIGATION_EXTENSION_FIELD)
                .filter(|s| !s.is_empty()),
            NavigationNode::Pretender(p) => p.navigation_extension.as_deref(),
        }
    }

    pub fn is_pretender(&self) -> bool {
        matches!(self, NavigationNode::Pretender(_))
    }

    pub fn as_page(&self) -> Option<&Page> {
        match self {
            NavigationNode::Page(page) => Some(page),
            NavigationNode::Pretender(_) => None,
        }
    }
}

/// Lazy, finite sequence of navigation nodes.
pub type NodeStream<'a> = Pin<Box<dyn Stream<Item = Result<NavigationNode, StoreError>> + Send + 'a>>;

/// Collaborators available to a navigation extension.
#[derive(Clone, Copy)]
pub struct NavigationContext<'a> {
    pub store: &'a dyn PageStore,
}

/// Contributes navigation children for nodes that name it.
pub trait NavigationExtension: Send + Sync {
    /// Name stored in the `navigation_extension` attribute.
    fn name(&self) -> &str;

    /// Label shown to editors.
    fn label(&self) -> &str {
        self.name()
    }

    /// Produce the children of `node`. Called fresh for every resolution.
    fn children<'a>(&'a self, node: &'a NavigationNode, ctx: NavigationContext<'a>)
    -> NodeStream<'a>;
}
