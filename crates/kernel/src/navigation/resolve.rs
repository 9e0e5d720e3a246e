//! Resolving navigation children, trees and breadcrumbs.

use std::future::Future;
use std::pin::Pin;

use pagina_sdk::navigation::{NavigationContext, NavigationNode, NodeStream};
use pagina_sdk::store::PageStore;
use pagina_sdk::types::Page;
use serde::Serialize;
use tokio_stream::StreamExt;

use super::NavigationRegistry;
use crate::error::DispatchError;

/// One entry in a rendered navigation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationEntry {
    pub title: String,
    pub url: String,
    pub pretender: bool,
    pub children: Vec<NavigationEntry>,
}

impl NavigationEntry {
    pub fn new(node: &NavigationNode, children: Vec<NavigationEntry>) -> Self {
        Self {
            title: node.title().to_string(),
            url: node.url().to_string(),
            pretender: node.is_pretender(),
            children,
        }
    }
}

/// A link in the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breadcrumb {
    pub title: String,
    pub url: String,
}

type TreeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<NavigationEntry>, DispatchError>> + Send + 'a>>;

/// Resolves navigation against a store and the registered extensions.
///
/// Nothing is cached; every call resolves fresh.
#[derive(Clone, Copy)]
pub struct NavigationResolver<'a> {
    registry: &'a NavigationRegistry,
    store: &'a dyn PageStore,
}

impl<'a> NavigationResolver<'a> {
    pub fn new(registry: &'a NavigationRegistry, store: &'a dyn PageStore) -> Self {
        Self { registry, store }
    }

    /// Lazy stream of the navigation children of `node`.
    pub fn children(&self, node: &'a NavigationNode) -> Result<NodeStream<'a>, DispatchError> {
        if let Some(name) = node.navigation_extension() {
            let extension = self
                .registry
                .get(name)
                .ok_or_else(|| DispatchError::UnknownNavigationExtension(name.to_string()))?;
            let ctx = NavigationContext { store: self.store };
            return Ok(extension.children(node, ctx));
        }

        let NavigationNode::Page(page) = node else {
            return Ok(Box::pin(tokio_stream::empty()));
        };
        let store = self.store;
        let parent_id = page.id;
        Ok(Box::pin(async_stream::stream! {
            match store.children(parent_id).await {
                Ok(children) => {
                    for child in children {
                        if child.in_navigation && child.active {
                            yield Ok(NavigationNode::Page(child));
                        }
                    }
                }
                Err(e) => yield Err(e),
            }
        }))
    }

    /// Drain [`children`](Self::children) into a vector.
    pub async fn collect_children(
        &self,
        node: &'a NavigationNode,
    ) -> Result<Vec<NavigationNode>, DispatchError> {
        let mut stream = self.children(node)?;
        let mut nodes = Vec::new();
        while let Some(child) = stream.next().await {
            nodes.push(child?);
        }
        Ok(nodes)
    }

    /// Navigation tree below `node`, `depth` levels deep.
    pub fn tree<'b>(&'b self, node: &'b NavigationNode, depth: usize) -> TreeFuture<'b>
    where
        'a: 'b,
    {
        Box::pin(async move {
            if depth == 0 {
                return Ok(Vec::new());
            }
            let resolver = NavigationResolver::<'b> {
                registry: self.registry,
                store: self.store,
            };
            let children = resolver.collect_children(node).await?;
            let mut entries = Vec::with_capacity(children.len());
            for child in &children {
                let nested = resolver.tree(child, depth - 1).await?;
                entries.push(NavigationEntry::new(child, nested));
            }
            Ok(entries)
        })
    }

    /// Top-level navigation: the root pages that appear in navigation.
    pub async fn roots(&self) -> Result<Vec<NavigationNode>, DispatchError> {
        Ok(self
            .store
            .roots()
            .await?
            .into_iter()
            .filter(|p| p.in_navigation && p.active)
            .map(NavigationNode::Page)
            .collect())
    }

    /// Root-to-page trail for `page`.
    pub async fn breadcrumbs(&self, page: &Page) -> Result<Vec<Breadcrumb>, DispatchError> {
        let mut trail: Vec<Breadcrumb> = self
            .store
            .ancestors(page.id)
            .await?
            .into_iter()
            .rev()
            .map(|p| Breadcrumb {
                url: p.url().to_string(),
                title: p.title,
            })
            .collect();
        trail.push(Breadcrumb {
            title: page.title.clone(),
            url: page.url().to_string(),
        });
        Ok(trail)
    }
}
