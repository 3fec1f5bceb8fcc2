//! Page asset queue.
//!
//! Assets are grouped into five fixed categories and emitted into the page
//! head in the order canonical, manifest, favicon, css, js. Each item is
//! identified by an id derived from its content, so registering the same URL
//! or the same inline block twice replaces the earlier entry in place.
//!
//! Within a category, items are emitted in dependency order: an item listing
//! another item's id in its dependencies is emitted after it. Independent
//! items keep their registration order. Dependencies on ids that are not
//! queued in the same category are ignored; a dependency cycle is logged and
//! the items involved fall back to registration order.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::error::ViewError;
use crate::utils::escape::{escape_html, strip_tags};

/// Marker removed from file names when deriving ids (`app.min.css` → `app`).
const MINIFIED_MARKER: &str = ".min";

/// Category of a queued asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Canonical,
    Manifest,
    Favicon,
    Css,
    Js,
}

impl AssetKind {
    /// Every kind, in emission order.
    pub const ALL: [AssetKind; 5] =
        [AssetKind::Canonical, AssetKind::Manifest, AssetKind::Favicon, AssetKind::Css, AssetKind::Js];

    pub const fn as_str(self) -> &'static str {
        match self {
            AssetKind::Canonical => "canonical",
            AssetKind::Manifest => "manifest",
            AssetKind::Favicon => "favicon",
            AssetKind::Css => "css",
            AssetKind::Js => "js",
        }
    }

    /// Markup for this kind, given either a resolved URL or inline content.
    ///
    /// Link-only kinds produce no markup for inline content.
    fn markup(self, url: Option<&str>, content: &str) -> String {
        match (self, url) {
            (AssetKind::Canonical, Some(url)) => link("canonical", url),
            (AssetKind::Manifest, Some(url)) => link("manifest", url),
            (AssetKind::Favicon, Some(url)) => link("icon", url),
            (AssetKind::Css, Some(url)) => link("stylesheet", url),
            (AssetKind::Css, None) => format!("<style>{}</style>", strip_tags(content)),
            (AssetKind::Js, Some(url)) => {
                format!("<script defer src=\"{}\"></script>", escape_html(url))
            }
            (AssetKind::Js, None) => {
                format!("<script type=\"module\">{}</script>", strip_tags(content))
            }
            (AssetKind::Canonical | AssetKind::Manifest | AssetKind::Favicon, None) => {
                String::new()
            }
        }
    }
}

fn link(rel: &str, href: &str) -> String {
    format!("<link rel=\"{}\" href=\"{}\">", rel, escape_html(href))
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetKind::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or_else(|| {
            ViewError::InvalidAssetKind {
                kind: s.to_string(),
                supported: AssetKind::ALL.map(AssetKind::as_str).join(", "),
            }
        })
    }
}

/// One registered asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueItem {
    pub kind: AssetKind,
    pub id: String,
    pub html: String,
    pub dependencies: Vec<String>,
}

/// Id for an asset: the URL's file name without extension or `.min` marker,
/// or a SHA-256 of inline content.
pub fn asset_id(url: Option<&str>, content: &str) -> String {
    match url {
        Some(url) => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            let stem = Path::new(path).file_stem().and_then(|s| s.to_str()).unwrap_or(path);
            stem.replace(MINIFIED_MARKER, "")
        }
        None => hex::encode(Sha256::digest(content.as_bytes())),
    }
}

/// Registry of page assets keyed by `(kind, id)`.
#[derive(Debug, Clone, Default)]
pub struct AssetQueue {
    items: HashMap<AssetKind, Vec<QueueItem>>,
}

impl AssetQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset and return its id.
    ///
    /// `url` is the content's URL form as resolved by the caller, or `None`
    /// for inline content. An existing item with the same id in the same
    /// category is replaced without changing its position.
    pub fn queue(
        &mut self,
        kind: AssetKind,
        content: &str,
        url: Option<&str>,
        dependencies: Vec<String>,
    ) -> String {
        let id = asset_id(url, content);
        let item = QueueItem {
            kind,
            id: id.clone(),
            html: kind.markup(url, content),
            dependencies,
        };
        tracing::debug!("Queued {} asset '{}'", kind, id);

        let items = self.items.entry(kind).or_default();
        match items.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        id
    }

    /// Remove an item; returns it if it was queued.
    pub fn dequeue(&mut self, kind: AssetKind, id: &str) -> Option<QueueItem> {
        let items = self.items.get_mut(&kind)?;
        let position = items.iter().position(|item| item.id == id)?;
        Some(items.remove(position))
    }

    pub fn get(&self, kind: AssetKind, id: &str) -> Option<&QueueItem> {
        self.items.get(&kind)?.iter().find(|item| item.id == id)
    }

    /// Items of one category in registration order.
    pub fn items(&self, kind: AssetKind) -> &[QueueItem] {
        self.items.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every item in emission order.
    pub fn ordered(&self) -> Vec<&QueueItem> {
        AssetKind::ALL
            .into_iter()
            .flat_map(|kind| dependency_order(kind, self.items(kind)))
            .collect()
    }

    /// Concatenated markup of every item, one per line.
    pub fn emit(&self) -> String {
        let mut head = String::new();
        for item in self.ordered() {
            if item.html.is_empty() {
                continue;
            }
            head.push_str(&item.html);
            head.push('\n');
        }
        head
    }
}

/// Kahn's algorithm with registration order as the tie-breaker.
fn dependency_order(kind: AssetKind, items: &[QueueItem]) -> Vec<&QueueItem> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(items.len(), 0);
    let nodes: Vec<NodeIndex> = (0..items.len()).map(|i| graph.add_node(i)).collect();
    let by_id: HashMap<&str, NodeIndex> =
        items.iter().zip(&nodes).map(|(item, &node)| (item.id.as_str(), node)).collect();

    for (item, &node) in items.iter().zip(&nodes) {
        for dependency in &item.dependencies {
            match by_id.get(dependency.as_str()) {
                Some(&dep_node) if dep_node != node => {
                    if !graph.contains_edge(dep_node, node) {
                        graph.add_edge(dep_node, node, ());
                    }
                }
                Some(_) => {}
                None => tracing::trace!(
                    "{} asset '{}' depends on unknown id '{}'",
                    kind,
                    item.id,
                    dependency
                ),
            }
        }
    }

    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|&node| graph.neighbors_directed(node, petgraph::Direction::Incoming).count())
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> =
        (0..items.len()).filter(|&i| in_degree[i] == 0).map(Reverse).collect();
    let mut emitted = vec![false; items.len()];
    let mut order = Vec::with_capacity(items.len());

    while let Some(Reverse(index)) = ready.pop() {
        emitted[index] = true;
        order.push(&items[index]);
        for next in graph.neighbors_directed(nodes[index], petgraph::Direction::Outgoing) {
            let next = graph[next];
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < items.len() {
        let stuck: Vec<&str> =
            items.iter().zip(&emitted).filter(|(_, done)| !**done).map(|(item, _)| item.id.as_str()).collect();
        tracing::warn!(
            "Dependency cycle among {} assets: {}; emitting them in registration order",
            kind,
            stuck.join(", ")
        );
        order.extend(items.iter().zip(&emitted).filter(|(_, done)| !**done).map(|(item, _)| item));
    }

    order
}
