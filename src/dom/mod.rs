use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use url::Url;

pub mod html;

pub use html::{HtmlDocument, HtmlNode};

/// Document loading state, as reported by `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl Default for ReadyState {
    fn default() -> Self {
        Self::Loading
    }
}

impl ReadyState {
    /// Whether the document has been parsed far enough for handlers to run.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Interactive | Self::Complete)
    }
}

/// The slice of the DOM the loader needs.
///
/// Nodes are cheap handles; equality and hashing must follow node identity so
/// they can key per-node state (container caches, listener bindings).
pub trait DocumentTree {
    type Node: Clone + Eq + Hash + Debug + 'static;

    /// The root element (`<html>`).
    fn document_element(&self) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn base_uri(&self) -> Url;

    fn ready_state(&self) -> ReadyState;

    fn is_element(&self, node: &Self::Node) -> bool;

    fn get_attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Nearest inclusive ancestor carrying `attribute`.
    fn closest(&self, node: &Self::Node, attribute: &str) -> Option<Self::Node> {
        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if self.is_element(&candidate) && self.has_attribute(&candidate, attribute) {
                return Some(candidate);
            }
            current = self.parent_element(&candidate);
        }
        None
    }

    /// Every connected element carrying `attribute`, in document order.
    fn query_attribute(&self, attribute: &str) -> Vec<Self::Node>;

    fn is_connected(&self, node: &Self::Node) -> bool;

    fn last_element_child(&self, node: &Self::Node) -> Option<Self::Node>;

    fn previous_element_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Lowercase local name of an element.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn text_content(&self, node: &Self::Node) -> String;

    /// Document-level marker set once a loader has been installed.
    fn loader_installed(&self) -> bool;

    fn mark_loader_installed(&self);
}
