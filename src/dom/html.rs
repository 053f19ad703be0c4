use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use kuchiki::traits::*;
use kuchiki::{parse_html, NodeRef};
use url::Url;

use super::{DocumentTree, ReadyState};

/// Identity handle for a node of an [`HtmlDocument`].
#[derive(Clone)]
pub struct HtmlNode(NodeRef);

impl PartialEq for HtmlNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0 .0, &other.0 .0)
    }
}

impl Eq for HtmlNode {}

impl Hash for HtmlNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0 .0), state);
    }
}

impl fmt::Debug for HtmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_element() {
            Some(element) => {
                let attributes = element.attributes.borrow();
                match attributes.get("id") {
                    Some(id) => write!(f, "<{} id=\"{}\">", &*element.name.local, id),
                    None => write!(f, "<{}>", &*element.name.local),
                }
            }
            None if self.0.as_document().is_some() => f.write_str("#document"),
            None => f.write_str("#node"),
        }
    }
}

/// In-memory document backed by a kuchiki tree.
///
/// Ready state and the install marker live next to the tree because the
/// parser has no notion of either.
pub struct HtmlDocument {
    document: NodeRef,
    base_uri: Url,
    ready_state: Cell<ReadyState>,
    loader_installed: Cell<bool>,
}

impl HtmlDocument {
    pub fn parse(html: &str, base_uri: Url) -> Self {
        Self {
            document: parse_html().one(html),
            base_uri,
            ready_state: Cell::new(ReadyState::Loading),
            loader_installed: Cell::new(false),
        }
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.ready_state.set(state);
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<HtmlNode> {
        self.document
            .descendants()
            .elements()
            .find(|element| element.attributes.borrow().get("id") == Some(id))
            .map(|element| HtmlNode(element.as_node().clone()))
    }

    pub fn select_first(&self, selector: &str) -> Result<HtmlNode> {
        self.document
            .select_first(selector)
            .map(|element| HtmlNode(element.as_node().clone()))
            .map_err(|_| anyhow!("no element matches `{selector}`"))
    }

    /// Every element in document order.
    pub fn elements(&self) -> Vec<HtmlNode> {
        self.document
            .descendants()
            .elements()
            .map(|element| HtmlNode(element.as_node().clone()))
            .collect()
    }

    /// `(name, value)` pairs of an element's attributes.
    pub fn attributes(&self, node: &HtmlNode) -> Vec<(String, String)> {
        node.0
            .as_element()
            .map(|element| {
                element
                    .attributes
                    .borrow()
                    .map
                    .iter()
                    .map(|(name, attribute)| (name.local.to_string(), attribute.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Detach `node` (and its subtree) from the document.
    pub fn remove(&self, node: &HtmlNode) {
        node.0.detach();
    }
}

impl DocumentTree for HtmlDocument {
    type Node = HtmlNode;

    fn document_element(&self) -> Option<HtmlNode> {
        self.document
            .children()
            .elements()
            .next()
            .map(|element| HtmlNode(element.as_node().clone()))
    }

    fn body(&self) -> Option<HtmlNode> {
        self.select_first("body").ok()
    }

    fn base_uri(&self) -> Url {
        self.base_uri.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state.get()
    }

    fn is_element(&self, node: &HtmlNode) -> bool {
        node.0.as_element().is_some()
    }

    fn get_attribute(&self, node: &HtmlNode, name: &str) -> Option<String> {
        let element = node.0.as_element()?;
        let attributes = element.attributes.borrow();
        attributes.get(name).map(str::to_string)
    }

    fn parent_element(&self, node: &HtmlNode) -> Option<HtmlNode> {
        node.0
            .parent()
            .filter(|parent| parent.as_element().is_some())
            .map(HtmlNode)
    }

    fn query_attribute(&self, attribute: &str) -> Vec<HtmlNode> {
        self.document
            .descendants()
            .elements()
            .filter(|element| element.attributes.borrow().contains(attribute))
            .map(|element| HtmlNode(element.as_node().clone()))
            .collect()
    }

    fn is_connected(&self, node: &HtmlNode) -> bool {
        node.0
            .inclusive_ancestors()
            .any(|ancestor| Rc::ptr_eq(&ancestor.0, &self.document.0))
    }

    fn last_element_child(&self, node: &HtmlNode) -> Option<HtmlNode> {
        let mut child = node.0.last_child();
        while let Some(candidate) = child {
            if candidate.as_element().is_some() {
                return Some(HtmlNode(candidate));
            }
            child = candidate.previous_sibling();
        }
        None
    }

    fn previous_element_sibling(&self, node: &HtmlNode) -> Option<HtmlNode> {
        let mut sibling = node.0.previous_sibling();
        while let Some(candidate) = sibling {
            if candidate.as_element().is_some() {
                return Some(HtmlNode(candidate));
            }
            sibling = candidate.previous_sibling();
        }
        None
    }

    fn tag_name(&self, node: &HtmlNode) -> Option<String> {
        node.0
            .as_element()
            .map(|element| element.name.local.to_lowercase())
    }

    fn text_content(&self, node: &HtmlNode) -> String {
        node.0.text_contents()
    }

    fn loader_installed(&self) -> bool {
        self.loader_installed.get()
    }

    fn mark_loader_installed(&self) {
        self.loader_installed.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(html: &str) -> HtmlDocument {
        HtmlDocument::parse(html, Url::parse("http://localhost/").unwrap())
    }

    #[test]
    fn removed_nodes_are_disconnected() {
        let doc = document(r#"<div id="outer"><button id="btn">go</button></div>"#);
        let button = doc.get_element_by_id("btn").unwrap();
        assert!(doc.is_connected(&button));

        doc.remove(&button);
        assert!(!doc.is_connected(&button));
        assert!(doc.get_element_by_id("btn").is_none());
    }

    #[test]
    fn closest_includes_self() {
        let doc = document(r#"<div q:container id="c"><p id="p"><b id="b">x</b></p></div>"#);
        let bold = doc.get_element_by_id("b").unwrap();
        let container = doc.get_element_by_id("c").unwrap();
        assert_eq!(doc.closest(&bold, "q:container"), Some(container.clone()));
        assert_eq!(doc.closest(&container, "q:container"), Some(container));
    }

    #[test]
    fn colon_attributes_survive_parsing() {
        let doc = document(r#"<button id="btn" on:click="./a.js#b" preventdefault:click></button>"#);
        let button = doc.get_element_by_id("btn").unwrap();
        assert_eq!(
            doc.get_attribute(&button, "on:click").as_deref(),
            Some("./a.js#b")
        );
        assert!(doc.has_attribute(&button, "preventdefault:click"));
        assert_eq!(doc.query_attribute("on:click"), vec![button]);
    }

    #[test]
    fn element_sibling_walk_skips_text() {
        let doc = document("<body><p id=\"a\"></p> text <p id=\"b\"></p> tail </body>");
        let body = doc.body().unwrap();
        let last = doc.last_element_child(&body).unwrap();
        assert_eq!(last, doc.get_element_by_id("b").unwrap());
        assert_eq!(
            doc.previous_element_sibling(&last),
            doc.get_element_by_id("a")
        );
    }
}
