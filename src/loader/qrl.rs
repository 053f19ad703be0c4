use url::Url;

use super::error::LoaderError;

pub const CONTAINER_ATTR: &str = "q:container";
pub const BASE_ATTR: &str = "q:base";
pub const PREVENT_DEFAULT_PREFIX: &str = "preventdefault:";
pub const DEFAULT_SYMBOL: &str = "default";

/// References starting with this marker index the container's local table.
const SYNC_MARKER: char = '#';

/// Which listener family an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Element,
    Document,
    Window,
}

impl Scope {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Element => "",
            Self::Document => "-document",
            Self::Window => "-window",
        }
    }

    /// `on:click`, `on-document:click`, `on-window:click`.
    pub fn attribute(self, event_name: &str) -> String {
        format!("on{}:{}", self.prefix(), event_name)
    }
}

pub fn prevent_default_attribute(event_name: &str) -> String {
    format!("{PREVENT_DEFAULT_PREFIX}{event_name}")
}

/// Base URI of a container: its `q:base` resolved against the document.
pub fn container_base(document_base: &Url, q_base: Option<&str>) -> Result<Url, LoaderError> {
    match q_base {
        Some(base) => document_base
            .join(base)
            .map_err(|source| LoaderError::InvalidReference {
                reference: base.to_string(),
                source,
            }),
        None => Ok(document_base.clone()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Slot in the container's local handler table.
    Local,
    /// Export of an external module.
    External,
}

/// One parsed entry of a handler attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    pub url: Url,
    pub symbol: String,
    pub kind: RefKind,
}

impl HandlerRef {
    pub fn parse(reference: &str, base: &Url) -> Result<Self, LoaderError> {
        let url = base
            .join(reference)
            .map_err(|source| LoaderError::InvalidReference {
                reference: reference.to_string(),
                source,
            })?;
        let symbol = symbol_from_fragment(url.fragment());
        let kind = if reference.starts_with(SYNC_MARKER) {
            RefKind::Local
        } else {
            RefKind::External
        };
        Ok(Self { url, symbol, kind })
    }

    pub fn is_local(&self) -> bool {
        self.kind == RefKind::Local
    }

    /// The URL to import: the reference without its fragment.
    pub fn module_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }

    /// Local table position: the symbol's leading decimal digits.
    pub fn local_index(&self) -> Option<usize> {
        let digits: String = self
            .symbol
            .chars()
            .take_while(|ch| ch.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// Symbol named by a fragment: everything before the first `?`, `[` or `|`,
/// or [`DEFAULT_SYMBOL`] when that is empty.
pub fn symbol_from_fragment(fragment: Option<&str>) -> String {
    let fragment = fragment.unwrap_or_default();
    let end = fragment
        .find(|ch| matches!(ch, '?' | '[' | '|'))
        .unwrap_or(fragment.len());
    match &fragment[..end] {
        "" => DEFAULT_SYMBOL.to_string(),
        symbol => symbol.to_string(),
    }
}

/// Split an attribute value into its newline-separated entries.
pub fn split_references(value: &str) -> Vec<&str> {
    value
        .split('\n')
        .filter(|entry| !entry.trim().is_empty())
        .collect()
}
