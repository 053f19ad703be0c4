use tracing::debug;
use url::Url;

use super::error::LoaderError;
use super::payload::{find_state_script, parse_state};
use super::qrl::{container_base, split_references, Scope, BASE_ATTR, CONTAINER_ATTR};
use super::state::{DocumentState, ListenerBinding};
use crate::dom::DocumentTree;

/// Handlers an element declares for one event.
pub enum Resolved<N> {
    /// Imperative bindings; these shadow the attribute.
    Bound(Vec<ListenerBinding<N>>),
    /// Newline-separated references from the attribute, still unparsed.
    Declared {
        container: N,
        base: Url,
        references: Vec<String>,
    },
}

/// Find what `element` wants to run for `event_name` in `scope`, if anything.
pub fn resolve<D: DocumentTree>(
    doc: &D,
    state: &DocumentState<D::Node>,
    element: &D::Node,
    scope: Scope,
    event_name: &str,
) -> Result<Option<Resolved<D::Node>>, LoaderError> {
    let attribute = scope.attribute(event_name);

    let bindings = state.bindings_for(element, &attribute);
    if !bindings.is_empty() {
        return Ok(Some(Resolved::Bound(bindings)));
    }

    let value = match doc.get_attribute(element, &attribute) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    let container = doc
        .closest(element, CONTAINER_ATTR)
        .ok_or_else(|| LoaderError::MissingContainer {
            attribute: attribute.clone(),
        })?;
    let q_base = doc.get_attribute(&container, BASE_ATTR);
    let base = container_base(&doc.base_uri(), q_base.as_deref())?;

    Ok(Some(Resolved::Declared {
        container,
        base,
        references: split_references(&value)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }))
}

/// Parse and cache the container's serialized state on first use.
///
/// Failures are not cached, so the next dispatch tries again.
pub fn ensure_container_state<D: DocumentTree>(
    doc: &D,
    state: &DocumentState<D::Node>,
    container: &D::Node,
) -> Result<(), LoaderError> {
    if state.has_payload(container) {
        return Ok(());
    }
    if let Some(script) = find_state_script(doc, container) {
        let payload = parse_state(&doc.text_content(&script))?;
        debug!(target = "qloader", container = ?container, "attached container state");
        state.store_payload(container, payload);
    }
    Ok(())
}
