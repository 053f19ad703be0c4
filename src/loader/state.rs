use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

use serde_json::Value as JsonValue;
use url::Url;

use super::context::ContextStack;
use crate::module::Handler;

/// A handler bound imperatively to an element, bypassing attribute parsing.
pub struct ListenerBinding<N> {
    /// Computed attribute name, e.g. `on:click`.
    pub attribute: String,
    pub symbol: String,
    pub url: Option<Url>,
    pub handler: Handler<N>,
}

impl<N> Clone for ListenerBinding<N> {
    fn clone(&self) -> Self {
        Self {
            attribute: self.attribute.clone(),
            symbol: self.symbol.clone(),
            url: self.url.clone(),
            handler: Rc::clone(&self.handler),
        }
    }
}

/// Data owned by one container element.
pub struct ContainerState<N> {
    pub local_handlers: Vec<Handler<N>>,
    pub payload: Option<Rc<JsonValue>>,
}

impl<N> Default for ContainerState<N> {
    fn default() -> Self {
        Self {
            local_handlers: Vec::new(),
            payload: None,
        }
    }
}

/// Everything the loader remembers about one document. Created at bootstrap
/// and kept for the document's lifetime.
pub struct DocumentState<N> {
    events: RefCell<BTreeSet<String>>,
    context: Rc<ContextStack<N>>,
    initialized: Cell<bool>,
    containers: RefCell<HashMap<N, ContainerState<N>>>,
    bindings: RefCell<HashMap<N, Vec<ListenerBinding<N>>>>,
    observed: RefCell<HashSet<N>>,
}

impl<N> Default for DocumentState<N> {
    fn default() -> Self {
        Self {
            events: RefCell::new(BTreeSet::new()),
            context: Rc::new(ContextStack::default()),
            initialized: Cell::new(false),
            containers: RefCell::new(HashMap::new()),
            bindings: RefCell::new(HashMap::new()),
            observed: RefCell::new(HashSet::new()),
        }
    }
}

impl<N: Clone + Eq + Hash> DocumentState<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Rc<ContextStack<N>> {
        Rc::clone(&self.context)
    }

    pub fn is_registered(&self, event_name: &str) -> bool {
        self.events.borrow().contains(event_name)
    }

    /// Returns `false` when the name was already present.
    pub(crate) fn insert_event(&self, event_name: &str) -> bool {
        self.events.borrow_mut().insert(event_name.to_string())
    }

    pub fn registered_events(&self) -> Vec<String> {
        self.events.borrow().iter().cloned().collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub(crate) fn set_initialized(&self) {
        self.initialized.set(true);
    }

    /// Install the local handler table of `container`.
    pub fn set_local_handlers(&self, container: &N, handlers: Vec<Handler<N>>) {
        self.containers
            .borrow_mut()
            .entry(container.clone())
            .or_default()
            .local_handlers = handlers;
    }

    pub fn local_handler(&self, container: &N, index: usize) -> Option<Handler<N>> {
        self.containers
            .borrow()
            .get(container)
            .and_then(|state| state.local_handlers.get(index).cloned())
    }

    pub fn payload(&self, container: &N) -> Option<Rc<JsonValue>> {
        self.containers
            .borrow()
            .get(container)
            .and_then(|state| state.payload.clone())
    }

    pub(crate) fn has_payload(&self, container: &N) -> bool {
        self.containers
            .borrow()
            .get(container)
            .is_some_and(|state| state.payload.is_some())
    }

    pub(crate) fn store_payload(&self, container: &N, payload: JsonValue) {
        self.containers
            .borrow_mut()
            .entry(container.clone())
            .or_default()
            .payload = Some(Rc::new(payload));
    }

    pub fn bind_listener(&self, element: &N, binding: ListenerBinding<N>) {
        self.bindings
            .borrow_mut()
            .entry(element.clone())
            .or_default()
            .push(binding);
    }

    /// Bindings on `element` for `attribute`, in bind order.
    pub fn bindings_for(&self, element: &N, attribute: &str) -> Vec<ListenerBinding<N>> {
        self.bindings
            .borrow()
            .get(element)
            .map(|bindings| {
                bindings
                    .iter()
                    .filter(|binding| binding.attribute == attribute)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn observe(&self, element: &N) {
        self.observed.borrow_mut().insert(element.clone());
    }

    /// Returns `true` only for the first call per observed element.
    pub(crate) fn take_observed(&self, element: &N) -> bool {
        self.observed.borrow_mut().remove(element)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.borrow().len()
    }
}
