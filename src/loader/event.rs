use std::cell::Cell;

/// Event type synthesized the first time an element scrolls into view.
pub const VISIBLE_EVENT: &str = "qvisible";

/// One record delivered by an intersection observer.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry<N> {
    pub target: N,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

impl<N> IntersectionEntry<N> {
    pub fn intersecting(target: N) -> Self {
        Self {
            target,
            is_intersecting: true,
            intersection_ratio: 1.0,
        }
    }

    pub fn leaving(target: N) -> Self {
        Self {
            target,
            is_intersecting: false,
            intersection_ratio: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail<N> {
    None,
    Intersection(IntersectionEntry<N>),
}

/// A DOM event as seen by the loader and by handlers.
///
/// Handlers receive the event behind an `Rc`, so cancellation flags use
/// interior mutability and are observed by the dispatcher mid-walk.
#[derive(Debug)]
pub struct Event<N> {
    event_type: String,
    target: Option<N>,
    bubbles: bool,
    detail: EventDetail<N>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl<N> Event<N> {
    /// A bubbling event fired at `target`.
    pub fn new(event_type: impl Into<String>, target: Option<N>) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            bubbles: true,
            detail: EventDetail::None,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// A custom event as created by `new CustomEvent(name, { detail })`: no
    /// target, no bubbling.
    pub fn custom(event_type: impl Into<String>, detail: EventDetail<N>) -> Self {
        Self {
            detail,
            bubbles: false,
            ..Self::new(event_type, None)
        }
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> Option<&N> {
        self.target.as_ref()
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn detail(&self) -> &EventDetail<N> {
        &self.detail
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// `DOMContentLoaded` -> `-d-o-m-content-loaded`, the attribute spelling
/// used by the renderer for mixed-case event names.
pub fn camel_to_kebab(name: &str) -> String {
    let mut kebab = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            kebab.push('-');
            kebab.push(ch.to_ascii_lowercase());
        } else {
            kebab.push(ch);
        }
    }
    kebab
}
