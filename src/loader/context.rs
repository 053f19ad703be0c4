use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

use super::event::Event;

/// What triggered the handler that is currently running.
#[derive(Debug)]
pub struct DispatchContext<N> {
    pub element: N,
    pub event: Rc<Event<N>>,
    pub url: Option<Url>,
}

impl<N: Clone> Clone for DispatchContext<N> {
    fn clone(&self) -> Self {
        Self {
            element: self.element.clone(),
            event: Rc::clone(&self.event),
            url: self.url.clone(),
        }
    }
}

/// The document's single ambient dispatch slot.
///
/// `enter` swaps a new context in and hands back a guard holding the value it
/// replaced; dropping the guard puts that value back, whether the handler
/// returned, failed, or its future was dropped mid-flight.
pub struct ContextStack<N> {
    current: RefCell<Option<DispatchContext<N>>>,
}

impl<N> Default for ContextStack<N> {
    fn default() -> Self {
        Self {
            current: RefCell::new(None),
        }
    }
}

impl<N: Clone> ContextStack<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<DispatchContext<N>> {
        self.current.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.borrow().is_none()
    }

    #[must_use = "the previous context is restored when the guard is dropped"]
    pub fn enter(self: &Rc<Self>, context: DispatchContext<N>) -> ContextGuard<N> {
        let previous = self.current.replace(Some(context));
        ContextGuard {
            stack: Rc::clone(self),
            previous: Some(previous),
        }
    }
}

pub struct ContextGuard<N> {
    stack: Rc<ContextStack<N>>,
    previous: Option<Option<DispatchContext<N>>>,
}

impl<N> Drop for ContextGuard<N> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.stack.current.borrow_mut() = previous;
        }
    }
}
