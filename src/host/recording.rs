use std::cell::RefCell;

use tracing::debug;

use super::{HostEnvironment, ListenerOptions, ListenerTarget, Signal};
use crate::loader::error::LoaderError;

/// Host that records every interaction so it can be inspected afterwards.
/// Idle callbacks are held until [`RecordingHost::run_idle`].
pub struct RecordingHost<N> {
    listeners: RefCell<Vec<(ListenerTarget, String, ListenerOptions)>>,
    queued: RefCell<Vec<String>>,
    signals: RefCell<Vec<Signal<N>>>,
    idle: RefCell<Vec<Box<dyn FnOnce()>>>,
    observed: RefCell<Vec<N>>,
    errors: RefCell<Vec<String>>,
}

impl<N> Default for RecordingHost<N> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            queued: RefCell::new(Vec::new()),
            signals: RefCell::new(Vec::new()),
            idle: RefCell::new(Vec::new()),
            observed: RefCell::new(Vec::new()),
            errors: RefCell::new(Vec::new()),
        }
    }
}

impl<N: Clone + PartialEq> RecordingHost<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate inline scripts pushing event names before bootstrap.
    pub fn with_queued_events(names: &[&str]) -> Self {
        let host = Self::default();
        host.queued
            .borrow_mut()
            .extend(names.iter().map(|name| name.to_string()));
        host
    }

    pub fn listeners(&self) -> Vec<(ListenerTarget, String, ListenerOptions)> {
        self.listeners.borrow().clone()
    }

    pub fn listener_count(&self, target: ListenerTarget, event_name: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(t, name, _)| *t == target && name == event_name)
            .count()
    }

    pub fn signals(&self) -> Vec<Signal<N>> {
        self.signals.borrow().clone()
    }

    pub fn signal_names(&self) -> Vec<&'static str> {
        self.signals
            .borrow()
            .iter()
            .map(Signal::event_name)
            .collect()
    }

    /// Symbols announced through `qsymbol`, in order.
    pub fn requested_symbols(&self) -> Vec<String> {
        self.signals
            .borrow()
            .iter()
            .filter_map(|signal| match signal {
                Signal::Symbol { symbol, .. } => Some(symbol.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pending_idle(&self) -> usize {
        self.idle.borrow().len()
    }

    /// Run queued idle callbacks, returning how many ran.
    pub fn run_idle(&self) -> usize {
        let callbacks: Vec<_> = self.idle.borrow_mut().drain(..).collect();
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }

    pub fn observed(&self) -> Vec<N> {
        self.observed.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl<N: Clone + PartialEq> HostEnvironment<N> for RecordingHost<N> {
    fn add_event_listener(&self, target: ListenerTarget, event_name: &str, options: ListenerOptions) {
        self.listeners
            .borrow_mut()
            .push((target, event_name.to_string(), options));
    }

    fn take_queued_events(&self) -> Vec<String> {
        std::mem::take(&mut *self.queued.borrow_mut())
    }

    fn emit(&self, signal: Signal<N>) {
        self.signals.borrow_mut().push(signal);
    }

    fn request_idle(&self, callback: Box<dyn FnOnce()>) {
        self.idle.borrow_mut().push(callback);
    }

    fn observe_intersection(&self, node: &N) {
        self.observed.borrow_mut().push(node.clone());
    }

    fn unobserve_intersection(&self, node: &N) {
        self.observed.borrow_mut().retain(|observed| observed != node);
    }

    fn report_error(&self, error: &LoaderError) {
        debug!(target = "qloader", error = %error, "recorded unhandled error");
        self.errors.borrow_mut().push(error.to_string());
    }
}

