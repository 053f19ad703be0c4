//! Deferred event binding.
//!
//! A [`Loader`] installs one document and one window listener per event type
//! in use and, when an event arrives, finds the handler references declared
//! on the elements it touches, loads the code they point at and runs it.

use std::rc::Rc;

use tracing::{debug, error, info};

pub mod broadcast;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod payload;
pub mod qrl;
pub mod resolver;
pub mod state;
pub mod visibility;

use crate::dom::DocumentTree;
use crate::host::{HostEnvironment, ListenerOptions, ListenerTarget, Signal};
use crate::module::ModuleLoader;

pub use context::{ContextStack, DispatchContext};
pub use dispatch::DispatchOutcome;
pub use error::LoaderError;
pub use event::{Event, EventDetail, IntersectionEntry, VISIBLE_EVENT};
pub use qrl::Scope;
pub use state::{DocumentState, ListenerBinding};

const READY_STATE_CHANGE: &str = "readystatechange";

pub struct Loader<D: DocumentTree> {
    doc: Rc<D>,
    host: Rc<dyn HostEnvironment<D::Node>>,
    modules: Rc<dyn ModuleLoader<D::Node>>,
    state: Rc<DocumentState<D::Node>>,
}

impl<D: DocumentTree> Loader<D> {
    pub fn new(
        doc: Rc<D>,
        host: Rc<dyn HostEnvironment<D::Node>>,
        modules: Rc<dyn ModuleLoader<D::Node>>,
    ) -> Self {
        Self {
            doc,
            host,
            modules,
            state: Rc::new(DocumentState::new()),
        }
    }

    /// Use a state object created ahead of time, e.g. so handlers can capture
    /// its context stack before the loader exists.
    pub fn with_state(mut self, state: Rc<DocumentState<D::Node>>) -> Self {
        self.state = state;
        self
    }

    pub fn document(&self) -> &Rc<D> {
        &self.doc
    }

    pub fn state(&self) -> &Rc<DocumentState<D::Node>> {
        &self.state
    }

    pub fn context(&self) -> Rc<ContextStack<D::Node>> {
        self.state.context()
    }

    /// Install the loader on its document.
    ///
    /// Returns `None` when the document already carries a loader. Otherwise
    /// queued event names are registered, the readiness watcher is armed and
    /// readiness is checked once. `already_initialized` suppresses the
    /// readiness transition entirely.
    pub fn bootstrap(self, already_initialized: bool) -> Option<Rc<Self>> {
        if self.doc.loader_installed() {
            debug!(target = "qloader", "loader already installed on document");
            return None;
        }
        self.doc.mark_loader_installed();
        if already_initialized {
            self.state.set_initialized();
        }

        let loader = Rc::new(self);
        let queued = loader.host.take_queued_events();
        if !queued.is_empty() {
            debug!(target = "qloader", events = ?queued, "registering queued events");
            loader.register(&queued);
        }
        loader.host.add_event_listener(
            ListenerTarget::Document,
            READY_STATE_CHANGE,
            ListenerOptions::BUBBLE,
        );
        loader.process_ready_state_change();
        Some(loader)
    }

    /// Make sure a global listener exists for each of `event_names`.
    pub fn register<I>(&self, event_names: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in event_names {
            let name = name.as_ref();
            if self.state.is_registered(name) {
                continue;
            }
            self.host
                .add_event_listener(ListenerTarget::Document, name, ListenerOptions::CAPTURE);
            self.host
                .add_event_listener(ListenerTarget::Window, name, ListenerOptions::BUBBLE);
            self.state.insert_event(name);
            debug!(target = "qloader", event = name, "installed global listeners");
        }
    }

    /// Handle for code loaded after bootstrap to request more event types.
    pub fn events_hook(self: &Rc<Self>) -> EventsHook<D> {
        EventsHook {
            loader: Rc::clone(self),
        }
    }

    /// `readystatechange` listener. Fires the init sequence the first time
    /// the document is interactive or complete.
    pub fn process_ready_state_change(&self) {
        let ready_state = self.doc.ready_state();
        if self.state.is_initialized() || !ready_state.is_ready() {
            return;
        }
        self.state.set_initialized();
        info!(target = "qloader", ready_state = ?ready_state, "document ready");

        self.host.emit(Signal::Init);
        let host = Rc::clone(&self.host);
        self.host
            .request_idle(Box::new(move || host.emit(Signal::Idle)));

        if self.state.is_registered(VISIBLE_EVENT) {
            self.start_visibility();
        }
    }

    pub(crate) fn report(&self, err: LoaderError) {
        error!(target = "qloader", error = %err, "unhandled loader error");
        self.host.report_error(&err);
    }
}

/// Late-registration hook, the `push` side of the loader.
pub struct EventsHook<D: DocumentTree> {
    loader: Rc<Loader<D>>,
}

impl<D: DocumentTree> Clone for EventsHook<D> {
    fn clone(&self) -> Self {
        Self {
            loader: Rc::clone(&self.loader),
        }
    }
}

impl<D: DocumentTree> EventsHook<D> {
    pub fn push<I>(&self, event_names: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.loader.register(event_names);
    }
}
