use std::cell::Cell;
use std::fmt::Debug;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{HostEnvironment, ListenerOptions, ListenerTarget, Signal};
use crate::loader::error::LoaderError;

/// Host for headless runs: everything is logged and idle callbacks run on a
/// local tokio task after `idle_timeout`.
///
/// `request_idle` spawns with `tokio::task::spawn_local`, so the loader must
/// be driven from inside a `LocalSet`.
pub struct LoggingHost {
    idle_timeout: Duration,
    queued: Vec<String>,
    taken: Cell<bool>,
    errors: Cell<usize>,
}

impl LoggingHost {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            queued: Vec::new(),
            taken: Cell::new(false),
            errors: Cell::new(0),
        }
    }

    pub fn with_queued_events(mut self, names: Vec<String>) -> Self {
        self.queued = names;
        self
    }

    pub fn error_count(&self) -> usize {
        self.errors.get()
    }
}

impl<N: Debug + 'static> HostEnvironment<N> for LoggingHost {
    fn add_event_listener(&self, target: ListenerTarget, event_name: &str, options: ListenerOptions) {
        debug!(
            target = "qloader",
            listener_target = ?target,
            event = event_name,
            capture = options.capture,
            "addEventListener"
        );
    }

    fn take_queued_events(&self) -> Vec<String> {
        if self.taken.replace(true) {
            Vec::new()
        } else {
            self.queued.clone()
        }
    }

    fn emit(&self, signal: Signal<N>) {
        match signal {
            Signal::Symbol {
                symbol,
                element,
                req_time,
            } => info!(
                target = "qloader",
                symbol = %symbol,
                element = ?element,
                waited_us = req_time.elapsed().as_micros() as u64,
                "qsymbol"
            ),
            other => info!(target = "qloader", signal = other.event_name(), "signal"),
        }
    }

    fn request_idle(&self, callback: Box<dyn FnOnce()>) {
        let delay = self.idle_timeout;
        tokio::task::spawn_local(async move {
            sleep(delay).await;
            callback();
        });
    }

    fn observe_intersection(&self, node: &N) {
        debug!(target = "qloader", element = ?node, "observing intersection");
    }

    fn unobserve_intersection(&self, node: &N) {
        debug!(target = "qloader", element = ?node, "unobserving intersection");
    }

    fn report_error(&self, error: &LoaderError) {
        self.errors.set(self.errors.get() + 1);
        warn!(target = "qloader", error = %error, "unhandled rejection");
    }
}
