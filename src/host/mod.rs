use std::time::Instant;

use crate::loader::error::LoaderError;

pub mod logging;
pub mod recording;

pub use logging::LoggingHost;
pub use recording::RecordingHost;

/// Where a global listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Document,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
}

impl ListenerOptions {
    pub const CAPTURE: Self = Self {
        capture: true,
        passive: false,
    };
    pub const BUBBLE: Self = Self {
        capture: false,
        passive: false,
    };
}

/// Custom events the loader fires on the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<N> {
    /// `qinit`: the document became interactive.
    Init,
    /// `qidle`: the host reported idle time after init.
    Idle,
    /// `qsymbol`: an external symbol is about to run.
    Symbol {
        symbol: String,
        element: N,
        req_time: Instant,
    },
}

impl<N> Signal<N> {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Init => "qinit",
            Self::Idle => "qidle",
            Self::Symbol { .. } => "qsymbol",
        }
    }
}

/// The window side of the page: listener installation, scheduling,
/// observation and error reporting.
///
/// Events arriving on listeners installed here are routed back by the host to
/// `Loader::process_document_event`, `Loader::process_window_event`,
/// `Loader::process_ready_state_change` and `Loader::process_intersections`.
pub trait HostEnvironment<N> {
    fn add_event_listener(&self, target: ListenerTarget, event_name: &str, options: ListenerOptions);

    /// Event names queued by inline scripts before the loader ran.
    fn take_queued_events(&self) -> Vec<String>;

    fn emit(&self, signal: Signal<N>);

    /// Run `callback` when idle, or after a fallback delay.
    fn request_idle(&self, callback: Box<dyn FnOnce()>);

    fn observe_intersection(&self, node: &N);

    fn unobserve_intersection(&self, node: &N);

    /// Unhandled-rejection channel.
    fn report_error(&self, error: &LoaderError);
}
