// Library exports for the loader and its test doubles

pub mod config;
pub mod dom;
pub mod host;
pub mod loader;
pub mod module;
pub mod scenario;

// Re-export commonly used types for tests
pub use config::LoaderConfig;
pub use dom::{DocumentTree, HtmlDocument, HtmlNode, ReadyState};
pub use host::{HostEnvironment, ListenerOptions, ListenerTarget, LoggingHost, RecordingHost, Signal};
pub use loader::{
    DispatchContext, DispatchOutcome, DocumentState, Event, EventDetail, EventsHook,
    IntersectionEntry, ListenerBinding, Loader, LoaderError, Scope,
};
pub use module::{handler, sync_handler, Handler, Module, ModuleLoader, ModuleRegistry};
