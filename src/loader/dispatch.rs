use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, trace};
use url::Url;

use super::context::DispatchContext;
use super::error::LoaderError;
use super::event::{camel_to_kebab, Event};
use super::qrl::{prevent_default_attribute, HandlerRef, Scope};
use super::resolver::{ensure_container_state, resolve, Resolved};
use super::Loader;
use crate::dom::DocumentTree;
use crate::host::Signal;
use crate::module::Handler;

/// What happened to an event while the loader handled it, so the host can
/// mirror it onto the native event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl DispatchOutcome {
    fn of<N>(event: &Event<N>) -> Self {
        Self {
            default_prevented: event.default_prevented(),
            propagation_stopped: event.propagation_stopped(),
        }
    }
}

/// A handler lookup that has finished, successfully or not.
struct Invocation<N> {
    symbol: String,
    url: Option<Url>,
    handler: Result<Handler<N>, LoaderError>,
    /// Set for external symbols; announced through `qsymbol`.
    requested_at: Option<Instant>,
}

impl<D: DocumentTree> Loader<D> {
    /// Entry point for the capturing document listener.
    ///
    /// Document-scoped listeners for the event are broadcast first, then the
    /// event walks up from its target. Failures go to the host's error channel.
    pub async fn process_document_event(&self, event: Rc<Event<D::Node>>) -> DispatchOutcome {
        let event_name = camel_to_kebab(event.event_type());
        self.broadcast(Scope::Document, &event, &event_name).await;
        if let Err(err) = self.bubble(&event, &event_name).await {
            self.report(err);
        }
        DispatchOutcome::of(&event)
    }

    /// Entry point for the window listener.
    pub async fn process_window_event(&self, event: Rc<Event<D::Node>>) -> DispatchOutcome {
        let event_name = camel_to_kebab(event.event_type());
        self.broadcast(Scope::Window, &event, &event_name).await;
        DispatchOutcome::of(&event)
    }

    async fn bubble(&self, event: &Rc<Event<D::Node>>, event_name: &str) -> Result<(), LoaderError> {
        let mut element = event
            .target()
            .filter(|target| self.doc.is_element(target))
            .cloned();
        while let Some(current) = element {
            self.dispatch(&current, Scope::Element, event, event_name)
                .await?;
            element = if event.bubbles() && !event.propagation_stopped() {
                self.doc.parent_element(&current)
            } else {
                None
            };
        }
        Ok(())
    }

    /// Run everything `element` declares for `event_name` in `scope`, one
    /// entry at a time. The first failing entry stops the rest.
    pub async fn dispatch(
        &self,
        element: &D::Node,
        scope: Scope,
        event: &Rc<Event<D::Node>>,
        event_name: &str,
    ) -> Result<(), LoaderError> {
        if self
            .doc
            .has_attribute(element, &prevent_default_attribute(event_name))
        {
            event.prevent_default();
        }

        let resolved = match resolve(&*self.doc, &self.state, element, scope, event_name)? {
            Some(resolved) => resolved,
            None => return Ok(()),
        };

        match resolved {
            Resolved::Bound(bindings) => {
                for binding in bindings {
                    let invocation = Invocation {
                        symbol: binding.symbol,
                        url: binding.url,
                        handler: Ok(binding.handler),
                        requested_at: None,
                    };
                    self.invoke(element, event, invocation).await?;
                }
            }
            Resolved::Declared {
                container,
                base,
                references,
            } => {
                for reference in references {
                    let reference = HandlerRef::parse(&reference, &base)?;
                    let invocation = self.lookup(&container, reference).await?;
                    self.invoke(element, event, invocation).await?;
                }
            }
        }
        Ok(())
    }

    async fn lookup(
        &self,
        container: &D::Node,
        reference: HandlerRef,
    ) -> Result<Invocation<D::Node>, LoaderError> {
        let requested_at = Instant::now();

        if reference.is_local() {
            let handler = reference
                .local_index()
                .and_then(|index| self.state.local_handler(container, index))
                .ok_or_else(|| LoaderError::MissingLocalHandler {
                    symbol: reference.symbol.clone(),
                });
            return Ok(Invocation {
                symbol: reference.symbol,
                url: Some(reference.url),
                handler,
                requested_at: None,
            });
        }

        let module_url = reference.module_url();
        let module = self.modules.import(&module_url);
        ensure_container_state(&*self.doc, &self.state, container)?;
        let module = module.await.map_err(|source| LoaderError::ModuleLoad {
            url: module_url.clone(),
            source,
        })?;
        trace!(target = "qloader", url = %module_url, symbol = %reference.symbol, "module loaded");

        let handler = module
            .get(&reference.symbol)
            .ok_or_else(|| LoaderError::MissingExport {
                url: module_url,
                symbol: reference.symbol.clone(),
            });
        Ok(Invocation {
            symbol: reference.symbol,
            url: Some(reference.url),
            handler,
            requested_at: Some(requested_at),
        })
    }

    async fn invoke(
        &self,
        element: &D::Node,
        event: &Rc<Event<D::Node>>,
        invocation: Invocation<D::Node>,
    ) -> Result<(), LoaderError> {
        if !self.doc.is_connected(element) {
            debug!(target = "qloader", element = ?element, symbol = %invocation.symbol, "skipping handler of detached element");
            return Ok(());
        }

        let _guard = self.state.context().enter(DispatchContext {
            element: element.clone(),
            event: Rc::clone(event),
            url: invocation.url,
        });

        if let Some(req_time) = invocation.requested_at {
            self.host.emit(Signal::Symbol {
                symbol: invocation.symbol.clone(),
                element: element.clone(),
                req_time,
            });
        }

        let handler = invocation.handler?;
        handler(Rc::clone(event), element.clone())
            .await
            .map_err(|source| LoaderError::Handler {
                symbol: invocation.symbol,
                source,
            })
    }
}
