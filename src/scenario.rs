//! Headless replay of a page: discover the handlers it declares, stub them
//! with logging handlers, and drive the loader through a scripted sequence.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::dom::{DocumentTree, HtmlDocument, HtmlNode, ReadyState};
use crate::loader::event::{Event, IntersectionEntry};
use crate::loader::qrl::{container_base, split_references, HandlerRef, BASE_ATTR, CONTAINER_ATTR};
use crate::loader::Loader;
use crate::module::{sync_handler, Handler, Module, ModuleRegistry};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Fire a DOM event at the element with `target` as its id.
    Event {
        #[serde(rename = "type")]
        event_type: String,
        target: Option<String>,
        #[serde(default = "default_bubbles")]
        bubbles: bool,
    },
    Visible { target: String },
    Remove { target: String },
    Ready { state: ReadyState },
}

fn default_bubbles() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).context("failed to parse scenario")
    }
}

/// Handler references found in a page.
#[derive(Debug, Default)]
pub struct PageManifest {
    /// Event names used by `on*:` attributes.
    pub events: BTreeSet<String>,
    /// Module URL -> exported symbols referenced.
    pub modules: BTreeMap<Url, BTreeSet<String>>,
    /// Container -> highest local table index referenced.
    pub local_tables: Vec<(HtmlNode, usize)>,
}

/// Collect every handler reference declared in `doc`. Malformed references
/// are logged and skipped.
pub fn scan_page(doc: &HtmlDocument) -> PageManifest {
    let mut manifest = PageManifest::default();
    let mut locals: Vec<(HtmlNode, usize)> = Vec::new();

    for element in doc.elements() {
        for (name, value) in doc.attributes(&element) {
            let Some(event_name) = listener_event_name(&name) else {
                continue;
            };
            manifest.events.insert(event_name.to_string());

            let Some(container) = doc.closest(&element, CONTAINER_ATTR) else {
                warn!(target = "qloader", attribute = %name, "handler outside any container");
                continue;
            };
            let base = match container_base(
                &doc.base_uri(),
                doc.get_attribute(&container, BASE_ATTR).as_deref(),
            ) {
                Ok(base) => base,
                Err(err) => {
                    warn!(target = "qloader", error = %err, "skipping container");
                    continue;
                }
            };

            for reference in split_references(&value) {
                match HandlerRef::parse(reference, &base) {
                    Ok(parsed) if parsed.is_local() => {
                        let index = parsed.local_index().unwrap_or_default();
                        match locals.iter_mut().find(|(node, _)| *node == container) {
                            Some((_, max)) => *max = (*max).max(index),
                            None => locals.push((container.clone(), index)),
                        }
                    }
                    Ok(parsed) => {
                        manifest
                            .modules
                            .entry(parsed.module_url())
                            .or_default()
                            .insert(parsed.symbol);
                    }
                    Err(err) => warn!(target = "qloader", error = %err, "skipping reference"),
                }
            }
        }
    }

    manifest.local_tables = locals;
    manifest
}

/// `on:click` / `on-document:click` / `on-window:click` -> `click`.
fn listener_event_name(attribute: &str) -> Option<&str> {
    let (prefix, event_name) = attribute.split_once(':')?;
    match prefix {
        "on" | "on-document" | "on-window" if !event_name.is_empty() => Some(event_name),
        _ => None,
    }
}

/// Counts handler invocations made through [`stub_handlers`].
#[derive(Debug, Default, Clone)]
pub struct InvocationCounter(Rc<Cell<usize>>);

impl InvocationCounter {
    pub fn get(&self) -> usize {
        self.0.get()
    }

    fn handler(&self, symbol: String) -> Handler<HtmlNode> {
        let counter = Rc::clone(&self.0);
        sync_handler(move |event: Rc<Event<HtmlNode>>, element| {
            counter.set(counter.get() + 1);
            info!(
                target = "qloader",
                symbol = %symbol,
                event = event.event_type(),
                element = ?element,
                "handler invoked"
            );
            Ok(())
        })
    }
}

/// Back every reference in `manifest` with a logging handler.
pub fn stub_handlers(
    manifest: &PageManifest,
    loader: &Loader<HtmlDocument>,
    registry: &ModuleRegistry<HtmlNode>,
    counter: &InvocationCounter,
) {
    for (url, symbols) in &manifest.modules {
        let module = symbols.iter().fold(Module::new(), |module, symbol| {
            module.export(symbol.clone(), counter.handler(symbol.clone()))
        });
        registry.insert(url.clone(), module);
    }
    for (container, max_index) in &manifest.local_tables {
        let handlers = (0..=*max_index)
            .map(|index| counter.handler(format!("#{index}")))
            .collect();
        loader.state().set_local_handlers(container, handlers);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub skipped: usize,
}

/// Drive `loader` through `scenario`, the way a browser would deliver events
/// to the listeners the loader installed.
pub async fn replay(loader: &Loader<HtmlDocument>, scenario: &Scenario) -> Result<ReplaySummary> {
    let doc = Rc::clone(loader.document());
    let mut summary = ReplaySummary::default();

    for step in &scenario.steps {
        match step {
            Step::Event {
                event_type,
                target,
                bubbles,
            } => {
                if !loader.state().is_registered(event_type) {
                    warn!(target = "qloader", event = %event_type, "no listener installed; event ignored");
                    summary.skipped += 1;
                    continue;
                }
                let target = target.as_deref().map(|id| element(&doc, id)).transpose()?;
                let event = Rc::new(Event::new(event_type.clone(), target).with_bubbles(*bubbles));
                let outcome = loader.process_document_event(Rc::clone(&event)).await;
                if event.bubbles() && !outcome.propagation_stopped {
                    loader.process_window_event(event).await;
                }
                info!(
                    target = "qloader",
                    event = %event_type,
                    default_prevented = outcome.default_prevented,
                    "event delivered"
                );
                summary.events += 1;
            }
            Step::Visible { target } => {
                let node = element(&doc, target)?;
                loader
                    .process_intersections(vec![IntersectionEntry::intersecting(node)])
                    .await;
            }
            Step::Remove { target } => {
                let node = element(&doc, target)?;
                doc.remove(&node);
            }
            Step::Ready { state } => {
                doc.set_ready_state(*state);
                loader.process_ready_state_change();
            }
        }
    }

    Ok(summary)
}

fn element(doc: &HtmlDocument, id: &str) -> Result<HtmlNode> {
    doc.get_element_by_id(id)
        .ok_or_else(|| anyhow!("no element with id `{id}`"))
}
