use std::rc::Rc;

use tracing::debug;

use super::event::{Event, EventDetail, IntersectionEntry, VISIBLE_EVENT};
use super::qrl::Scope;
use super::Loader;
use crate::dom::DocumentTree;

impl<D: DocumentTree> Loader<D> {
    /// Observe every element with an `on:qvisible` handler.
    pub(crate) fn start_visibility(&self) {
        let targets = self
            .doc
            .query_attribute(&Scope::Element.attribute(VISIBLE_EVENT));
        debug!(target = "qloader", count = targets.len(), "observing elements for visibility");
        for target in targets {
            self.state.observe(&target);
            self.host.observe_intersection(&target);
        }
    }

    /// Intersection observer callback. Each observed element gets a single
    /// `qvisible` dispatch on its first intersecting record.
    pub async fn process_intersections(&self, entries: Vec<IntersectionEntry<D::Node>>) {
        for entry in entries {
            if !entry.is_intersecting || !self.state.take_observed(&entry.target) {
                continue;
            }
            self.host.unobserve_intersection(&entry.target);
            let target = entry.target.clone();
            let event = Rc::new(Event::custom(
                VISIBLE_EVENT,
                EventDetail::Intersection(entry),
            ));
            if let Err(err) = self
                .dispatch(&target, Scope::Element, &event, VISIBLE_EVENT)
                .await
            {
                self.report(err);
            }
        }
    }
}
