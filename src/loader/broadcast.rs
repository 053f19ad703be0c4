use std::rc::Rc;

use super::event::Event;
use super::qrl::Scope;
use super::Loader;
use crate::dom::DocumentTree;

impl<D: DocumentTree> Loader<D> {
    /// Deliver `event` to every element declaring a `scope` listener for it,
    /// regardless of where the event originated.
    ///
    /// Targets run one after another in document order. A failing target is
    /// reported and the next one still runs.
    pub async fn broadcast(&self, scope: Scope, event: &Rc<Event<D::Node>>, event_name: &str) {
        let targets = self.doc.query_attribute(&scope.attribute(event_name));
        for target in targets {
            if let Err(err) = self.dispatch(&target, scope, event, event_name).await {
                self.report(err);
            }
        }
    }
}
