//! Typed, same-thread publish/subscribe.
//!
//! The bus is deliberately `!Send` and `!Sync`: subscribers run on the thread
//! that owns the session, synchronously, in the order events are emitted.
//! Subscribers only see `&EditorEvent`, never the session, so a handler
//! cannot trigger a nested emission.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::editing::RangeId;
use crate::geometry::ScrollDelta;
use crate::layout::VirtualWindow;
use crate::schema::{ElementId, SchemaDiff};

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The store committed a change to these view lines
    SchemaChanged(SchemaDiff),
    /// The range set or an endpoint changed; ids of the ranges now present
    SelectionChanged(Vec<RangeId>),
    /// These layout entries are materialized and should be drawn
    RenderRequested(VirtualWindow),
    /// The viewport should scroll by this much
    ScrollDeltaRequested(ScrollDelta),
    /// An element changed size outside of a structural edit
    ElementResized(ElementId),
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::SchemaChanged(_) => "schema-changed",
            EditorEvent::SelectionChanged(_) => "selection-changed",
            EditorEvent::RenderRequested(_) => "render-requested",
            EditorEvent::ScrollDeltaRequested(_) => "scroll-delta-requested",
            EditorEvent::ElementResized(_) => "element-resized",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&EditorEvent)>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
    _single_thread: PhantomData<Rc<()>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Deliver to every subscriber, in subscription order
    pub fn emit(&mut self, event: EditorEvent) {
        log::trace!("emit {}", event.name());
        for (_, handler) in &mut self.subscribers {
            handler(&event);
        }
    }

    /// Subscribe a recorder that keeps every event, for front ends that poll
    pub fn record(&mut self) -> Rc<RefCell<Vec<EditorEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        self.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delivery_in_emission_order() {
        let mut bus = EventBus::new();
        let log = bus.record();
        bus.emit(EditorEvent::ElementResized(ElementId::from_raw(1)));
        bus.emit(EditorEvent::SelectionChanged(vec![]));
        let names: Vec<_> = log.borrow().iter().map(EditorEvent::name).collect();
        assert_eq!(names, vec!["element-resized", "selection-changed"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_| *counter.borrow_mut() += 1);
        bus.emit(EditorEvent::SelectionChanged(vec![]));
        assert!(bus.unsubscribe(id));
        bus.emit(EditorEvent::SelectionChanged(vec![]));
        assert_eq!(*count.borrow(), 1);
        assert!(!bus.unsubscribe(id));
    }
}
