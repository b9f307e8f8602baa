use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use folio_protocol::{
    ElementId, EventKind, Handler, Host, HostEvent, IntersectionEntry, ListenerId, Observation,
    ScrollBehavior, Target, ViewportMetrics,
};

enum Registration {
    Event { target: Target, kind: EventKind },
    Observer(Observation),
}

/// A scripted window: metrics, clock and visibility are set by the caller,
/// scroll requests are recorded, events are dispatched by hand.
pub struct HeadlessHost {
    metrics: Cell<ViewportMetrics>,
    visible: Cell<bool>,
    now: Cell<f64>,
    scrolls: RefCell<Vec<(f64, ScrollBehavior)>>,
    listeners: RefCell<BTreeMap<ListenerId, (Registration, Handler)>>,
    next_id: Cell<u64>,
}

impl HeadlessHost {
    pub fn new(metrics: ViewportMetrics) -> Self {
        Self {
            metrics: Cell::new(metrics),
            visible: Cell::new(true),
            now: Cell::new(0.0),
            scrolls: RefCell::new(Vec::new()),
            listeners: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// A 1280×`height` window over a document of `scroll_height`.
    pub fn with_viewport(height: f64, scroll_height: f64) -> Self {
        Self::new(ViewportMetrics {
            width: 1280.0,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
            scroll_height,
            scroll_width: 1280.0,
        })
    }

    pub fn set_metrics(&self, metrics: ViewportMetrics) {
        self.metrics.set(metrics);
    }

    pub fn set_scroll_y(&self, y: f64) {
        let mut m = self.metrics.get();
        m.scroll_y = y;
        self.metrics.set(m);
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    pub fn set_now(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    /// Every `scroll_to` call so far.
    pub fn scrolls(&self) -> Vec<(f64, ScrollBehavior)> {
        self.scrolls.borrow().clone()
    }

    pub fn last_scroll(&self) -> Option<(f64, ScrollBehavior)> {
        self.scrolls.borrow().last().copied()
    }

    /// Number of live listeners and observers.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of live event listeners for `kind` on `target`.
    pub fn listeners_on(&self, target: Target, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .values()
            .filter(|(reg, _)| {
                matches!(reg, Registration::Event { target: t, kind: k } if *t == target && *k == kind)
            })
            .count()
    }

    /// Deliver `event` to every listener registered for its kind on `target`.
    pub fn dispatch(&self, target: Target, event: &HostEvent) {
        let Some(kind) = event.kind() else {
            return;
        };
        let handlers: Vec<Handler> = self
            .listeners
            .borrow()
            .values()
            .filter(|(reg, _)| {
                matches!(reg, Registration::Event { target: t, kind: k } if *t == target && *k == kind)
            })
            .map(|(_, h)| Handler::clone(h))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Notify mutation observers attached to `target`.
    pub fn mutate(&self, target: Target) {
        let handlers: Vec<Handler> = self
            .listeners
            .borrow()
            .values()
            .filter(|(reg, _)| {
                matches!(reg, Registration::Observer(Observation::Mutations { target: t, .. }) if *t == target)
            })
            .map(|(_, h)| Handler::clone(h))
            .collect();
        for handler in handlers {
            handler(&HostEvent::Mutation);
        }
    }

    /// Report intersection changes to observers watching those elements.
    pub fn intersect(&self, changes: &[(ElementId, bool)]) {
        let observers: Vec<(Vec<ElementId>, Handler)> = self
            .listeners
            .borrow()
            .values()
            .filter_map(|(reg, h)| match reg {
                Registration::Observer(Observation::Intersections { targets, .. }) => {
                    Some((targets.clone(), Handler::clone(h)))
                }
                _ => None,
            })
            .collect();
        for (targets, handler) in observers {
            let entries: Vec<IntersectionEntry> = changes
                .iter()
                .filter(|(id, _)| targets.contains(id))
                .map(|&(target, is_intersecting)| IntersectionEntry {
                    target,
                    is_intersecting,
                })
                .collect();
            if !entries.is_empty() {
                handler(&HostEvent::Intersection(entries));
            }
        }
    }

    fn register(&self, registration: Registration, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().insert(id, (registration, handler));
        id
    }
}

impl Host for HeadlessHost {
    fn metrics(&self) -> ViewportMetrics {
        self.metrics.get()
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        self.scrolls.borrow_mut().push((top, behavior));
        let mut m = self.metrics.get();
        m.scroll_y = top.clamp(0.0, (m.scroll_height - m.height).max(0.0));
        self.metrics.set(m);
    }

    fn document_visible(&self) -> bool {
        self.visible.get()
    }

    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn listen(&self, target: Target, kind: EventKind, handler: Handler) -> ListenerId {
        self.register(Registration::Event { target, kind }, handler)
    }

    fn observe(&self, observation: Observation, handler: Handler) -> ListenerId {
        self.register(Registration::Observer(observation), handler)
    }

    fn unlisten(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn dispatch_reaches_matching_listener_only() {
        let host = HeadlessHost::with_viewport(800.0, 4000.0);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = host.listen(
            Target::Window,
            EventKind::Scroll,
            Rc::new(move |_| h.set(h.get() + 1)),
        );
        host.dispatch(Target::Window, &HostEvent::Scroll);
        host.dispatch(Target::Document, &HostEvent::Scroll);
        host.dispatch(Target::Window, &HostEvent::Resize);
        assert_eq!(hits.get(), 1);
        host.unlisten(id);
        host.dispatch(Target::Window, &HostEvent::Scroll);
        assert_eq!(hits.get(), 1);
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn scroll_to_is_recorded_and_clamped() {
        let host = HeadlessHost::with_viewport(800.0, 2000.0);
        host.scroll_to(5000.0, ScrollBehavior::Smooth);
        assert_eq!(host.metrics().scroll_y, 1200.0);
        assert_eq!(host.last_scroll(), Some((5000.0, ScrollBehavior::Smooth)));
    }
}
