use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use folio_protocol::{
    EventKind, Handler, Host, HostEvent, IntersectionEntry, ListenerId, MutationFilter,
    Observation, ScrollBehavior, Target, ViewportMetrics,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Element, Event, EventTarget, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, MouseEvent, MutationObserver,
    MutationObserverInit, Node, ScrollToOptions, VisibilityState, Window,
};

use crate::dom::BrowserDom;

type EventClosure = Closure<dyn FnMut(Event)>;
type ObserverClosure = Closure<dyn FnMut(js_sys::Array)>;

enum Registration {
    Event {
        target: EventTarget,
        name: &'static str,
        closure: EventClosure,
    },
    Mutations {
        observer: MutationObserver,
        _closure: ObserverClosure,
    },
    Intersections {
        observer: IntersectionObserver,
        _closure: ObserverClosure,
    },
}

impl Registration {
    fn detach(self) {
        match self {
            Registration::Event {
                target,
                name,
                closure,
            } => {
                target
                    .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                    .ok();
            }
            Registration::Mutations { observer, .. } => observer.disconnect(),
            Registration::Intersections { observer, .. } => observer.disconnect(),
        }
    }
}

fn event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Scroll => "scroll",
        EventKind::Resize => "resize",
        EventKind::Click => "click",
        EventKind::PointerDown => "pointerdown",
        EventKind::PointerMove => "pointermove",
        EventKind::PointerUp => "pointerup",
        EventKind::PointerLeave => "pointerleave",
    }
}

fn host_event(kind: EventKind, event: &Event) -> HostEvent {
    let client_y = || {
        event
            .dyn_ref::<MouseEvent>()
            .map_or(0.0, |e| f64::from(e.client_y()))
    };
    match kind {
        EventKind::Scroll => HostEvent::Scroll,
        EventKind::Resize => HostEvent::Resize,
        EventKind::Click => HostEvent::Click {
            client_y: client_y(),
        },
        EventKind::PointerDown => {
            // Keeps the drag from selecting page text.
            event.prevent_default();
            HostEvent::PointerDown {
                client_y: client_y(),
            }
        }
        EventKind::PointerMove => HostEvent::PointerMove {
            client_y: client_y(),
        },
        EventKind::PointerUp => HostEvent::PointerUp,
        EventKind::PointerLeave => HostEvent::PointerLeave,
    }
}

/// The browser window behind [`Host`].
///
/// Listener closures and observers live in the registration table until
/// `unlisten` drops them.
pub struct BrowserHost {
    window: Window,
    dom: Rc<BrowserDom>,
    registrations: RefCell<HashMap<ListenerId, Registration>>,
    next_id: Cell<u64>,
}

impl BrowserHost {
    pub fn new(window: Window, dom: Rc<BrowserDom>) -> Self {
        Self {
            window,
            dom,
            registrations: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    fn event_target(&self, target: Target) -> Option<EventTarget> {
        match target {
            Target::Window => Some(self.window.clone().into()),
            Target::Document => Some(self.dom.document().clone().into()),
            Target::Body => self.dom.document().body().map(Into::into),
            Target::Element(id) => self.dom.element(id).map(Into::into),
        }
    }

    fn node(&self, target: Target) -> Option<Node> {
        match target {
            Target::Window | Target::Document => Some(self.dom.document().clone().into()),
            Target::Body => self.dom.document().body().map(Into::into),
            Target::Element(id) => self.dom.element(id).map(Into::into),
        }
    }

    fn register(&self, registration: Option<Registration>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        if let Some(registration) = registration {
            self.registrations.borrow_mut().insert(id, registration);
        }
        id
    }

    fn observe_mutations(
        &self,
        target: Target,
        filter: &MutationFilter,
        handler: Handler,
    ) -> Result<Registration, JsValue> {
        let node = self
            .node(target)
            .ok_or_else(|| JsValue::from_str("mutation target not found"))?;
        let closure: ObserverClosure = Closure::new(move |_records: js_sys::Array| {
            handler(&HostEvent::Mutation);
        });
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;

        let init = MutationObserverInit::new();
        init.set_child_list(filter.child_list);
        init.set_subtree(filter.subtree);
        init.set_attributes(filter.attributes);
        init.set_character_data(filter.character_data);
        if !filter.attribute_filter.is_empty() {
            let names: js_sys::Array = filter
                .attribute_filter
                .iter()
                .map(|name| JsValue::from_str(name))
                .collect();
            init.set_attribute_filter(&names);
        }
        observer.observe_with_options(&node, &init)?;
        Ok(Registration::Mutations {
            observer,
            _closure: closure,
        })
    }

    fn observe_intersections(
        &self,
        targets: &[folio_protocol::ElementId],
        threshold: f64,
        root_margin: &str,
        handler: Handler,
    ) -> Result<Registration, JsValue> {
        let dom = Rc::clone(&self.dom);
        let closure: ObserverClosure = Closure::new(move |entries: js_sys::Array| {
            let entries: Vec<IntersectionEntry> = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| IntersectionEntry {
                    target: dom.id_of(&entry.target()),
                    is_intersecting: entry.is_intersecting(),
                })
                .collect();
            handler(&HostEvent::Intersection(entries));
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(threshold));
        init.set_root_margin(root_margin);
        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)?;
        for element in targets.iter().filter_map(|&id| self.dom.element(id)) {
            observer.observe(&element);
        }
        Ok(Registration::Intersections {
            observer,
            _closure: closure,
        })
    }
}

/// Scroll extent of the page: the larger of the root element and the body,
/// as `(height, width)`. Quirks-mode pages report it on the body only.
fn document_extent(root: Option<(i32, i32)>, body: Option<(i32, i32)>) -> (f64, f64) {
    let (rh, rw) = root.unwrap_or((0, 0));
    let (bh, bw) = body.unwrap_or((0, 0));
    (f64::from(rh.max(bh)), f64::from(rw.max(bw)))
}

impl Host for BrowserHost {
    fn metrics(&self) -> ViewportMetrics {
        let window = &self.window;
        let number = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let document = self.dom.document();
        let size = |e: &Element| (e.scroll_height(), e.scroll_width());
        let (scroll_height, scroll_width) = document_extent(
            document.document_element().as_ref().map(size),
            document.body().as_deref().map(size),
        );
        ViewportMetrics {
            width: number(window.inner_width()),
            height: number(window.inner_height()),
            scroll_x: window.scroll_x().unwrap_or(0.0),
            scroll_y: window.scroll_y().unwrap_or(0.0),
            scroll_height,
            scroll_width,
        }
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn document_visible(&self) -> bool {
        self.dom.document().visibility_state() == VisibilityState::Visible
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn listen(&self, target: Target, kind: EventKind, handler: Handler) -> ListenerId {
        let Some(event_target) = self.event_target(target) else {
            tracing::warn!(?target, ?kind, "listener target not found");
            return self.register(None);
        };
        let name = event_name(kind);
        let closure: EventClosure = Closure::new(move |event: Event| {
            handler(&host_event(kind, &event));
        });
        let options = AddEventListenerOptions::new();
        options.set_passive(!matches!(kind, EventKind::PointerDown));
        let added = event_target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            closure.as_ref().unchecked_ref(),
            &options,
        );
        if let Err(err) = added {
            tracing::warn!(?err, name, "addEventListener failed");
            return self.register(None);
        }
        self.register(Some(Registration::Event {
            target: event_target,
            name,
            closure,
        }))
    }

    fn observe(&self, observation: Observation, handler: Handler) -> ListenerId {
        let registration = match &observation {
            Observation::Mutations { target, filter } => {
                self.observe_mutations(*target, filter, handler)
            }
            Observation::Intersections {
                targets,
                threshold,
                root_margin,
            } => self.observe_intersections(targets, *threshold, root_margin, handler),
        };
        match registration {
            Ok(registration) => self.register(Some(registration)),
            Err(err) => {
                tracing::warn!(?err, "observer setup failed");
                self.register(None)
            }
        }
    }

    fn unlisten(&self, id: ListenerId) {
        let registration = self.registrations.borrow_mut().remove(&id);
        if let Some(registration) = registration {
            registration.detach();
        }
    }
}

impl Drop for BrowserHost {
    fn drop(&mut self) {
        for (_, registration) in self.registrations.take() {
            registration.detach();
        }
    }
}
