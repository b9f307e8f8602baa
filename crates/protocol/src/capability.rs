//! The capabilities the view core needs from its environment.
//!
//! The core never touches a browser API directly. It reads geometry and
//! attributes through [`DomTree`], window state and event registration
//! through [`Host`], deferred work through [`Scheduler`] and page
//! screenshots through [`Capturer`]. The wasm bridge implements these with
//! web-sys; `folio-headless` implements them in memory.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Rect, ViewportMetrics};

/// Opaque identity of an element in the display tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// The attribute selectors the core issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// `[name]`
    HasAttr(&'static str),
    /// `[name="value"]`
    AttrEquals(&'static str, &'static str),
}

impl Selector {
    pub fn to_css(self) -> String {
        match self {
            Selector::HasAttr(name) => format!("[{name}]"),
            Selector::AttrEquals(name, value) => format!("[{name}=\"{value}\"]"),
        }
    }

    /// Whether an element with the given attribute value matches.
    pub fn matches(self, value_of: impl Fn(&str) -> Option<String>) -> bool {
        match self {
            Selector::HasAttr(name) => value_of(name).is_some(),
            Selector::AttrEquals(name, expected) => value_of(name).as_deref() == Some(expected),
        }
    }
}

/// Read/write access to the live element tree.
///
/// Query results are in document order. Geometry is viewport-relative and
/// read fresh on every call.
pub trait DomTree {
    fn query_all(&self, selector: Selector) -> Vec<ElementId>;
    /// Descendants of `root` (excluding `root` itself) matching `selector`.
    fn query_within(&self, root: ElementId, selector: Selector) -> Vec<ElementId>;
    /// Whether the element is still attached to the document.
    fn contains(&self, node: ElementId) -> bool;
    fn attribute(&self, node: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: ElementId, name: &str, value: &str);
    fn remove_attribute(&self, node: ElementId, name: &str);
    /// `None` when the element is detached or unknown.
    fn bounding_rect(&self, node: ElementId) -> Option<Rect>;
    /// Inline style property (custom properties included).
    fn style(&self, node: ElementId, property: &str) -> Option<String>;
    fn set_style(&self, node: ElementId, property: &str, value: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Where a listener or observer is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Window,
    Document,
    Body,
    Element(ElementId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
    Click,
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub is_intersecting: bool,
}

/// Everything a [`Handler`] can be called with.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Scroll,
    Resize,
    Click { client_y: f64 },
    PointerDown { client_y: f64 },
    PointerMove { client_y: f64 },
    PointerUp,
    PointerLeave,
    Mutation,
    Intersection(Vec<IntersectionEntry>),
}

impl HostEvent {
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            HostEvent::Scroll => Some(EventKind::Scroll),
            HostEvent::Resize => Some(EventKind::Resize),
            HostEvent::Click { .. } => Some(EventKind::Click),
            HostEvent::PointerDown { .. } => Some(EventKind::PointerDown),
            HostEvent::PointerMove { .. } => Some(EventKind::PointerMove),
            HostEvent::PointerUp => Some(EventKind::PointerUp),
            HostEvent::PointerLeave => Some(EventKind::PointerLeave),
            HostEvent::Mutation | HostEvent::Intersection(_) => None,
        }
    }
}

/// Which mutations wake a mutation observer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationFilter {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
    pub character_data: bool,
    /// Restrict attribute notifications to these names (empty = all).
    pub attribute_filter: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Mutations {
        target: Target,
        filter: MutationFilter,
    },
    Intersections {
        targets: Vec<ElementId>,
        threshold: f64,
        root_margin: String,
    },
}

pub type Handler = Rc<dyn Fn(&HostEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Window state, scrolling and event registration.
pub trait Host {
    fn metrics(&self) -> ViewportMetrics;
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);
    /// `false` while the tab is in the background.
    fn document_visible(&self) -> bool;
    /// Wall-clock milliseconds.
    fn now_ms(&self) -> f64;
    fn listen(&self, target: Target, kind: EventKind, handler: Handler) -> ListenerId;
    fn observe(&self, observation: Observation, handler: Handler) -> ListenerId;
    /// Remove a listener or disconnect an observer. Unknown ids are ignored.
    fn unlisten(&self, id: ListenerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Next animation frame.
    Frame,
    /// Next idle period, run after `timeout_ms` at the latest.
    Idle { timeout_ms: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

pub type Task = Box<dyn FnOnce()>;

/// Deferred execution on the UI thread.
pub trait Scheduler {
    fn schedule(&self, slot: Slot, task: Task) -> TaskId;
    /// Cancel a task that has not run yet. Unknown or finished ids are ignored.
    fn cancel(&self, id: TaskId);
}

/// Size and resolution of a page screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("capture rejected: {0}")]
    Rejected(String),
    #[error("capture produced no image")]
    Empty,
}

pub type CaptureCallback = Box<dyn FnOnce(Result<String, CaptureError>)>;

/// Renders the whole document to an encoded image (a data URL).
///
/// Completion is reported through `done`, possibly after the call returns.
pub trait Capturer {
    fn capture(&self, request: CaptureRequest, done: CaptureCallback);
}
