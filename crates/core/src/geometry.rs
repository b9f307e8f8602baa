use std::rc::Rc;

use folio_protocol::{
    AbsoluteOffset, BoxMetrics, DomTree, ElementId, ElementPosition, Host, Rect, Scheduler,
    ViewportMetrics,
};

/// The capabilities every component is built from.
#[derive(Clone)]
pub struct Env {
    pub dom: Rc<dyn DomTree>,
    pub host: Rc<dyn Host>,
    pub scheduler: Rc<dyn Scheduler>,
}

impl Env {
    pub fn new(dom: Rc<dyn DomTree>, host: Rc<dyn Host>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            dom,
            host,
            scheduler,
        }
    }

    /// A sampler over the current layout.
    pub fn sampler(&self) -> GeometrySampler<'_> {
        GeometrySampler::new(self.dom.as_ref(), self.host.metrics())
    }
}

/// One consistent read of layout geometry.
///
/// Window metrics are read once at construction; element boxes are read
/// on each call. Missing or detached elements sample as a zero box.
pub struct GeometrySampler<'a> {
    dom: &'a dyn DomTree,
    metrics: ViewportMetrics,
}

impl<'a> GeometrySampler<'a> {
    pub fn new(dom: &'a dyn DomTree, metrics: ViewportMetrics) -> Self {
        Self { dom, metrics }
    }

    pub fn metrics(&self) -> ViewportMetrics {
        self.metrics
    }

    pub fn rect(&self, node: ElementId) -> Rect {
        self.dom.bounding_rect(node).unwrap_or(Rect::ZERO)
    }

    /// Rounded viewport box plus document-absolute offset.
    pub fn position(&self, node: ElementId) -> ElementPosition {
        match self.dom.bounding_rect(node) {
            Some(rect) => self.position_of(&rect),
            None => ElementPosition::ZEROED,
        }
    }

    pub fn position_of(&self, rect: &Rect) -> ElementPosition {
        ElementPosition {
            viewport: BoxMetrics::rounded(rect),
            absolute: AbsoluteOffset {
                top: (rect.top() + self.metrics.scroll_y).round(),
                left: (rect.left() + self.metrics.scroll_x).round(),
            },
        }
    }
}
