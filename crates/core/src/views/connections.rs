//! Curves from technology labels to the timeline cards that use them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use folio_protocol::{
    DomTree, ElementId, EventKind, Handler, HostEvent, MutationFilter, Observation, Point, Target,
    TechName, tech_name,
};
use serde::Serialize;

use crate::attrs;
use crate::geometry::Env;
use crate::schedule::{FramePass, Subscriptions};
use crate::tech_index::TechnologyIndex;
use crate::views::tech_list::TechSelection;

/// A cubic Bézier leaving and entering horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePath {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl CurvePath {
    /// Control points a third of the horizontal distance in from each end.
    pub fn s_curve(start: Point, end: Point) -> Self {
        let dx = (end.x - start.x) / 3.0;
        Self {
            start,
            c1: Point::new(start.x + dx, start.y),
            c2: Point::new(end.x - dx, end.y),
            end,
        }
    }

    /// SVG path data: `M x1,y1 C c1x,c1y c2x,c2y x2,y2`.
    pub fn to_svg_d(&self) -> String {
        let Self { start, c1, c2, end } = self;
        format!(
            "M{},{} C{},{} {},{} {},{}",
            start.x, start.y, c1.x, c1.y, c2.x, c2.y, end.x, end.y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionLine {
    /// `line-{label ordinal}-{card ordinal}-{tech}`
    pub id: String,
    pub tech: TechName,
    pub start: Point,
    pub end: Point,
    pub highlighted: bool,
}

impl ConnectionLine {
    pub fn path(&self) -> CurvePath {
        CurvePath::s_curve(self.start, self.end)
    }
}

/// One line per (label, card) pair, sampled from current geometry.
///
/// A label starts at the midpoint of its right edge; a card is reached at
/// its centre. Labels whose technology matches no bucket yield nothing.
pub fn compute_lines(
    dom: &dyn DomTree,
    labels: &[ElementId],
    index: &TechnologyIndex,
    selection: &TechSelection,
) -> Vec<ConnectionLine> {
    let mut lines = Vec::new();
    for (label_ordinal, &label) in labels.iter().enumerate() {
        let Some(name) = dom.attribute(label, attrs::TECH_NAME).filter(|n| !n.is_empty()) else {
            continue;
        };
        let Some(cards) = index.lookup(&name).filter(|c| !c.is_empty()) else {
            continue;
        };
        let highlighted = selection.is_highlighted(&name);
        let start = dom
            .bounding_rect(label)
            .unwrap_or_default()
            .right_middle();
        let tech = TechName::from(name.as_str());
        for (card_ordinal, &card) in cards.iter().enumerate() {
            lines.push(ConnectionLine {
                id: format!("line-{label_ordinal}-{card_ordinal}-{name}"),
                tech: tech.clone(),
                start,
                end: dom.bounding_rect(card).unwrap_or_default().center(),
                highlighted,
            });
        }
    }
    lines
}

/// Marks the cards of the active technology through data attributes.
#[derive(Debug, Default)]
pub struct Highlighter {
    marked: Vec<ElementId>,
}

impl Highlighter {
    pub fn marked(&self) -> &[ElementId] {
        &self.marked
    }

    /// Unmark every card marked by the last `apply`. Returns how many.
    pub fn clear(&mut self, dom: &dyn DomTree) -> usize {
        let marked = std::mem::take(&mut self.marked);
        for &card in &marked {
            dom.remove_attribute(card, attrs::SELECTED_TECH);
            for icon in dom.query_within(card, attrs::FLAGGED_ICONS) {
                dom.remove_attribute(icon, attrs::TECH_SELECTED);
            }
        }
        marked.len()
    }

    /// Replace the previous marks with those for `active`. Returns the
    /// number of cards marked.
    pub fn apply(
        &mut self,
        dom: &dyn DomTree,
        index: &TechnologyIndex,
        active: Option<&TechName>,
    ) -> usize {
        self.clear(dom);
        let Some(active) = active else {
            return 0;
        };
        let Some(cards) = index.lookup(active) else {
            return 0;
        };
        let wanted = active.match_key();
        for &card in cards {
            dom.set_attribute(card, attrs::SELECTED_TECH, active);
            for icon in dom.query_within(card, attrs::ICONS) {
                let title = dom.attribute(icon, attrs::TITLE).unwrap_or_default();
                if tech_name::match_key(&title) == wanted {
                    dom.set_attribute(icon, attrs::TECH_SELECTED, "1");
                }
            }
            self.marked.push(card);
        }
        self.marked.len()
    }
}

pub type LineSink = Rc<dyn Fn(&[ConnectionLine])>;

/// Links the technology list to the timeline cards.
///
/// The card index is rebuilt whenever the document body reports a
/// structural change or a `data-card-technologies` edit. Line geometry is
/// recomputed at most once per frame on scroll, resize and selection
/// changes; each pass is handed to the registered sink.
///
/// Mutations only refresh the index. The sink usually writes markup under
/// the observed body, so a pass queued from here would feed itself.
pub struct ConnectionEngine {
    env: Env,
    label_root: ElementId,
    index: RefCell<TechnologyIndex>,
    selection: RefCell<TechSelection>,
    highlighter: RefCell<Highlighter>,
    lines: RefCell<Vec<ConnectionLine>>,
    sink: RefCell<Option<LineSink>>,
    frame: FramePass,
    subscriptions: Subscriptions,
    mounted: Cell<bool>,
}

impl ConnectionEngine {
    pub fn new(env: Env, label_root: ElementId) -> Rc<Self> {
        let frame = FramePass::frame(Rc::clone(&env.scheduler));
        Rc::new(Self {
            env,
            label_root,
            index: RefCell::new(TechnologyIndex::default()),
            selection: RefCell::new(TechSelection::default()),
            highlighter: RefCell::new(Highlighter::default()),
            lines: RefCell::new(Vec::new()),
            sink: RefCell::new(None),
            frame,
            subscriptions: Subscriptions::new(),
            mounted: Cell::new(false),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn set_sink(&self, sink: LineSink) {
        *self.sink.borrow_mut() = Some(sink);
    }

    pub fn mount(self: &Rc<Self>) {
        if self.mounted.replace(true) {
            return;
        }
        self.rebuild_index();
        self.recompute();

        let host = &self.env.host;
        let weak = Rc::downgrade(self);
        self.subscriptions.push(host.observe(
            Observation::Mutations {
                target: Target::Body,
                filter: MutationFilter {
                    child_list: true,
                    subtree: true,
                    attributes: true,
                    attribute_filter: vec![attrs::CARD_TECHNOLOGIES],
                    ..MutationFilter::default()
                },
            },
            Rc::new(move |_: &HostEvent| {
                if let Some(engine) = weak.upgrade() {
                    engine.rebuild_index();
                }
            }),
        ));

        let weak = Rc::downgrade(self);
        let on_layout: Handler = Rc::new(move |_: &HostEvent| {
            if let Some(engine) = weak.upgrade() {
                engine.schedule();
            }
        });
        self.subscriptions.push(host.listen(
            Target::Window,
            EventKind::Scroll,
            Rc::clone(&on_layout),
        ));
        self.subscriptions
            .push(host.listen(Target::Window, EventKind::Resize, on_layout));
    }

    /// Disconnect, drop the queued pass and take the marks off the cards.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        self.frame.cancel();
        self.subscriptions.remove_all(self.env.host.as_ref());
        self.highlighter.borrow_mut().clear(self.env.dom.as_ref());
        tracing::debug!("connection engine unmounted");
    }

    /// Rescan every card. Returns the number of distinct technologies.
    pub fn rebuild_index(&self) -> usize {
        if !self.mounted.get() {
            return 0;
        }
        let index = TechnologyIndex::build(self.env.dom.as_ref());
        let keys = index.len();
        tracing::debug!(keys, "technology index rebuilt");
        *self.index.borrow_mut() = index;
        keys
    }

    pub fn index(&self) -> TechnologyIndex {
        self.index.borrow().clone()
    }

    pub fn selection(&self) -> TechSelection {
        self.selection.borrow().clone()
    }

    /// Lines from the last pass.
    pub fn lines(&self) -> Vec<ConnectionLine> {
        self.lines.borrow().clone()
    }

    pub fn hover(self: &Rc<Self>, name: Option<TechName>) {
        let changed = self.selection.borrow_mut().hover(name);
        if changed {
            self.selection_changed();
        }
    }

    pub fn leave(self: &Rc<Self>) {
        let changed = self.selection.borrow_mut().leave();
        if changed {
            self.selection_changed();
        }
    }

    pub fn toggle(self: &Rc<Self>, name: TechName) {
        self.selection.borrow_mut().toggle(name);
        self.selection_changed();
    }

    /// Queue a geometry pass for the next frame.
    pub fn schedule(self: &Rc<Self>) {
        if !self.mounted.get() {
            return;
        }
        let weak = Rc::downgrade(self);
        self.frame.request(move || {
            if let Some(engine) = weak.upgrade() {
                engine.recompute();
            }
        });
    }

    /// Sample label and card geometry, store the lines and hand them to
    /// the sink. `None` when unmounted.
    pub fn recompute(&self) -> Option<usize> {
        if !self.mounted.get() {
            return None;
        }
        let dom = self.env.dom.as_ref();
        let labels = dom.query_within(self.label_root, attrs::LABELS);
        let lines = compute_lines(
            dom,
            &labels,
            &self.index.borrow(),
            &self.selection.borrow(),
        );
        let count = lines.len();
        tracing::trace!(labels = labels.len(), lines = count, "connection pass");
        *self.lines.borrow_mut() = lines;

        let sink = self.sink.borrow().clone();
        if let Some(sink) = sink {
            let lines = self.lines.borrow().clone();
            sink(&lines);
        }
        Some(count)
    }

    fn selection_changed(self: &Rc<Self>) {
        if !self.mounted.get() {
            return;
        }
        let active = self.selection.borrow().active().cloned();
        let marked = self.highlighter.borrow_mut().apply(
            self.env.dom.as_ref(),
            &self.index.borrow(),
            active.as_ref(),
        );
        tracing::debug!(active = ?active.as_ref().map(TechName::as_str), marked, "highlight");
        self.schedule();
    }
}

impl Drop for ConnectionEngine {
    fn drop(&mut self) {
        self.subscriptions.remove_all(self.env.host.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_headless::HeadlessDom;
    use folio_protocol::Rect;

    #[test]
    fn s_curve_controls_sit_a_third_in() {
        let path = CurvePath::s_curve(Point::new(0.0, 10.0), Point::new(300.0, 70.0));
        assert_eq!(path.c1, Point::new(100.0, 10.0));
        assert_eq!(path.c2, Point::new(200.0, 70.0));
        assert_eq!(path.to_svg_d(), "M0,10 C100,10 200,70 300,70");
    }

    #[test]
    fn leftward_curve() {
        let path = CurvePath::s_curve(Point::new(300.0, 0.0), Point::new(0.0, 0.0));
        assert_eq!(path.to_svg_d(), "M300,0 C200,0 100,0 0,0");
    }

    #[test]
    fn unmatched_label_yields_no_lines() {
        let dom = HeadlessDom::new();
        let label = dom.append_at(
            None,
            &[(attrs::TECH_NAME, "Elixir")],
            Rect::new(0.0, 0.0, 80.0, 20.0),
        );
        dom.append(None, &[(attrs::CARD_TECHNOLOGIES, "React")]);
        let index = TechnologyIndex::build(&dom);
        let lines = compute_lines(&dom, &[label], &index, &TechSelection::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn clearing_twice_is_a_no_op() {
        let dom = HeadlessDom::new();
        let card = dom.append(None, &[(attrs::CARD_TECHNOLOGIES, "Go, Docker")]);
        let icon = dom.append(Some(card), &[(attrs::TITLE, "Go")]);
        dom.append(Some(card), &[(attrs::TITLE, "Docker")]);
        let index = TechnologyIndex::build(&dom);

        let mut highlighter = Highlighter::default();
        assert_eq!(highlighter.apply(&dom, &index, Some(&"go".into())), 1);
        assert_eq!(dom.attribute(card, attrs::SELECTED_TECH).as_deref(), Some("go"));
        assert_eq!(dom.attribute(icon, attrs::TECH_SELECTED).as_deref(), Some("1"));
        assert_eq!(dom.count_with_attribute(attrs::TECH_SELECTED), 1);

        assert_eq!(highlighter.clear(&dom), 1);
        assert_eq!(highlighter.clear(&dom), 0);
        assert_eq!(dom.count_with_attribute(attrs::SELECTED_TECH), 0);
        assert_eq!(dom.count_with_attribute(attrs::TECH_SELECTED), 0);
    }
}
