//! Which timeline entries are on screen, and where.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use folio_protocol::{
    DomTree, ElementId, ElementPosition, EventKind, Handler, HostEvent, IntersectionEntry, Observation,
    PercentagePosition, Rect, ScreenPosition, Target, TechnologyPositionView, ViewportView,
    VisibilitySnapshot, VisibleItemView,
};

use crate::attrs;
use crate::config::FolioConfig;
use crate::geometry::{Env, GeometrySampler};
use crate::model::{Timeline, TimelineEntry};
use crate::schedule::{FramePass, Subscriptions};
use crate::store::SnapshotWriter;

/// The vertical slice of the viewport an entry must touch to count as
/// visible, as fractions of the viewport height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityBand {
    pub top: f64,
    pub bottom: f64,
}

impl Default for VisibilityBand {
    fn default() -> Self {
        Self {
            top: 0.1,
            bottom: 0.9,
        }
    }
}

impl VisibilityBand {
    pub fn from_config(config: &FolioConfig) -> Self {
        Self {
            top: config.band_top,
            bottom: config.band_bottom,
        }
    }

    /// `top <= vh * bottom && bottom >= vh * top`
    pub fn contains(&self, rect: &Rect, viewport_height: f64) -> bool {
        rect.top() <= viewport_height * self.bottom && rect.bottom() >= viewport_height * self.top
    }

    /// Share of the box inside the band, whole percent in `0..=100`.
    pub fn visible_percent(&self, rect: &Rect, viewport_height: f64) -> u8 {
        if rect.h <= 0.0 {
            return 0;
        }
        let overlap = rect.bottom().min(viewport_height * self.bottom)
            - rect.top().max(viewport_height * self.top);
        let overlap = overlap.clamp(0.0, rect.h);
        (100.0 * overlap / rect.h).round() as u8
    }
}

/// Build the snapshot for the given cards (DOM order).
///
/// Each card's record comes from its `data-card-index` attribute, falling
/// back to the display-order mapping when the attribute is missing.
pub fn compute_snapshot(
    dom: &dyn DomTree,
    sampler: &GeometrySampler<'_>,
    timeline: &Timeline,
    cards: &[ElementId],
    band: VisibilityBand,
) -> VisibilitySnapshot {
    let metrics = sampler.metrics();
    let vh = metrics.height;
    let viewport = ViewportView {
        width: metrics.width,
        height: metrics.height,
        scroll_y: metrics.scroll_y,
        scroll_x: metrics.scroll_x,
    };

    let mut items = Vec::new();
    for (index, &card) in cards.iter().enumerate() {
        let rect = sampler.rect(card);
        if !band.contains(&rect, vh) {
            continue;
        }
        let record = dom
            .attribute(card, attrs::CARD_INDEX)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| timeline.entries().get(i))
            .or_else(|| timeline.by_display_index(index));

        let visibility = band.visible_percent(&rect, vh);
        let position = sampler.position_of(&rect);
        let from_top = if vh > 0.0 {
            (rect.top() / vh * 100.0).round()
        } else {
            0.0
        };

        items.push(VisibleItemView {
            index,
            title: record.map_or_else(|| "No title".to_string(), TimelineEntry::heading),
            year: record.map_or_else(|| "No year".to_string(), |r| r.years.trim().to_string()),
            company: record
                .map(|r| r.company.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Unknown Company".to_string()),
            visibility,
            screen_position: ScreenPosition {
                viewport: position.viewport,
                absolute: position.absolute,
                percentage: PercentagePosition {
                    from_top: format!("{from_top}%"),
                    from_left: "50%".to_string(),
                    visible_height: format!("{visibility}%"),
                },
            },
            technologies: record.map_or_else(Vec::new, |r| technology_positions(dom, sampler, card, r)),
            viewport,
        });
    }
    items
}

/// Pair each technology name with the icon at the same ordinal.
fn technology_positions(
    dom: &dyn DomTree,
    sampler: &GeometrySampler<'_>,
    card: ElementId,
    record: &TimelineEntry,
) -> Vec<TechnologyPositionView> {
    let icons = dom.query_within(card, attrs::ICONS);
    record
        .technology_names()
        .into_iter()
        .enumerate()
        .map(|(i, name)| TechnologyPositionView {
            name,
            position: icons
                .get(i)
                .map(|&icon| sampler.position(icon))
                .unwrap_or(ElementPosition::ZEROED),
        })
        .collect()
}

/// Keeps the store's visibility snapshot in sync with the timeline on screen.
///
/// Passes run on mount, then at most once per frame on window scroll or
/// resize. Independently, an intersection observer records every entry
/// that has ever been on screen and flags its card for the reveal
/// animation; that set only grows.
pub struct VisibilityTracker {
    env: Env,
    container: ElementId,
    timeline: Rc<Timeline>,
    band: VisibilityBand,
    writer: SnapshotWriter,
    frame: FramePass,
    subscriptions: Subscriptions,
    revealed: RefCell<BTreeSet<usize>>,
    mounted: Cell<bool>,
    reveal_threshold: f64,
    reveal_root_margin: String,
}

impl VisibilityTracker {
    pub fn new(
        env: Env,
        container: ElementId,
        timeline: Rc<Timeline>,
        writer: SnapshotWriter,
        config: &FolioConfig,
    ) -> Rc<Self> {
        let frame = FramePass::frame(Rc::clone(&env.scheduler));
        Rc::new(Self {
            env,
            container,
            timeline,
            band: VisibilityBand::from_config(config),
            writer,
            frame,
            subscriptions: Subscriptions::new(),
            revealed: RefCell::new(BTreeSet::new()),
            mounted: Cell::new(false),
            reveal_threshold: config.reveal_threshold,
            reveal_root_margin: config.reveal_root_margin.clone(),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Run the first pass and start listening. Mounting twice is a no-op.
    pub fn mount(self: &Rc<Self>) {
        if self.mounted.replace(true) {
            return;
        }
        self.recompute();

        let host = &self.env.host;
        let weak = Rc::downgrade(self);
        let on_layout: Handler = Rc::new(move |_: &HostEvent| {
            if let Some(tracker) = weak.upgrade() {
                tracker.schedule();
            }
        });
        self.subscriptions.push(host.listen(
            Target::Window,
            EventKind::Scroll,
            Rc::clone(&on_layout),
        ));
        self.subscriptions
            .push(host.listen(Target::Window, EventKind::Resize, on_layout));

        let cards = self.cards();
        for (index, &card) in cards.iter().enumerate() {
            self.env
                .dom
                .set_attribute(card, attrs::ENTRY_INDEX, &index.to_string());
        }
        let weak = Rc::downgrade(self);
        self.subscriptions.push(host.observe(
            Observation::Intersections {
                targets: cards,
                threshold: self.reveal_threshold,
                root_margin: self.reveal_root_margin.clone(),
            },
            Rc::new(move |event: &HostEvent| {
                if let (Some(tracker), HostEvent::Intersection(entries)) = (weak.upgrade(), event) {
                    tracker.on_intersections(entries);
                }
            }),
        ));
    }

    /// Remove every listener and drop any queued pass.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        self.frame.cancel();
        self.subscriptions.remove_all(self.env.host.as_ref());
        tracing::debug!("visibility tracker unmounted");
    }

    /// Queue a pass for the next frame, replacing any queued one.
    pub fn schedule(self: &Rc<Self>) {
        if !self.mounted.get() {
            return;
        }
        let weak = Rc::downgrade(self);
        self.frame.request(move || {
            if let Some(tracker) = weak.upgrade() {
                tracker.recompute();
            }
        });
    }

    /// Sample geometry and publish. Returns the number of visible entries,
    /// or `None` if nothing was written (unmounted, or container gone).
    pub fn recompute(&self) -> Option<usize> {
        if !self.mounted.get() || !self.env.dom.contains(self.container) {
            return None;
        }
        let sampler = self.env.sampler();
        let cards = self.cards();
        let snapshot = compute_snapshot(
            self.env.dom.as_ref(),
            &sampler,
            &self.timeline,
            &cards,
            self.band,
        );
        let visible = snapshot.len();
        tracing::trace!(cards = cards.len(), visible, "visibility pass");
        self.writer.publish(snapshot, self.env.host.now_ms());
        Some(visible)
    }

    /// Display indices that have intersected the viewport at least once.
    pub fn revealed(&self) -> Vec<usize> {
        self.revealed.borrow().iter().copied().collect()
    }

    fn cards(&self) -> Vec<ElementId> {
        self.env.dom.query_within(self.container, attrs::CARDS)
    }

    fn on_intersections(&self, entries: &[IntersectionEntry]) {
        if !self.mounted.get() {
            return;
        }
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let index = self
                .env
                .dom
                .attribute(entry.target, attrs::ENTRY_INDEX)
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            if self.revealed.borrow_mut().insert(index) {
                self.env.dom.set_attribute(entry.target, attrs::REVEALED, "1");
            }
        }
    }
}

impl Drop for VisibilityTracker {
    fn drop(&mut self) {
        self.subscriptions.remove_all(self.env.host.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VH: f64 = 1000.0;

    #[test]
    fn band_edges_are_inclusive() {
        let band = VisibilityBand::default();
        assert!(band.contains(&Rect::vertical(900.0, 1200.0), VH));
        assert!(!band.contains(&Rect::vertical(900.5, 1200.0), VH));
        assert!(band.contains(&Rect::vertical(-300.0, 100.0), VH));
        assert!(!band.contains(&Rect::vertical(-300.0, 99.0), VH));
    }

    #[test]
    fn percent_of_partially_visible_box() {
        let band = VisibilityBand::default();
        // 100px of a 250px box fall inside 100..900.
        assert_eq!(band.visible_percent(&Rect::vertical(-50.0, 200.0), VH), 40);
        assert_eq!(band.visible_percent(&Rect::vertical(500.0, 1000.0), VH), 80);
        assert_eq!(band.visible_percent(&Rect::vertical(200.0, 300.0), VH), 100);
        // Taller than the band: only the band's share counts.
        assert_eq!(band.visible_percent(&Rect::vertical(0.0, 1600.0), VH), 50);
    }

    #[test]
    fn zero_height_box_is_zero_percent() {
        let band = VisibilityBand::default();
        assert_eq!(band.visible_percent(&Rect::vertical(500.0, 500.0), VH), 0);
    }
}
