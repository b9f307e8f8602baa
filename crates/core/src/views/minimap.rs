//! Page thumbnail with a scroll indicator and click/drag navigation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use folio_protocol::{
    CaptureError, CaptureRequest, Capturer, ElementId, EventKind, Handler, HostEvent,
    MutationFilter, Observation, Rect, ScrollBehavior, Slot, Target, ViewportMetrics,
};

use crate::config::FolioConfig;
use crate::geometry::Env;
use crate::schedule::{FramePass, Subscriptions};

/// Custom property on the minimap root holding the thumbnail image.
pub const THUMBNAIL_PROPERTY: &str = "--minimap-thumbnail-bg";

/// How far down the page the window is, in `0..=1`.
pub fn scroll_ratio(metrics: &ViewportMetrics) -> f64 {
    (metrics.scroll_y.max(0.0) / metrics.max_scroll()).clamp(0.0, 1.0)
}

/// Indicator geometry within the thumbnail track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    /// Viewport y of the track's top edge.
    pub top: f64,
    pub height: f64,
    /// Indicator height: the viewport's share of the page, never below the floor.
    pub indicator: f64,
}

impl Track {
    pub fn new(metrics: &ViewportMetrics, track: &Rect, min_indicator: f64) -> Self {
        let share = if metrics.scroll_height > 0.0 {
            metrics.height / metrics.scroll_height
        } else {
            1.0
        };
        Self {
            top: track.top(),
            height: track.h,
            indicator: (share * track.h).max(min_indicator),
        }
    }

    /// Travel available to the indicator, at least one pixel.
    pub fn draggable(&self) -> f64 {
        (self.height - self.indicator).max(1.0)
    }

    pub fn offset(&self, ratio: f64) -> f64 {
        let draggable = self.draggable();
        (ratio * draggable).clamp(0.0, draggable)
    }

    /// Scroll offset that puts the indicator's centre under `client_y`.
    pub fn scroll_target(&self, client_y: f64, max_scroll: f64) -> f64 {
        let draggable = self.draggable();
        let pos = (client_y - self.top - self.indicator / 2.0).clamp(0.0, draggable);
        (pos / draggable * max_scroll).round()
    }
}

/// The elements the controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimapParts {
    /// Carries the thumbnail property and the busy opacity.
    pub root: ElementId,
    /// The thumbnail box the indicator travels in.
    pub track: ElementId,
    pub indicator: ElementId,
    /// Receives clicks and drags; carries the slider aria values.
    pub interaction: ElementId,
    /// Mutations under this element trigger a recapture.
    pub content: ElementId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The document is in a background tab.
    Hidden,
    /// Less than the capture interval since the last attempt.
    Throttled,
    InFlight,
    Unmounted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Handed to the capturer, not settled yet.
    Pending,
    Replaced,
    /// Same image as the current thumbnail.
    Unchanged,
    Failed(CaptureError),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MinimapState {
    /// Data URL of the current thumbnail.
    pub thumbnail: Option<String>,
    pub ratio: f64,
    /// `ratio` as a whole percentage.
    pub percent: u8,
    pub drag: DragState,
    pub capture: CaptureState,
    /// Host clock time of the last capture attempt that was not skipped.
    pub last_capture_at: Option<f64>,
    pub last_outcome: Option<CaptureOutcome>,
}

/// Drives the minimap beside the page.
///
/// Thumbnail captures are queued into idle time by content mutations,
/// window resizes, scrolling outside a drag and the mount itself, and
/// rate-limited on the host clock. The indicator follows the window
/// scroll once per frame. Clicks scroll smoothly to the pointer; a drag
/// scrolls instantly until the pointer is released or leaves the document.
pub struct MinimapController {
    env: Env,
    capturer: Rc<dyn Capturer>,
    parts: MinimapParts,
    config: FolioConfig,
    state: RefCell<MinimapState>,
    indicator_pass: FramePass,
    capture_pass: FramePass,
    subscriptions: Subscriptions,
    drag_subscriptions: Subscriptions,
    mounted: Cell<bool>,
}

impl MinimapController {
    pub fn new(
        env: Env,
        capturer: Rc<dyn Capturer>,
        parts: MinimapParts,
        config: &FolioConfig,
    ) -> Rc<Self> {
        let indicator_pass = FramePass::frame(Rc::clone(&env.scheduler));
        let capture_pass = FramePass::idle(Rc::clone(&env.scheduler), config.capture_idle_timeout_ms);
        Rc::new(Self {
            env,
            capturer,
            parts,
            config: config.clone(),
            state: RefCell::new(MinimapState::default()),
            indicator_pass,
            capture_pass,
            subscriptions: Subscriptions::new(),
            drag_subscriptions: Subscriptions::new(),
            mounted: Cell::new(false),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn state(&self) -> MinimapState {
        self.state.borrow().clone()
    }

    pub fn mount(self: &Rc<Self>) {
        if self.mounted.replace(true) {
            return;
        }
        let dom = self.env.dom.as_ref();
        let layer = self.parts.interaction;
        dom.set_style(self.parts.root, THUMBNAIL_PROPERTY, "none");
        dom.set_attribute(layer, "role", "slider");
        dom.set_attribute(layer, "aria-valuemin", "0");
        dom.set_attribute(layer, "aria-valuemax", "100");
        dom.set_attribute(layer, "aria-orientation", "vertical");
        self.update_indicator();

        let host = &self.env.host;
        let subs = &self.subscriptions;
        subs.push(host.listen(
            Target::Window,
            EventKind::Scroll,
            self.handler(|ctrl, _| {
                ctrl.schedule_indicator();
                if ctrl.drag() == DragState::Idle {
                    ctrl.request_capture();
                }
            }),
        ));
        subs.push(host.listen(
            Target::Window,
            EventKind::Resize,
            self.handler(|ctrl, _| {
                ctrl.schedule_indicator();
                ctrl.request_capture();
            }),
        ));
        subs.push(host.listen(
            Target::Element(layer),
            EventKind::Click,
            self.handler(|ctrl, event| {
                if let HostEvent::Click { client_y } = event {
                    ctrl.scroll_to_pointer(*client_y);
                }
            }),
        ));
        subs.push(host.listen(
            Target::Element(layer),
            EventKind::PointerDown,
            self.handler(|ctrl, event| {
                if let HostEvent::PointerDown { client_y } = event {
                    ctrl.start_drag(*client_y);
                }
            }),
        ));
        subs.push(host.observe(
            Observation::Mutations {
                target: Target::Element(self.parts.content),
                filter: MutationFilter {
                    child_list: true,
                    subtree: true,
                    attributes: true,
                    character_data: true,
                    attribute_filter: Vec::new(),
                },
            },
            self.handler(|ctrl, _| ctrl.request_capture()),
        ));

        let weak = Rc::downgrade(self);
        self.capture_pass.request_in(
            Slot::Idle {
                timeout_ms: self.config.initial_capture_delay_ms,
            },
            move || {
                if let Some(ctrl) = weak.upgrade() {
                    ctrl.capture_now();
                }
            },
        );
    }

    /// Remove every listener, drag ones included, and drop queued passes.
    /// A capture still in flight only restores the opacity when it settles.
    pub fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        self.indicator_pass.cancel();
        self.capture_pass.cancel();
        self.subscriptions.remove_all(self.env.host.as_ref());
        self.drag_subscriptions.remove_all(self.env.host.as_ref());
        self.state.borrow_mut().drag = DragState::Idle;
        tracing::debug!("minimap unmounted");
    }

    pub fn drag(&self) -> DragState {
        self.state.borrow().drag
    }

    pub fn schedule_indicator(self: &Rc<Self>) {
        if !self.mounted.get() {
            return;
        }
        let weak = Rc::downgrade(self);
        self.indicator_pass.request(move || {
            if let Some(ctrl) = weak.upgrade() {
                ctrl.update_indicator();
            }
        });
    }

    /// Move the indicator to the current scroll position and refresh the
    /// aria values. Returns the ratio, or `None` while dragging or unmounted.
    pub fn update_indicator(&self) -> Option<f64> {
        if !self.mounted.get() || self.drag() == DragState::Dragging {
            return None;
        }
        let dom = self.env.dom.as_ref();
        let metrics = self.env.host.metrics();
        let ratio = scroll_ratio(&metrics);
        let percent = (ratio * 100.0).round() as u8;

        if let Some(rect) = dom.bounding_rect(self.parts.track) {
            let track = Track::new(&metrics, &rect, self.config.min_indicator_px);
            dom.set_style(
                self.parts.indicator,
                "transform",
                &format!("translateY({}px)", track.offset(ratio)),
            );
            dom.set_style(self.parts.indicator, "height", &format!("{}px", track.indicator));
        }
        let layer = self.parts.interaction;
        dom.set_attribute(layer, "aria-valuenow", &percent.to_string());
        dom.set_attribute(
            layer,
            "aria-valuetext",
            &format!("Scrolled to {percent}% of the page"),
        );

        let mut state = self.state.borrow_mut();
        state.ratio = ratio;
        state.percent = percent;
        Some(ratio)
    }

    /// Scroll so the indicator centres on `client_y`: instantly while
    /// dragging, smoothly otherwise. Returns the scroll offset requested.
    pub fn scroll_to_pointer(&self, client_y: f64) -> Option<f64> {
        if !self.mounted.get() {
            return None;
        }
        let rect = self.env.dom.bounding_rect(self.parts.track)?;
        let metrics = self.env.host.metrics();
        let track = Track::new(&metrics, &rect, self.config.min_indicator_px);
        let top = track.scroll_target(client_y, metrics.max_scroll());
        let behavior = match self.drag() {
            DragState::Dragging => ScrollBehavior::Instant,
            DragState::Idle => ScrollBehavior::Smooth,
        };
        self.env.host.scroll_to(top, behavior);
        Some(top)
    }

    pub fn start_drag(self: &Rc<Self>, client_y: f64) {
        if !self.mounted.get() || self.drag() == DragState::Dragging {
            return;
        }
        self.state.borrow_mut().drag = DragState::Dragging;
        tracing::debug!(client_y, "minimap drag started");
        self.scroll_to_pointer(client_y);

        let host = &self.env.host;
        let subs = &self.drag_subscriptions;
        subs.push(host.listen(
            Target::Document,
            EventKind::PointerMove,
            self.handler(|ctrl, event| {
                if let HostEvent::PointerMove { client_y } = event
                    && ctrl.drag() == DragState::Dragging
                {
                    ctrl.scroll_to_pointer(*client_y);
                }
            }),
        ));
        for kind in [EventKind::PointerUp, EventKind::PointerLeave] {
            subs.push(host.listen(
                Target::Document,
                kind,
                self.handler(|ctrl, _| ctrl.end_drag()),
            ));
        }
    }

    pub fn end_drag(self: &Rc<Self>) {
        if self.drag() != DragState::Dragging {
            return;
        }
        self.drag_subscriptions.remove_all(self.env.host.as_ref());
        self.state.borrow_mut().drag = DragState::Idle;
        tracing::debug!("minimap drag ended");
        self.schedule_indicator();
    }

    /// Queue a capture into the next idle period.
    pub fn request_capture(self: &Rc<Self>) {
        if !self.mounted.get() {
            return;
        }
        let weak = Rc::downgrade(self);
        self.capture_pass.request(move || {
            if let Some(ctrl) = weak.upgrade() {
                ctrl.capture_now();
            }
        });
    }

    /// Start a capture unless hidden, busy or throttled.
    pub fn capture_now(self: &Rc<Self>) -> CaptureOutcome {
        let outcome = match self.skip_reason() {
            Some(reason) => CaptureOutcome::Skipped(reason),
            None => {
                self.start_capture();
                return CaptureOutcome::Pending;
            }
        };
        tracing::trace!(?outcome, "capture");
        self.state.borrow_mut().last_outcome = Some(outcome.clone());
        outcome
    }

    fn skip_reason(&self) -> Option<SkipReason> {
        if !self.mounted.get() {
            return Some(SkipReason::Unmounted);
        }
        if !self.env.host.document_visible() {
            return Some(SkipReason::Hidden);
        }
        let state = self.state.borrow();
        if state.capture == CaptureState::Capturing {
            return Some(SkipReason::InFlight);
        }
        if let Some(last) = state.last_capture_at
            && self.env.host.now_ms() - last < self.config.capture_interval_ms
        {
            return Some(SkipReason::Throttled);
        }
        None
    }

    fn start_capture(self: &Rc<Self>) {
        let metrics = self.env.host.metrics();
        {
            let mut state = self.state.borrow_mut();
            state.last_capture_at = Some(self.env.host.now_ms());
            state.capture = CaptureState::Capturing;
            state.last_outcome = Some(CaptureOutcome::Pending);
        }
        let content_width = if metrics.scroll_width > 0.0 {
            metrics.scroll_width
        } else {
            metrics.width
        };
        let request = CaptureRequest {
            width: content_width.min(self.config.capture_max_width),
            height: metrics.scroll_height.min(self.config.capture_max_height),
            pixel_ratio: self.config.capture_pixel_ratio,
        };

        let root = self.parts.root;
        let previous = self
            .env
            .dom
            .style(root, "opacity")
            .filter(|o| !o.is_empty());
        self.env
            .dom
            .set_style(root, "opacity", &self.config.capture_busy_opacity);

        let dom = Rc::clone(&self.env.dom);
        let weak = Rc::downgrade(self);
        self.capturer.capture(
            request,
            Box::new(move |result| {
                dom.set_style(root, "opacity", previous.as_deref().unwrap_or("1"));
                if let Some(ctrl) = weak.upgrade() {
                    ctrl.finish_capture(result);
                }
            }),
        );
    }

    fn finish_capture(&self, result: Result<String, CaptureError>) {
        self.state.borrow_mut().capture = CaptureState::Idle;
        if !self.mounted.get() {
            return;
        }
        let outcome = match result {
            Ok(url) if url.is_empty() => CaptureOutcome::Failed(CaptureError::Empty),
            Ok(url) => {
                let unchanged = self.state.borrow().thumbnail.as_deref() == Some(url.as_str());
                if unchanged {
                    CaptureOutcome::Unchanged
                } else {
                    self.env.dom.set_style(
                        self.parts.root,
                        THUMBNAIL_PROPERTY,
                        &format!("url({url})"),
                    );
                    self.state.borrow_mut().thumbnail = Some(url);
                    CaptureOutcome::Replaced
                }
            }
            Err(err) => CaptureOutcome::Failed(err),
        };
        if let CaptureOutcome::Failed(err) = &outcome {
            tracing::debug!(%err, "thumbnail capture failed, keeping previous");
        } else {
            tracing::debug!(?outcome, "thumbnail capture settled");
        }
        self.state.borrow_mut().last_outcome = Some(outcome);
    }

    fn handler(self: &Rc<Self>, f: impl Fn(&Rc<Self>, &HostEvent) + 'static) -> Handler {
        let weak = Rc::downgrade(self);
        Rc::new(move |event: &HostEvent| {
            if let Some(ctrl) = weak.upgrade() {
                f(&ctrl, event);
            }
        })
    }
}

impl Drop for MinimapController {
    fn drop(&mut self) {
        self.subscriptions.remove_all(self.env.host.as_ref());
        self.drag_subscriptions.remove_all(self.env.host.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_headless::{HeadlessDom, HeadlessHost, ManualScheduler, ScriptedCapturer};
    use folio_protocol::DomTree;

    fn metrics(height: f64, scroll_y: f64, scroll_height: f64) -> ViewportMetrics {
        ViewportMetrics {
            width: 1280.0,
            height,
            scroll_x: 0.0,
            scroll_y,
            scroll_height,
            scroll_width: 1280.0,
        }
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(scroll_ratio(&metrics(1000.0, 2000.0, 5000.0)), 0.5);
        assert_eq!(scroll_ratio(&metrics(1000.0, -40.0, 5000.0)), 0.0);
        assert_eq!(scroll_ratio(&metrics(1000.0, 9000.0, 5000.0)), 1.0);
        // Page shorter than the window: max scroll floors at one pixel.
        assert_eq!(scroll_ratio(&metrics(1000.0, 0.0, 600.0)), 0.0);
    }

    #[test]
    fn indicator_has_a_floor() {
        let track = Track::new(
            &metrics(800.0, 0.0, 400_000.0),
            &Rect::new(0.0, 0.0, 100.0, 300.0),
            8.0,
        );
        assert_eq!(track.indicator, 8.0);
        assert_eq!(track.draggable(), 292.0);
    }

    #[test]
    fn pointer_centres_the_indicator() {
        let m = metrics(1000.0, 0.0, 5000.0);
        let track = Track::new(&m, &Rect::new(0.0, 100.0, 120.0, 400.0), 8.0);
        assert_eq!(track.indicator, 80.0);
        assert_eq!(track.scroll_target(300.0, m.max_scroll()), 2000.0);
        // Above and below the track clamp to the ends.
        assert_eq!(track.scroll_target(0.0, m.max_scroll()), 0.0);
        assert_eq!(track.scroll_target(900.0, m.max_scroll()), 4000.0);
    }

    struct Rig {
        dom: Rc<HeadlessDom>,
        host: Rc<HeadlessHost>,
        scheduler: Rc<ManualScheduler>,
        capturer: Rc<ScriptedCapturer>,
        parts: MinimapParts,
        ctrl: Rc<MinimapController>,
    }

    fn rig() -> Rig {
        let dom = Rc::new(HeadlessDom::new());
        let content = dom.append(None, &[]);
        let root = dom.append(None, &[]);
        let track = dom.append_at(Some(root), &[], Rect::new(0.0, 100.0, 120.0, 400.0));
        let indicator = dom.append(Some(track), &[]);
        let interaction = dom.append(Some(track), &[]);
        let parts = MinimapParts {
            root,
            track,
            indicator,
            interaction,
            content,
        };
        let host = Rc::new(HeadlessHost::with_viewport(1000.0, 5000.0));
        let scheduler = Rc::new(ManualScheduler::new());
        let capturer = Rc::new(ScriptedCapturer::new());
        let env = Env::new(dom.clone(), host.clone(), scheduler.clone());
        let ctrl = MinimapController::new(env, capturer.clone(), parts, &FolioConfig::default());
        Rig {
            dom,
            host,
            scheduler,
            capturer,
            parts,
            ctrl,
        }
    }

    #[test]
    fn mount_places_indicator_and_queues_first_capture() {
        let rig = rig();
        rig.host.set_scroll_y(2000.0);
        rig.ctrl.mount();
        let dom = rig.dom.as_ref();
        assert_eq!(
            dom.style(rig.parts.indicator, "transform").as_deref(),
            Some("translateY(160px)")
        );
        assert_eq!(dom.style(rig.parts.indicator, "height").as_deref(), Some("80px"));
        assert_eq!(
            dom.attribute(rig.parts.interaction, "aria-valuetext").as_deref(),
            Some("Scrolled to 50% of the page")
        );
        assert_eq!(rig.scheduler.idle_timeouts(), vec![300]);
    }

    #[test]
    fn capture_dims_then_restores_and_replaces_once() {
        let rig = rig();
        rig.ctrl.mount();
        rig.scheduler.run_idle();

        let requests = rig.capturer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].width, 1280.0);
        assert_eq!(requests[0].height, 5000.0);
        assert_eq!(requests[0].pixel_ratio, 0.3);
        let opacity = |rig: &Rig| rig.dom.style(rig.parts.root, "opacity");
        assert_eq!(opacity(&rig).as_deref(), Some("0.5"));

        rig.capturer.succeed("data:image/png;base64,AAA");
        assert_eq!(opacity(&rig).as_deref(), Some("1"));
        assert_eq!(
            rig.dom.style(rig.parts.root, THUMBNAIL_PROPERTY).as_deref(),
            Some("url(data:image/png;base64,AAA)")
        );
        assert_eq!(rig.ctrl.state().last_outcome, Some(CaptureOutcome::Replaced));

        rig.host.advance(3000.0);
        assert_eq!(rig.ctrl.capture_now(), CaptureOutcome::Pending);
        rig.capturer.succeed("data:image/png;base64,AAA");
        assert_eq!(rig.ctrl.state().last_outcome, Some(CaptureOutcome::Unchanged));
    }

    #[test]
    fn failure_keeps_thumbnail_and_restores_opacity() {
        let rig = rig();
        rig.dom.set_style(rig.parts.root, "opacity", "0.9");
        rig.ctrl.mount();
        rig.scheduler.run_idle();
        rig.capturer.fail("tainted canvas");
        assert_eq!(rig.dom.style(rig.parts.root, "opacity").as_deref(), Some("0.9"));
        assert!(matches!(
            rig.ctrl.state().last_outcome,
            Some(CaptureOutcome::Failed(CaptureError::Rejected(_)))
        ));
        assert_eq!(rig.ctrl.state().thumbnail, None);
    }

    #[test]
    fn skips_are_reported() {
        let rig = rig();
        rig.ctrl.mount();
        assert_eq!(rig.ctrl.capture_now(), CaptureOutcome::Pending);
        assert_eq!(
            rig.ctrl.capture_now(),
            CaptureOutcome::Skipped(SkipReason::InFlight)
        );
        rig.capturer.succeed("data:x");
        rig.host.advance(2999.0);
        assert_eq!(
            rig.ctrl.capture_now(),
            CaptureOutcome::Skipped(SkipReason::Throttled)
        );
        rig.host.advance(1.0);
        rig.host.set_visible(false);
        assert_eq!(
            rig.ctrl.capture_now(),
            CaptureOutcome::Skipped(SkipReason::Hidden)
        );
        rig.ctrl.unmount();
        assert_eq!(
            rig.ctrl.capture_now(),
            CaptureOutcome::Skipped(SkipReason::Unmounted)
        );
    }

    #[test]
    fn completion_after_unmount_only_restores_opacity() {
        let rig = rig();
        rig.ctrl.mount();
        rig.ctrl.capture_now();
        rig.ctrl.unmount();
        rig.capturer.succeed("data:late");
        assert_eq!(rig.dom.style(rig.parts.root, "opacity").as_deref(), Some("1"));
        assert_eq!(
            rig.dom.style(rig.parts.root, THUMBNAIL_PROPERTY).as_deref(),
            Some("none")
        );
        assert_eq!(rig.host.listener_count(), 0);
        assert_eq!(rig.scheduler.pending_idle(), 0);
    }

    #[test]
    fn click_scrolls_smoothly() {
        let rig = rig();
        rig.ctrl.mount();
        rig.host.dispatch(
            Target::Element(rig.parts.interaction),
            &HostEvent::Click { client_y: 300.0 },
        );
        assert_eq!(rig.host.last_scroll(), Some((2000.0, ScrollBehavior::Smooth)));
    }
}
