mod capture;
mod dom;
mod host;
mod logging;
mod scheduler;

use std::rc::Rc;

use folio_core::model::{Timeline, parse_skill_years, parse_work_experience};
use folio_core::views::progress::{SkillParser, usage_by_declared_years, usage_by_work_years};
use folio_core::views::tech_list::{connection_counts, display_list, sort_by_connections};
use folio_core::views::{
    ConnectionEngine, ConnectionLine, MinimapController, MinimapParts, VisibilityTracker,
};
use folio_core::{Env, FolioConfig, SnapshotWriter, TimelineState, ViewStateStore};
use folio_protocol::TechName;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::Element;

pub use capture::JsCapturer;
pub use dom::BrowserDom;
pub use host::BrowserHost;
pub use scheduler::BrowserScheduler;

fn js_err(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    logging::init(level);
}

/// Icon id (`set:Name`) for a technology, or the placeholder glyph.
#[wasm_bindgen]
pub fn icon_for(name: &str) -> String {
    folio_core::icons::icon_for(name).as_str().to_string()
}

#[derive(Serialize)]
struct TechListItem {
    name: TechName,
    connections: usize,
    icon: &'static str,
    highlighted: bool,
}

/// The page's view-state core: one per document.
#[wasm_bindgen]
pub struct Portfolio {
    env: Env,
    dom: Rc<BrowserDom>,
    config: FolioConfig,
    timeline: Rc<Timeline>,
    store: ViewStateStore,
    writer: Option<SnapshotWriter>,
    tracker: Option<Rc<VisibilityTracker>>,
    engine: Option<Rc<ConnectionEngine>>,
    minimap: Option<Rc<MinimapController>>,
}

#[wasm_bindgen]
impl Portfolio {
    /// `work_experience` is the fixture JSON; `config` an optional
    /// `FolioConfig` JSON object.
    #[wasm_bindgen(constructor)]
    pub fn new(work_experience: &str, config: Option<String>) -> Result<Portfolio, JsError> {
        let timeline = parse_work_experience(work_experience.as_bytes()).map_err(js_err)?;
        let config = match config {
            Some(json) => FolioConfig::from_json(&json).map_err(js_err)?,
            None => FolioConfig::default(),
        };
        let window = web_sys::window().ok_or_else(|| JsError::new("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsError::new("no document"))?;

        let dom = Rc::new(BrowserDom::new(document));
        let host = Rc::new(BrowserHost::new(window.clone(), Rc::clone(&dom)));
        let scheduler = Rc::new(BrowserScheduler::new(window));
        let env = Env::new(dom.clone(), host, scheduler);
        let (store, writer) = ViewStateStore::new();
        tracing::info!(entries = timeline.len(), "portfolio created");
        Ok(Portfolio {
            env,
            dom,
            config,
            timeline: Rc::new(timeline),
            store,
            writer: Some(writer),
            tracker: None,
            engine: None,
            minimap: None,
        })
    }

    /// Track the cards under `container`. Only one timeline per page.
    pub fn mount_timeline(&mut self, container: Element) -> Result<(), JsError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| JsError::new("timeline already mounted"))?;
        let container = self.dom.intern(&container);
        let tracker = VisibilityTracker::new(
            self.env.clone(),
            container,
            Rc::clone(&self.timeline),
            writer,
            &self.config,
        );
        tracker.mount();
        self.tracker = Some(tracker);
        Ok(())
    }

    /// Link the labels under `labels` to the cards, drawing into `overlay`.
    pub fn mount_connections(&mut self, labels: Element, overlay: Element) {
        if let Some(engine) = self.engine.take() {
            engine.unmount();
        }
        let engine = ConnectionEngine::new(self.env.clone(), self.dom.intern(&labels));
        let host = Rc::clone(&self.env.host);
        engine.set_sink(Rc::new(move |lines: &[ConnectionLine]| {
            let m = host.metrics();
            overlay.set_inner_html(&folio_core::svg::render_connections(lines, m.width, m.height));
        }));
        engine.mount();
        self.engine = Some(engine);
    }

    /// Drive the minimap. `capture` resolves `{width, height, pixelRatio}`
    /// to a data URL.
    pub fn mount_minimap(
        &mut self,
        root: Element,
        track: Element,
        indicator: Element,
        interaction: Element,
        content: Element,
        capture: js_sys::Function,
    ) {
        if let Some(minimap) = self.minimap.take() {
            minimap.unmount();
        }
        let parts = MinimapParts {
            root: self.dom.intern(&root),
            track: self.dom.intern(&track),
            indicator: self.dom.intern(&indicator),
            interaction: self.dom.intern(&interaction),
            content: self.dom.intern(&content),
        };
        let minimap = MinimapController::new(
            self.env.clone(),
            Rc::new(JsCapturer::new(capture)),
            parts,
            &self.config,
        );
        minimap.mount();
        self.minimap = Some(minimap);
    }

    /// `callback(stateJson)` after every store write.
    pub fn on_change(&self, callback: js_sys::Function) {
        self.store.subscribe(Rc::new(move |state: &TimelineState| {
            match serde_json::to_string(state) {
                Ok(json) => {
                    callback.call1(&JsValue::NULL, &JsValue::from_str(&json)).ok();
                }
                Err(err) => tracing::warn!(%err, "state not serializable"),
            }
        }));
    }

    pub fn hover(&self, name: Option<String>) {
        if let Some(engine) = &self.engine {
            engine.hover(name.map(TechName::from));
        }
    }

    pub fn leave(&self) {
        if let Some(engine) = &self.engine {
            engine.leave();
        }
    }

    pub fn toggle(&self, name: &str) {
        if let Some(engine) = &self.engine {
            engine.toggle(TechName::from(name));
        }
    }

    /// The whole store state as JSON.
    pub fn state_json(&self) -> Result<String, JsError> {
        self.store
            .with_state(serde_json::to_string)
            .map_err(js_err)
    }

    pub fn visible_items_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.store.visible_items()).map_err(js_err)
    }

    /// On-screen technologies, most connected first, selection pinned on top.
    pub fn technology_list_json(&self) -> Result<String, JsError> {
        let counts = connection_counts(self.dom.as_ref());
        let base = sort_by_connections(&self.store.unique_technologies(), &counts);
        let selection = self.engine.as_ref().map(|e| e.selection()).unwrap_or_default();
        let items: Vec<TechListItem> = display_list(&base, selection.selected())
            .into_iter()
            .map(|name| TechListItem {
                connections: counts.get(name.as_str()).copied().unwrap_or(0),
                icon: folio_core::icons::icon_for(&name).as_str(),
                highlighted: selection.is_highlighted(&name),
                name,
            })
            .collect();
        serde_json::to_string(&items).map_err(js_err)
    }

    /// Current connection overlay as an SVG document.
    pub fn connection_svg(&self) -> String {
        let lines = self.engine.as_ref().map(|e| e.lines()).unwrap_or_default();
        let m = self.env.host.metrics();
        folio_core::svg::render_connections(&lines, m.width, m.height)
    }

    /// Years per technology over the work history.
    pub fn work_usage_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&usage_by_work_years(&self.timeline)).map_err(js_err)
    }

    /// Declared years per technology from a skills fixture.
    pub fn skill_usage_json(&self, skills: &str) -> Result<String, JsError> {
        let skills = parse_skill_years(skills.as_bytes()).map_err(js_err)?;
        let parser = SkillParser::new().map_err(js_err)?;
        serde_json::to_string(&usage_by_declared_years(&skills, &parser)).map_err(js_err)
    }

    /// Tear everything down. The portfolio can be mounted again afterwards,
    /// except for the timeline.
    pub fn unmount(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.unmount();
        }
        if let Some(engine) = self.engine.take() {
            engine.unmount();
        }
        if let Some(minimap) = self.minimap.take() {
            minimap.unmount();
        }
        tracing::info!("portfolio unmounted");
    }
}
