use std::cell::RefCell;
use std::collections::HashMap;

use folio_protocol::{DomTree, ElementId, Rect, Selector};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, NodeList};

/// Smallest table size at which detached entries are swept.
const MIN_PRUNE_AT: usize = 256;

/// Id allocation for [`BrowserDom`].
///
/// Pinned entries (elements the page handed over) live as long as the
/// table. Everything else is swept once it fails the liveness check, but
/// only after the table has doubled since the last sweep.
struct IdTable<T> {
    entries: HashMap<u64, (T, bool)>,
    next_id: u64,
    prune_at: usize,
}

impl<T> IdTable<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 0,
            prune_at: MIN_PRUNE_AT,
        }
    }

    fn insert(&mut self, value: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, (value, false));
        id
    }

    fn get(&self, id: u64) -> Option<&T> {
        self.entries.get(&id).map(|(value, _)| value)
    }

    fn pin(&mut self, id: u64) {
        if let Some((_, pinned)) = self.entries.get_mut(&id) {
            *pinned = true;
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sweep unpinned entries rejected by `live` and hand them back.
    fn prune(&mut self, live: impl Fn(&T) -> bool) -> Vec<T> {
        if self.entries.len() < self.prune_at {
            return Vec::new();
        }
        let dead: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, (value, pinned))| !*pinned && !live(value))
            .map(|(&id, _)| id)
            .collect();
        let removed = dead
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .map(|(value, _)| value)
            .collect();
        self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_AT);
        removed
    }
}

/// The live document behind [`DomTree`].
///
/// Elements get an id the first time a query or the page hands them over.
/// A `WeakMap` on the element side maps back to the id, so repeated
/// queries reuse it without scanning.
pub struct BrowserDom {
    document: Document,
    ids: js_sys::WeakMap,
    table: RefCell<IdTable<Element>>,
}

impl BrowserDom {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            ids: js_sys::WeakMap::new(),
            table: RefCell::new(IdTable::new()),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Id for an element the page owns. It is never released.
    pub fn intern(&self, element: &Element) -> ElementId {
        let id = self.id_of(element);
        self.table.borrow_mut().pin(id.0);
        id
    }

    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.table.borrow().get(id.0).cloned()
    }

    pub(crate) fn id_of(&self, element: &Element) -> ElementId {
        let key = element.unchecked_ref::<js_sys::Object>();
        if let Some(id) = self.ids.get(key).as_f64() {
            return ElementId(id as u64);
        }
        let id = self.table.borrow_mut().insert(element.clone());
        self.ids.set(key, &JsValue::from_f64(id as f64));
        ElementId(id)
    }

    /// Forget query results that have left the document.
    fn prune(&self) {
        let removed = self.table.borrow_mut().prune(|e| e.is_connected());
        if removed.is_empty() {
            return;
        }
        for element in &removed {
            self.ids.delete(element.unchecked_ref());
        }
        tracing::debug!(
            removed = removed.len(),
            kept = self.table.borrow().len(),
            "detached elements released"
        );
    }

    fn html(&self, id: ElementId) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }

    fn collect(&self, list: Result<NodeList, JsValue>) -> Vec<ElementId> {
        let Ok(list) = list else {
            return Vec::new();
        };
        let ids = (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.id_of(&element))
            .collect();
        self.prune();
        ids
    }
}

impl DomTree for BrowserDom {
    fn query_all(&self, selector: Selector) -> Vec<ElementId> {
        self.collect(self.document.query_selector_all(&selector.to_css()))
    }

    fn query_within(&self, root: ElementId, selector: Selector) -> Vec<ElementId> {
        match self.element(root) {
            Some(root) => self.collect(root.query_selector_all(&selector.to_css())),
            None => Vec::new(),
        }
    }

    fn contains(&self, node: ElementId) -> bool {
        self.element(node).is_some_and(|e| e.is_connected())
    }

    fn attribute(&self, node: ElementId, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn set_attribute(&self, node: ElementId, name: &str, value: &str) {
        if let Some(element) = self.element(node) {
            element.set_attribute(name, value).ok();
        }
    }

    fn remove_attribute(&self, node: ElementId, name: &str) {
        if let Some(element) = self.element(node) {
            element.remove_attribute(name).ok();
        }
    }

    fn bounding_rect(&self, node: ElementId) -> Option<Rect> {
        let element = self.element(node).filter(|e| e.is_connected())?;
        let r = element.get_bounding_client_rect();
        Some(Rect::new(r.x(), r.y(), r.width(), r.height()))
    }

    fn style(&self, node: ElementId, property: &str) -> Option<String> {
        self.html(node)?
            .style()
            .get_property_value(property)
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn set_style(&self, node: ElementId, property: &str, value: &str) {
        if let Some(element) = self.html(node) {
            element.style().set_property(property, value).ok();
        }
    }
}
