//! Process-wide view state published by the visibility tracker.
//!
//! [`ViewStateStore::new`] hands out the only [`SnapshotWriter`]; everyone
//! else holds a cloned [`ViewStateStore`] and reads through selectors.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use folio_protocol::{TechName, VisibilitySnapshot, VisibleItemView};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineState {
    pub visible_items: VisibilitySnapshot,
    /// Epoch milliseconds of the last write, `None` before the first one.
    pub last_updated: Option<f64>,
    /// Every technology name in `visible_items`, deduplicated and sorted.
    pub unique_technologies: Vec<TechName>,
}

pub type Listener = Rc<dyn Fn(&TimelineState)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Shared {
    state: RefCell<TimelineState>,
    listeners: RefCell<BTreeMap<SubscriptionId, Listener>>,
    next_id: Cell<u64>,
}

/// Read side of the store. Cheap to clone.
#[derive(Clone)]
pub struct ViewStateStore {
    shared: Rc<Shared>,
}

/// The single write handle. Not `Clone`.
pub struct SnapshotWriter {
    shared: Rc<Shared>,
}

impl ViewStateStore {
    pub fn new() -> (ViewStateStore, SnapshotWriter) {
        let shared = Rc::new(Shared::default());
        (
            ViewStateStore {
                shared: Rc::clone(&shared),
            },
            SnapshotWriter { shared },
        )
    }

    pub fn visible_items(&self) -> VisibilitySnapshot {
        self.shared.state.borrow().visible_items.clone()
    }

    pub fn unique_technologies(&self) -> Vec<TechName> {
        self.shared.state.borrow().unique_technologies.clone()
    }

    pub fn last_updated(&self) -> Option<f64> {
        self.shared.state.borrow().last_updated
    }

    /// Run `f` against the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&TimelineState) -> R) -> R {
        f(&self.shared.state.borrow())
    }

    /// Call `listener` after every write.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.shared.next_id.get());
        self.shared.next_id.set(id.0 + 1);
        self.shared.listeners.borrow_mut().insert(id, listener);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.shared.listeners.borrow_mut().remove(&id);
    }
}

impl SnapshotWriter {
    /// Replace the snapshot wholesale and re-derive the technology list.
    pub fn publish(&self, snapshot: VisibilitySnapshot, timestamp: f64) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.unique_technologies = unique_technologies(&snapshot);
            state.visible_items = snapshot;
            state.last_updated = Some(timestamp);
        }
        self.notify();
    }

    /// Empty the snapshot (explicit reset).
    pub fn clear(&self, timestamp: f64) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.visible_items.clear();
            state.unique_technologies.clear();
            state.last_updated = Some(timestamp);
        }
        self.notify();
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self.shared.listeners.borrow().values().cloned().collect();
        let state = self.shared.state.borrow().clone();
        for listener in listeners {
            listener(&state);
        }
    }
}

/// Names across all items: exact-match dedup, lexicographic order.
pub fn unique_technologies(items: &[VisibleItemView]) -> Vec<TechName> {
    let mut names: Vec<TechName> = items
        .iter()
        .flat_map(|item| item.technologies.iter())
        .map(|tech| {
            if tech.name.is_empty() {
                TechName::from("Unknown")
            } else {
                tech.name.clone()
            }
        })
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_protocol::{
        BoxMetrics, ElementPosition, PercentagePosition, ScreenPosition, TechnologyPositionView,
        ViewportView,
    };

    fn item(index: usize, techs: &[&str]) -> VisibleItemView {
        VisibleItemView {
            index,
            title: format!("Entry {index}"),
            year: "2020".into(),
            company: "Acme".into(),
            visibility: 100,
            screen_position: ScreenPosition {
                viewport: BoxMetrics::default(),
                absolute: Default::default(),
                percentage: PercentagePosition {
                    from_top: "0%".into(),
                    from_left: "50%".into(),
                    visible_height: "100%".into(),
                },
            },
            technologies: techs
                .iter()
                .map(|t| TechnologyPositionView {
                    name: TechName::from(*t),
                    position: ElementPosition::ZEROED,
                })
                .collect(),
            viewport: ViewportView::default(),
        }
    }

    #[test]
    fn publish_derives_sorted_unique_names() {
        let (store, writer) = ViewStateStore::new();
        writer.publish(
            vec![item(0, &["React", "Docker"]), item(1, &["React", "docker", "Ansible"])],
            10.0,
        );
        let names: Vec<String> = store
            .unique_technologies()
            .iter()
            .map(|n| n.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["Ansible", "Docker", "React", "docker"]);
        assert_eq!(store.visible_items().len(), 2);
        assert_eq!(store.last_updated(), Some(10.0));
    }

    #[test]
    fn clear_empties_everything() {
        let (store, writer) = ViewStateStore::new();
        writer.publish(vec![item(0, &["Go"])], 1.0);
        writer.clear(2.0);
        assert!(store.visible_items().is_empty());
        assert!(store.unique_technologies().is_empty());
        assert_eq!(store.last_updated(), Some(2.0));
    }

    #[test]
    fn subscribers_see_each_write() {
        let (store, writer) = ViewStateStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let id = store.subscribe(Rc::new(move |state: &TimelineState| {
            s.borrow_mut().push(state.visible_items.len());
        }));
        writer.publish(vec![item(0, &[]), item(1, &[])], 1.0);
        store.unsubscribe(id);
        writer.publish(vec![], 2.0);
        assert_eq!(*seen.borrow(), vec![2]);
    }
}
