use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use folio_protocol::{DomTree, ElementId, Rect, Selector};

#[derive(Debug, Default)]
struct Node {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    rect: Option<Rect>,
}

/// An in-memory element tree with fixed geometry.
///
/// Elements are appended under a parent (or at the document root) and keep
/// document order. Geometry is whatever the test sets; detached subtrees
/// report no rect and are skipped by queries.
#[derive(Debug, Default)]
pub struct HeadlessDom {
    nodes: RefCell<HashMap<ElementId, Node>>,
    roots: RefCell<Vec<ElementId>>,
    next_id: Cell<u64>,
}

impl HeadlessDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new element under `parent` (or at the root).
    pub fn append(&self, parent: Option<ElementId>, attrs: &[(&str, &str)]) -> ElementId {
        let id = ElementId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let node = Node {
            parent,
            attributes: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..Node::default()
        };
        let mut nodes = self.nodes.borrow_mut();
        nodes.insert(id, node);
        match parent {
            Some(p) => {
                if let Some(parent_node) = nodes.get_mut(&p) {
                    parent_node.children.push(id);
                }
            }
            None => self.roots.borrow_mut().push(id),
        }
        id
    }

    /// Append an element with a bounding box.
    pub fn append_at(
        &self,
        parent: Option<ElementId>,
        attrs: &[(&str, &str)],
        rect: Rect,
    ) -> ElementId {
        let id = self.append(parent, attrs);
        self.set_rect(id, rect);
        id
    }

    pub fn set_rect(&self, node: ElementId, rect: Rect) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.rect = Some(rect);
        }
    }

    /// Shift every element's box vertically, as a window scroll would.
    pub fn shift_all(&self, dy: f64) {
        for node in self.nodes.borrow_mut().values_mut() {
            if let Some(rect) = node.rect.as_mut() {
                rect.y += dy;
            }
        }
    }

    /// Remove `node` and its subtree from the document.
    pub fn detach(&self, node: ElementId) {
        let parent = self.nodes.borrow().get(&node).and_then(|n| n.parent);
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.borrow_mut().get_mut(&p) {
                    parent_node.children.retain(|c| *c != node);
                }
            }
            None => self.roots.borrow_mut().retain(|r| *r != node),
        }
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.parent = None;
        }
    }

    /// Elements (attached or not) that currently carry `name`.
    pub fn count_with_attribute(&self, name: &str) -> usize {
        self.nodes
            .borrow()
            .values()
            .filter(|n| n.attributes.contains_key(name))
            .count()
    }

    fn collect(&self, start: &[ElementId], selector: Selector, out: &mut Vec<ElementId>) {
        let nodes = self.nodes.borrow();
        let mut stack: Vec<ElementId> = start.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = nodes.get(&id) else {
                continue;
            };
            if selector.matches(|name| node.attributes.get(name).cloned()) {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
    }
}

impl DomTree for HeadlessDom {
    fn query_all(&self, selector: Selector) -> Vec<ElementId> {
        let roots = self.roots.borrow().clone();
        let mut out = Vec::new();
        self.collect(&roots, selector, &mut out);
        out
    }

    fn query_within(&self, root: ElementId, selector: Selector) -> Vec<ElementId> {
        let children = match self.nodes.borrow().get(&root) {
            Some(n) => n.children.clone(),
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        self.collect(&children, selector, &mut out);
        out
    }

    fn contains(&self, node: ElementId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = node;
        loop {
            match nodes.get(&current) {
                Some(n) => match n.parent {
                    Some(p) => current = p,
                    None => return self.roots.borrow().contains(&current),
                },
                None => return false,
            }
        }
    }

    fn attribute(&self, node: ElementId, name: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(&node)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&self, node: ElementId, name: &str, value: &str) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&self, node: ElementId, name: &str) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.attributes.remove(name);
        }
    }

    fn bounding_rect(&self, node: ElementId) -> Option<Rect> {
        if !self.contains(node) {
            return None;
        }
        self.nodes.borrow().get(&node).and_then(|n| n.rect)
    }

    fn style(&self, node: ElementId, property: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(&node)
            .and_then(|n| n.style.get(property).cloned())
    }

    fn set_style(&self, node: ElementId, property: &str, value: &str) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.style.insert(property.to_string(), value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_follow_document_order() {
        let dom = HeadlessDom::new();
        let root = dom.append(None, &[]);
        let a = dom.append(Some(root), &[("data-x", "a")]);
        let b = dom.append(Some(root), &[("data-x", "b")]);
        // Appended later but nested under `a`, so it precedes `b`.
        let a1 = dom.append(Some(a), &[("data-x", "a1")]);
        assert_eq!(dom.query_all(Selector::HasAttr("data-x")), vec![a, a1, b]);
        assert_eq!(dom.query_within(a, Selector::HasAttr("data-x")), vec![a1]);
    }

    #[test]
    fn detached_subtree_is_invisible() {
        let dom = HeadlessDom::new();
        let root = dom.append(None, &[]);
        let card = dom.append_at(Some(root), &[("data-x", "1")], Rect::new(0.0, 0.0, 10.0, 10.0));
        let icon = dom.append(Some(card), &[("title", "Go")]);
        dom.detach(card);
        assert!(!dom.contains(card));
        assert!(!dom.contains(icon));
        assert_eq!(dom.bounding_rect(card), None);
        assert!(dom.query_all(Selector::HasAttr("data-x")).is_empty());
    }

    #[test]
    fn attribute_value_selector() {
        let dom = HeadlessDom::new();
        let a = dom.append(None, &[("data-tech-selected", "1")]);
        dom.append(None, &[("data-tech-selected", "0")]);
        assert_eq!(
            dom.query_all(Selector::AttrEquals("data-tech-selected", "1")),
            vec![a]
        );
    }
}
