//! The technology list beside the timeline: ordering, counts and the
//! hover/selection state that drives highlighting.

use std::collections::HashMap;

use folio_protocol::{DomTree, TechName};

use crate::attrs;

/// Transient hover plus one sticky selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechSelection {
    hovered: Option<TechName>,
    selected: Option<TechName>,
}

impl TechSelection {
    pub fn hovered(&self) -> Option<&TechName> {
        self.hovered.as_ref()
    }

    pub fn selected(&self) -> Option<&TechName> {
        self.selected.as_ref()
    }

    /// Selection if present, else hover.
    pub fn active(&self) -> Option<&TechName> {
        self.selected.as_ref().or(self.hovered.as_ref())
    }

    /// Pointer moved over an item (or over a gap, `None`). Ignored while
    /// something is selected. Returns whether anything changed.
    pub fn hover(&mut self, name: Option<TechName>) -> bool {
        if self.selected.is_some() || self.hovered == name {
            return false;
        }
        self.hovered = name;
        true
    }

    /// Pointer left the list.
    pub fn leave(&mut self) -> bool {
        if self.selected.is_some() || self.hovered.is_none() {
            return false;
        }
        self.hovered = None;
        true
    }

    /// Click: select `name`, or deselect it if it was the selection.
    /// Hover follows the clicked item either way.
    pub fn toggle(&mut self, name: TechName) {
        self.selected = if self.selected.as_ref() == Some(&name) {
            None
        } else {
            Some(name.clone())
        };
        self.hovered = Some(name);
    }

    pub fn is_highlighted(&self, tech: &str) -> bool {
        self.hovered.as_ref().is_some_and(|h| *h == tech)
            || self.selected.as_ref().is_some_and(|s| *s == tech)
    }
}

/// How many cards list each technology (raw token, case-sensitive).
pub fn connection_counts(dom: &dyn DomTree) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for card in dom.query_all(attrs::CARDS) {
        let raw = dom.attribute(card, attrs::CARD_TECHNOLOGIES).unwrap_or_default();
        for token in attrs::split_technologies(&raw) {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Order `technologies` by connection count, most connected first.
/// Ties keep their incoming (alphabetical) order.
pub fn sort_by_connections(
    technologies: &[TechName],
    counts: &HashMap<String, usize>,
) -> Vec<TechName> {
    let mut sorted = technologies.to_vec();
    sorted.sort_by_key(|t| std::cmp::Reverse(counts.get(t.as_str()).copied().unwrap_or(0)));
    sorted
}

/// The list as displayed: the selection pinned first, then the base order.
pub fn display_list(base: &[TechName], selected: Option<&TechName>) -> Vec<TechName> {
    let Some(selected) = selected else {
        return base.to_vec();
    };
    std::iter::once(selected.clone())
        .chain(base.iter().filter(|t| *t != selected).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_headless::HeadlessDom;

    fn names(list: &[&str]) -> Vec<TechName> {
        list.iter().map(|s| TechName::from(*s)).collect()
    }

    #[test]
    fn hover_is_ignored_while_selected() {
        let mut sel = TechSelection::default();
        assert!(sel.hover(Some("React".into())));
        sel.toggle("Docker".into());
        assert_eq!(sel.active().map(TechName::as_str), Some("Docker"));
        assert!(!sel.hover(Some("Go".into())));
        assert!(!sel.leave());
        assert_eq!(sel.hovered().map(TechName::as_str), Some("Docker"));
    }

    #[test]
    fn clicking_selection_again_deselects() {
        let mut sel = TechSelection::default();
        sel.toggle("Go".into());
        sel.toggle("Go".into());
        assert!(sel.selected().is_none());
        // Hover stays on the clicked item until the pointer leaves.
        assert_eq!(sel.active().map(TechName::as_str), Some("Go"));
        assert!(sel.leave());
        assert!(sel.active().is_none());
    }

    #[test]
    fn clicking_another_item_replaces_selection() {
        let mut sel = TechSelection::default();
        sel.toggle("Go".into());
        sel.toggle("Rust".into());
        assert_eq!(sel.selected().map(TechName::as_str), Some("Rust"));
        assert!(sel.is_highlighted("Rust"));
        assert!(!sel.is_highlighted("Go"));
    }

    #[test]
    fn counts_and_sort() {
        let dom = HeadlessDom::new();
        dom.append(None, &[(attrs::CARD_TECHNOLOGIES, "React, Redux")]);
        dom.append(None, &[(attrs::CARD_TECHNOLOGIES, "React, Docker")]);
        dom.append(None, &[(attrs::CARD_TECHNOLOGIES, "react")]);
        let counts = connection_counts(&dom);
        assert_eq!(counts.get("React"), Some(&2));
        assert_eq!(counts.get("react"), Some(&1));
        let sorted = sort_by_connections(&names(&["Docker", "React", "Redux", "Vue"]), &counts);
        assert_eq!(sorted, names(&["React", "Docker", "Redux", "Vue"]));
    }

    #[test]
    fn selection_is_pinned_without_duplicates() {
        let base = names(&["React", "Docker", "Go"]);
        let go = TechName::from("Go");
        assert_eq!(display_list(&base, Some(&go)), names(&["Go", "React", "Docker"]));
        let elm = TechName::from("Elm");
        assert_eq!(display_list(&base, Some(&elm)), names(&["Elm", "React", "Docker", "Go"]));
        assert_eq!(display_list(&base, None), base);
    }
}
