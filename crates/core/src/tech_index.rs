use folio_protocol::{DomTree, ElementId, tech_name};
use indexmap::{IndexMap, IndexSet};

use crate::attrs;

/// Technology → cards that list it, rebuilt from the live tree.
///
/// Keys are the raw tag tokens lowercased and trimmed. Buckets and keys
/// keep document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnologyIndex {
    buckets: IndexMap<String, IndexSet<ElementId>>,
}

impl TechnologyIndex {
    /// Scan every `[data-card-technologies]` element in the document.
    pub fn build(dom: &dyn DomTree) -> Self {
        let cards = dom.query_all(attrs::CARDS);
        let mut index = Self::default();
        for card in cards {
            let raw = dom.attribute(card, attrs::CARD_TECHNOLOGIES).unwrap_or_default();
            index.insert_card(card, &raw);
        }
        index
    }

    /// Add `card` under every token of a comma-separated technology list.
    pub fn insert_card(&mut self, card: ElementId, raw: &str) {
        for token in attrs::split_technologies(raw) {
            self.buckets
                .entry(tech_name::index_key(token))
                .or_default()
                .insert(card);
        }
    }

    /// Exact bucket for an index key.
    pub fn get(&self, key: &str) -> Option<&IndexSet<ElementId>> {
        self.buckets.get(key)
    }

    /// Bucket of the first key that matches `tech` once both sides are
    /// reduced to their alphanumeric residue.
    pub fn lookup(&self, tech: &str) -> Option<&IndexSet<ElementId>> {
        let wanted = tech_name::match_key(tech);
        self.buckets
            .iter()
            .find(|(key, _)| tech_name::match_key(key) == wanted)
            .map(|(_, cards)| cards)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_headless::HeadlessDom;

    #[test]
    fn builds_lowercased_buckets_in_document_order() {
        let dom = HeadlessDom::new();
        let a = dom.append(None, &[(attrs::CARD_TECHNOLOGIES, "React, Node.js")]);
        let b = dom.append(None, &[(attrs::CARD_TECHNOLOGIES, " react ,Docker,")]);
        dom.append(None, &[("data-other", "React")]);
        let index = TechnologyIndex::build(&dom);
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["react", "node.js", "docker"]);
        let react: Vec<_> = index.get("react").map(|s| s.iter().copied().collect()).unwrap_or_default();
        assert_eq!(react, vec![a, b]);
    }

    #[test]
    fn lookup_uses_alphanumeric_residue() {
        let mut index = TechnologyIndex::default();
        index.insert_card(ElementId(1), "node js");
        index.insert_card(ElementId(2), "Node.js");
        // Two distinct keys at build time...
        assert_eq!(index.len(), 2);
        // ...but a label finds the first one whose residue matches.
        let hit: Vec<_> = index.lookup("NodeJS").map(|s| s.iter().copied().collect()).unwrap_or_default();
        assert_eq!(hit, vec![ElementId(1)]);
        assert!(index.lookup("Deno").is_none());
    }
}
