//! Attribute names shared with the rendering layer.
//!
//! These are the only coupling between the core and the markup; renaming
//! any of them is a breaking change for the page templates.

use folio_protocol::Selector;

/// Comma-separated technology list on each timeline card.
pub const CARD_TECHNOLOGIES: &str = "data-card-technologies";
/// Fixture index of the record a card renders.
pub const CARD_INDEX: &str = "data-card-index";
/// Single technology name on each technology label.
pub const TECH_NAME: &str = "data-tech-name";
/// Technology name on icon containers.
pub const TITLE: &str = "title";
/// Set on cards of the active technology; value is the technology name.
pub const SELECTED_TECH: &str = "data-selected-tech";
/// Set to "1" on icons inside highlighted cards that match the active technology.
pub const TECH_SELECTED: &str = "data-tech-selected";
/// Display index written onto each card for intersection reports.
pub const ENTRY_INDEX: &str = "data-index";
/// Set to "1" once a card has entered the viewport.
pub const REVEALED: &str = "data-revealed";

pub const CARDS: Selector = Selector::HasAttr(CARD_TECHNOLOGIES);
pub const LABELS: Selector = Selector::HasAttr(TECH_NAME);
pub const ICONS: Selector = Selector::HasAttr(TITLE);
pub const FLAGGED_ICONS: Selector = Selector::AttrEquals(TECH_SELECTED, "1");

/// Split a comma-separated technology attribute into trimmed, non-empty tokens.
pub fn split_technologies(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_empty_tokens() {
        let tokens: Vec<_> = split_technologies(" React, ,Node.js ,").collect();
        assert_eq!(tokens, vec!["React", "Node.js"]);
    }
}
