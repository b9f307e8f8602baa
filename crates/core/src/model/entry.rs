use folio_protocol::TechName;
use serde::{Deserialize, Serialize};

/// One work-experience record from the fixtures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(default)]
    pub year: String,
    /// Free-text span, e.g. "2014-2016".
    pub years: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub about_company: String,
    #[serde(default)]
    pub company_site: Option<String>,
    /// Comma-separated technology names.
    #[serde(default)]
    pub technologies: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub about_product: String,
}

impl TimelineEntry {
    /// Heading as rendered on the card.
    pub fn heading(&self) -> String {
        format!("{} at {}", self.title, self.company)
    }

    /// Technology names in declaration order.
    ///
    /// Blank tokens are kept as "Unknown" so the list stays aligned with
    /// the icons rendered for the same string.
    pub fn technology_names(&self) -> Vec<TechName> {
        if self.technologies.is_empty() {
            return Vec::new();
        }
        self.technologies
            .split(',')
            .map(|t| match t.trim() {
                "" => TechName::from("Unknown"),
                name => TechName::from(name),
            })
            .collect()
    }

    /// Number of calendar years the entry spans, inclusive.
    ///
    /// "2014-2016" → 3, "2019" → 1, anything without two four-digit years → 1.
    pub fn duration_years(&self) -> u32 {
        let years: Vec<u32> = self
            .years
            .split('-')
            .filter_map(|part| first_four_digits(part.trim()))
            .filter(|y| *y > 0)
            .collect();
        match years.as_slice() {
            [start, end, ..] => end.saturating_sub(*start) + 1,
            _ => 1,
        }
    }
}

fn first_four_digits(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|pos| s[pos..pos + 4].parse().ok())
}

/// The loaded records, in fixture order (oldest first).
///
/// The page renders them newest first, so display index `i` shows record
/// `len - 1 - i`.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new(entries: Vec<TimelineEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record shown at display position `index`.
    pub fn by_display_index(&self, index: usize) -> Option<&TimelineEntry> {
        let last = self.entries.len().checked_sub(1)?;
        let record = last.checked_sub(index)?;
        self.entries.get(record)
    }

    /// Records in display order (newest first).
    pub fn display_order(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().rev()
    }
}
