use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A technology name as it appears in fixtures and on label elements.
///
/// Wraps `Rc<str>`: names are cloned into every snapshot, line id and
/// highlight marker, and the whole core runs on one thread.
///
/// Equality is exact (case as given). The two normalization levels used
/// for matching against the card index live in [`index_key`] and
/// [`match_key`] and are deliberately not merged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TechName(Rc<str>);

impl TechName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key used when building the card index (lowercase + trim).
    pub fn index_key(&self) -> String {
        index_key(&self.0)
    }

    /// Key used when comparing a label against index keys.
    pub fn match_key(&self) -> String {
        match_key(&self.0)
    }
}

/// Lowercase and trim a raw tag token.
pub fn index_key(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// Lowercase, trim and drop everything outside `[a-z0-9]`.
///
/// "Node.js" and "node js" both reduce to "nodejs".
pub fn match_key(raw: &str) -> String {
    raw.to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

impl PartialEq<&str> for TechName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl std::ops::Deref for TechName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TechName {
    fn from(s: &str) -> Self {
        TechName(Rc::from(s))
    }
}

impl From<String> for TechName {
    fn from(s: String) -> Self {
        TechName(Rc::from(s))
    }
}

// serde's `rc` feature is off; names go over the wire as plain strings.

impl Serialize for TechName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TechName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(TechName::from)
    }
}
