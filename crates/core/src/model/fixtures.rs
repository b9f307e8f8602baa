use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::entry::{Timeline, TimelineEntry};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Declared experience with one technology (`skills-years.json`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkillYears {
    pub title: String,
    /// Non-numeric values count as zero.
    #[serde(default, deserialize_with = "lenient_years")]
    pub years: f64,
}

fn lenient_years<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

/// Parse `work-experience.json`: an array of records, oldest first.
pub fn parse_work_experience(data: &[u8]) -> Result<Timeline, FixtureError> {
    let entries: Vec<TimelineEntry> = serde_json::from_slice(data)?;
    Ok(Timeline::new(entries))
}

/// Parse `skills-years.json`: an array of `{title, years}`.
pub fn parse_skill_years(data: &[u8]) -> Result<Vec<SkillYears>, FixtureError> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_record() {
        let data = br#"[{"years": "2014-2016", "title": "Dev", "company": "Acme", "technologies": "React, Redux"}]"#;
        let timeline = parse_work_experience(data).unwrap_or_default();
        assert_eq!(timeline.len(), 1);
        let entry = &timeline.entries()[0];
        assert_eq!(entry.company, "Acme");
        assert_eq!(entry.company_site, None);
        assert_eq!(entry.about_product, "");
    }

    #[test]
    fn rejects_non_array() {
        assert!(parse_work_experience(br#"{"years": "2014"}"#).is_err());
    }

    #[test]
    fn skill_years_tolerates_strings() {
        let data = br#"[{"title": "Go", "years": 3}, {"title": "Rust", "years": "many"}, {"title": "Zig"}]"#;
        let skills = parse_skill_years(data).unwrap_or_default();
        assert_eq!(skills.len(), 3);
        assert_eq!(skills[0].years, 3.0);
        assert_eq!(skills[1].years, 0.0);
        assert_eq!(skills[2].years, 0.0);
    }
}
