pub mod entry;
pub mod fixtures;

pub use entry::{Timeline, TimelineEntry};
pub use fixtures::{FixtureError, SkillYears, parse_skill_years, parse_work_experience};
