//! Experience per technology, for the progress bars panel.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::attrs;
use crate::model::{SkillYears, Timeline};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnologyUsage {
    pub name: String,
    /// Years of use.
    pub duration: f64,
    /// Relative to the longest-used technology, one decimal.
    pub percentage: f64,
    pub color: String,
}

const PALETTE: &[(&str, &str)] = &[
    ("JavaScript/TypeScript", "#f0db4f"),
    ("JavaScript", "#f0db4f"),
    ("TypeScript", "#007acc"),
    ("React", "#61dafb"),
    ("Node.js", "#83CD29"),
    ("HTML", "#e34c26"),
    ("CSS", "#264de4"),
    ("Sass", "#cc6699"),
    ("Redux", "#764abc"),
    ("GraphQL", "#e10098"),
    ("MongoDB", "#4db33d"),
    ("PostgreSQL", "#336791"),
    ("Docker", "#0db7ed"),
    ("Git", "#f34f29"),
    ("Webpack", "#8dd6f9"),
    ("Jest", "#c21325"),
    ("Cypress", "#17202C"),
    ("AngularJS", "#dd0031"),
    ("jQuery", "#0769ad"),
    ("Photoshop", "#001e36"),
    ("Illustrator", "#330000"),
    ("3DMax", "#2d5f8d"),
    ("Figma", "#f24e1e"),
    ("Blender", "#ea7600"),
    ("Bootstrap", "#563d7c"),
    ("Tailwind", "#38b2ac"),
    ("Next.js", "#00e7ff"),
    ("NestJS", "#e0234e"),
    ("Express", "#47b5f9"),
    ("Mongoose", "#880000"),
    ("D3.js", "#f9a03c"),
    ("Three.js", "#8deaff"),
    ("Electron.js", "#47848F"),
    ("PixiJS", "#f9a01b"),
    ("MobX", "#ff9955"),
    ("JWT", "#f0ad00"),
    ("Socket.IO", "#ffffff"),
    ("OAuth", "#eb5424"),
    ("REST", "#6e5494"),
    ("WebSockets", "#00e5ff"),
    ("WebRTC", "#00c2ff"),
    ("PWA", "#5a0fc8"),
    ("Jira", "#0052cc"),
    ("Confluence", "#172b4d"),
    ("Trello", "#0079bf"),
    ("Slack", "#4a154b"),
    ("VS Code", "#0078d7"),
    ("WebStorm", "#00cdff"),
    ("GitHub", "#ffffff"),
    ("GitLab", "#fca121"),
    ("Bitbucket", "#0052cc"),
    ("npm", "#cb3837"),
    ("Yarn", "#2c8ebb"),
    ("Linux", "#fcc624"),
    ("Windows", "#0078d7"),
    ("macOS", "#ffffff"),
    ("AWS", "#ff9900"),
    ("Firebase", "#ffca28"),
    ("Vercel", "#ffffff"),
    ("Netlify", "#00c7b7"),
    ("Heroku", "#430098"),
    ("DigitalOcean", "#0080ff"),
    ("Nginx", "#009639"),
    ("Apache", "#d22128"),
    ("WordPress", "#21759b"),
    ("Shopify", "#7ab55c"),
    ("Webflow", "#4353ff"),
    ("Airtable", "#18bfff"),
    ("React Flow", "#00e5a8"),
    ("Passport.js", "#34e27a"),
    ("Material Design", "#4285f4"),
    ("Jade", "#00a86b"),
    ("Notion", "#000000"),
    ("Framer", "#0055ff"),
    ("Rive", "#ff7d00"),
    ("Lottie", "#00b0ff"),
    ("GSAP", "#88ce02"),
    ("Framer Motion", "#0055ff"),
    ("React Spring", "#ff6d6d"),
    ("React Three Fiber", "#00d8ff"),
];

/// Palette colour for `name`, or a stable bright colour derived from it.
pub fn color_for(name: &str) -> String {
    if let Some((_, color)) = PALETTE.iter().find(|(key, _)| *key == name) {
        return (*color).to_string();
    }
    // `h * 31 + unit` over UTF-16 units, wrapping at 32 bits.
    let hash = name
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit)));
    format!("hsl({} 75% 55%)", hash.unsigned_abs() % 360)
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Attach colours and percentages relative to the largest duration.
fn with_percentages(durations: IndexMap<String, f64>) -> Vec<TechnologyUsage> {
    let max = durations.values().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    durations
        .into_iter()
        .map(|(name, duration)| TechnologyUsage {
            color: color_for(&name),
            percentage: (duration / max * 1000.0).round() / 10.0,
            name,
            duration,
        })
        .collect()
}

/// Years per technology summed over the work history, longest first.
pub fn usage_by_work_years(timeline: &Timeline) -> Vec<TechnologyUsage> {
    let mut durations: IndexMap<String, f64> = IndexMap::new();
    for entry in timeline.entries() {
        let duration = f64::from(entry.duration_years());
        for tech in attrs::split_technologies(&entry.technologies) {
            *durations.entry(tech.to_string()).or_insert(0.0) += duration;
        }
    }
    let mut usage = with_percentages(durations);
    usage.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    usage
}

/// Declared years per technology: aliases merged, longest claim kept.
pub fn usage_by_declared_years(skills: &[SkillYears], parser: &SkillParser) -> Vec<TechnologyUsage> {
    let mut durations: IndexMap<String, f64> = IndexMap::new();
    for skill in skills.iter().filter(|s| !s.title.is_empty() && s.years > 0.0) {
        let slot = durations
            .entry(parser.normalize_tech_name(&skill.title))
            .or_insert(0.0);
        *slot = slot.max(skill.years);
    }
    let mut usage = with_percentages(durations);
    usage.sort_by(|a, b| b.duration.total_cmp(&a.duration));
    usage
}

/// "1 year", "3 years", "2.5 years".
pub fn format_years_en(years: f64) -> String {
    let n = one_decimal(years);
    if n.fract() != 0.0 {
        return format!("{n} years");
    }
    let whole = n as i64;
    if whole == 1 {
        "1 year".to_string()
    } else {
        format!("{whole} years")
    }
}

/// Free-text skill details and name aliases.
pub struct SkillParser {
    paren: Regex,
    plus: Regex,
    years: Regex,
    half_year: Regex,
    months: Regex,
    from_year: Regex,
    bare: Regex,
    js_ts: Regex,
    typescript: Regex,
    javascript: Regex,
    less: Regex,
    react_flow: Regex,
}

const ALIASES: &[(&str, &str)] = &[
    ("NodeJS", "Node.js"),
    ("NodeJs", "Node.js"),
    ("Node", "Node.js"),
    ("Next", "Next.js"),
    ("NextJS", "Next.js"),
    ("NuxtJS", "Nuxt"),
    ("ThreeJS", "Three.js"),
    ("ReactJS", "React"),
    ("AngularJs", "AngularJS"),
    ("Express.js", "Express"),
    ("ExpressJS", "Express"),
    ("ExpessJS", "Express"),
    ("MongooseJS", "Mongoose"),
    ("JQuery", "jQuery"),
    ("Electron", "Electron.js"),
    ("SocketIO", "Socket.IO"),
];

impl SkillParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            paren: Regex::new(r"\((\d+)\+?\)")?,
            plus: Regex::new(r"\b(\d+)\s*\+")?,
            years: Regex::new(r"\b(\d+)\s*years?\b")?,
            half_year: Regex::new(r"half\s*year")?,
            months: Regex::new(r"\b(\d+)\s*months?\b")?,
            from_year: Regex::new(r"from\s*(\d{4})")?,
            bare: Regex::new(r"^\s*(\d+)\s*(?:y|yr|yrs)?\s*$")?,
            js_ts: Regex::new(r"(?i)java\s*script\s*/\s*type\s*script")?,
            typescript: Regex::new(r"(?i)typescript?\b")?,
            javascript: Regex::new(r"(?i)javascript\b")?,
            less: Regex::new(r"(?i)less\b")?,
            react_flow: Regex::new(r"(?i)react\s*flow")?,
        })
    }

    /// Years claimed by a details string; 0 when nothing is recognised.
    ///
    /// `current_year` anchors "from YYYY".
    pub fn parse_years(&self, details: &str, current_year: i32) -> f64 {
        let details = details.to_lowercase();
        let number = |re: &Regex| -> Option<f64> {
            re.captures(&details)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        };

        if let Some(n) = number(&self.paren) {
            return n;
        }
        if let Some(n) = number(&self.plus) {
            return n;
        }
        if let Some(n) = number(&self.years) {
            return n;
        }
        if self.half_year.is_match(&details) {
            return 0.5;
        }
        if let Some(n) = number(&self.months) {
            return one_decimal(n / 12.0);
        }
        if let Some(year) = number(&self.from_year)
            && year <= f64::from(current_year)
        {
            return f64::from(current_year) - year;
        }
        number(&self.bare).unwrap_or(0.0)
    }

    /// Fold spelling variants onto one display name.
    pub fn normalize_tech_name(&self, raw: &str) -> String {
        let name = raw
            .strip_prefix(['"', '\''])
            .unwrap_or(raw);
        let name = name.strip_suffix(['"', '\'']).unwrap_or(name).trim();
        let lower = name.to_lowercase();

        if self.js_ts.is_match(name) {
            return "JavaScript/TypeScript".into();
        }
        if self.typescript.is_match(name) {
            return "TypeScript".into();
        }
        if self.javascript.is_match(name) {
            return "JavaScript".into();
        }
        if lower.contains("html") {
            return "HTML".into();
        }
        if lower.contains("css") {
            if lower.contains("sass") || lower.contains("scss") {
                return "Sass".into();
            }
            return "CSS".into();
        }
        if self.less.is_match(name) {
            return "CSS".into();
        }
        if lower.contains("jade") {
            return "Jade".into();
        }
        if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
            return (*canonical).into();
        }
        if lower.contains("docker compose") {
            return "Docker".into();
        }
        if lower.contains("passport.js") {
            return "Passport.js".into();
        }
        if self.react_flow.is_match(name) {
            return "React Flow".into();
        }
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimelineEntry;

    fn parser() -> SkillParser {
        SkillParser::new().unwrap()
    }

    fn entry(years: &str, technologies: &str) -> TimelineEntry {
        TimelineEntry {
            years: years.into(),
            technologies: technologies.into(),
            ..TimelineEntry::default()
        }
    }

    #[test]
    fn work_years_are_summed_and_ranked() {
        let timeline = Timeline::new(vec![
            entry("2014-2016", "React, Redux"),
            entry("2017", "React"),
            entry("2018 - 2021", "Docker"),
        ]);
        let usage = usage_by_work_years(&timeline);
        let summary: Vec<_> = usage
            .iter()
            .map(|u| (u.name.as_str(), u.duration, u.percentage))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("React", 4.0, 100.0),
                ("Docker", 4.0, 100.0),
                ("Redux", 3.0, 75.0)
            ]
        );
        assert_eq!(usage[0].color, "#61dafb");
    }

    #[test]
    fn declared_years_keep_the_longest_alias() {
        let skills = vec![
            SkillYears {
                title: "NodeJS".into(),
                years: 4.0,
            },
            SkillYears {
                title: "Node".into(),
                years: 6.0,
            },
            SkillYears {
                title: "TypeScrip".into(),
                years: 3.0,
            },
            SkillYears {
                title: "Cobol".into(),
                years: 0.0,
            },
        ];
        let usage = usage_by_declared_years(&skills, &parser());
        let names: Vec<_> = usage.iter().map(|u| (u.name.as_str(), u.duration)).collect();
        assert_eq!(names, vec![("Node.js", 6.0), ("TypeScript", 3.0)]);
        assert_eq!(usage[1].percentage, 50.0);
    }

    #[test]
    fn parses_free_text_details() {
        let p = parser();
        assert_eq!(p.parse_years("Expert (13+)", 2025), 13.0);
        assert_eq!(p.parse_years("10+ years", 2025), 10.0);
        assert_eq!(p.parse_years("3 years", 2025), 3.0);
        assert_eq!(p.parse_years("Half year", 2025), 0.5);
        assert_eq!(p.parse_years("6 months", 2025), 0.5);
        assert_eq!(p.parse_years("from 2016", 2025), 9.0);
        assert_eq!(p.parse_years("from 2030", 2025), 0.0);
        assert_eq!(p.parse_years("2 y", 2025), 2.0);
        assert_eq!(p.parse_years("some", 2025), 0.0);
    }

    #[test]
    fn normalizes_aliases() {
        let p = parser();
        assert_eq!(p.normalize_tech_name("JavaScript / TypeScript"), "JavaScript/TypeScript");
        assert_eq!(p.normalize_tech_name("'SCSS/CSS'"), "Sass");
        assert_eq!(p.normalize_tech_name("Less"), "CSS");
        assert_eq!(p.normalize_tech_name("ExpessJS"), "Express");
        assert_eq!(p.normalize_tech_name("Docker Compose"), "Docker");
        assert_eq!(p.normalize_tech_name("ReactFlow"), "React Flow");
        assert_eq!(p.normalize_tech_name("Rust"), "Rust");
    }

    #[test]
    fn years_wording() {
        assert_eq!(format_years_en(1.0), "1 year");
        assert_eq!(format_years_en(3.0), "3 years");
        assert_eq!(format_years_en(2.5), "2.5 years");
        assert_eq!(format_years_en(0.04), "0 years");
    }

    #[test]
    fn unknown_names_get_a_stable_hue() {
        let a = color_for("Zig");
        assert!(a.starts_with("hsl(") && a.ends_with(" 75% 55%)"));
        assert_eq!(a, color_for("Zig"));
    }
}
