//! Field extractors: derive normalized values from the free-text fields of a
//! single posting. Every function here is total; bad input yields a fallback
//! value, never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::WorkType;

pub const PLACEHOLDER_LOGO: &str = "/placeholder.svg?height=48&width=48";
pub const DEFAULT_SUMMARY_LEN: usize = 150;
pub const NO_DESCRIPTION: &str = "No description available";

const MILLIS_PER_DAY: u64 = 1000 * 60 * 60 * 24;

// --- Logo ---

pub fn valid_logo_url(logo: Option<&str>) -> String {
    match logo.filter(|l| !l.is_empty()) {
        Some(l) if url::Url::parse(l).is_ok() => l.to_string(),
        _ => PLACEHOLDER_LOGO.to_string(),
    }
}

// --- Dates ---

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses the timestamp shapes seen in scraped data. Values without an
/// offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Human label for how long ago `value` was, relative to `now`.
///
/// The distance is absolute, so a date in the future gets the same label as
/// a date equally far in the past.
pub fn format_relative_date(value: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return "Date unknown".to_string();
    };
    let Some(date) = parse_timestamp(value) else {
        return "Invalid date".to_string();
    };

    let elapsed = (now - date).num_milliseconds().unsigned_abs();
    let days = elapsed / MILLIS_PER_DAY;

    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => format!("{} weeks ago", days / 7),
        _ => format!("{} months ago", days / 30),
    }
}

pub fn relative_date(value: Option<&str>) -> String {
    format_relative_date(value, Utc::now())
}

// --- Work type ---

pub fn extract_work_type(description: Option<&str>) -> WorkType {
    let Some(description) = description else {
        return WorkType::NotSpecified;
    };
    let lower = description.to_lowercase();

    if lower.contains("remote") {
        WorkType::Remote
    } else if lower.contains("hybrid") {
        WorkType::Hybrid
    } else if lower.contains("on-site") || lower.contains("onsite") {
        WorkType::OnSite
    } else {
        WorkType::NotSpecified
    }
}

// --- Summary ---

/// Shortens `description` to at most `max_len` characters plus `...`,
/// breaking on the last whitespace when there is one.
pub fn truncate_description(description: Option<&str>, max_len: usize) -> String {
    let Some(text) = description.filter(|d| !d.is_empty()) else {
        return NO_DESCRIPTION.to_string();
    };

    let head = match text.char_indices().nth(max_len) {
        Some((idx, _)) => &text[..idx],
        None => return text.to_string(),
    };

    match head.rfind(char::is_whitespace) {
        Some(idx) => format!("{}...", &head[..idx]),
        None => format!("{}...", head),
    }
}

// --- Salary ---

pub struct SalaryRule {
    pub label: &'static str,
    pub regex: Regex,
}

/// Tried in order; the first rule matching anywhere in the text wins.
pub static SALARY_RULES: LazyLock<Vec<SalaryRule>> = LazyLock::new(|| {
    [
        (
            "currency range",
            r"(?i)\$(\d{1,3}(,\d{3})*(\.\d+)?)\s*-\s*\$(\d{1,3}(,\d{3})*(\.\d+)?)",
        ),
        ("currency amount", r"(?i)(\$\d{1,3}(,\d{3})*(\.\d+)?)"),
        (
            "range per period",
            r"(?i)(\d{1,3}(,\d{3})*(\.\d+)?)\s*-\s*(\d{1,3}(,\d{3})*(\.\d+)?)\s*/\s*(year|yr|hour|hr)",
        ),
        (
            "amount per period",
            r"(?i)(\d{1,3}(,\d{3})*(\.\d+)?)\s*/\s*(year|yr|hour|hr)",
        ),
        ("thousands range", r"(?i)(\d{2,3})(k)\s*-\s*(\d{2,3})(k)"),
    ]
    .into_iter()
    .map(|(label, pattern)| SalaryRule {
        label,
        regex: Regex::new(pattern).expect("salary rule pattern compiles"),
    })
    .collect()
});

static FIRST_SALARY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$?(\d{1,3}(?:,\d{3})*|\d+)(?:k)?").expect("salary number pattern compiles")
});

pub fn extract_salary(description: Option<&str>) -> Option<String> {
    let text = description?;
    SALARY_RULES.iter().find_map(|rule| {
        let m = rule.regex.find(text)?;
        tracing::trace!(rule = rule.label, salary = m.as_str(), "salary rule matched");
        Some(m.as_str().to_string())
    })
}

/// Lower bound of the advertised salary, in plain units (`80k` → 80000).
pub fn parse_min_salary(description: Option<&str>) -> Option<f64> {
    let salary = extract_salary(description)?;
    let caps = FIRST_SALARY_NUMBER.captures(&salary)?;

    let digits = caps.get(1)?.as_str().replace(',', "");
    let mut amount: f64 = digits.parse().ok()?;
    if caps.get(0)?.as_str().to_lowercase().contains('k') {
        amount *= 1000.0;
    }
    Some(amount)
}

// --- Skills ---

const SKILL_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "languages",
        &[
            "Python", "JavaScript", "TypeScript", "Java", "C++", "C#", "Ruby", "Go", "Rust", "PHP",
            "Swift", "Kotlin",
        ],
    ),
    (
        "frameworks",
        &[
            "React", "Angular", "Vue", "Node.js", "Express", "Django", "Flask", "Spring",
            "Laravel", "Rails",
        ],
    ),
    (
        "cloud",
        &["AWS", "Azure", "GCP", "Docker", "Kubernetes", "Terraform", "Jenkins", "Git", "CI/CD"],
    ),
    (
        "data stores",
        &["SQL", "NoSQL", "MongoDB", "PostgreSQL", "MySQL", "Oracle", "Redis", "Elasticsearch"],
    ),
    (
        "ai",
        &[
            "Machine Learning",
            "Deep Learning",
            "NLP",
            "Computer Vision",
            "Data Science",
            "AI",
            "Artificial Intelligence",
        ],
    ),
    (
        "ml libraries",
        &["TensorFlow", "PyTorch", "Scikit-learn", "Pandas", "NumPy", "Keras", "NLTK", "OpenCV"],
    ),
    (
        "project management",
        &["Agile", "Scrum", "Kanban", "JIRA", "Confluence", "Trello", "Asana"],
    ),
    (
        "architecture",
        &["REST", "GraphQL", "API", "Microservices", "Serverless", "WebSockets"],
    ),
];

pub struct SkillRule {
    pub category: &'static str,
    pub regex: Regex,
}

pub static SKILL_RULES: LazyLock<Vec<SkillRule>> = LazyLock::new(|| {
    SKILL_CATEGORIES
        .iter()
        .map(|&(category, words)| {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            SkillRule {
                category,
                regex: Regex::new(&format!(r"(?i)\b({})\b", alternation))
                    .expect("skill rule pattern compiles"),
            }
        })
        .collect()
});

/// Skills mentioned in `description`, deduplicated ignoring case.
///
/// Results are lower-cased with only the first letter raised
/// (`TypeScript` comes back as `Typescript`).
pub fn extract_skills(description: Option<&str>) -> Vec<String> {
    let Some(text) = description.filter(|d| !d.is_empty()) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut skills = Vec::new();

    for rule in SKILL_RULES.iter() {
        for m in rule.regex.find_iter(text) {
            let lower = m.as_str().to_lowercase();
            if seen.insert(lower.clone()) {
                tracing::trace!(category = rule.category, skill = m.as_str(), "skill found");
                skills.push(capitalize_first(&lower));
            }
        }
    }

    skills
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-06-15T12:00:00Z").unwrap()
    }

    fn ago(duration: Duration) -> String {
        (now() - duration).to_rfc3339()
    }

    #[test]
    fn test_extractors_are_total_on_missing_input() {
        assert_eq!(valid_logo_url(None), PLACEHOLDER_LOGO);
        assert_eq!(format_relative_date(None, now()), "Date unknown");
        assert_eq!(extract_work_type(None), WorkType::NotSpecified);
        assert_eq!(truncate_description(None, 150), NO_DESCRIPTION);
        assert_eq!(extract_salary(None), None);
        assert_eq!(parse_min_salary(None), None);
        assert!(extract_skills(None).is_empty());

        assert_eq!(valid_logo_url(Some("")), PLACEHOLDER_LOGO);
        assert_eq!(format_relative_date(Some(""), now()), "Date unknown");
        assert_eq!(extract_work_type(Some("")), WorkType::NotSpecified);
        assert_eq!(truncate_description(Some(""), 150), NO_DESCRIPTION);
        assert_eq!(extract_salary(Some("")), None);
        assert!(extract_skills(Some("")).is_empty());
    }

    #[test]
    fn test_valid_logo_url() {
        let logo = "https://media.licdn.com/dms/image/logo.png";
        assert_eq!(valid_logo_url(Some(logo)), logo);
        assert_eq!(valid_logo_url(Some("not a url")), PLACEHOLDER_LOGO);
        assert_eq!(valid_logo_url(Some("/relative/logo.png")), PLACEHOLDER_LOGO);
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        assert!(parse_timestamp("2024-06-15T12:00:00Z").is_some());
        assert!(parse_timestamp("2024-06-15T12:00:00.123+02:00").is_some());
        assert!(parse_timestamp("2024-06-15T12:00:00").is_some());
        assert!(parse_timestamp("2024-06-15 12:00:00").is_some());
        assert!(parse_timestamp("2024-06-15").is_some());
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_relative_date_boundaries() {
        assert_eq!(format_relative_date(Some(&ago(Duration::zero())), now()), "Today");
        assert_eq!(format_relative_date(Some(&ago(Duration::hours(23))), now()), "Today");
        assert_eq!(format_relative_date(Some(&ago(Duration::hours(36))), now()), "Yesterday");
        assert_eq!(format_relative_date(Some(&ago(Duration::days(3))), now()), "3 days ago");
        assert_eq!(format_relative_date(Some(&ago(Duration::days(6))), now()), "6 days ago");
        assert_eq!(format_relative_date(Some(&ago(Duration::days(7))), now()), "1 weeks ago");
        assert_eq!(format_relative_date(Some(&ago(Duration::days(10))), now()), "1 weeks ago");
        assert_eq!(format_relative_date(Some(&ago(Duration::days(29))), now()), "4 weeks ago");
        assert_eq!(format_relative_date(Some(&ago(Duration::days(45))), now()), "1 months ago");
        assert_eq!(format_relative_date(Some(&ago(Duration::days(95))), now()), "3 months ago");
    }

    #[test]
    fn test_relative_date_invalid_and_future() {
        assert_eq!(format_relative_date(Some("not-a-date"), now()), "Invalid date");

        let future = (now() + Duration::days(3)).to_rfc3339();
        assert_eq!(format_relative_date(Some(&future), now()), "3 days ago");
    }

    #[test]
    fn test_work_type_priority() {
        assert_eq!(extract_work_type(Some("Remote or hybrid")), WorkType::Remote);
        assert_eq!(extract_work_type(Some("HYBRID, sometimes remote")), WorkType::Remote);
        assert_eq!(extract_work_type(Some("Hybrid (3 days)")), WorkType::Hybrid);
        assert_eq!(extract_work_type(Some("On-site in Austin")), WorkType::OnSite);
        assert_eq!(extract_work_type(Some("onsite")), WorkType::OnSite);
        assert_eq!(extract_work_type(Some("Full-time")), WorkType::NotSpecified);

        let once = extract_work_type(Some("remote"));
        assert_eq!(extract_work_type(Some(once.label())), once);
    }

    #[test]
    fn test_truncate_breaks_on_word_boundary() {
        let text = "word ".repeat(40);
        assert_eq!(text.chars().count(), 200);

        let short = truncate_description(Some(&text), 150);
        assert!(short.chars().count() <= 153);
        assert!(short.ends_with("word..."));
        assert!(!short.contains("wo..."));
    }

    #[test]
    fn test_truncate_hard_cut_and_fit() {
        let text = "x".repeat(200);
        let short = truncate_description(Some(&text), 150);
        assert_eq!(short.chars().count(), 153);
        assert!(short.ends_with("..."));

        assert_eq!(truncate_description(Some("fits"), 150), "fits");
        let exact = "y".repeat(150);
        assert_eq!(truncate_description(Some(&exact), 150), exact);
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "é".repeat(10);
        assert_eq!(truncate_description(Some(&text), 4), "éééé...");
    }

    #[test]
    fn test_extract_salary_first_rule_wins() {
        assert_eq!(
            extract_salary(Some("Salary: $80,000 - $120,000 per year")).as_deref(),
            Some("$80,000 - $120,000")
        );
        assert_eq!(extract_salary(Some("Pay up to $95,000")).as_deref(), Some("$95,000"));
        assert_eq!(
            extract_salary(Some("Paying 40 - 55 / hour")).as_deref(),
            Some("40 - 55 / hour")
        );
        assert_eq!(extract_salary(Some("Rate 65/hr")).as_deref(), Some("65/hr"));
        assert_eq!(extract_salary(Some("Band 90k - 110k")).as_deref(), Some("90k - 110k"));
        assert_eq!(extract_salary(Some("Competitive pay and benefits")), None);
    }

    #[test]
    fn test_salary_rules_are_ordered() {
        let labels: Vec<_> = SALARY_RULES.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                "currency range",
                "currency amount",
                "range per period",
                "amount per period",
                "thousands range"
            ]
        );
    }

    #[test]
    fn test_parse_min_salary() {
        assert_eq!(parse_min_salary(Some("$80,000 - $120,000")), Some(80000.0));
        assert_eq!(parse_min_salary(Some("Band 90k - 110k")), Some(90000.0));
        assert_eq!(parse_min_salary(Some("Rate 65/hr")), Some(65.0));
        assert_eq!(parse_min_salary(Some("no numbers here")), None);
    }

    #[test]
    fn test_extract_skills_dedup_and_casing() {
        let skills = extract_skills(Some("Python and react, plus more PYTHON and React"));
        assert_eq!(skills, vec!["Python", "React"]);

        let skills = extract_skills(Some("TypeScript with Node.js on AWS"));
        assert_eq!(skills, vec!["Typescript", "Node.js", "Aws"]);
    }

    #[test]
    fn test_extract_skills_whole_words_only() {
        assert!(extract_skills(Some("Pythonic javascripting")).is_empty());
        assert_eq!(extract_skills(Some("NoSQL stores")), vec!["Nosql"]);
        assert_eq!(extract_skills(Some("Machine learning work")), vec!["Machine learning"]);
    }

    #[test]
    fn test_extract_skills_groups_by_category() {
        // Category order decides result order, not text order.
        let skills = extract_skills(Some("Docker first, then Rust"));
        assert_eq!(skills, vec!["Rust", "Docker"]);
    }

    #[test]
    fn test_every_skill_rule_matches_its_words() {
        for (rule, (category, words)) in SKILL_RULES.iter().zip(SKILL_CATEGORIES) {
            assert_eq!(rule.category, *category);
            for word in words.iter().filter(|w| !w.ends_with('+') && !w.ends_with('#')) {
                assert!(rule.regex.is_match(word), "{} should match {}", category, word);
            }
        }
    }
}
