//! Keyword classification of scraped postings (job type, experience level, posted date).

use chrono::{NaiveDate, TimeDelta};

use crate::models::{ExperienceLevel, JobType};
use crate::text::vocab::{EXPERIENCE_LEVEL_TERMS, JOB_TYPE_TERMS};

pub fn detect_job_type(title: &str, description: &str) -> Option<JobType> {
    let haystack = format!("{title} {description}").to_lowercase();
    first_match(&haystack, JOB_TYPE_TERMS)
}

pub fn detect_experience_level(title: &str, description: &str) -> Option<ExperienceLevel> {
    let haystack = format!("{title} {description}").to_lowercase();
    first_match(&haystack, EXPERIENCE_LEVEL_TERMS)
}

fn first_match<T: Copy>(haystack: &str, table: &[(T, &[&str])]) -> Option<T> {
    table
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| contains_term(haystack, term)))
        .map(|(value, _)| *value)
}

/// Substring match that refuses to land inside a longer word:
/// "lead" matches "team lead" but not "leading".
pub fn contains_term(haystack: &str, term: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric();

    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

/// Larger relative amounts ("99999 days ago") are scraping noise, not dates.
const MAX_RELATIVE_AMOUNT: i64 = 3_650;

/// Parses the posted-date strings job boards show next to a card.
///
/// Handles ISO dates (`2024-05-01`, `2024-05-01T10:00:00Z`), "today"/"just posted",
/// "yesterday", and relative forms like "3 days ago", "30+ days ago", "5 hours ago".
pub fn parse_posted_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(date) = text
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(date);
    }

    if ["just posted", "today", "active today"]
        .iter()
        .any(|marker| text.contains(marker))
        || text.contains("hour")
        || text.contains("minute")
    {
        return Some(today);
    }

    if text.contains("yesterday") {
        return days_before(today, 1);
    }

    let amount: i64 = text
        .split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|digits| digits.parse().ok())
        .filter(|amount| *amount <= MAX_RELATIVE_AMOUNT)?;

    let days = if text.contains("month") {
        amount.checked_mul(30)?
    } else if text.contains("week") {
        amount.checked_mul(7)?
    } else if text.contains("day") || text.ends_with('d') {
        amount
    } else {
        return None;
    };

    days_before(today, days)
}

fn days_before(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    today.checked_sub_signed(TimeDelta::try_days(days)?)
}
