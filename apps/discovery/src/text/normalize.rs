use crate::text::vocab::{COMPANY_SUFFIXES, ROLE_TERMS, SENIORITY_QUALIFIERS};

/// Lower-cases, turns punctuation into spaces and collapses whitespace.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_title(title: &str) -> String {
    normalize_text(title)
}

/// Title tokens with seniority qualifiers removed ("Sr. Data Engineer" → ["data", "engineer"]).
pub fn title_tokens(title: &str) -> Vec<String> {
    normalize_text(title)
        .split_whitespace()
        .filter(|token| !SENIORITY_QUALIFIERS.contains(token))
        .map(str::to_string)
        .collect()
}

/// The role a title names: the last token found in the role vocabulary.
pub fn detect_role(title: &str) -> Option<&'static str> {
    title_tokens(title)
        .iter()
        .rev()
        .find_map(|token| {
            ROLE_TERMS
                .iter()
                .find(|role| **role == token.as_str())
                .copied()
        })
}

/// Company name without punctuation or trailing legal suffixes ("Acme, Inc." → "acme").
pub fn normalize_company(company: &str) -> String {
    let normalized = normalize_text(company);
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| COMPANY_SUFFIXES.contains(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

/// Text before the first comma, normalized. "Austin, TX" → "austin".
pub fn city_segment(location: &str) -> String {
    normalize_text(location.split(',').next().unwrap_or_default())
}

/// Company as a catalog filter term: lowercased with inner punctuation kept and
/// trailing legal suffixes dropped ("AT&T Inc." → "at&t").
pub fn company_filter(company: &str) -> String {
    let lowered = collapse_whitespace(company).to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    while tokens.len() > 1
        && tokens
            .last()
            .is_some_and(|t| COMPANY_SUFFIXES.contains(&trim_separators(t)))
    {
        tokens.pop();
    }
    let joined = tokens.join(" ");
    trim_separators(&joined).to_string()
}

/// City as a catalog filter term: "St. Louis, MO" → "st. louis".
pub fn city_filter(location: &str) -> String {
    let city = collapse_whitespace(location.split(',').next().unwrap_or_default()).to_lowercase();
    trim_separators(&city).to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Identity used to collapse duplicate postings across sources.
pub fn dedup_key(title: &str, company: &str) -> (String, String) {
    (normalize_title(title), normalize_company(company))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_collapses_punctuation() {
        assert_eq!(normalize_text("  Full-Stack   Dev / React "), "full stack dev react");
    }

    #[test]
    fn test_filters_keep_inner_punctuation() {
        assert_eq!(company_filter("AT&T Inc."), "at&t");
        assert_eq!(company_filter("Acme, Inc."), "acme");
        assert_eq!(company_filter("  Procter & Gamble Co "), "procter & gamble");
        assert_eq!(city_filter("St. Louis, MO"), "st. louis");
        assert_eq!(city_filter("Winston-Salem"), "winston-salem");
        assert_eq!(city_filter(" , TX"), "");
    }

    #[test]
    fn test_title_tokens_strip_seniority() {
        assert_eq!(title_tokens("Sr. Data Engineer"), vec!["data", "engineer"]);
        assert_eq!(title_tokens("Junior Developer"), vec!["developer"]);
    }

    #[test]
    fn test_detect_role_uses_last_role_term() {
        assert_eq!(detect_role("Senior Software Engineer"), Some("engineer"));
        assert_eq!(detect_role("Engineering Manager"), Some("manager"));
        assert_eq!(detect_role("Data Engineer, Analytics Developer"), Some("developer"));
        assert_eq!(detect_role("Barista"), None);
    }

    #[test]
    fn test_normalize_company_strips_legal_suffixes() {
        assert_eq!(normalize_company("Acme, Inc."), "acme");
        assert_eq!(normalize_company("Globex Corp"), "globex");
        assert_eq!(normalize_company("Initech Holdings LLC"), "initech holdings");
        assert_eq!(normalize_company("Acme Co Ltd"), "acme");
    }

    #[test]
    fn test_normalize_company_keeps_single_suffix_like_name() {
        assert_eq!(normalize_company("Limited"), "limited");
        assert_eq!(normalize_company(""), "");
    }

    #[test]
    fn test_city_segment() {
        assert_eq!(city_segment("Austin, TX, USA"), "austin");
        assert_eq!(city_segment("Berlin"), "berlin");
        assert_eq!(city_segment(""), "");
    }

    #[test]
    fn test_dedup_key_ignores_case_and_suffixes() {
        assert_eq!(
            dedup_key("Backend Engineer", "Acme Inc"),
            dedup_key("backend  engineer", "ACME")
        );
        assert_ne!(
            dedup_key("Senior Backend Engineer", "Acme"),
            dedup_key("Backend Engineer", "Acme")
        );
    }
}
