//! Fixed vocabularies shared by keyword extraction, normalization and classification.
//!
//! All tables are immutable process-wide statics. Order matters where noted:
//! classification tables are scanned top to bottom and the first hit wins.

use crate::models::{ExperienceLevel, JobType};

/// Function words dropped by keyword extraction. Tokens of length ≤2 are dropped
/// before this table is consulted, so only longer words appear here.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "with", "this", "that", "from", "they", "will", "been",
    "were", "which", "their", "what", "about", "would", "there", "your", "into", "who", "its",
];

/// Technology and process terms recognized by substring match.
pub const TECHNICAL_TERMS: &[&str] = &[
    // languages
    "javascript",
    "typescript",
    "python",
    "java",
    "rust",
    "golang",
    "ruby",
    "php",
    "swift",
    "kotlin",
    "scala",
    "c++",
    "c#",
    // frameworks and runtimes
    "react",
    "angular",
    "vue",
    "node",
    "django",
    "flask",
    "spring",
    "rails",
    "express",
    ".net",
    // data
    "sql",
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "graphql",
    "kafka",
    // cloud and infra
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "jenkins",
    "linux",
    "git",
    "ci/cd",
    // practice
    "devops",
    "agile",
    "scrum",
    "microservices",
    "rest",
    "machine learning",
    "data science",
];

/// Seniority qualifiers stripped from titles before role and token comparison.
pub const SENIORITY_QUALIFIERS: &[&str] = &["sr.", "sr", "senior", "jr.", "jr", "junior"];

/// Role head nouns. Two titles naming the same role are treated as close matches.
pub const ROLE_TERMS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "designer",
    "analyst",
    "scientist",
    "architect",
    "consultant",
    "specialist",
    "administrator",
    "director",
    "coordinator",
];

/// Legal-form suffixes removed from company names.
pub const COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "ltd",
    "llc",
    "limited",
    "co",
    "gmbh",
    "plc",
];

/// Location strings that mean "no fixed office".
pub const REMOTE_MARKERS: &[&str] = &["remote", "anywhere", "work from home", "wfh", "telecommute"];

/// Scanned in order; first matching term wins.
pub const JOB_TYPE_TERMS: &[(JobType, &[&str])] = &[
    (
        JobType::FullTime,
        &["full-time", "full time", "fulltime", "permanent"],
    ),
    (JobType::PartTime, &["part-time", "part time", "parttime"]),
    (
        JobType::Contract,
        &["contract", "contractor", "freelance", "c2c"],
    ),
    (JobType::Temporary, &["temporary", "temp", "seasonal"]),
    (JobType::Internship, &["internship", "intern", "co-op"]),
];

/// Scanned in order; first matching term wins.
pub const EXPERIENCE_LEVEL_TERMS: &[(ExperienceLevel, &[&str])] = &[
    (ExperienceLevel::Senior, &["senior", "sr.", "sr"]),
    (ExperienceLevel::Lead, &["lead", "principal", "staff"]),
    (
        ExperienceLevel::Entry,
        &[
            "junior",
            "jr.",
            "jr",
            "entry level",
            "entry-level",
            "graduate",
            "new grad",
        ],
    ),
    (
        ExperienceLevel::Mid,
        &["mid-level", "mid level", "intermediate"],
    ),
    (
        ExperienceLevel::Executive,
        &["director", "vice president", "vp", "head of", "chief"],
    ),
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}
