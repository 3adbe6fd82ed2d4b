use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a candidate posting came from. Also selects its scoring policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Catalog,
    Indeed,
    LinkedIn,
    Glassdoor,
    WeWorkRemotely,
}

impl Source {
    pub const EXTERNAL: [Source; 4] = [
        Source::Indeed,
        Source::LinkedIn,
        Source::Glassdoor,
        Source::WeWorkRemotely,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Catalog => "catalog",
            Source::Indeed => "indeed",
            Source::LinkedIn => "linkedin",
            Source::Glassdoor => "glassdoor",
            Source::WeWorkRemotely => "weworkremotely",
        }
    }

    pub fn is_external(&self) -> bool {
        !matches!(self, Source::Catalog)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "catalog" | "database" | "db" => Ok(Source::Catalog),
            "indeed" => Ok(Source::Indeed),
            "linkedin" => Ok(Source::LinkedIn),
            "glassdoor" => Ok(Source::Glassdoor),
            "weworkremotely" | "wwr" => Ok(Source::WeWorkRemotely),
            other => Err(format!("unknown job source '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
    Internship,
}

impl FromStr for JobType {
    type Err = String;

    /// Accepts the catalog's stored labels (`full-time`, `FULL_TIME`, `full time`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match key.as_str() {
            "fulltime" | "permanent" => Ok(JobType::FullTime),
            "parttime" => Ok(JobType::PartTime),
            "contract" | "contractor" | "freelance" => Ok(JobType::Contract),
            "temporary" | "temp" => Ok(JobType::Temporary),
            "internship" | "intern" => Ok(JobType::Internship),
            _ => Err(format!("unknown job type '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
    Executive,
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match key.as_str() {
            "entry" | "entrylevel" | "junior" => Ok(ExperienceLevel::Entry),
            "mid" | "midlevel" | "intermediate" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            "lead" | "principal" | "staff" => Ok(ExperienceLevel::Lead),
            "executive" | "director" => Ok(ExperienceLevel::Executive),
            _ => Err(format!("unknown experience level '{s}'")),
        }
    }
}

/// The saved posting a discovery request is anchored to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceJob {
    /// Catalog id, when the reference lives in the catalog. Used to keep the
    /// reference out of its own candidate list.
    pub id: Option<Uuid>,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    pub skills: Option<Vec<String>>,
}

/// A discovered posting. `score` and `match_reasons` are assigned by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateJob {
    pub id: Option<Uuid>,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub url: String,
    pub salary: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    /// Only catalog records carry structured skills.
    pub skills: Vec<String>,
    pub source: Source,
    pub posted_date: Option<NaiveDate>,
    pub score: f64,
    pub match_reasons: Vec<String>,
}

impl CandidateJob {
    pub fn new(source: Source, title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            company: company.into(),
            description: String::new(),
            location: String::new(),
            url: String::new(),
            salary: None,
            job_type: None,
            experience_level: None,
            skills: Vec::new(),
            source,
            posted_date: None,
            score: 0.0,
            match_reasons: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }
}

/// Typed record for one job card as scraped, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExtractedJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub posted_date: Option<String>,
}

/// Fields recovered from a single posting URL. Everything but `url` may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialCandidateJob {
    pub url: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub salary: Option<String>,
    pub posted_date: Option<NaiveDate>,
    pub job_type: Option<JobType>,
    pub experience_level: Option<ExperienceLevel>,
    pub source: Option<Source>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_roundtrips_through_str() {
        for source in Source::EXTERNAL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert_eq!("Catalog".parse::<Source>().unwrap(), Source::Catalog);
        assert!("monster".parse::<Source>().is_err());
    }

    #[test]
    fn test_source_serde_lowercase() {
        let json = serde_json::to_string(&Source::WeWorkRemotely).unwrap();
        assert_eq!(json, r#""weworkremotely""#);
    }

    #[test]
    fn test_job_type_parses_catalog_labels() {
        assert_eq!("FULL_TIME".parse::<JobType>().unwrap(), JobType::FullTime);
        assert_eq!("part-time".parse::<JobType>().unwrap(), JobType::PartTime);
        assert_eq!("Internship".parse::<JobType>().unwrap(), JobType::Internship);
        assert!("gig".parse::<JobType>().is_err());
    }

    #[test]
    fn test_job_type_serializes_kebab_case() {
        let json = serde_json::to_string(&JobType::FullTime).unwrap();
        assert_eq!(json, r#""full-time""#);
    }

    #[test]
    fn test_experience_level_parses_aliases() {
        assert_eq!(
            "entry-level".parse::<ExperienceLevel>().unwrap(),
            ExperienceLevel::Entry
        );
        assert_eq!(
            "Principal".parse::<ExperienceLevel>().unwrap(),
            ExperienceLevel::Lead
        );
    }

    #[test]
    fn test_candidate_builder_defaults() {
        let job = CandidateJob::new(Source::Indeed, "Engineer", "Acme").with_location("Remote");
        assert_eq!(job.location, "Remote");
        assert_eq!(job.score, 0.0);
        assert!(job.skills.is_empty());
        assert!(job.match_reasons.is_empty());
    }
}
