//! Internal job catalog: storage seams and the candidate provider built on them.

pub mod postgres;
pub mod provider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CandidateJob, ReferenceJob, Source};

pub use crate::errors::CatalogError;
pub use postgres::{create_pool, PgCatalog};
pub use provider::DatabaseCandidateProvider;

/// Filters for one catalog search. Every set filter must match; an empty query
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    /// Any one keyword appearing in the title is a match.
    pub title_keywords: Vec<String>,
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
}

impl CatalogQuery {
    pub fn by_title(keywords: Vec<String>) -> Self {
        Self {
            title_keywords: keywords,
            ..Default::default()
        }
    }

    pub fn by_company(company: impl Into<String>) -> Self {
        Self {
            company: Some(company.into()),
            ..Default::default()
        }
    }

    pub fn by_location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title_keywords.is_empty() && self.company.is_none() && self.location.is_none()
    }
}

/// A stored job posting as the catalog returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogJob {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl CatalogJob {
    pub fn into_candidate(self) -> CandidateJob {
        CandidateJob {
            id: Some(self.id),
            description: self.description.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            salary: self.salary,
            job_type: self.job_type.and_then(|t| t.parse().ok()),
            experience_level: self.experience_level.and_then(|l| l.parse().ok()),
            skills: self.skills,
            posted_date: self.posted_at.map(|at| at.date_naive()),
            ..CandidateJob::new(Source::Catalog, self.title, self.company)
        }
    }

    pub fn into_reference(self) -> ReferenceJob {
        ReferenceJob {
            id: Some(self.id),
            title: self.title,
            company: self.company,
            description: self.description.unwrap_or_default(),
            location: self.location,
            job_type: self.job_type.and_then(|t| t.parse().ok()),
            experience_level: self.experience_level.and_then(|l| l.parse().ok()),
            skills: Some(self.skills).filter(|skills| !skills.is_empty()),
        }
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn search_jobs(
        &self,
        query: &CatalogQuery,
        limit: usize,
    ) -> Result<Vec<CatalogJob>, CatalogError>;
}

/// Lookup of a user's saved job by id.
#[async_trait]
pub trait JobRecords: Send + Sync {
    async fn get_job_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ReferenceJob>, CatalogError>;
}
