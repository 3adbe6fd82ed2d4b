//! Postgres-backed catalog over the `jobs` table.
//!
//! Expected columns: `id uuid`, `owner_id uuid`, `title text`, `company text`,
//! `description text`, `location text`, `url text`, `salary text`,
//! `job_type text`, `experience_level text`, `skills text[]`,
//! `posted_at timestamptz`, `created_at timestamptz`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{CatalogError, CatalogJob, CatalogQuery, CatalogStore, JobRecords};
use crate::models::ReferenceJob;

const JOB_COLUMNS: &str = "id, title, company, description, location, url, salary, \
     job_type, experience_level, COALESCE(skills, '{}') AS skills, posted_at";

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    company: String,
    description: Option<String>,
    location: Option<String>,
    url: Option<String>,
    salary: Option<String>,
    job_type: Option<String>,
    experience_level: Option<String>,
    skills: Vec<String>,
    posted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<JobRow> for CatalogJob {
    fn from(row: JobRow) -> Self {
        CatalogJob {
            id: row.id,
            title: row.title,
            company: row.company,
            description: row.description,
            location: row.location,
            url: row.url,
            salary: row.salary,
            job_type: row.job_type,
            experience_level: row.experience_level,
            skills: row.skills,
            posted_at: row.posted_at,
        }
    }
}

/// `%` and `_` are wildcards in ILIKE; user text must match literally.
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn search_query(query: &CatalogQuery, limit: usize) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE TRUE"));

    if !query.title_keywords.is_empty() {
        let patterns: Vec<String> = query
            .title_keywords
            .iter()
            .map(|keyword| like_pattern(keyword))
            .collect();
        builder.push(" AND title ILIKE ANY(");
        builder.push_bind(patterns);
        builder.push(")");
    }
    if let Some(company) = &query.company {
        builder.push(" AND company ILIKE ");
        builder.push_bind(like_pattern(company));
    }
    if let Some(location) = &query.location {
        builder.push(" AND location ILIKE ");
        builder.push_bind(like_pattern(location));
    }

    builder.push(" ORDER BY created_at DESC LIMIT ");
    builder.push_bind(limit as i64);
    builder
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn search_jobs(
        &self,
        query: &CatalogQuery,
        limit: usize,
    ) -> Result<Vec<CatalogJob>, CatalogError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = search_query(query, limit)
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!("Catalog query {query:?} returned {} rows", rows.len());
        Ok(rows.into_iter().map(CatalogJob::from).collect())
    }
}

#[async_trait]
impl JobRecords for PgCatalog {
    async fn get_job_by_id(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ReferenceJob>, CatalogError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| CatalogJob::from(row).into_reference()))
    }
}
