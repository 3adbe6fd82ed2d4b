use thiserror::Error;
use uuid::Uuid;

/// Failure inside the internal job catalog (search or single-record lookup).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Catalog query timed out")]
    Timeout,
}

/// A job card that could not be turned into a candidate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("job card has neither a title nor a company")]
    MissingIdentity,
}

/// Errors that abort a discovery call. Source and catalog failures never show
/// up here; they degrade to empty results.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Reference job not found: {job_id}")]
    ReferenceNotFound { job_id: Uuid },

    #[error("Job record lookup failed: {0}")]
    JobRecords(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_not_found_message() {
        let job_id = Uuid::nil();
        let err = DiscoveryError::ReferenceNotFound { job_id };
        assert_eq!(
            err.to_string(),
            "Reference job not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_catalog_error_converts() {
        let err: DiscoveryError = CatalogError::Timeout.into();
        assert!(matches!(err, DiscoveryError::JobRecords(CatalogError::Timeout)));
    }
}
