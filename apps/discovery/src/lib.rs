//! Candidate job discovery and similarity ranking.
//!
//! Given a saved reference job, [`DiscoveryEngine`] gathers postings from the
//! internal catalog and several external job sites concurrently, tolerating any
//! of them failing or hanging, then ranks the merged list by a deterministic
//! multi-factor similarity score.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod location;
pub mod models;
pub mod orchestrator;
pub mod similarity;
pub mod sources;
pub mod telemetry;
pub mod text;

pub use config::Config;
pub use errors::{CatalogError, DiscoveryError};
pub use models::{CandidateJob, PartialCandidateJob, ReferenceJob, Source};
pub use orchestrator::{
    DiscoveryEngine, DiscoveryOptions, DiscoveryReport, DiscoveryStrategy, SourceOutcome,
    SourceStatus,
};
