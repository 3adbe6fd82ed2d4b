pub mod job;

pub use job::{
    CandidateJob, ExperienceLevel, JobType, PartialCandidateJob, RawExtractedJob, ReferenceJob,
    Source,
};
