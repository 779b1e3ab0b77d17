// src/types/mod.rs
pub mod criteria;
pub mod job;
pub mod response;

pub use criteria::{JobType, KeywordFilter, SalaryRange, SearchCriteria};
pub use job::{JobSalary, RawJob, ScoreBreakdown, ScoredJob};
pub use response::{
    ApiError, ApiErrorCode, ScoreDistribution, SearchJobsData, SearchJobsResponse,
    SearchMetadata,
};
