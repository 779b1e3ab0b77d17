//! Job search aggregation.
//!
//! A validated [`types::SearchCriteria`] goes through the
//! [`aggregator::JobSearchPipeline`]: the [`cache`] is checked, every job
//! board adapter in [`scrapers`] runs concurrently under one deadline, and the
//! merged postings are filtered, deduplicated and scored. Each search is
//! recorded in [`analytics`]. The [`web`] module exposes the pipeline over
//! HTTP together with monitoring and per-user saved searches.

pub mod aggregator;
pub mod analytics;
pub mod auth;
pub mod cache;
pub mod core;
pub mod scrapers;
pub mod types;
pub mod utils;
pub mod validation;
pub mod web;

pub use aggregator::{build_pipeline, JobSearchPipeline};
pub use types::{SearchCriteria, SearchJobsResponse};
pub use validation::{validate_search_request, ValidationResult};
pub use web::start_web_server;
