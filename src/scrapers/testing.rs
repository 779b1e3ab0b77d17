// src/scrapers/testing.rs
//! Deterministic adapter for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::{JobScraper, ScrapeConfig, ScrapeResult};
use crate::types::RawJob;

pub struct FakeScraper {
    name: String,
    jobs: Vec<RawJob>,
    errors: Vec<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    closed: AtomicBool,
}

impl FakeScraper {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            jobs: Vec::new(),
            errors: Vec::new(),
            delay: None,
            calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_jobs(mut self, jobs: Vec<RawJob>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.errors.push(error.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobScraper for FakeScraper {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, config: &ScrapeConfig) -> ScrapeResult {
        let started = Instant::now();
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        ScrapeResult::from_parts(
            &self.name,
            config,
            self.jobs.clone(),
            0,
            self.errors.clone(),
            started,
        )
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
