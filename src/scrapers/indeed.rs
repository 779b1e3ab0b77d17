// src/scrapers/indeed.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use scraper::Html;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::html::{
    detect_challenge, first_attr, first_text, infer_job_type, parse_relative_date, parse_salary,
    selector,
};
use super::{JobScraper, ParsedPage, ScrapeConfig, ScrapeResult};
use crate::core::config_manager::ScraperSettings;
use crate::types::RawJob;

pub const SOURCE_NAME: &str = "indeed";

const CARD_SELECTORS: &[&str] = &[
    "div.job_seen_beacon",
    "div.jobsearch-SerpJobCard",
    "li div.cardOutline",
];
const TITLE_SELECTORS: &[&str] = &[
    "h2.jobTitle span[title]",
    "h2.jobTitle a span",
    "h2.jobTitle",
    "a.jcs-JobTitle",
];
const COMPANY_SELECTORS: &[&str] = &[
    "[data-testid='company-name']",
    "span.companyName",
    ".company",
];
const LOCATION_SELECTORS: &[&str] = &[
    "[data-testid='text-location']",
    "div.companyLocation",
    ".location",
];
const SALARY_SELECTORS: &[&str] = &[
    "div.salary-snippet-container",
    "[data-testid='attribute_snippet_testid']",
    "span.salaryText",
];
const SNIPPET_SELECTORS: &[&str] = &[
    "div.job-snippet",
    "[data-testid='jobsnippet_footer']",
    ".summary",
];
const DATE_SELECTORS: &[&str] = &["span.date", "[data-testid='myJobsStateDate']"];
const JOB_KEY_SELECTORS: &[&str] = &["a[data-jk]", "[data-jk]"];

pub struct IndeedScraper {
    client: Client,
    base_url: String,
}

impl IndeedScraper {
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.indeed_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_url(&self, config: &ScrapeConfig) -> Result<Url> {
        let mut params = vec![("q", config.search_query.as_str())];
        if let Some(location) = config.location.as_deref() {
            params.push(("l", location));
        }
        Url::parse_with_params(&format!("{}/jobs", self.base_url), &params)
            .context("Failed to build Indeed search URL")
    }

    async fn fetch(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch Indeed results")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response.text().await.context("Failed to read response body")
    }

    /// Extract job cards from a results page
    pub fn parse_results(&self, html: &str, max_results: usize) -> ParsedPage {
        let document = Html::parse_document(html);
        let mut page = ParsedPage::default();
        let now = Utc::now();

        let cards: Vec<_> = CARD_SELECTORS
            .iter()
            .filter_map(|css| selector(css))
            .map(|card_selector| document.select(&card_selector).collect::<Vec<_>>())
            .find(|cards| !cards.is_empty())
            .unwrap_or_default();

        for card in cards {
            if page.jobs.len() >= max_results {
                break;
            }

            let (Some(title), Some(company)) = (
                first_text(card, TITLE_SELECTORS),
                first_text(card, COMPANY_SELECTORS),
            ) else {
                page.failed += 1;
                continue;
            };

            let job_key = card
                .value()
                .attr("data-jk")
                .map(str::to_string)
                .or_else(|| first_attr(card, JOB_KEY_SELECTORS, "data-jk"));
            let description = first_text(card, SNIPPET_SELECTORS).unwrap_or_default();
            let salary = first_text(card, SALARY_SELECTORS).and_then(|text| parse_salary(&text));

            let mut job = RawJob::new(
                SOURCE_NAME,
                &title,
                &company,
                &first_text(card, LOCATION_SELECTORS).unwrap_or_default(),
            )
            .with_description(&description);
            job.url = match &job_key {
                Some(key) => format!("{}/viewjob?jk={}", self.base_url, key),
                None => first_attr(card, &["h2.jobTitle a", "a"], "href")
                    .map(|href| self.absolute_url(&href))
                    .unwrap_or_default(),
            };
            job.external_id = job_key;
            job.salary = salary;
            job.job_type = infer_job_type(&card.text().collect::<Vec<_>>().join(" "));
            job.posted_at =
                first_text(card, DATE_SELECTORS).and_then(|text| parse_relative_date(&text, now));

            page.jobs.push(job);
        }

        if page.failed > 0 {
            page.errors.push(format!(
                "{} Indeed result card(s) could not be parsed",
                page.failed
            ));
        }

        page
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.base_url, href)
        }
    }
}

#[async_trait]
impl JobScraper for IndeedScraper {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    async fn scrape(&self, config: &ScrapeConfig) -> ScrapeResult {
        let started = Instant::now();

        let url = match self.search_url(config) {
            Ok(url) => url,
            Err(e) => return ScrapeResult::failure(SOURCE_NAME, format!("{:#}", e), started),
        };

        info!(source = SOURCE_NAME, %url, "Fetching job results");

        let html = match self.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(source = SOURCE_NAME, "Scrape failed: {:#}", e);
                return ScrapeResult::failure(SOURCE_NAME, format!("{:#}", e), started);
            }
        };

        let page = self.parse_results(&html, config.max_results);
        if page.jobs.is_empty() && page.failed == 0 {
            if let Some(marker) = detect_challenge(&html) {
                warn!(source = SOURCE_NAME, marker, "Anti-bot challenge page served");
                return ScrapeResult::failure(
                    SOURCE_NAME,
                    format!("Indeed served a challenge page ({})", marker),
                    started,
                );
            }
        }

        debug!(
            source = SOURCE_NAME,
            jobs = page.jobs.len(),
            failed = page.failed,
            "Parsed result page"
        );

        ScrapeResult::from_parts(
            SOURCE_NAME,
            config,
            page.jobs,
            page.failed,
            page.errors,
            started,
        )
    }

    async fn close(&self) {
        debug!(source = SOURCE_NAME, "Scraper closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
<html><body><ul>
  <li><div class="job_seen_beacon" data-jk="abc123">
    <h2 class="jobTitle"><a data-jk="abc123" href="/rc/clk?jk=abc123"><span title="Senior Software Engineer">Senior Software Engineer</span></a></h2>
    <span data-testid="company-name">Acme Corp</span>
    <div data-testid="text-location">San Francisco, CA</div>
    <div class="salary-snippet-container">$150,000 - $180,000 a year</div>
    <div class="job-snippet">Build distributed systems in Rust. Full-time role.</div>
    <span class="date">Posted 3 days ago</span>
  </div></li>
  <li><div class="job_seen_beacon">
    <h2 class="jobTitle"><a href="/rc/clk?jk=def456"><span title="Backend Engineer">Backend Engineer</span></a></h2>
    <span class="companyName">Globex</span>
    <div class="companyLocation">Remote</div>
  </div></li>
  <li><div class="job_seen_beacon">
    <div class="job-snippet">Card without a title</div>
  </div></li>
</ul></body></html>
"#;

    fn scraper() -> IndeedScraper {
        IndeedScraper::new(&ScraperSettings::default()).unwrap()
    }

    #[test]
    fn test_parse_results_extracts_cards() {
        let page = scraper().parse_results(RESULTS_PAGE, 25);

        assert_eq!(page.jobs.len(), 2);
        assert_eq!(page.failed, 1);
        assert_eq!(page.errors.len(), 1);

        let first = &page.jobs[0];
        assert_eq!(first.title, "Senior Software Engineer");
        assert_eq!(first.company, "Acme Corp");
        assert_eq!(first.location, "San Francisco, CA");
        assert_eq!(first.external_id.as_deref(), Some("abc123"));
        assert_eq!(first.url, "https://www.indeed.com/viewjob?jk=abc123");
        assert_eq!(first.salary.as_ref().unwrap().min, Some(150_000.0));
        assert!(first.posted_at.is_some());
        assert_eq!(first.source, "indeed");

        let second = &page.jobs[1];
        assert_eq!(second.company, "Globex");
        assert_eq!(second.external_id, None);
        assert_eq!(second.url, "https://www.indeed.com/rc/clk?jk=def456");
    }

    #[test]
    fn test_parse_results_respects_max_results() {
        let page = scraper().parse_results(RESULTS_PAGE, 1);
        assert_eq!(page.jobs.len(), 1);
    }

    #[test]
    fn test_absurd_posting_age_keeps_the_card() {
        let html = r#"
<div class="job_seen_beacon" data-jk="zzz999">
  <h2 class="jobTitle"><span title="Rust Engineer">Rust Engineer</span></h2>
  <span class="companyName">Initech</span>
  <div class="companyLocation">Austin, TX</div>
  <span class="date">Posted 99999999999999 days ago</span>
</div>
<div class="job_seen_beacon" data-jk="ok1">
  <h2 class="jobTitle"><span title="Platform Engineer">Platform Engineer</span></h2>
  <span class="companyName">Hooli</span>
  <div class="companyLocation">Remote</div>
  <span class="date">Posted 2 days ago</span>
</div>
"#;
        let page = scraper().parse_results(html, 25);

        assert_eq!(page.jobs.len(), 2);
        assert_eq!(page.jobs[0].title, "Rust Engineer");
        assert!(page.jobs[0].posted_at.is_none());
        assert!(page.jobs[1].posted_at.is_some());
    }

    #[test]
    fn test_page_without_cards_is_empty() {
        let page = scraper().parse_results("<html><body>No jobs found</body></html>", 10);
        assert!(page.jobs.is_empty());
        assert_eq!(page.failed, 0);
    }

    #[test]
    fn test_search_url() {
        let config = ScrapeConfig {
            search_query: "software engineer".into(),
            location: Some("San Francisco".into()),
            max_results: 10,
        };
        let url = scraper().search_url(&config).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.indeed.com/jobs?q=software+engineer&l=San+Francisco"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_reported_not_raised() {
        let settings = ScraperSettings {
            indeed_base_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 2,
            ..ScraperSettings::default()
        };
        let scraper = IndeedScraper::new(&settings).unwrap();
        let config = ScrapeConfig {
            search_query: "rust".into(),
            location: None,
            max_results: 5,
        };

        let result = scraper.scrape(&config).await;

        assert!(result.is_failure());
        assert_eq!(result.source, "indeed");
        assert_eq!(result.scraped_count, 0);
    }
}
