// src/scrapers/linkedin.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Url};
use scraper::{ElementRef, Html};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::html::{
    detect_challenge, first_attr, first_text, infer_job_type, parse_relative_date, parse_salary,
    selector,
};
use super::{JobScraper, ParsedPage, ScrapeConfig, ScrapeResult};
use crate::core::config_manager::ScraperSettings;
use crate::types::RawJob;

pub const SOURCE_NAME: &str = "linkedin";

const SEARCH_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";

const CARD_SELECTORS: &[&str] = &[
    "div.base-search-card",
    "div.job-search-card",
    "li div.base-card",
];
const TITLE_SELECTORS: &[&str] = &["h3.base-search-card__title", ".job-search-card__title", "h3"];
const COMPANY_SELECTORS: &[&str] = &[
    "h4.base-search-card__subtitle a",
    "h4.base-search-card__subtitle",
    "h4",
];
const LOCATION_SELECTORS: &[&str] = &[
    "span.job-search-card__location",
    ".base-search-card__metadata span",
];
const SALARY_SELECTORS: &[&str] = &["span.job-search-card__salary-info"];
const LINK_SELECTORS: &[&str] = &["a.base-card__full-link", "a.base-search-card__full-link", "a"];
const DATE_SELECTORS: &[&str] = &[
    "time.job-search-card__listdate",
    "time.job-search-card__listdate--new",
    "time",
];

pub struct LinkedinScraper {
    client: Client,
    base_url: String,
}

impl LinkedinScraper {
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.linkedin_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_url(&self, config: &ScrapeConfig) -> Result<Url> {
        let mut params = vec![("keywords", config.search_query.as_str())];
        if let Some(location) = config.location.as_deref() {
            params.push(("location", location));
        }
        params.push(("start", "0"));
        Url::parse_with_params(&format!("{}{}", self.base_url, SEARCH_PATH), &params)
            .context("Failed to build LinkedIn search URL")
    }

    async fn fetch(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch LinkedIn results")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response.text().await.context("Failed to read response body")
    }

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

            let mut job = RawJob::new(
                SOURCE_NAME,
                &title,
                &company,
                &first_text(card, LOCATION_SELECTORS).unwrap_or_default(),
            );
            job.url = first_attr(card, LINK_SELECTORS, "href")
                .map(|href| strip_tracking(&href))
                .unwrap_or_default();
            job.external_id = entity_id(card).or_else(|| job_id_from_url(&job.url));
            job.salary = first_text(card, SALARY_SELECTORS).and_then(|text| parse_salary(&text));
            job.job_type = infer_job_type(&title);
            job.posted_at = first_attr(card, DATE_SELECTORS, "datetime")
                .and_then(|value| parse_listing_date(&value))
                .or_else(|| {
                    first_text(card, DATE_SELECTORS)
                        .and_then(|text| parse_relative_date(&text, now))
                });

            page.jobs.push(job);
        }

        if page.failed > 0 {
            page.errors.push(format!(
                "{} LinkedIn result card(s) could not be parsed",
                page.failed
            ));
        }

        page
    }
}

// urn:li:jobPosting:3812345678
fn entity_id(card: ElementRef<'_>) -> Option<String> {
    let urn = card
        .value()
        .attr("data-entity-urn")
        .map(str::to_string)
        .or_else(|| first_attr(card, &["[data-entity-urn]"], "data-entity-urn"))?;
    urn.rsplit(':')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

// /jobs/view/rust-engineer-at-acme-3812345678
fn job_id_from_url(url: &str) -> Option<String> {
    let path = url.split('?').next()?.trim_end_matches('/');
    let last = path.rsplit('/').next()?;
    let id = last.rsplit('-').next()?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}

fn strip_tracking(href: &str) -> String {
    href.split('?').next().unwrap_or(href).to_string()
}

fn parse_listing_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[async_trait]
impl JobScraper for LinkedinScraper {
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
                warn!(source = SOURCE_NAME, marker, "Login wall or challenge page served");
                return ScrapeResult::failure(
                    SOURCE_NAME,
                    format!("LinkedIn served a challenge page ({})", marker),
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
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
<li>
  <div class="base-card base-search-card job-search-card" data-entity-urn="urn:li:jobPosting:3812345678">
    <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/rust-engineer-at-acme-3812345678?refId=abc&amp;trackingId=xyz"></a>
    <div class="base-search-card__info">
      <h3 class="base-search-card__title">  Rust Engineer  </h3>
      <h4 class="base-search-card__subtitle"><a href="/company/acme">Acme Corp</a></h4>
      <div class="base-search-card__metadata">
        <span class="job-search-card__location">Berlin, Germany</span>
        <span class="job-search-card__salary-info">€70,000 - €90,000</span>
        <time class="job-search-card__listdate" datetime="2024-03-01">2 weeks ago</time>
      </div>
    </div>
  </div>
</li>
<li>
  <div class="base-card base-search-card job-search-card">
    <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/contract-platform-engineer-at-globex-3899990000?position=2"></a>
    <h3 class="base-search-card__title">Contract Platform Engineer</h3>
    <h4 class="base-search-card__subtitle">Globex</h4>
    <span class="job-search-card__location">Remote</span>
  </div>
</li>
<li>
  <div class="base-card base-search-card job-search-card">
    <h4 class="base-search-card__subtitle">No title here</h4>
  </div>
</li>
"#;

    fn scraper() -> LinkedinScraper {
        LinkedinScraper::new(&ScraperSettings::default()).unwrap()
    }

    #[test]
    fn test_parse_results_extracts_cards() {
        let page = scraper().parse_results(RESULTS_PAGE, 25);

        assert_eq!(page.jobs.len(), 2);
        assert_eq!(page.failed, 1);

        let first = &page.jobs[0];
        assert_eq!(first.title, "Rust Engineer");
        assert_eq!(first.company, "Acme Corp");
        assert_eq!(first.location, "Berlin, Germany");
        assert_eq!(first.external_id.as_deref(), Some("3812345678"));
        assert_eq!(
            first.url,
            "https://www.linkedin.com/jobs/view/rust-engineer-at-acme-3812345678"
        );
        let salary = first.salary.as_ref().unwrap();
        assert_eq!(salary.min, Some(70_000.0));
        assert_eq!(salary.max, Some(90_000.0));
        assert_eq!(salary.currency.as_deref(), Some("EUR"));
        assert_eq!(
            first.posted_at.map(|d| d.format("%Y-%m-%d").to_string()),
            Some("2024-03-01".to_string())
        );

        let second = &page.jobs[1];
        assert_eq!(second.external_id.as_deref(), Some("3899990000"));
        assert_eq!(second.job_type, Some(crate::types::JobType::Contract));
        assert_eq!(second.source, "linkedin");
    }

    #[test]
    fn test_authwall_page_has_no_cards() {
        let html = r#"<html><body><div class="authwall-join-form">Join LinkedIn</div></body></html>"#;
        let page = scraper().parse_results(html, 10);
        assert!(page.jobs.is_empty());
        assert_eq!(detect_challenge(html), Some("authwall"));
    }

    #[test]
    fn test_search_url() {
        let config = ScrapeConfig {
            search_query: "rust developer".into(),
            location: Some("Berlin".into()),
            max_results: 10,
        };
        let url = scraper().search_url(&config).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search?keywords=rust+developer&location=Berlin&start=0"
        );
    }

    #[test]
    fn test_job_id_from_url() {
        assert_eq!(
            job_id_from_url("https://www.linkedin.com/jobs/view/rust-dev-at-acme-123456?x=1"),
            Some("123456".to_string())
        );
        assert_eq!(job_id_from_url("https://example.com/careers/open"), None);
    }
}
