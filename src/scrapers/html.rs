// src/scrapers/html.rs
//! Parsing helpers shared by the board adapters

use chrono::{DateTime, Duration, Utc};
use scraper::{ElementRef, Selector};

use crate::types::{JobSalary, JobType};
use crate::utils::clean_text;

const CHALLENGE_MARKERS: &[&str] = &[
    "verify you are human",
    "cf-challenge",
    "challenge-platform",
    "captcha",
    "unusual traffic",
    "security check",
    "authwall",
];

// Annualization factors for pay quoted per period
const HOURS_PER_YEAR: f64 = 2080.0;
const DAYS_PER_YEAR: f64 = 260.0;
const WEEKS_PER_YEAR: f64 = 52.0;
const MONTHS_PER_YEAR: f64 = 12.0;

pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Cleaned text of the first matching, non-empty element
pub fn first_text(element: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        if let Some(selector) = selector(selector_str) {
            for found in element.select(&selector) {
                let text = clean_text(&found.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Attribute value of the first matching element that carries it
pub fn first_attr(element: ElementRef<'_>, selectors: &[&str], attr: &str) -> Option<String> {
    for selector_str in selectors {
        if let Some(selector) = selector(selector_str) {
            for found in element.select(&selector) {
                if let Some(value) = found.value().attr(attr) {
                    let value = value.trim();
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }
    None
}

/// Marker of an anti-bot or login wall page, if the page looks like one
pub fn detect_challenge(html: &str) -> Option<&'static str> {
    let lower = html.to_lowercase();
    CHALLENGE_MARKERS
        .iter()
        .find(|marker| lower.contains(*marker))
        .copied()
}

fn currency_of(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    let code = if text.contains('$') || upper.contains("USD") {
        "USD"
    } else if text.contains('€') || upper.contains("EUR") {
        "EUR"
    } else if text.contains('£') || upper.contains("GBP") {
        "GBP"
    } else {
        return None;
    };
    Some(code.to_string())
}

fn extract_amounts(text: &str) -> Vec<f64> {
    let mut amounts = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let mut raw = String::new();
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == ',' || chars[i] == '.')
        {
            if chars[i] != ',' {
                raw.push(chars[i]);
            }
            i += 1;
        }

        let raw = raw.trim_end_matches('.');
        if let Ok(mut amount) = raw.parse::<f64>() {
            if i < chars.len() && (chars[i] == 'k' || chars[i] == 'K') {
                amount *= 1000.0;
                i += 1;
            }
            amounts.push(amount);
        }
    }

    amounts
}

/// Parse a pay snippet such as "$120,000 - $150,000 a year" or
/// "From $25 an hour". Amounts are annualized.
pub fn parse_salary(text: &str) -> Option<JobSalary> {
    let lower = text.to_lowercase();
    let amounts = extract_amounts(text);
    if amounts.is_empty() {
        return None;
    }

    let factor = if lower.contains("hour") {
        HOURS_PER_YEAR
    } else if lower.contains("day") {
        DAYS_PER_YEAR
    } else if lower.contains("week") {
        WEEKS_PER_YEAR
    } else if lower.contains("month") {
        MONTHS_PER_YEAR
    } else {
        1.0
    };

    let first = amounts[0] * factor;
    let (min, max) = if amounts.len() >= 2 {
        let second = amounts[1] * factor;
        (Some(first.min(second)), Some(first.max(second)))
    } else if lower.contains("up to") {
        (None, Some(first))
    } else if lower.contains("from") || lower.contains("starting at") {
        (Some(first), None)
    } else {
        (Some(first), Some(first))
    };

    Some(JobSalary {
        min,
        max,
        currency: currency_of(text),
    })
}

/// Parse "Posted 3 days ago", "Just posted", "30+ days ago", "2 weeks ago"
pub fn parse_relative_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = text.to_lowercase();
    if lower.contains("just posted") || lower.contains("today") || lower.contains("just now") {
        return Some(now);
    }

    let amount = extract_amounts(&lower).first().copied()? as i64;
    let days = if lower.contains("minute") || lower.contains("hour") {
        0
    } else if lower.contains("day") {
        amount
    } else if lower.contains("week") {
        amount.checked_mul(7)?
    } else if lower.contains("month") {
        amount.checked_mul(30)?
    } else {
        return None;
    };

    // Out-of-range counts yield no date
    now.checked_sub_signed(Duration::try_days(days)?)
}

/// Guess the employment type from free text
pub fn infer_job_type(text: &str) -> Option<JobType> {
    let lower = text.to_lowercase();
    if lower.contains("internship") || lower.contains("intern ") {
        Some(JobType::Internship)
    } else if lower.contains("part-time") || lower.contains("part time") {
        Some(JobType::PartTime)
    } else if lower.contains("contract") {
        Some(JobType::Contract)
    } else if lower.contains("temporary") {
        Some(JobType::Temporary)
    } else if lower.contains("full-time") || lower.contains("full time") {
        Some(JobType::FullTime)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_first_text_falls_back_through_selectors() {
        let document = Html::parse_fragment(
            r#"<div><span class="empty"> </span><p class="company">  Acme
                 Corp </p></div>"#,
        );
        let root = document.root_element();

        assert_eq!(
            first_text(root, &[".missing", ".empty", ".company"]),
            Some("Acme Corp".to_string())
        );
        assert_eq!(first_text(root, &[".missing"]), None);
    }

    #[test]
    fn test_first_attr() {
        let document = Html::parse_fragment(r#"<div><a class="link" href="/jobs/1">Job</a></div>"#);
        assert_eq!(
            first_attr(document.root_element(), &["a.link"], "href"),
            Some("/jobs/1".to_string())
        );
    }

    #[test]
    fn test_detect_challenge() {
        assert_eq!(
            detect_challenge("<title>Just a moment...</title><div id=\"cf-challenge\">"),
            Some("cf-challenge")
        );
        assert_eq!(
            detect_challenge("<p>Please Verify you are human</p>"),
            Some("verify you are human")
        );
        assert_eq!(detect_challenge("<ul><li>Rust Engineer</li></ul>"), None);
    }

    #[test]
    fn test_parse_salary_range() {
        let salary = parse_salary("$120,000 - $150,000 a year").unwrap();
        assert_eq!(salary.min, Some(120_000.0));
        assert_eq!(salary.max, Some(150_000.0));
        assert_eq!(salary.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_parse_salary_hourly_and_open_ended() {
        let hourly = parse_salary("From $25 an hour").unwrap();
        assert_eq!(hourly.min, Some(52_000.0));
        assert_eq!(hourly.max, None);

        let capped = parse_salary("Up to £90K a year").unwrap();
        assert_eq!(capped.min, None);
        assert_eq!(capped.max, Some(90_000.0));
        assert_eq!(capped.currency.as_deref(), Some("GBP"));

        assert!(parse_salary("Competitive").is_none());
    }

    #[test]
    fn test_parse_relative_date() {
        let now = Utc::now();
        assert_eq!(parse_relative_date("Just posted", now), Some(now));
        assert_eq!(
            parse_relative_date("Posted 3 days ago", now),
            Some(now - Duration::days(3))
        );
        assert_eq!(
            parse_relative_date("30+ days ago", now),
            Some(now - Duration::days(30))
        );
        assert_eq!(
            parse_relative_date("2 weeks ago", now),
            Some(now - Duration::days(14))
        );
        assert_eq!(parse_relative_date("5 hours ago", now), Some(now));
        assert_eq!(parse_relative_date("EmployerActive", now), None);
        assert_eq!(parse_relative_date("Posted 99999999999999 days ago", now), None);
        assert_eq!(parse_relative_date("99999999999999999999 months ago", now), None);
    }

    #[test]
    fn test_infer_job_type() {
        assert_eq!(infer_job_type("Full-time, Permanent"), Some(JobType::FullTime));
        assert_eq!(infer_job_type("Part time"), Some(JobType::PartTime));
        assert_eq!(infer_job_type("Contract role"), Some(JobType::Contract));
        assert_eq!(infer_job_type("Great team"), None);
    }
}
