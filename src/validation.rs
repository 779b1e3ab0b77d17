// src/validation.rs
//! Request validation for job searches.
//!
//! Every violation is collected so the caller gets the complete list in one
//! round trip. Unknown fields are ignored.

use serde_json::{Map, Value};

use crate::types::criteria::{
    JobType, KeywordFilter, SalaryRange, SearchCriteria, DEFAULT_MAX_RESULTS, KNOWN_SOURCES,
    MAX_RESULTS_LIMIT,
};

const MAX_QUERY_LENGTH: usize = 200;
const MAX_LOCATION_LENGTH: usize = 100;
const MAX_PREFERRED_LOCATIONS: usize = 10;
const MAX_POSTED_WITHIN_DAYS: i64 = 365;
const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid(SearchCriteria),
    Invalid(Vec<String>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> &[String] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }

    pub fn into_result(self) -> Result<SearchCriteria, Vec<String>> {
        match self {
            ValidationResult::Valid(criteria) => Ok(criteria),
            ValidationResult::Invalid(errors) => Err(errors),
        }
    }
}

/// Validate an untyped JSON payload into [`SearchCriteria`]
pub fn validate_search_request(payload: &Value) -> ValidationResult {
    let Some(body) = payload.as_object() else {
        return ValidationResult::Invalid(vec!["Request body must be a JSON object".to_string()]);
    };

    let mut errors = Vec::new();

    let query = validate_query(body, &mut errors);
    let location = optional_string(body, "location", MAX_LOCATION_LENGTH, &mut errors);
    let preferred_locations = validate_preferred_locations(body, &mut errors);
    let sources = validate_sources(body, &mut errors);
    let job_types = validate_job_types(body, &mut errors);
    let salary = validate_salary(body, &mut errors);
    let keywords = validate_keywords(body, &mut errors);
    let posted_within_days = validate_posted_within_days(body, &mut errors);
    let max_results = validate_max_results(body, &mut errors);

    if !errors.is_empty() {
        return ValidationResult::Invalid(errors);
    }

    ValidationResult::Valid(SearchCriteria {
        query: query.unwrap_or_default(),
        location,
        preferred_locations,
        sources,
        job_types,
        salary,
        keywords,
        posted_within_days,
        max_results,
    })
}

fn present<'a>(body: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    body.get(field).filter(|value| !value.is_null())
}

fn validate_query(body: &Map<String, Value>, errors: &mut Vec<String>) -> Option<String> {
    match present(body, "query") {
        None => {
            errors.push("query is required".to_string());
            None
        }
        Some(Value::String(raw)) => {
            let query = raw.trim();
            if query.is_empty() {
                errors.push("query must not be empty".to_string());
                None
            } else if query.chars().count() > MAX_QUERY_LENGTH {
                errors.push(format!(
                    "query must be at most {} characters",
                    MAX_QUERY_LENGTH
                ));
                None
            } else {
                Some(query.to_string())
            }
        }
        Some(_) => {
            errors.push("query must be a string".to_string());
            None
        }
    }
}

// An empty location means "anywhere" and is treated as absent
fn optional_string(
    body: &Map<String, Value>,
    field: &str,
    max_length: usize,
    errors: &mut Vec<String>,
) -> Option<String> {
    match present(body, field)? {
        Value::String(raw) => {
            let value = raw.trim();
            if value.chars().count() > max_length {
                errors.push(format!("{} must be at most {} characters", field, max_length));
                None
            } else if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        _ => {
            errors.push(format!("{} must be a string", field));
            None
        }
    }
}

fn string_array(
    body: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<Vec<String>> {
    let value = present(body, field)?;
    let Some(items) = value.as_array() else {
        errors.push(format!("{} must be an array of strings", field));
        return None;
    };

    let mut values = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item.as_str().map(str::trim) {
            Some(text) if !text.is_empty() => values.push(text.to_string()),
            Some(_) => errors.push(format!("{}[{}] must not be empty", field, index)),
            None => errors.push(format!("{}[{}] must be a string", field, index)),
        }
    }
    Some(values)
}

fn validate_preferred_locations(
    body: &Map<String, Value>,
    errors: &mut Vec<String>,
) -> Option<Vec<String>> {
    let locations = string_array(body, "preferredLocations", errors)?;
    if locations.len() > MAX_PREFERRED_LOCATIONS {
        errors.push(format!(
            "preferredLocations must contain at most {} entries",
            MAX_PREFERRED_LOCATIONS
        ));
    }
    Some(locations)
}

fn validate_sources(body: &Map<String, Value>, errors: &mut Vec<String>) -> Option<Vec<String>> {
    let requested = string_array(body, "sources", errors)?;
    if requested.is_empty() {
        errors.push("sources must contain at least one source".to_string());
        return None;
    }

    let mut sources: Vec<String> = Vec::with_capacity(requested.len());
    for source in requested {
        let source = source.to_lowercase();
        if !KNOWN_SOURCES.contains(&source.as_str()) {
            errors.push(format!(
                "Unknown source '{}'. Supported: {}",
                source,
                KNOWN_SOURCES.join(", ")
            ));
        } else if !sources.contains(&source) {
            sources.push(source);
        }
    }
    Some(sources)
}

fn validate_job_types(body: &Map<String, Value>, errors: &mut Vec<String>) -> Option<Vec<JobType>> {
    let requested = string_array(body, "jobTypes", errors)?;
    let mut job_types = Vec::with_capacity(requested.len());
    for raw in requested {
        match JobType::parse(&raw) {
            Some(job_type) if !job_types.contains(&job_type) => job_types.push(job_type),
            Some(_) => {}
            None => errors.push(format!(
                "Unknown job type '{}'. Supported: {}",
                raw,
                JobType::ALL
                    .iter()
                    .map(JobType::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
    Some(job_types)
}

fn validate_salary(body: &Map<String, Value>, errors: &mut Vec<String>) -> Option<SalaryRange> {
    let value = present(body, "salary")?;
    let Some(salary) = value.as_object() else {
        errors.push("salary must be an object with min and max".to_string());
        return None;
    };

    let mut bound = |field: &str| -> Option<f64> {
        match salary.get(field).and_then(Value::as_f64) {
            Some(amount) if amount >= 0.0 => Some(amount),
            Some(_) => {
                errors.push(format!("salary.{} must not be negative", field));
                None
            }
            None => {
                errors.push(format!("salary.{} is required and must be a number", field));
                None
            }
        }
    };
    let min = bound("min");
    let max = bound("max");

    let currency = match salary.get("currency").filter(|value| !value.is_null()) {
        None => Some(DEFAULT_CURRENCY.to_string()),
        Some(Value::String(code))
            if code.trim().len() == 3 && code.trim().chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            Some(code.trim().to_uppercase())
        }
        Some(_) => {
            errors.push("salary.currency must be a 3-letter currency code".to_string());
            None
        }
    };

    let (min, max) = (min?, max?);
    if min > max {
        errors.push("salary.min must be less than or equal to salary.max".to_string());
        return None;
    }

    Some(SalaryRange {
        min,
        max,
        currency: currency?,
    })
}

fn validate_keywords(body: &Map<String, Value>, errors: &mut Vec<String>) -> Option<KeywordFilter> {
    let value = present(body, "keywords")?;
    let Some(keywords) = value.as_object() else {
        errors.push("keywords must be an object with include and exclude lists".to_string());
        return None;
    };

    let include = string_array(keywords, "include", errors).unwrap_or_default();
    let exclude = string_array(keywords, "exclude", errors).unwrap_or_default();

    Some(KeywordFilter {
        include: lowercase_all(include),
        exclude: lowercase_all(exclude),
    })
}

fn lowercase_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|value| value.to_lowercase()).collect()
}

fn bounded_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn validate_posted_within_days(body: &Map<String, Value>, errors: &mut Vec<String>) -> Option<u32> {
    let value = present(body, "postedWithinDays")?;
    match bounded_integer(value) {
        Some(days) if (1..=MAX_POSTED_WITHIN_DAYS).contains(&days) => Some(days as u32),
        _ => {
            errors.push(format!(
                "postedWithinDays must be an integer between 1 and {}",
                MAX_POSTED_WITHIN_DAYS
            ));
            None
        }
    }
}

fn validate_max_results(body: &Map<String, Value>, errors: &mut Vec<String>) -> usize {
    let Some(value) = present(body, "maxResults") else {
        return DEFAULT_MAX_RESULTS;
    };

    match bounded_integer(value) {
        Some(count) if (1..=MAX_RESULTS_LIMIT as i64).contains(&count) => count as usize,
        _ => {
            errors.push(format!(
                "maxResults must be an integer between 1 and {}",
                MAX_RESULTS_LIMIT
            ));
            DEFAULT_MAX_RESULTS
        }
    }
}
