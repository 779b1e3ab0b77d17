// src/utils.rs
use std::collections::HashSet;

/// Normalize free text for comparisons: lowercase, punctuation collapsed to
/// single spaces, trimmed.
pub fn normalize_text(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-fold and trim a user supplied label (query, location)
pub fn fold_label(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Split normalized text into tokens, dropping single characters
pub fn tokenize(value: &str) -> Vec<String> {
    normalize_text(value)
        .split(' ')
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the token sets of two strings
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let left: HashSet<String> = tokenize(a).into_iter().collect();
    let right: HashSet<String> = tokenize(b).into_iter().collect();

    if left.is_empty() && right.is_empty() {
        return 1.0;
    }

    let intersection = left.intersection(&right).count() as f64;
    let union = left.union(&right).count() as f64;
    intersection / union
}

/// Percentage of `part` in `whole`, zero when `whole` is zero
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Clean scraped text by collapsing all whitespace runs
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Senior  Engineer, (Remote) "), "senior engineer remote");
        assert_eq!(normalize_text("C++/Rust"), "c rust");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_tokenize_drops_single_chars() {
        assert_eq!(tokenize("A Rust-engineer"), vec!["rust", "engineer"]);
    }

    #[test]
    fn test_token_similarity() {
        assert_eq!(token_similarity("Software Engineer", "software engineer"), 1.0);
        assert_eq!(token_similarity("data analyst", "software engineer"), 0.0);
        let partial = token_similarity("senior software engineer", "software engineer");
        assert!((partial - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Acme\n   Corp \t"), "Acme Corp");
    }
}
