// src/core/config_manager.rs
//! Unified configuration management: defaults, then the active profile of
//! `config.yaml` when present, then environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregator::scoring::ScoringWeights;
use crate::types::criteria::MAX_RESULTS_LIMIT;

const DEFAULT_CONFIG_FILE: &str = "config.yaml";
const DEVELOPMENT_JWT_SECRET: &str = "change-me-in-production";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub search: SearchConfig,
    pub scrapers: ScraperSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub timeout_ms: u64,
    /// Postings requested from each adapter, before filtering and ranking
    pub fetch_limit: usize,
    pub cache_ttl_secs: u64,
    pub cache_max_size: usize,
    pub analytics_max_metrics: usize,
    pub weights: ScoringWeights,
    pub source_quality: HashMap<String, f64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            fetch_limit: MAX_RESULTS_LIMIT,
            cache_ttl_secs: 300,
            cache_max_size: 100,
            analytics_max_metrics: 1000,
            weights: ScoringWeights::default(),
            source_quality: HashMap::from([
                ("linkedin".to_string(), 0.8),
                ("indeed".to_string(), 0.75),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    pub enabled_sources: Vec<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub indeed_base_url: String,
    pub linkedin_base_url: String,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            enabled_sources: vec!["indeed".to_string(), "linkedin".to_string()],
            request_timeout_secs: 20,
            user_agent: BROWSER_USER_AGENT.to_string(),
            indeed_base_url: "https://www.indeed.com".to_string(),
            linkedin_base_url: "https://www.linkedin.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

// One profile of config.yaml; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileFile {
    address: Option<String>,
    port: Option<u16>,
    database_path: Option<PathBuf>,
    jwt_secret: Option<String>,
    search: Option<SearchConfig>,
    scrapers: Option<ScraperSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: Option<ProfileFile>,
    production: Option<ProfileFile>,
}

impl ConfigManager {
    /// Load all configurations
    pub fn load() -> Result<Self> {
        let environment = Self::environment_name();
        info!("Loading configuration for environment: {}", environment);

        let config_path = std::env::var("JOBSCOUT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::from_yaml_str(&environment, &content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            info!("{} not found, using defaults", config_path.display());
            Self::defaults(&environment)?
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.environment.database_path = Self::resolve_path(&config.environment.database_path)?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration for environment {}", environment))?;

        Ok(config)
    }

    fn environment_name() -> String {
        std::env::var("JOBSCOUT_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// Built-in defaults for an environment
    pub fn defaults(environment: &str) -> Result<Self> {
        let base_dir = if environment == "production" {
            PathBuf::from("/app")
        } else {
            PathBuf::from(".")
        };

        Ok(Self {
            environment: EnvironmentConfig {
                name: environment.to_string(),
                address: "0.0.0.0".to_string(),
                port: 8000,
                database_path: base_dir.join("data").join("jobscout.db"),
            },
            search: SearchConfig::default(),
            scrapers: ScraperSettings::default(),
            auth: AuthSettings {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            },
        })
    }

    /// Defaults overlaid with the matching profile of a YAML document
    pub fn from_yaml_str(environment: &str, content: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(content).context("Invalid configuration YAML")?;
        let profile = match environment {
            "production" => file.production,
            _ => file.local,
        }
        .unwrap_or_default();

        let mut config = Self::defaults(environment)?;
        if let Some(address) = profile.address {
            config.environment.address = address;
        }
        if let Some(port) = profile.port {
            config.environment.port = port;
        }
        if let Some(path) = profile.database_path {
            config.environment.database_path = path;
        }
        if let Some(secret) = profile.jwt_secret {
            config.auth.jwt_secret = secret;
        }
        if let Some(search) = profile.search {
            config.search = search;
        }
        if let Some(scrapers) = profile.scrapers {
            config.scrapers = scrapers;
        }

        Ok(config)
    }

    /// Environment variables win over file values
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("JOBSCOUT_PORT") {
            self.environment.port = port
                .parse()
                .context("JOBSCOUT_PORT must be a valid port number")?;
        }
        if let Some(address) = lookup("JOBSCOUT_ADDRESS") {
            self.environment.address = address;
        }
        if let Some(path) = lookup("JOBSCOUT_DATABASE_PATH") {
            self.environment.database_path = PathBuf::from(path);
        }
        if let Some(secret) = lookup("JOBSCOUT_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(timeout) = lookup("SEARCH_TIMEOUT_MS") {
            self.search.timeout_ms = timeout
                .parse()
                .context("SEARCH_TIMEOUT_MS must be a number of milliseconds")?;
        }
        if let Some(limit) = lookup("SEARCH_FETCH_LIMIT") {
            self.search.fetch_limit = limit
                .parse()
                .context("SEARCH_FETCH_LIMIT must be a positive integer")?;
        }
        if let Some(ttl) = lookup("SEARCH_CACHE_TTL_SECS") {
            self.search.cache_ttl_secs = ttl
                .parse()
                .context("SEARCH_CACHE_TTL_SECS must be a number of seconds")?;
        }
        if let Some(size) = lookup("SEARCH_CACHE_MAX_SIZE") {
            self.search.cache_max_size = size
                .parse()
                .context("SEARCH_CACHE_MAX_SIZE must be a positive integer")?;
        }
        if let Some(max) = lookup("SEARCH_ANALYTICS_MAX") {
            self.search.analytics_max_metrics = max
                .parse()
                .context("SEARCH_ANALYTICS_MAX must be a positive integer")?;
        }
        if let Some(sources) = lookup("SEARCH_SOURCES") {
            self.scrapers.enabled_sources = sources
                .split(',')
                .map(|source| source.trim().to_lowercase())
                .filter(|source| !source.is_empty())
                .collect();
        }
        Ok(())
    }

    /// Reject settings that are only acceptable outside production
    pub fn validate(&self) -> Result<()> {
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() {
            anyhow::bail!("jwt_secret must not be empty");
        }
        if self.environment.name == "production" && secret == DEVELOPMENT_JWT_SECRET {
            anyhow::bail!("production requires JOBSCOUT_JWT_SECRET or a production jwt_secret");
        }
        Ok(())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure the database directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(db_parent) = self.environment.database_path.parent() {
            tokio::fs::create_dir_all(db_parent)
                .await
                .with_context(|| {
                    format!(
                        "Failed to create database directory: {}",
                        db_parent.display()
                    )
                })?;
        }
        Ok(())
    }
}
