use crate::adapters::http::{RetryPolicy, DEFAULT_TIMEOUT};
use crate::adapters::{github, leetcode};
use crate::core::score::ScoreWeights;
use crate::utils::error::{Result, StatsError};
use crate::utils::validation::{validate_range, validate_url, validate_weight, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub github: GitHubConfig,
    pub leetcode: LeetCodeConfig,
    pub http: HttpConfig,
    pub scoring: ScoreWeights,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base_url: String,
    pub graphql_url: String,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: github::DEFAULT_API_BASE_URL.to_string(),
            graphql_url: github::DEFAULT_GRAPHQL_URL.to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeetCodeConfig {
    pub graphql_url: String,
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            graphql_url: leetcode::DEFAULT_GRAPHQL_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            retry_attempts: retry.max_retries,
            retry_base_delay_ms: retry.base_delay.as_millis() as u64,
            user_agent: concat!("devstats/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

fn env_placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

impl StatsConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StatsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, substituting `${VAR}` placeholders.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| StatsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Unset variables are left as the literal `${VAR}` text.
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            self.github.api_base_url = url;
        }
        if let Ok(url) = std::env::var("GITHUB_GRAPHQL_URL") {
            self.github.graphql_url = url;
        }
        if let Ok(url) = std::env::var("LEETCODE_GRAPHQL_URL") {
            self.leetcode.graphql_url = url;
        }
        if let Some(timeout) = parse_env("UPSTREAM_TIMEOUT_SECONDS")? {
            self.http.timeout_seconds = timeout;
        }
        if let Some(retries) = parse_env("UPSTREAM_RETRY_ATTEMPTS")? {
            self.http.retry_attempts = retries;
        }
        if let Some(ttl) = parse_env("STATS_CACHE_TTL_SECONDS")? {
            self.cache.ttl_seconds = ttl;
        }
        Ok(())
    }

    /// The access token, treating blank values and unresolved `${VAR}`
    /// placeholders as absent.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !env_placeholder().is_match(t))
            .map(str::to_string)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.http.retry_attempts,
            base_delay: Duration::from_millis(self.http.retry_base_delay_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        if self.cache.enabled && self.cache.ttl_seconds > 0 {
            Some(Duration::from_secs(self.cache.ttl_seconds))
        } else {
            None
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("github.api_base_url", &self.github.api_base_url)?;
        validate_url("github.graphql_url", &self.github.graphql_url)?;
        validate_url("leetcode.graphql_url", &self.leetcode.graphql_url)?;

        validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 60)?;
        validate_range("http.retry_attempts", self.http.retry_attempts, 0, 5)?;
        validate_range("http.retry_base_delay_ms", self.http.retry_base_delay_ms, 0, 10_000)?;

        let weights = &self.scoring;
        validate_weight("scoring.follower_weight", weights.follower_weight)?;
        validate_weight("scoring.public_repo_weight", weights.public_repo_weight)?;
        validate_weight("scoring.star_weight", weights.star_weight)?;
        validate_weight("scoring.fork_weight", weights.fork_weight)?;
        validate_weight("scoring.contribution_weight", weights.contribution_weight)?;
        if weights.assumed_population < 2 {
            return Err(StatsError::InvalidConfigValueError {
                field: "scoring.assumed_population".to_string(),
                value: weights.assumed_population.to_string(),
                reason: "Population must be greater than 1".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| StatsError::InvalidConfigValueError {
                field: name.to_string(),
                value: raw.clone(),
                reason: "Expected a non-negative integer".to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Validate for StatsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
