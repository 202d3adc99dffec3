use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::github::retry::RetryPolicy;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".pr-insights.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-insights.toml.
///
/// All fields are optional; the defaults reproduce the fixed limits the
/// collector and chart commands were first run with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub charts: ChartsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// GraphQL endpoint
    pub endpoint: String,
    /// Value sent in the User-Agent header
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: "https://api.github.com/graphql".to_string(),
            user_agent: "pr-insights".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// How many eligible repositories discovery should return
    pub target_repositories: usize,
    /// Minimum MERGED + CLOSED pull requests for a repository to qualify
    pub min_pull_requests: u64,
    /// Stop collecting a repository after this many eligible PRs
    pub per_repository_cap: Option<usize>,
    /// GitHub search expression used for discovery
    pub search_query: String,
    pub repository_page_size: u32,
    pub pull_request_page_size: u32,
    /// CSV file the collected records are written to
    pub output: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            target_repositories: 200,
            min_pull_requests: 100,
            per_repository_cap: None,
            search_query: "stars:>1000 sort:stars-desc".to_string(),
            repository_page_size: 50,
            pull_request_page_size: 25,
            output: PathBuf::from("pull_requests.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// CSV file the chart commands read
    pub input: PathBuf,
    pub heatmap_dir: PathBuf,
    pub hexbin_dir: PathBuf,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("pull_requests.csv"),
            heatmap_dir: PathBuf::from("heatmaps"),
            hexbin_dir: PathBuf::from("hexbins"),
        }
    }
}

impl Config {
    /// Load configuration from the given path, or from .pr-insights.toml in
    /// the current directory. A missing default file yields the defaults; an
    /// explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| {
                std::env::var("GITHUB_TOKEN")
                    .ok()
                    .filter(|token| !token.trim().is_empty())
            })
    }
}
