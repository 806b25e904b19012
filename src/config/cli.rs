use crate::config::toml_config::StatsConfig;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "devstats")]
#[command(about = "Aggregate public GitHub and LeetCode statistics into one JSON document")]
pub struct CliConfig {
    /// GitHub username
    #[arg(long)]
    pub account_user: String,

    /// LeetCode username
    #[arg(long)]
    pub judge_user: String,

    /// Path to a TOML configuration file (environment variables are used otherwise)
    #[arg(short, long)]
    pub config: Option<String>,

    /// GitHub access token (defaults to GITHUB_TOKEN)
    #[arg(long)]
    pub github_token: Option<String>,

    /// Per-request upstream timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Loads the file or environment configuration and applies flag overrides.
    pub fn load_stats_config(&self) -> Result<StatsConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = StatsConfig::from_file(path)?;
                if config.github_token().is_none() {
                    config.github.token = std::env::var("GITHUB_TOKEN").ok();
                }
                config
            }
            None => StatsConfig::from_env()?,
        };

        if let Some(token) = &self.github_token {
            config.github.token = Some(token.clone());
        }
        if let Some(timeout) = self.timeout {
            config.http.timeout_seconds = timeout;
        }

        Ok(config)
    }
}
