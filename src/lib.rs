pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{GitHubClient, LeetCodeClient};
pub use config::StatsConfig;
pub use crate::core::{aggregator::StatsAggregator, cache::CachedAggregator};
pub use domain::model::{AggregatedStats, ReportStatus, StatsReport};
pub use utils::error::{Result, StatsError};

/// Aggregator wired to the real upstream clients.
pub type LiveAggregator = StatsAggregator<GitHubClient, LeetCodeClient>;

/// Builds the live aggregator from validated configuration.
pub fn build_aggregator(config: &StatsConfig) -> Result<LiveAggregator> {
    let github = GitHubClient::from_config(config)?;
    let leetcode = LeetCodeClient::from_config(config)?;

    if config.github_token().is_none() {
        tracing::warn!("no GitHub token configured; requests will report notConfigured");
    }

    Ok(StatsAggregator::new(github, leetcode).with_weights(config.scoring))
}
