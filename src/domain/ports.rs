use crate::domain::model::{AccountProfile, ContributionCount, JudgeProfile, RepositoryAggregate};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Source-control host side. Implementations propagate every failure; the
/// facade decides what to swallow.
#[async_trait]
pub trait AccountStatsSource: Send + Sync {
    async fn fetch_account_and_repos(
        &self,
        username: &str,
    ) -> Result<(AccountProfile, RepositoryAggregate)>;

    async fn fetch_contributions(&self, username: &str) -> Result<ContributionCount>;
}

/// Competitive-programming judge side.
#[async_trait]
pub trait JudgeStatsSource: Send + Sync {
    async fn fetch_judge_profile(&self, username: &str) -> Result<JudgeProfile>;
}
