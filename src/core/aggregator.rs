use crate::core::score::ScoreWeights;
use crate::core::{AccountStatsSource, AggregatedStats, Aggregation, JudgeStatsSource, Platform, Result};
use crate::domain::model::{AccountProfile, AccountStats, ContributionCount, RepositoryAggregate, StatsReport};

/// Fans out to both platforms and folds the results into one
/// [`AggregatedStats`].
///
/// A failing platform contributes zeros and never hides the other platform's
/// data. The only error returned is a GitHub credential problem, which an
/// operator has to fix.
pub struct StatsAggregator<A: AccountStatsSource, J: JudgeStatsSource> {
    account: A,
    judge: J,
    weights: ScoreWeights,
}

impl<A: AccountStatsSource, J: JudgeStatsSource> StatsAggregator<A, J> {
    pub fn new(account: A, judge: J) -> Self {
        Self {
            account,
            judge,
            weights: ScoreWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub async fn aggregate(&self, account_username: &str, judge_username: &str) -> Result<Aggregation> {
        // All three calls are in flight together and each settles on its own.
        let (account_and_repos, contributions, judge) = tokio::join!(
            self.account.fetch_account_and_repos(account_username),
            self.account.fetch_contributions(account_username),
            self.judge.fetch_judge_profile(judge_username),
        );

        let mut stats = AggregatedStats::default();
        let mut degraded = Vec::new();

        match combine_account(account_and_repos, contributions) {
            Ok(account) => {
                let score = self.weights.composite_score(
                    &account.profile,
                    &account.repos,
                    account.contributions,
                );
                let top_percentage = self.weights.percentile(score);
                tracing::debug!(
                    username = account_username,
                    score,
                    top_percentage,
                    "computed account ranking"
                );
                stats.apply_account(&account, top_percentage);
            }
            Err(e) if e.is_auth() => {
                tracing::error!(
                    platform = %Platform::GitHub,
                    username = account_username,
                    "credential problem, refusing to report zeros: {}",
                    e
                );
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    platform = %Platform::GitHub,
                    username = account_username,
                    category = ?e.category(),
                    "falling back to zeroed account stats: {}",
                    e
                );
                degraded.push(Platform::GitHub);
            }
        }

        match judge {
            Ok(profile) => stats.apply_judge(&profile),
            Err(e) => {
                tracing::warn!(
                    platform = %Platform::LeetCode,
                    username = judge_username,
                    category = ?e.category(),
                    "falling back to zeroed judge stats: {}",
                    e
                );
                degraded.push(Platform::LeetCode);
            }
        }

        Ok(Aggregation { stats, degraded })
    }

    pub async fn get_aggregated_stats(
        &self,
        account_username: &str,
        judge_username: &str,
    ) -> Result<AggregatedStats> {
        self.aggregate(account_username, judge_username)
            .await
            .map(|aggregation| aggregation.stats)
    }

    /// Like [`Self::get_aggregated_stats`], but folds the credential error
    /// into a `notConfigured` report.
    pub async fn report(&self, account_username: &str, judge_username: &str) -> StatsReport {
        match self.get_aggregated_stats(account_username, judge_username).await {
            Ok(stats) => StatsReport::ok(stats),
            Err(e) => StatsReport::not_configured(e.user_friendly_message()),
        }
    }
}

/// All or nothing: either GitHub call failing discards the other one's data.
/// A credential error wins over any other failure so it is never masked.
fn combine_account(
    account_and_repos: Result<(AccountProfile, RepositoryAggregate)>,
    contributions: Result<ContributionCount>,
) -> Result<AccountStats> {
    match (account_and_repos, contributions) {
        (Ok((profile, repos)), Ok(contributions)) => Ok(AccountStats {
            profile,
            repos,
            contributions,
        }),
        (Err(e), _) if e.is_auth() => Err(e),
        (_, Err(e)) if e.is_auth() => Err(e),
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}
