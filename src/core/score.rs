//! Composite score and percentile estimate for a source-control account.
//!
//! The weights and the assumed population are display heuristics. They are
//! kept as named constants so changes to the ranking policy show up in review.

use crate::domain::model::{AccountProfile, ContributionCount, RepositoryAggregate};
use serde::{Deserialize, Serialize};

pub const FOLLOWER_WEIGHT: f64 = 2.0;
pub const PUBLIC_REPO_WEIGHT: f64 = 5.0;
pub const STAR_WEIGHT: f64 = 3.0;
pub const FORK_WEIGHT: f64 = 2.0;
pub const CONTRIBUTION_WEIGHT: f64 = 0.5;

/// Number of accounts the percentile is measured against.
pub const ASSUMED_POPULATION: u64 = 100_000_000;

pub const MIN_TOP_PERCENTAGE: f64 = 0.1;
pub const MAX_TOP_PERCENTAGE: f64 = 99.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub follower_weight: f64,
    pub public_repo_weight: f64,
    pub star_weight: f64,
    pub fork_weight: f64,
    pub contribution_weight: f64,
    pub assumed_population: u64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            follower_weight: FOLLOWER_WEIGHT,
            public_repo_weight: PUBLIC_REPO_WEIGHT,
            star_weight: STAR_WEIGHT,
            fork_weight: FORK_WEIGHT,
            contribution_weight: CONTRIBUTION_WEIGHT,
            assumed_population: ASSUMED_POPULATION,
        }
    }
}

impl ScoreWeights {
    pub fn composite_score(
        &self,
        profile: &AccountProfile,
        repos: &RepositoryAggregate,
        contributions: ContributionCount,
    ) -> f64 {
        profile.follower_count as f64 * self.follower_weight
            + profile.public_repo_count as f64 * self.public_repo_weight
            + repos.total_stars as f64 * self.star_weight
            + repos.total_forks as f64 * self.fork_weight
            + contributions.0 as f64 * self.contribution_weight
    }

    pub fn percentile(&self, score: f64) -> f64 {
        percentile(score, self.assumed_population)
    }
}

/// Composite score with the default weights.
pub fn composite_score(
    profile: &AccountProfile,
    repos: &RepositoryAggregate,
    contributions: ContributionCount,
) -> f64 {
    ScoreWeights::default().composite_score(profile, repos, contributions)
}

/// "Top X%" estimate in `[0.1, 99.9]`. Higher scores give smaller values.
///
/// The score is compressed with `log10(score + 1) / log10(population)` so a
/// zero score maps to the bottom of the range and huge scores clamp at the top
/// instead of overflowing it. Negative or NaN scores are treated as zero.
pub fn percentile(score: f64, assumed_population: u64) -> f64 {
    let score = if score.is_nan() { 0.0 } else { score.max(0.0) };
    // log10(1) == 0 would divide by zero; config validation rejects it too.
    let population = assumed_population.max(2) as f64;

    let raw_percentile = (score + 1.0).log10() / population.log10();
    ((1.0 - raw_percentile) * 100.0).clamp(MIN_TOP_PERCENTAGE, MAX_TOP_PERCENTAGE)
}
