use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream platform a piece of data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    GitHub,
    LeetCode,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::GitHub => write!(f, "GitHub"),
            Platform::LeetCode => write!(f, "LeetCode"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub following_count: u64,
    pub follower_count: u64,
    pub public_repo_count: u64,
}

/// Star and fork totals over the most recently updated repositories page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAggregate {
    pub total_stars: u64,
    pub total_forks: u64,
}

/// Commits + pull requests + issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionCount(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBucket {
    pub solved_count: u64,
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Exact, case-sensitive match on the judge's difficulty label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeProfile {
    pub ranking: u64,
    pub easy: DifficultyBucket,
    pub medium: DifficultyBucket,
    pub hard: DifficultyBucket,
}

impl JudgeProfile {
    pub fn bucket_mut(&mut self, difficulty: Difficulty) -> &mut DifficultyBucket {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }

    /// Saturates instead of overflowing on oversized upstream counts.
    pub fn total_solved(&self) -> u64 {
        self.easy
            .solved_count
            .saturating_add(self.medium.solved_count)
            .saturating_add(self.hard.solved_count)
    }

    pub fn total_submissions(&self) -> u64 {
        self.easy
            .total_count
            .saturating_add(self.medium.total_count)
            .saturating_add(self.hard.total_count)
    }

    /// Percentage of solved over submitted; 0 when nothing was submitted.
    pub fn acceptance_rate(&self) -> f64 {
        let submissions = self.total_submissions();
        if submissions == 0 {
            return 0.0;
        }
        self.total_solved() as f64 / submissions as f64 * 100.0
    }
}

/// Everything the GitHub side contributes, before scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountStats {
    pub profile: AccountProfile,
    pub repos: RepositoryAggregate,
    pub contributions: ContributionCount,
}

/// The single shape handed to the presentation layer. Every field is numeric
/// and defaults to zero when its platform degraded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    pub stars: u64,
    pub forks: u64,
    pub contributions: u64,
    pub top_percentage: f64,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub total_solved: u64,
    pub easy_solved: u64,
    pub medium_solved: u64,
    pub hard_solved: u64,
    pub ranking: u64,
    pub acceptance_rate: f64,
}

impl AggregatedStats {
    pub fn apply_account(&mut self, account: &AccountStats, top_percentage: f64) {
        self.stars = account.repos.total_stars;
        self.forks = account.repos.total_forks;
        self.contributions = account.contributions.0;
        self.top_percentage = top_percentage;
        self.public_repos = account.profile.public_repo_count;
        self.followers = account.profile.follower_count;
        self.following = account.profile.following_count;
    }

    pub fn apply_judge(&mut self, judge: &JudgeProfile) {
        self.total_solved = judge.total_solved();
        self.easy_solved = judge.easy.solved_count;
        self.medium_solved = judge.medium.solved_count;
        self.hard_solved = judge.hard.solved_count;
        self.ranking = judge.ranking;
        self.acceptance_rate = judge.acceptance_rate();
    }
}

/// Facade result plus the platforms that fell back to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub stats: AggregatedStats,
    pub degraded: Vec<Platform>,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.degraded.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportStatus {
    Ok,
    NotConfigured,
}

/// Envelope written by the binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub status: ReportStatus,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<AggregatedStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatsReport {
    pub fn ok(stats: AggregatedStats) -> Self {
        Self {
            status: ReportStatus::Ok,
            generated_at: Utc::now(),
            stats: Some(stats),
            message: None,
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            status: ReportStatus::NotConfigured,
            generated_at: Utc::now(),
            stats: None,
            message: Some(message.into()),
        }
    }
}
