//! In-memory upstream sources for facade and cache tests.

use crate::core::{AccountStatsSource, JudgeStatsSource, Platform, Result};
use crate::domain::model::{AccountProfile, ContributionCount, JudgeProfile, RepositoryAggregate};
use crate::utils::error::StatsError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Upstream,
    NotFound,
    Auth,
}

impl Failure {
    fn into_error(self, platform: Platform, username: &str) -> StatsError {
        match self {
            Failure::Upstream => StatsError::upstream(platform, "fake call", "HTTP 503"),
            Failure::NotFound => StatsError::NotFound {
                platform,
                username: username.to_string(),
            },
            Failure::Auth => StatsError::Auth {
                platform,
                message: "token absent".to_string(),
            },
        }
    }
}

pub struct FakeAccountSource {
    pub profile: AccountProfile,
    pub repos: RepositoryAggregate,
    pub contributions: ContributionCount,
    pub account_failure: Option<Failure>,
    pub contributions_failure: Option<Failure>,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl FakeAccountSource {
    pub fn with_counts(followers: u64, repos: u64, stars: u64, forks: u64, contributions: u64) -> Self {
        Self {
            profile: AccountProfile {
                following_count: 1,
                follower_count: followers,
                public_repo_count: repos,
            },
            repos: RepositoryAggregate {
                total_stars: stars,
                total_forks: forks,
            },
            contributions: ContributionCount(contributions),
            account_failure: None,
            contributions_failure: None,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn pause(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl AccountStatsSource for FakeAccountSource {
    async fn fetch_account_and_repos(
        &self,
        username: &str,
    ) -> Result<(AccountProfile, RepositoryAggregate)> {
        self.pause().await;
        match self.account_failure {
            Some(failure) => Err(failure.into_error(Platform::GitHub, username)),
            None => Ok((self.profile, self.repos)),
        }
    }

    async fn fetch_contributions(&self, username: &str) -> Result<ContributionCount> {
        self.pause().await;
        match self.contributions_failure {
            Some(failure) => Err(failure.into_error(Platform::GitHub, username)),
            None => Ok(self.contributions),
        }
    }
}

pub struct FakeJudgeSource {
    pub profile: JudgeProfile,
    pub failure: Option<Failure>,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

impl FakeJudgeSource {
    pub fn returning(profile: JudgeProfile) -> Self {
        Self {
            profile,
            failure: None,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::returning(JudgeProfile::default())
        }
    }
}

#[async_trait]
impl JudgeStatsSource for FakeJudgeSource {
    async fn fetch_judge_profile(&self, username: &str) -> Result<JudgeProfile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.failure {
            Some(failure) => Err(failure.into_error(Platform::LeetCode, username)),
            None => Ok(self.profile),
        }
    }
}
