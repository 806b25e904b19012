use crate::core::aggregator::StatsAggregator;
use crate::core::{AccountStatsSource, AggregatedStats, JudgeStatsSource, Result};
use crate::domain::model::StatsReport;
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Extra lifetime added to each entry, as a fraction of the TTL, so entries
/// written together do not all expire together.
const TTL_JITTER: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    account_username: String,
    judge_username: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stats: AggregatedStats,
    expires_at: Instant,
}

/// Time-boxed cache in front of [`StatsAggregator`], keyed by both usernames.
///
/// Only complete results are stored. Degraded results and credential errors
/// go back upstream on the next call. `ttl: None` turns the cache off.
pub struct CachedAggregator<A: AccountStatsSource, J: JudgeStatsSource> {
    inner: StatsAggregator<A, J>,
    ttl: Option<Duration>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl<A: AccountStatsSource, J: JudgeStatsSource> CachedAggregator<A, J> {
    pub fn new(inner: StatsAggregator<A, J>, ttl: Option<Duration>) -> Self {
        Self {
            inner,
            ttl: ttl.filter(|t| !t.is_zero()),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_aggregated_stats(
        &self,
        account_username: &str,
        judge_username: &str,
    ) -> Result<AggregatedStats> {
        let Some(ttl) = self.ttl else {
            return self
                .inner
                .get_aggregated_stats(account_username, judge_username)
                .await;
        };

        let key = CacheKey {
            account_username: account_username.to_string(),
            judge_username: judge_username.to_string(),
        };

        if let Some(stats) = self.lookup(&key).await {
            tracing::debug!(account_username, judge_username, "stats cache hit");
            return Ok(stats);
        }

        // The lock is not held while upstream calls are outstanding.
        let aggregation = self.inner.aggregate(account_username, judge_username).await?;

        if aggregation.is_complete() {
            let now = Instant::now();
            let entry = CacheEntry {
                stats: aggregation.stats,
                expires_at: now + jittered(ttl),
            };
            let mut entries = self.entries.lock().await;
            // Keys that are never looked up again would otherwise stay forever.
            entries.retain(|_, e| e.expires_at > now);
            entries.insert(key, entry);
        } else {
            tracing::debug!(
                degraded = ?aggregation.degraded,
                "not caching degraded stats"
            );
        }

        Ok(aggregation.stats)
    }

    pub async fn report(&self, account_username: &str, judge_username: &str) -> StatsReport {
        match self.get_aggregated_stats(account_username, judge_username).await {
            Ok(stats) => StatsReport::ok(stats),
            Err(e) => StatsReport::not_configured(e.user_friendly_message()),
        }
    }

    pub async fn invalidate_all(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Expired entries are evicted here rather than by a background task.
    async fn lookup(&self, key: &CacheKey) -> Option<AggregatedStats> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.stats),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

fn jittered(ttl: Duration) -> Duration {
    let extra = rand::thread_rng().gen_range(0.0..=TTL_JITTER);
    ttl + ttl.mul_f64(extra)
}
