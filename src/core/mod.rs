pub mod aggregator;
pub mod cache;
pub mod score;

#[cfg(test)]
pub(crate) mod fakes;

pub use crate::domain::model::{AggregatedStats, Aggregation, Platform};
pub use crate::domain::ports::{AccountStatsSource, JudgeStatsSource};
pub use crate::utils::error::Result;
