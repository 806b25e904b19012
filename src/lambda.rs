#[cfg(feature = "lambda")]
use devstats::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use devstats::{build_aggregator, CachedAggregator, GitHubClient, LeetCodeClient, StatsConfig, StatsReport};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::Deserialize;

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub account_username: Option<String>,
    pub judge_username: Option<String>,
}

#[cfg(feature = "lambda")]
type Aggregator = CachedAggregator<GitHubClient, LeetCodeClient>;

#[cfg(feature = "lambda")]
fn username(from_event: Option<String>, env_var: &str) -> Result<String, Error> {
    from_event
        .filter(|name| !name.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok())
        .ok_or_else(|| format!("no username in event and {} is unset", env_var).into())
}

#[cfg(feature = "lambda")]
async fn function_handler(
    aggregator: &Aggregator,
    event: LambdaEvent<Request>,
) -> Result<StatsReport, Error> {
    let account_username = username(event.payload.account_username, "DEVSTATS_ACCOUNT_USER")?;
    let judge_username = username(event.payload.judge_username, "DEVSTATS_JUDGE_USER")?;

    tracing::info!(
        account_username = %account_username,
        judge_username = %judge_username,
        "aggregating developer stats"
    );

    Ok(aggregator.report(&account_username, &judge_username).await)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let config = StatsConfig::from_env()?;
    config.validate()?;

    // Warm containers reuse this aggregator, and with it the cache.
    let aggregator = CachedAggregator::new(build_aggregator(&config)?, config.cache_ttl());
    let aggregator = &aggregator;

    run(service_fn(move |event: LambdaEvent<Request>| async move {
        function_handler(aggregator, event).await
    }))
    .await
}
