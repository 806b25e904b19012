use anyhow::Context;
use clap::Parser;
use devstats::utils::error::ErrorSeverity;
use devstats::utils::{logger, validation::Validate};
use devstats::{build_aggregator, CliConfig, ReportStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting devstats CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_stats_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration failed: {} (Category: {:?})", e, e.category());
            tracing::error!("Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let aggregator = match build_aggregator(&config) {
        Ok(aggregator) => aggregator,
        Err(e) => {
            tracing::error!("Could not build upstream clients: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            let exit_code = if e.severity() == ErrorSeverity::Critical { 3 } else { 1 };
            std::process::exit(exit_code);
        }
    };

    let report = aggregator.report(&cli.account_user, &cli.judge_user).await;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize stats report")?;
    println!("{}", output);

    if report.status == ReportStatus::NotConfigured {
        tracing::error!("GitHub credential is missing or was rejected");
        eprintln!("💡 Set GITHUB_TOKEN or pass --github-token");
        std::process::exit(3);
    }

    Ok(())
}
