use clap::Parser;
use player_pilot::{bootstrap, ChromePage, PilotConfig, RunOutcome};
use tracing::{error, info};

/// Unlock quality restrictions, pin the stream quality and enter theater
/// mode on a live player page, then exit.
#[derive(Parser, Debug)]
#[command(name = "player-pilot", version)]
struct Args {
    /// Room page to drive.
    url: String,

    /// Quality label to pin; empty means best available.
    #[arg(long, default_value = "蓝光8M")]
    quality: String,

    /// Full-sequence retries after a failed pass.
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Pause between retries, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Settle time after the quality switch, in milliseconds.
    #[arg(long, default_value_t = 800)]
    switch_delay_ms: u64,

    /// Run the browser without a window.
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let url = url::Url::parse(&args.url)?;

    let config = PilotConfig {
        target_quality: args.quality,
        retry_times: args.retries,
        retry_delay_ms: args.retry_delay_ms,
        quality_switch_delay_ms: args.switch_delay_ms,
    };

    info!(url = %url, "opening player page");
    let page = ChromePage::launch(url.as_str(), args.headless)?;

    let (orchestrator, outcome) = bootstrap::start(&page, config).await;
    match outcome {
        RunOutcome::Succeeded => info!("page tuned"),
        outcome => {
            let state = orchestrator.state().await;
            error!(?outcome, retries = state.retry_count, "page left partially tuned");
        }
    }

    Ok(())
}
