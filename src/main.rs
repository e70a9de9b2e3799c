use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use raffle::bluesky::client::PublicAtpClient;
use raffle::config::Config;
use raffle::output::describe_criteria;
use raffle::output::terminal::{self, SpinnerWriter};
use raffle::pipeline::{self, EngagementFilters, RaffleOptions, RaffleRequest, RunContext};

/// Raffle: roll a random Bluesky user who liked, reposted and/or follows
/// from a post.
///
/// Tick at least one of --liked / --reposted. With both, a participant must
/// have done both. --followed additionally requires them to follow the
/// post's author.
#[derive(Parser)]
#[command(name = "raffle", version, about)]
struct Cli {
    /// URL of the post (e.g. https://bsky.app/profile/alice.bsky.social/post/3kxyz)
    post_url: String,

    /// Include accounts that liked the post
    #[arg(long)]
    liked: bool,

    /// Include accounts that reposted the post
    #[arg(long)]
    reposted: bool,

    /// Only keep accounts that follow the post's author
    #[arg(long)]
    followed: bool,

    /// Collect likes and reposts concurrently
    #[arg(long)]
    parallel: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let spinner = ProgressBar::new_spinner();
    let log_spinner = spinner.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("raffle=info")),
        )
        .with_writer(move || SpinnerWriter::new(log_spinner.clone(), std::io::stderr()))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let request = RaffleRequest {
        post_url: cli.post_url,
        filters: EngagementFilters {
            liked: cli.liked,
            reposted: cli.reposted,
        },
        followers_only: cli.followed,
    };
    let options = RaffleOptions {
        relationship_concurrency: config.relationship_concurrency,
        parallel_collections: cli.parallel,
        ..RaffleOptions::default()
    };

    let client = PublicAtpClient::new(&config.public_api_url, config.call_timeout)?;

    let cancel = CancellationToken::new();
    let ctx = RunContext::new(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling raffle");
            cancel.cancel();
        }
    });

    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message("Fetching...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    info!(api = %config.public_api_url, "Starting raffle");
    let result = pipeline::run(&client, &request, &options, &ctx).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            terminal::display_outcome(&outcome, &describe_criteria(&request));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            warn!(error = ?err, "Raffle failed");
            terminal::display_error(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}
