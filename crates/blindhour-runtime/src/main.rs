//! blindhour: live, frozen, and revealed contest scoreboards.
//!
//! Every command writes JSON to stdout; logs go to stderr.

use std::sync::Arc;

use clap::Parser;

use blindhour_source_codeforces::{CodeforcesClient, RetryPolicy};

mod cli;
mod cmd_json;
mod cmd_watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("BLINDHOUR_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let client = Arc::new(
        CodeforcesClient::new()
            .with_base_url(args.api_url.as_str())
            .with_retry(RetryPolicy {
                max_attempts: args.retries,
                ..RetryPolicy::default()
            }),
    );

    match args.command {
        cli::Command::Simulate(opts) => {
            cmd_watch::cmd_simulate(client, opts).await?;
        }
        cli::Command::Track(opts) => {
            cmd_watch::cmd_track(client, opts).await?;
        }
        cli::Command::Reveal(opts) => {
            cmd_json::cmd_reveal(&client, opts.contest_id, opts.freeze_minutes).await?;
        }
        cli::Command::Replay(opts) => {
            cmd_json::cmd_replay(&client, opts).await?;
        }
        cli::Command::Sample(opts) => {
            cmd_json::cmd_sample(opts)?;
        }
    }

    Ok(())
}

/// Write one JSON document to stdout.
pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
