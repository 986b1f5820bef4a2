//! CLI definition using clap derive.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blindhour", about = "ICPC scoreboard with a blind hour and a reveal")]
pub struct Cli {
    /// Codeforces API base URL
    #[arg(
        long,
        global = true,
        env = "BLINDHOUR_API_URL",
        default_value = blindhour_source_codeforces::DEFAULT_BASE_URL
    )]
    pub api_url: String,

    /// Attempts per API request before giving up
    #[arg(long, global = true, env = "BLINDHOUR_RETRIES", default_value = "4")]
    pub retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a time-compressed synthetic contest and print every board, then the reveal
    Simulate(SimulateOpts),
    /// Follow a live contest until it ends (or ctrl-c), printing each new board
    Track(TrackOpts),
    /// Build the reveal payload for a finished contest
    Reveal(RevealOpts),
    /// Replay a contest's submission log to a point in time
    Replay(ReplayOpts),
    /// Print a complete synthetic dataset
    Sample(SampleOpts),
}

#[derive(Args, Clone, Copy)]
pub struct SimParamsOpts {
    #[arg(long, env = "BLINDHOUR_SEED", default_value = "42")]
    pub seed: u64,

    #[arg(long, default_value = "40")]
    pub contestants: usize,

    /// Contest length in minutes
    #[arg(long, default_value = "240")]
    pub duration_minutes: u32,

    /// Freeze offset from the start, in minutes
    #[arg(long, default_value = "180")]
    pub freeze_minutes: u32,

    #[arg(long, default_value = "7")]
    pub problems: usize,
}

#[derive(Args)]
pub struct SimulateOpts {
    #[command(flatten)]
    pub params: SimParamsOpts,

    /// Wall-clock seconds the whole contest is compressed into
    #[arg(long, env = "BLINDHOUR_WALL_SECONDS", default_value = "240")]
    pub wall_seconds: u64,
}

#[derive(Args)]
pub struct TrackOpts {
    pub contest_id: u64,

    /// Freeze offset from the start, in minutes
    #[arg(long, default_value = "60")]
    pub freeze_minutes: u32,

    /// Seconds between refreshes (never below 15)
    #[arg(long, env = "BLINDHOUR_REFRESH_SECONDS", default_value = "30")]
    pub refresh_seconds: u64,

    /// Build and print the reveal once tracking stops
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Args)]
pub struct RevealOpts {
    pub contest_id: u64,

    /// Freeze offset from the start, in minutes
    #[arg(long, default_value = "60")]
    pub freeze_minutes: u32,
}

#[derive(Args)]
pub struct ReplayOpts {
    pub contest_id: u64,

    /// Cutoff in seconds from the contest start (inclusive)
    #[arg(long)]
    pub at: u64,

    /// Freeze offset used to label the replayed board
    #[arg(long, default_value = "60")]
    pub freeze_minutes: u32,
}

#[derive(Args)]
pub struct SampleOpts {
    #[command(flatten)]
    pub params: SimParamsOpts,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,
}

impl From<SimParamsOpts> for blindhour_sim::SimParams {
    fn from(o: SimParamsOpts) -> Self {
        Self {
            seed: o.seed,
            contestants: o.contestants,
            duration_minutes: o.duration_minutes,
            freeze_minutes: o.freeze_minutes,
            problems: o.problems,
        }
    }
}
