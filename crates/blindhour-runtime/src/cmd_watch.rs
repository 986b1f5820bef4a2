//! Long-running commands that drive a session and stream its boards.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};

use blindhour_core::StandingsSnapshot;
use blindhour_session::{ContestConfig, ContestSession, Phase, SimulationConfig};
use blindhour_source_codeforces::CodeforcesClient;

use crate::cli::{SimulateOpts, TrackOpts};
use crate::print_json;

const WATCH_INTERVAL: Duration = Duration::from_secs(1);

enum WatchEnd {
    /// The session left the watched phases on its own.
    Settled(Phase),
    Interrupted,
}

/// Print each new board until the phase satisfies `done` or ctrl-c.
async fn watch(session: &ContestSession, done: impl Fn(Phase) -> bool) -> anyhow::Result<WatchEnd> {
    let mut shown: Option<Arc<StandingsSnapshot>> = None;
    let mut last_phase = session.phase();
    let mut ticker = interval(WATCH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("received ctrl-c");
                return Ok(WatchEnd::Interrupted);
            }
            _ = ticker.tick() => {}
        }

        let phase = session.phase();
        if phase != last_phase {
            tracing::info!("phase {last_phase} -> {phase}");
            last_phase = phase;
        }
        if let Some(board) = session.snapshot() {
            if !shown.as_ref().is_some_and(|s| Arc::ptr_eq(s, &board)) {
                print_json(board.as_ref(), false)?;
                shown = Some(board);
            }
        }
        if let Some(err) = session.last_error() {
            tracing::debug!("last error: {err}");
        }
        if done(phase) {
            return Ok(WatchEnd::Settled(phase));
        }
    }
}

pub async fn cmd_simulate(client: Arc<CodeforcesClient>, opts: SimulateOpts) -> anyhow::Result<()> {
    // Sources are never touched in simulation mode.
    let session = ContestSession::new(client.clone(), client);
    let config = SimulationConfig {
        params: opts.params.into(),
        wall_budget: Duration::from_secs(opts.wall_seconds.max(1)),
    };
    session.start_simulation(config).await;

    match watch(&session, |p| p == Phase::Ended).await? {
        WatchEnd::Settled(_) => {
            let payload = session.reveal().await?;
            print_json(payload.as_ref(), false)
        }
        WatchEnd::Interrupted => {
            session.reset().await;
            Ok(())
        }
    }
}

pub async fn cmd_track(client: Arc<CodeforcesClient>, opts: TrackOpts) -> anyhow::Result<()> {
    let session = ContestSession::new(client.clone(), client);
    let config = ContestConfig::new(opts.contest_id)
        .with_freeze_minutes(opts.freeze_minutes)
        .with_refresh_interval(Duration::from_secs(opts.refresh_seconds));
    session.start_contest(config).await;
    if let Some(err) = session.last_error() {
        tracing::warn!("initial fetch failed, will keep retrying: {err}");
    }

    if let WatchEnd::Interrupted = watch(&session, |p| p != Phase::Live).await? {
        if session.phase() == Phase::Live {
            session.freeze().await?;
        }
    }

    if opts.reveal {
        let payload = session.reveal().await?;
        print_json(payload.as_ref(), false)?;
    }
    session.reset().await;
    Ok(())
}
