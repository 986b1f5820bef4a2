//! Background loops. Each owns a generation ticket and stops as soon as a
//! publish is refused, the token is cancelled, or it concludes on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::config::ContestConfig;
use crate::phase::Transition;
use crate::session::{Shared, SimRun};

/// Poll the standings source until cancelled or the contest concludes.
pub(crate) async fn refresh_loop(
    shared: Arc<Shared>,
    generation: u64,
    config: ContestConfig,
    cancel: CancellationToken,
) {
    let period = config.effective_refresh_interval();
    let contest_id = config.contest_id;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {}
        }

        // A fetch in flight is not interrupted; cancellation only skips the next one.
        let fetched = shared.standings_source.fetch_standings(contest_id).await;
        if cancel.is_cancelled() {
            break;
        }

        match fetched {
            Ok(data) => {
                let concluded = data.contest.status.is_concluded();
                tracing::debug!(
                    "refreshed contest {contest_id}: {} rows, status {:?}",
                    data.rows.len(),
                    data.contest.status
                );
                if !shared.publish_standings(generation, data) {
                    break;
                }
                if concluded {
                    tracing::info!("contest {contest_id} concluded at the source, auto-freezing");
                    shared.conclude(generation, Transition::AutoFreeze, None);
                    shared.detach_worker(generation);
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("refresh of contest {contest_id} failed: {e}");
                shared.record_error(generation, e.into());
            }
        }
    }
    tracing::debug!("refresher for generation {generation} exited");
}

/// Advance the simulated clock once per tick until the contest ends.
pub(crate) async fn tick_loop(
    shared: Arc<Shared>,
    generation: u64,
    run: Arc<SimRun>,
    tick: Duration,
    cancel: CancellationToken,
) {
    let dataset = &run.dataset;
    let duration = dataset.duration_seconds();
    let freeze = dataset.freeze_seconds();
    let mut ticker = interval(tick.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let sim_seconds = run.elapsed_sim_seconds();
        if sim_seconds >= duration {
            shared.conclude(generation, Transition::Finish, Some(dataset.snapshot_at(duration)));
            shared.detach_worker(generation);
            tracing::info!("simulation finished, ready for reveal");
            break;
        }

        let snapshot = dataset.snapshot_at(sim_seconds);
        if !shared.publish_tick(generation, snapshot, sim_seconds >= freeze) {
            break;
        }
    }
    tracing::debug!("ticker for generation {generation} exited");
}
