//! The contest session: one tracked contest, one background worker.
//!
//! All mutable state sits behind a single `std::sync::Mutex` that is held
//! only to copy or swap values, never across an `.await`. Snapshots are
//! immutable and shared by `Arc`, so a reader's copy is always whole.
//!
//! Writes from background work carry a generation ticket. `freeze`,
//! `reveal`, and `reset` revoke the ticket under the same lock that moves
//! the phase, so a worker that is still finishing a fetch cannot publish
//! afterwards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use blindhour_core::types::{ContestStatus, StandingsData, Submission};
use blindhour_core::{
    RevealInput, RevealPayload, StandingsSnapshot, StandingsSource, SubmissionSource, reconstruct,
    standings_at,
};
use blindhour_sim::{SimDataset, generate};

use crate::config::{ContestConfig, SessionOptions, SimulationConfig};
use crate::error::SessionError;
use crate::phase::{Phase, Transition};
use crate::worker;

/// A running simulation: the full synthetic contest plus its clock.
#[derive(Debug)]
pub(crate) struct SimRun {
    pub dataset: SimDataset,
    pub compression: f64,
    pub started: Instant,
}

impl SimRun {
    /// Simulated seconds elapsed since the start.
    pub fn elapsed_sim_seconds(&self) -> u64 {
        (self.started.elapsed().as_secs_f64() * self.compression) as u64
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Mode {
    Live(ContestConfig),
    Simulation(Arc<SimRun>),
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub phase: Phase,
    /// Bumped on every start and reset.
    pub generation: u64,
    /// Generation allowed to publish, if any.
    pub writer: Option<u64>,
    pub mode: Option<Mode>,
    pub snapshot: Option<Arc<StandingsSnapshot>>,
    pub reveal: Option<Arc<RevealPayload>>,
    pub last_error: Option<SessionError>,
    pub last_refresh: Option<DateTime<Utc>>,
    /// Latest standings fetch (real mode).
    pub standings: Option<Arc<StandingsData>>,
    /// Submission log, fetched once on demand and kept until reset.
    pub submission_log: Option<Arc<Vec<Submission>>>,
}

pub(crate) struct WorkerHandle {
    pub generation: u64,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<()>,
}

pub(crate) struct Shared {
    pub standings_source: Arc<dyn StandingsSource>,
    pub submission_source: Arc<dyn SubmissionSource>,
    pub options: SessionOptions,
    state: Mutex<SessionState>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl Shared {
    pub fn state(&self) -> MutexGuard<'_, SessionState> {
        // Every field is replaced wholesale, so a poisoned guard is still coherent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<WorkerHandle>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a fetched standings board. Returns `false` once `generation`
    /// may no longer write.
    pub fn publish_standings(&self, generation: u64, data: StandingsData) -> bool {
        let snapshot = Arc::new(StandingsSnapshot::from_standings(&data));
        let mut st = self.state();
        if st.writer != Some(generation) {
            return false;
        }
        st.snapshot = Some(snapshot);
        st.standings = Some(Arc::new(data));
        st.last_error = None;
        st.last_refresh = Some(Utc::now());
        true
    }

    /// Publish a simulated board, auto-freezing once the clock passes the
    /// freeze boundary.
    pub fn publish_tick(&self, generation: u64, snapshot: StandingsSnapshot, past_freeze: bool) -> bool {
        let mut st = self.state();
        if st.writer != Some(generation) {
            return false;
        }
        if past_freeze && st.phase == Phase::Live {
            if let Ok(next) = st.phase.apply(Transition::AutoFreeze) {
                st.phase = next;
                tracing::info!("simulation reached the freeze, board frozen");
            }
        }
        st.snapshot = Some(Arc::new(snapshot));
        st.last_refresh = Some(Utc::now());
        true
    }

    pub fn record_error(&self, generation: u64, err: SessionError) {
        let mut st = self.state();
        if st.writer == Some(generation) {
            st.last_error = Some(err);
        }
    }

    /// Apply a worker-driven transition and revoke the worker's ticket.
    pub fn conclude(&self, generation: u64, transition: Transition, last: Option<StandingsSnapshot>) {
        let mut st = self.state();
        if st.writer != Some(generation) {
            return;
        }
        match st.phase.apply(transition) {
            Ok(next) => {
                tracing::info!("{} -> {next}", st.phase);
                st.phase = next;
            }
            Err(e) => tracing::debug!("worker transition skipped: {e}"),
        }
        if let Some(snapshot) = last {
            st.snapshot = Some(Arc::new(snapshot));
            st.last_refresh = Some(Utc::now());
        }
        st.writer = None;
    }

    /// Drop the worker's own handle without joining it. Called from inside
    /// the worker, where a join would wait on itself.
    pub fn detach_worker(&self, generation: u64) {
        let mut slot = self.worker_slot();
        if slot.as_ref().is_some_and(|w| w.generation == generation) {
            slot.take();
        }
    }
}

/// A single tracked contest with injected data sources.
pub struct ContestSession {
    shared: Arc<Shared>,
}

impl ContestSession {
    pub fn new(
        standings: Arc<dyn StandingsSource>,
        submissions: Arc<dyn SubmissionSource>,
    ) -> Self {
        Self::with_options(standings, submissions, SessionOptions::default())
    }

    pub fn with_options(
        standings: Arc<dyn StandingsSource>,
        submissions: Arc<dyn SubmissionSource>,
        options: SessionOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                standings_source: standings,
                submission_source: submissions,
                options,
                state: Mutex::new(SessionState::default()),
                worker: Mutex::new(None),
            }),
        }
    }

    // ─── Transitions ──────────────────────────────────────────────

    /// Start tracking a real contest. Any previous contest is reset first.
    ///
    /// A failed initial fetch is recorded in `last_error`; the session is
    /// `live` either way and the refresher keeps trying.
    pub async fn start_contest(&self, config: ContestConfig) {
        let (generation, ()) = self
            .begin(|st| st.mode = Some(Mode::Live(config.clone())))
            .await;
        tracing::info!(
            "live: tracking contest {} (refresh every {}s)",
            config.contest_id,
            config.effective_refresh_interval().as_secs()
        );

        match self.shared.standings_source.fetch_standings(config.contest_id).await {
            Ok(data) => {
                self.shared.publish_standings(generation, data);
            }
            Err(e) => {
                tracing::warn!("initial fetch for contest {} failed: {e}", config.contest_id);
                self.shared.record_error(generation, e.into());
            }
        }

        self.install_worker(generation, |shared, cancel| {
            tokio::spawn(worker::refresh_loop(shared, generation, config, cancel))
        });
    }

    /// Start a synthetic contest compressed into `config.wall_budget`.
    pub async fn start_simulation(&self, config: SimulationConfig) {
        let dataset = generate(config.params);
        let initial = dataset.snapshot_at(0);
        let compression = config.compression_ratio();
        // The clock starts only once the previous worker is gone.
        let (generation, run) = self
            .begin(move |st| {
                let run = Arc::new(SimRun {
                    dataset,
                    compression,
                    started: Instant::now(),
                });
                st.mode = Some(Mode::Simulation(Arc::clone(&run)));
                st.snapshot = Some(Arc::new(initial));
                st.last_refresh = Some(Utc::now());
                run
            })
            .await;
        tracing::info!(
            "live: simulation seed={} ({} contestants, x{:.0} speed)",
            config.params.seed,
            run.dataset.rows.len(),
            run.compression
        );

        let tick = self.shared.options.tick_interval;
        self.install_worker(generation, move |shared, cancel| {
            tokio::spawn(worker::tick_loop(shared, generation, run, tick, cancel))
        });
    }

    /// Stop background activity and keep the last board as the frozen view.
    pub async fn freeze(&self) -> Result<(), SessionError> {
        {
            let mut st = self.shared.state();
            st.phase = st.phase.apply(Transition::Freeze)?;
            st.writer = None;
        }
        tracing::info!("frozen: scoreboard locked");
        self.stop_worker().await;
        Ok(())
    }

    /// Enter the reveal and build its payload.
    ///
    /// On failure the phase is still `reveal`, the payload stays absent, and
    /// the error is both recorded and returned.
    pub async fn reveal(&self) -> Result<Arc<RevealPayload>, SessionError> {
        let (mode, generation) = {
            let mut st = self.shared.state();
            st.phase = st.phase.apply(Transition::Reveal)?;
            st.writer = None;
            st.reveal = None;
            st.last_error = None;
            (st.mode.clone(), st.generation)
        };
        self.stop_worker().await;

        let result = match mode {
            Some(Mode::Simulation(run)) => Ok(Arc::new(run.dataset.reveal.clone())),
            Some(Mode::Live(config)) => self.build_reveal(config).await.map(Arc::new),
            None => Err(SessionError::NoContest),
        };

        let mut st = self.shared.state();
        if st.generation == generation {
            match &result {
                Ok(payload) => {
                    tracing::info!(
                        "reveal: {} contestants, {} blind-hour submissions",
                        payload.contestants.len(),
                        payload.blind_hour_submissions.len()
                    );
                    st.reveal = Some(Arc::clone(payload));
                }
                Err(e) => {
                    tracing::warn!("reveal failed: {e}");
                    st.last_error = Some(e.clone());
                }
            }
        }
        result
    }

    /// Back to `setup`: stop the worker, drop every snapshot, payload and error.
    pub async fn reset(&self) {
        {
            let mut st = self.shared.state();
            let generation = st.generation + 1;
            *st = SessionState {
                generation,
                ..SessionState::default()
            };
        }
        self.stop_worker().await;
        tracing::info!("setup: session reset");
    }

    // ─── Reads ────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.shared.state().phase
    }

    pub fn snapshot(&self) -> Option<Arc<StandingsSnapshot>> {
        self.shared.state().snapshot.clone()
    }

    pub fn reveal_payload(&self) -> Option<Arc<RevealPayload>> {
        self.shared.state().reveal.clone()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.shared.state().last_error.clone()
    }

    pub fn is_worker_running(&self) -> bool {
        self.shared
            .worker_slot()
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// What a presentation layer should show right now.
    pub fn view(&self) -> View {
        let st = self.shared.state();
        match st.phase {
            Phase::Setup => View::Setup,
            Phase::Reveal => View::Reveal {
                payload: st.reveal.clone(),
                error: st.last_error.clone(),
            },
            phase => View::Standings {
                phase,
                snapshot: st.snapshot.clone(),
            },
        }
    }

    pub fn status(&self) -> SessionStatus {
        let st = self.shared.state();
        let mut status = SessionStatus {
            phase: st.phase,
            contest_id: None,
            contest_name: None,
            freeze_minutes: None,
            refresh_interval_seconds: None,
            duration_seconds: None,
            last_refresh: st.last_refresh,
            error: st.last_error.as_ref().map(ToString::to_string),
            sim_mode: false,
        };
        match &st.mode {
            Some(Mode::Live(config)) => {
                status.contest_id = Some(config.contest_id);
                status.freeze_minutes = Some(config.freeze_minutes);
                status.refresh_interval_seconds =
                    Some(config.effective_refresh_interval().as_secs());
                if let Some(data) = &st.standings {
                    status.contest_name = Some(data.contest.name.clone());
                    status.duration_seconds = Some(data.contest.duration_seconds);
                }
            }
            Some(Mode::Simulation(run)) => {
                status.sim_mode = true;
                status.contest_name = Some(run.dataset.contest.name.clone());
                status.freeze_minutes = Some(run.dataset.params.freeze_minutes);
                status.duration_seconds = Some(run.dataset.duration_seconds());
            }
            None => {}
        }
        status
    }

    /// Replay the tracked contest's log to `cutoff_seconds`.
    ///
    /// Real mode fetches the submission log on first use and keeps it until
    /// reset; the standings rows come from the latest refresh.
    pub async fn state_at(&self, cutoff_seconds: u64) -> Result<StandingsSnapshot, SessionError> {
        let (mode, generation, standings, log) = {
            let st = self.shared.state();
            (
                st.mode.clone(),
                st.generation,
                st.standings.clone(),
                st.submission_log.clone(),
            )
        };

        match mode {
            None => Err(SessionError::NoContest),
            Some(Mode::Simulation(run)) => {
                let data = &run.dataset;
                let contestants =
                    standings_at(&data.submissions, &data.rows, &data.problems, cutoff_seconds);
                Ok(StandingsSnapshot::replayed(
                    &data.contest,
                    data.problems.as_slice(),
                    contestants,
                    ContestStatus::at_offset(
                        cutoff_seconds,
                        data.freeze_seconds(),
                        data.duration_seconds(),
                    ),
                    cutoff_seconds,
                ))
            }
            Some(Mode::Live(config)) => {
                let standings = match standings {
                    Some(s) => s,
                    None => Arc::new(
                        self.shared
                            .standings_source
                            .fetch_standings(config.contest_id)
                            .await?,
                    ),
                };
                let log = match log {
                    Some(log) => log,
                    None => {
                        let log = Arc::new(
                            self.shared
                                .submission_source
                                .fetch_submissions(config.contest_id)
                                .await?,
                        );
                        let mut st = self.shared.state();
                        if st.generation == generation {
                            st.submission_log = Some(Arc::clone(&log));
                        }
                        log
                    }
                };
                let contestants =
                    standings_at(&log, &standings.rows, &standings.problems, cutoff_seconds);
                Ok(StandingsSnapshot::replayed(
                    &standings.contest,
                    standings.problems.as_slice(),
                    contestants,
                    ContestStatus::at_offset(
                        cutoff_seconds,
                        config.freeze_seconds(),
                        standings.contest.duration_seconds,
                    ),
                    cutoff_seconds,
                ))
            }
        }
    }

    // ─── Internals ────────────────────────────────────────────────

    /// Implicit reset, then enter `live` holding the writer ticket.
    ///
    /// `enter` runs under the state lock after the previous worker has
    /// stopped; it installs the mode and anything published with it.
    async fn begin<R>(&self, enter: impl FnOnce(&mut SessionState) -> R) -> (u64, R) {
        self.stop_worker().await;
        let mut st = self.shared.state();
        let generation = st.generation + 1;
        *st = SessionState {
            phase: Phase::Live,
            generation,
            writer: Some(generation),
            ..SessionState::default()
        };
        let entered = enter(&mut st);
        (generation, entered)
    }

    /// Spawn the worker unless `generation` lost its ticket meanwhile.
    ///
    /// The slot lock is held across the check and the insert so a
    /// concurrent stop either sees the new worker or prevents its spawn.
    fn install_worker<F>(&self, generation: u64, spawn: F)
    where
        F: FnOnce(Arc<Shared>, CancellationToken) -> JoinHandle<()>,
    {
        let mut slot = self.shared.worker_slot();
        if self.shared.state().writer != Some(generation) {
            return;
        }
        let cancel = CancellationToken::new();
        let handle = spawn(Arc::clone(&self.shared), cancel.clone());
        if let Some(stale) = slot.replace(WorkerHandle {
            generation,
            cancel,
            handle,
        }) {
            stale.cancel.cancel();
        }
    }

    /// Signal the worker and wait (bounded) for it to exit.
    async fn stop_worker(&self) {
        let Some(worker) = self.shared.worker_slot().take() else {
            return;
        };
        worker.cancel.cancel();
        let timeout = self.shared.options.stop_timeout;
        if tokio::time::timeout(timeout, worker.handle).await.is_err() {
            tracing::warn!(
                "worker for generation {} did not stop within {timeout:?}, detached",
                worker.generation
            );
        }
    }

    async fn build_reveal(&self, config: ContestConfig) -> Result<RevealPayload, SessionError> {
        let id = config.contest_id;
        tracing::info!("reveal: fetching complete data for contest {id}");
        let data = self
            .shared
            .standings_source
            .fetch_standings(id)
            .await
            .map_err(SessionError::Reconstruction)?;
        let submissions = self
            .shared
            .submission_source
            .fetch_submissions(id)
            .await
            .map_err(SessionError::Reconstruction)?;
        Ok(reconstruct(
            RevealInput {
                contest: &data.contest,
                problems: &data.problems,
                rows: &data.rows,
                submissions: &submissions,
            },
            config.freeze_seconds(),
        ))
    }
}

impl Drop for ContestSession {
    fn drop(&mut self) {
        if let Some(worker) = self.shared.worker_slot().take() {
            worker.cancel.cancel();
        }
    }
}

/// Phase-dependent content for a presentation layer.
#[derive(Debug, Clone)]
pub enum View {
    Setup,
    /// `live`, `frozen`, or `ended`. The board may be absent if no fetch
    /// has succeeded yet.
    Standings {
        phase: Phase,
        snapshot: Option<Arc<StandingsSnapshot>>,
    },
    /// Callers must check `error` before trusting a missing payload.
    Reveal {
        payload: Option<Arc<RevealPayload>>,
        error: Option<SessionError>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub phase: Phase,
    pub contest_id: Option<u64>,
    pub contest_name: Option<String>,
    pub freeze_minutes: Option<u32>,
    pub refresh_interval_seconds: Option<u64>,
    pub duration_seconds: Option<u64>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub sim_mode: bool,
}
