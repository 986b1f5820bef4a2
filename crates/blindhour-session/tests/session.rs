use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blindhour_core::types::{
    ContestId, ContestMeta, ContestStatus, ContestantRow, ParticipantType, Problem, ProblemIndex,
    ProblemResult, ProblemSet, StandingsData, Submission, Verdict,
};
use blindhour_core::{SourceError, StandingsSource, SubmissionSource};
use blindhour_session::{
    ContestConfig, ContestSession, Phase, SessionError, SimulationConfig, View,
};
use blindhour_sim::{SimParams, generate};

// ─── Fake source ──────────────────────────────────────────────────

/// Scripted source. Each fetch pops the next scripted answer; the last one
/// repeats forever.
#[derive(Default)]
struct FakeSource {
    standings: Mutex<VecDeque<Result<StandingsData, SourceError>>>,
    submissions: Mutex<VecDeque<Result<Vec<Submission>, SourceError>>>,
    standings_calls: AtomicU32,
    submission_calls: AtomicU32,
    /// Delay on every standings fetch after the first.
    stall: Option<Duration>,
}

struct FakeSourceBuilder {
    source: FakeSource,
}

impl FakeSource {
    fn builder() -> FakeSourceBuilder {
        FakeSourceBuilder {
            source: FakeSource::default(),
        }
    }

    fn standings_calls(&self) -> u32 {
        self.standings_calls.load(Ordering::SeqCst)
    }

    fn submission_calls(&self) -> u32 {
        self.submission_calls.load(Ordering::SeqCst)
    }
}

impl FakeSourceBuilder {
    fn standings(self, status: ContestStatus) -> Self {
        self.standings_result(Ok(standings(status)))
    }

    fn standings_result(self, result: Result<StandingsData, SourceError>) -> Self {
        self.source.standings.lock().expect("lock").push_back(result);
        self
    }

    fn stall_refreshes(mut self, delay: Duration) -> Self {
        self.source.stall = Some(delay);
        self
    }

    fn submissions_result(self, result: Result<Vec<Submission>, SourceError>) -> Self {
        self.source.submissions.lock().expect("lock").push_back(result);
        self
    }

    fn build(self) -> Arc<FakeSource> {
        Arc::new(self.source)
    }
}

fn next<T: Clone>(queue: &Mutex<VecDeque<Result<T, SourceError>>>) -> Result<T, SourceError> {
    let mut q = queue.lock().expect("lock");
    match q.len() {
        0 => Err(SourceError::Rejected("nothing scripted".into())),
        1 => q[0].clone(),
        _ => q.pop_front().unwrap_or_else(|| Err(SourceError::Rejected("empty".into()))),
    }
}

#[async_trait]
impl StandingsSource for FakeSource {
    async fn fetch_standings(&self, _: ContestId) -> Result<StandingsData, SourceError> {
        let call = self.standings_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.stall.filter(|_| call > 0) {
            tokio::time::sleep(delay).await;
        }
        next(&self.standings)
    }
}

#[async_trait]
impl SubmissionSource for FakeSource {
    async fn fetch_submissions(&self, _: ContestId) -> Result<Vec<Submission>, SourceError> {
        self.submission_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.submissions)
    }
}

fn session(source: &Arc<FakeSource>) -> ContestSession {
    ContestSession::new(source.clone(), source.clone())
}

// ─── Data ─────────────────────────────────────────────────────────

fn solved(time: u64) -> ProblemResult {
    ProblemResult {
        solved: true,
        time,
        rejected_attempts: 0,
    }
}

fn standings(status: ContestStatus) -> StandingsData {
    let mut ann = BTreeMap::new();
    ann.insert(ProblemIndex::new("A"), solved(600));
    ann.insert(ProblemIndex::new("B"), solved(4000));
    let mut ben = BTreeMap::new();
    ben.insert(ProblemIndex::new("A"), solved(1200));
    StandingsData {
        contest: ContestMeta {
            id: 77,
            name: "Regional".into(),
            duration_seconds: 5 * 3600,
            status,
            relative_time_seconds: Some(3600),
        },
        problems: ProblemSet::new(vec![Problem::new("A", "Apples"), Problem::new("B", "Bridges")]),
        rows: vec![
            ContestantRow {
                handle: "ann".into(),
                rank: 1,
                points: 2.0,
                penalty: 76,
                problem_results: ann,
            },
            ContestantRow {
                handle: "ben".into(),
                rank: 2,
                points: 1.0,
                penalty: 20,
                problem_results: ben,
            },
        ],
    }
}

fn sub(id: u64, handle: &str, problem: &str, verdict: Verdict, t: u64) -> Submission {
    Submission {
        submission_id: id,
        handle: handle.into(),
        participant_type: ParticipantType::Contestant,
        problem_index: problem.into(),
        verdict,
        relative_time_seconds: t,
        passed_test_count: Some(2),
    }
}

fn log() -> Vec<Submission> {
    vec![
        sub(1, "ann", "A", Verdict::Ok, 600),
        sub(2, "ben", "A", Verdict::Ok, 1200),
        sub(3, "ann", "B", Verdict::WrongAnswer, 3700),
        sub(4, "ann", "B", Verdict::Ok, 4000),
    ]
}

fn config() -> ContestConfig {
    // freeze one hour in
    ContestConfig::new(77).with_freeze_minutes(60)
}

// ─── Real mode ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn start_contest_goes_live_with_initial_board() {
    let source = FakeSource::builder().standings(ContestStatus::Coding).build();
    let s = session(&source);

    s.start_contest(config()).await;

    assert_eq!(s.phase(), Phase::Live);
    let board = s.snapshot().expect("initial board");
    assert_eq!(board.contestant("ann").map(|c| c.solved), Some(2));
    assert_eq!(board.contest.phase, ContestStatus::Coding);
    assert_eq!(source.standings_calls(), 1);
    assert!(s.last_error().is_none());
    assert!(s.is_worker_running());
}

#[tokio::test(start_paused = true)]
async fn failed_initial_fetch_is_recorded_then_cleared() {
    let source = FakeSource::builder()
        .standings_result(Err(SourceError::Unavailable {
            attempts: 4,
            message: "timeout".into(),
        }))
        .standings(ContestStatus::Coding)
        .build();
    let s = session(&source);

    s.start_contest(config()).await;
    assert_eq!(s.phase(), Phase::Live);
    assert!(s.snapshot().is_none());
    assert!(matches!(s.last_error(), Some(SessionError::Source(_))));

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(source.standings_calls(), 2);
    assert!(s.snapshot().is_some());
    assert!(s.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn refresh_interval_has_a_floor() {
    let source = FakeSource::builder().standings(ContestStatus::Coding).build();
    let s = session(&source);

    s.start_contest(config().with_refresh_interval(Duration::from_secs(1)))
        .await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(source.standings_calls(), 1);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(source.standings_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn concluded_contest_auto_freezes_and_stops_polling() {
    let source = FakeSource::builder()
        .standings(ContestStatus::Coding)
        .standings(ContestStatus::Finished)
        .build();
    let s = session(&source);

    s.start_contest(config()).await;
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(s.phase(), Phase::Frozen);
    assert!(!s.is_worker_running());
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.standings_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn explicit_freeze_keeps_last_board() {
    let source = FakeSource::builder().standings(ContestStatus::Coding).build();
    let s = session(&source);

    s.start_contest(config()).await;
    let before = s.snapshot().expect("board");
    s.freeze().await.expect("freeze from live");

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(s.phase(), Phase::Frozen);
    assert_eq!(source.standings_calls(), 1);
    let after = s.snapshot().expect("board");
    assert!(Arc::ptr_eq(&before, &after));
}

#[tokio::test(start_paused = true)]
async fn invalid_transitions_leave_state_alone() {
    let source = FakeSource::builder().standings(ContestStatus::Coding).build();
    let s = session(&source);

    assert_eq!(
        s.freeze().await,
        Err(SessionError::InvalidTransition {
            from: Phase::Setup,
            to: Phase::Frozen
        })
    );
    assert!(matches!(
        s.reveal().await,
        Err(SessionError::InvalidTransition { from: Phase::Setup, .. })
    ));
    assert_eq!(s.phase(), Phase::Setup);
    assert_eq!(source.standings_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn reveal_reconstructs_from_both_sources() {
    let source = FakeSource::builder()
        .standings(ContestStatus::Finished)
        .submissions_result(Ok(log()))
        .build();
    let s = session(&source);

    s.start_contest(config()).await;
    let payload = s.reveal().await.expect("reveal");

    assert_eq!(s.phase(), Phase::Reveal);
    assert_eq!(payload.contest.freeze_time_seconds, 3600);
    let ann = payload.contestant("ann").expect("ann");
    assert_eq!((ann.freeze_solved_count, ann.freeze_penalty, ann.freeze_rank), (1, 10, 1));
    assert_eq!(ann.final_rank, 1);
    let ids: Vec<u64> = payload
        .blind_hour_submissions
        .iter()
        .map(|b| b.submission_id)
        .collect();
    assert_eq!(ids, [3, 4]);
    assert_eq!(payload.blind_hour_submissions[1].wrong_attempts_before, 1);
    assert!(s.reveal_payload().is_some());
    assert!(!s.is_worker_running());

    // Immutable until reset.
    assert!(s.reveal().await.is_err());
    assert!(Arc::ptr_eq(&payload, &s.reveal_payload().expect("kept")));
}

#[tokio::test(start_paused = true)]
async fn reveal_failure_enters_reveal_without_payload() {
    let source = FakeSource::builder()
        .standings(ContestStatus::Coding)
        .submissions_result(Err(SourceError::Rejected("contest is private".into())))
        .build();
    let s = session(&source);

    s.start_contest(config()).await;
    let err = s.reveal().await.expect_err("must fail");

    assert!(matches!(err, SessionError::Reconstruction(SourceError::Rejected(_))));
    assert_eq!(s.phase(), Phase::Reveal);
    assert!(s.reveal_payload().is_none());
    assert_eq!(s.last_error(), Some(err));
    match s.view() {
        View::Reveal { payload, error } => {
            assert!(payload.is_none());
            assert!(error.is_some());
        }
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn reset_mid_refresh_stops_all_mutation() {
    let source = FakeSource::builder().standings(ContestStatus::Coding).build();
    let s = session(&source);

    s.start_contest(config()).await;
    s.reset().await;

    assert_eq!(s.phase(), Phase::Setup);
    assert!(s.snapshot().is_none());
    assert!(s.last_error().is_none());
    assert!(!s.is_worker_running());
    assert!(matches!(s.view(), View::Setup));

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.standings_calls(), 1);
    assert!(s.snapshot().is_none());
}

#[derive(Debug, Clone, Copy)]
enum ResetFrom {
    LiveMidFetch,
    Frozen,
    Reveal,
    Ended,
    SimulationLive,
}

async fn drive_to(s: &ContestSession, from: ResetFrom) {
    match from {
        ResetFrom::LiveMidFetch => {
            s.start_contest(config()).await;
            // the first refresh is now stuck inside the source
            tokio::time::sleep(Duration::from_secs(31)).await;
            assert_eq!(s.phase(), Phase::Live);
        }
        ResetFrom::Frozen => {
            s.start_contest(config()).await;
            s.freeze().await.expect("freeze");
        }
        ResetFrom::Reveal => {
            s.start_contest(config()).await;
            s.reveal().await.expect("reveal");
        }
        ResetFrom::Ended => {
            s.start_simulation(sim_config()).await;
            tokio::time::sleep(Duration::from_secs(12)).await;
            assert_eq!(s.phase(), Phase::Ended);
        }
        ResetFrom::SimulationLive => {
            s.start_simulation(sim_config()).await;
            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert_eq!(s.phase(), Phase::Live);
            assert!(s.is_worker_running());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn reset_from_every_phase_leaves_nothing_running() {
    for from in [
        ResetFrom::LiveMidFetch,
        ResetFrom::Frozen,
        ResetFrom::Reveal,
        ResetFrom::Ended,
        ResetFrom::SimulationLive,
    ] {
        let source = FakeSource::builder()
            .standings(ContestStatus::Coding)
            .stall_refreshes(Duration::from_secs(60))
            .submissions_result(Ok(log()))
            .build();
        let s = session(&source);
        drive_to(&s, from).await;

        s.reset().await;
        assert_eq!(s.phase(), Phase::Setup, "{from:?}");
        assert!(!s.is_worker_running(), "{from:?}");
        assert!(s.snapshot().is_none(), "{from:?}");
        assert!(s.reveal_payload().is_none(), "{from:?}");

        // several refresh periods and well over a hundred ticks
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(s.phase(), Phase::Setup, "{from:?}");
        assert!(s.snapshot().is_none(), "{from:?}");
        assert!(s.last_error().is_none(), "{from:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn state_at_caches_the_submission_log() {
    let source = FakeSource::builder()
        .standings(ContestStatus::Coding)
        .submissions_result(Ok(log()))
        .build();
    let s = session(&source);
    s.start_contest(config()).await;

    let early = s.state_at(700).await.expect("replay");
    assert_eq!(early.contestant("ann").map(|c| c.solved), Some(1));
    assert_eq!(early.contestant("ben").map(|c| c.solved), Some(0));
    assert_eq!(early.contest.phase, ContestStatus::Coding);

    let late = s.state_at(5000).await.expect("replay");
    // 10 + (66 + 20)
    assert_eq!(late.contestant("ann").map(|c| c.penalty), Some(96));
    assert_eq!(late.contest.phase, ContestStatus::Frozen);
    assert_eq!(source.submission_calls(), 1);

    s.reset().await;
    assert_eq!(s.state_at(0).await.map(|_| ()), Err(SessionError::NoContest));
}

#[tokio::test(start_paused = true)]
async fn status_reports_tracked_contest() {
    let source = FakeSource::builder().standings(ContestStatus::Coding).build();
    let s = session(&source);
    assert_eq!(s.status().phase, Phase::Setup);
    assert!(s.status().contest_id.is_none());

    s.start_contest(config().with_refresh_interval(Duration::from_secs(45)))
        .await;
    let status = s.status();
    assert_eq!(status.contest_id, Some(77));
    assert_eq!(status.contest_name.as_deref(), Some("Regional"));
    assert_eq!(status.refresh_interval_seconds, Some(45));
    assert_eq!(status.freeze_minutes, Some(60));
    assert!(status.last_refresh.is_some());
    assert!(!status.sim_mode);

    let json = serde_json::to_value(&status).expect("serialize");
    assert_eq!(json["phase"], "live");
    assert_eq!(json["contestId"], 77);
}

// ─── Simulation ───────────────────────────────────────────────────

fn sim_config() -> SimulationConfig {
    SimulationConfig {
        params: SimParams {
            seed: 11,
            contestants: 10,
            duration_minutes: 120,
            freeze_minutes: 60,
            problems: 4,
        },
        // 7200 simulated seconds in 10 wall seconds
        wall_budget: Duration::from_secs(10),
    }
}

#[tokio::test(start_paused = true)]
async fn simulation_runs_live_frozen_ended_then_reveals() {
    let source = FakeSource::builder().build();
    let s = session(&source);

    s.start_simulation(sim_config()).await;
    assert_eq!(s.phase(), Phase::Live);
    let opening = s.snapshot().expect("zero-elapsed board");
    assert_eq!(opening.total_solved(), 0);
    assert!(s.status().sim_mode);

    tokio::time::sleep(Duration::from_millis(6500)).await;
    assert_eq!(s.phase(), Phase::Frozen);
    assert!(s.is_worker_running(), "ticker keeps running through the freeze");
    let frozen = s.snapshot().expect("board");
    assert_eq!(frozen.contest.phase, ContestStatus::Frozen);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(s.phase(), Phase::Ended);
    assert!(!s.is_worker_running());
    let last = s.snapshot().expect("final board");
    assert_eq!(last.contest.phase, ContestStatus::Finished);
    assert_eq!(last.contestants, frozen.contestants);

    let payload = s.reveal().await.expect("sim reveal");
    assert_eq!(*payload, generate(sim_config().params).reveal);
    assert_eq!(source.standings_calls() + source.submission_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn freezing_a_simulation_stops_the_ticker() {
    let source = FakeSource::builder().build();
    let s = session(&source);

    s.start_simulation(sim_config()).await;
    tokio::time::sleep(Duration::from_millis(2500)).await;
    s.freeze().await.expect("freeze");
    let held = s.snapshot().expect("board");

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(s.phase(), Phase::Frozen);
    assert!(Arc::ptr_eq(&held, &s.snapshot().expect("board")));
}

#[tokio::test(start_paused = true)]
async fn simulation_state_at_is_uncapped_replay() {
    let source = FakeSource::builder().build();
    let s = session(&source);
    s.start_simulation(sim_config()).await;

    let data = generate(sim_config().params);
    let end = s.state_at(data.duration_seconds()).await.expect("replay");
    let solved: u64 = data.rows.iter().map(|r| r.points as u64).sum();
    assert_eq!(end.total_solved(), solved);
}

#[tokio::test(start_paused = true)]
async fn simulation_clock_starts_after_a_stuck_refresher_is_stopped() {
    let source = FakeSource::builder()
        .standings(ContestStatus::Coding)
        .stall_refreshes(Duration::from_secs(3600))
        .build();
    let s = session(&source);
    s.start_contest(config()).await;
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(source.standings_calls(), 2);

    // Waits out the stop timeout on the stuck refresher first.
    s.start_simulation(sim_config()).await;
    assert_eq!(s.phase(), Phase::Live);
    let opening = s.snapshot().expect("opening board");
    assert_eq!(opening.contest.relative_time_seconds, 0);

    // 1 wall second is 720 simulated seconds, far from the freeze at 3600.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(s.phase(), Phase::Live);
    let board = s.snapshot().expect("board");
    assert!(
        board.contest.relative_time_seconds < 3600,
        "clock at {}s one second after start",
        board.contest.relative_time_seconds
    );
}

#[tokio::test(start_paused = true)]
async fn starting_again_replaces_the_previous_contest() {
    let source = FakeSource::builder().standings(ContestStatus::Coding).build();
    let s = session(&source);

    s.start_simulation(sim_config()).await;
    s.start_contest(config()).await;

    assert_eq!(s.phase(), Phase::Live);
    assert!(!s.status().sim_mode);
    tokio::time::sleep(Duration::from_secs(20)).await;
    let board = s.snapshot().expect("board");
    assert_eq!(board.contest.id, 77);
}
