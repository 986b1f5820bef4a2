//! Seeded synthetic contest generator.
//!
//! Produces problems, a submission log, authoritative final rows, and the
//! reveal payload, all from one `StdRng` stream. Same params, same bytes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use blindhour_core::types::{
    ContestMeta, ContestStatus, ContestantRow, ParticipantType, Problem, ProblemSet, Submission,
    Verdict,
};
use blindhour_core::{
    RevealInput, RevealPayload, StandingsSnapshot, reconstruct, standings_at,
};

const PROBLEM_POOL: [(&str, &str); 10] = [
    ("A", "Opening Move"),
    ("B", "Balanced Brackets"),
    ("C", "Cycle Cover"),
    ("D", "Dividing Lines"),
    ("E", "Exact Change"),
    ("F", "Flood Fill"),
    ("G", "Grid Guards"),
    ("H", "Hidden Permutation"),
    ("I", "Interval Sweep"),
    ("J", "Jumping Frogs"),
];

const HANDLE_POOL: [&str; 24] = [
    "segtree_enjoyer",
    "lazy_propagator",
    "dp_on_a_bus",
    "off_by_one",
    "two_pointers",
    "knapsack_kid",
    "bitset_bandit",
    "mod_inverse",
    "greedy_goblin",
    "dijkstra_daily",
    "fenwick_fan",
    "suffix_sorter",
    "hld_hiker",
    "convex_hull_cat",
    "mo_queries",
    "trie_hard",
    "kmp_kingdom",
    "sparse_tabler",
    "centroid_crow",
    "flow_finder",
    "dsu_duck",
    "bfs_bear",
    "fft_falcon",
    "z_function",
];

const COUNTED_REJECTIONS: [Verdict; 3] = [
    Verdict::WrongAnswer,
    Verdict::TimeLimitExceeded,
    Verdict::RuntimeError,
];

/// Generator parameters. Identical params always yield an identical dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimParams {
    pub seed: u64,
    pub contestants: usize,
    pub duration_minutes: u32,
    pub freeze_minutes: u32,
    pub problems: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            seed: 42,
            contestants: 40,
            duration_minutes: 240,
            freeze_minutes: 180,
            problems: 7,
        }
    }
}

impl SimParams {
    /// Clamp into a generatable range: at least one contestant and problem,
    /// at most the problem pool, freeze no later than the end.
    pub fn normalized(self) -> Self {
        let duration_minutes = self.duration_minutes.max(1);
        Self {
            seed: self.seed,
            contestants: self.contestants.max(1),
            duration_minutes,
            freeze_minutes: self.freeze_minutes.min(duration_minutes),
            problems: self.problems.clamp(1, PROBLEM_POOL.len()),
        }
    }
}

/// A complete synthetic contest, interchangeable with fetched data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimDataset {
    pub params: SimParams,
    pub contest: ContestMeta,
    pub problems: ProblemSet,
    /// Authoritative final standings, in final rank order.
    pub rows: Vec<ContestantRow>,
    /// Chronological log with sequential ids.
    pub submissions: Vec<Submission>,
    pub reveal: RevealPayload,
}

impl SimDataset {
    pub fn duration_seconds(&self) -> u64 {
        self.contest.duration_seconds
    }

    pub fn freeze_seconds(&self) -> u64 {
        self.reveal.contest.freeze_time_seconds
    }

    /// The board a spectator would see `sim_seconds` into the contest.
    ///
    /// Once the freeze passes, the board stays at its last pre-freeze state
    /// until the end.
    pub fn snapshot_at(&self, sim_seconds: u64) -> StandingsSnapshot {
        let now = sim_seconds.min(self.duration_seconds());
        let freeze = self.freeze_seconds();
        let phase = ContestStatus::at_offset(now, freeze, self.duration_seconds());
        let cutoff = if now >= freeze { freeze.saturating_sub(1) } else { now };
        let contestants = standings_at(&self.submissions, &self.rows, &self.problems, cutoff);
        StandingsSnapshot::replayed(
            &self.contest,
            self.problems.as_slice(),
            contestants,
            phase,
            now,
        )
    }
}

/// One synthetic event before ids are assigned.
struct Draft {
    contestant: usize,
    problem: usize,
    verdict: Verdict,
    time: u64,
    passed: u32,
}

struct Clock {
    duration: u64,
    freeze: u64,
}

pub fn generate(params: SimParams) -> SimDataset {
    let params = params.normalized();
    let mut rng = StdRng::seed_from_u64(params.seed);
    let clock = Clock {
        duration: u64::from(params.duration_minutes) * 60,
        freeze: u64::from(params.freeze_minutes) * 60,
    };

    let problems = ProblemSet::new(
        PROBLEM_POOL[..params.problems]
            .iter()
            .map(|(index, name)| Problem::new(*index, *name))
            .collect(),
    );
    let handles: Vec<String> = (0..params.contestants).map(handle_for).collect();

    let mut skills: Vec<f64> = (0..params.contestants)
        .map(|_| rng.random_range(0.3..1.0))
        .collect();
    skills.sort_by(|a, b| b.total_cmp(a));

    let mut drafts = Vec::new();
    for (contestant, &skill) in skills.iter().enumerate() {
        for problem in 0..params.problems {
            let difficulty = (problem + 1) as f64 / params.problems as f64;
            draft_pair(
                &mut rng,
                &clock,
                contestant,
                problem,
                skill,
                difficulty,
                &mut drafts,
            );
        }
    }
    drafts.sort_by_key(|d| d.time);

    let submissions: Vec<Submission> = drafts
        .iter()
        .enumerate()
        .map(|(i, d)| Submission {
            submission_id: i as u64 + 1,
            handle: handles[d.contestant].clone(),
            participant_type: ParticipantType::Contestant,
            problem_index: PROBLEM_POOL[d.problem].0.into(),
            verdict: d.verdict,
            relative_time_seconds: d.time,
            passed_test_count: Some(d.passed),
        })
        .collect();

    let entrants: Vec<ContestantRow> = handles
        .iter()
        .map(|handle| ContestantRow {
            handle: handle.clone(),
            rank: 0,
            points: 0.0,
            penalty: 0,
            problem_results: Default::default(),
        })
        .collect();
    let rows: Vec<ContestantRow> = standings_at(&submissions, &entrants, &problems, clock.duration)
        .into_iter()
        .map(|c| ContestantRow {
            handle: c.handle,
            rank: c.rank,
            points: f64::from(c.solved),
            penalty: c.penalty,
            problem_results: c.problem_results,
        })
        .collect();

    let contest = ContestMeta {
        id: 0,
        name: format!(
            "Blind Hour Simulation ({}h, last {} min frozen)",
            params.duration_minutes / 60,
            params.duration_minutes - params.freeze_minutes
        ),
        duration_seconds: clock.duration,
        status: ContestStatus::Finished,
        relative_time_seconds: Some(clock.duration),
    };
    let reveal = reconstruct(
        RevealInput {
            contest: &contest,
            problems: &problems,
            rows: &rows,
            submissions: &submissions,
        },
        clock.freeze,
    );

    SimDataset {
        params,
        contest,
        problems,
        rows,
        submissions,
        reveal,
    }
}

fn handle_for(i: usize) -> String {
    HANDLE_POOL
        .get(i)
        .map_or_else(|| format!("team_{:02}", i + 1), |h| (*h).to_string())
}

/// Uniform draw from `[lo, hi)`, or `None` if the window is empty.
fn draw(rng: &mut StdRng, lo: u64, hi: u64) -> Option<u64> {
    (lo < hi).then(|| rng.random_range(lo..hi))
}

fn rejection(rng: &mut StdRng) -> (Verdict, u32) {
    let verdict = COUNTED_REJECTIONS[rng.random_range(0..COUNTED_REJECTIONS.len())];
    // Some rejections die on the first test and carry no penalty.
    let passed = if rng.random_bool(0.15) {
        0
    } else {
        rng.random_range(1..=12)
    };
    (verdict, passed)
}

/// Synthesize every event for one (contestant, problem) pair.
///
/// At most one accepted event, and every rejection of a solved pair lies
/// strictly before it.
fn draft_pair(
    rng: &mut StdRng,
    clock: &Clock,
    contestant: usize,
    problem: usize,
    skill: f64,
    difficulty: f64,
    out: &mut Vec<Draft>,
) {
    let p_early = (skill - difficulty * 0.6 + 0.3).clamp(0.0, 1.0);
    let attempts = if rng.random_bool(0.4) {
        rng.random_range(0..=2u32)
    } else {
        0
    };
    let push = |rng: &mut StdRng, time: u64, accepted: bool, out: &mut Vec<Draft>| {
        let (verdict, passed) = if accepted {
            (Verdict::Ok, 20)
        } else {
            rejection(rng)
        };
        out.push(Draft {
            contestant,
            problem,
            verdict,
            time,
            passed,
        });
    };

    let latest_early = clock.freeze.saturating_sub(60);
    if rng.random_bool(p_early) && latest_early >= 60 {
        let upper = (40 + 25 * problem as u64) * 60;
        let solve = draw(rng, 300, upper)
            .unwrap_or(300)
            .min(latest_early)
            .max(60);
        let lo = solve.saturating_sub(1800).max(60);
        for _ in 0..attempts {
            if let Some(t) = draw(rng, lo, solve.saturating_sub(30)) {
                push(rng, t, false, out);
            }
        }
        push(rng, solve, true, out);
        return;
    }

    for _ in 0..attempts {
        if let Some(t) = draw(rng, 60, clock.freeze.saturating_sub(120)) {
            push(rng, t, false, out);
        }
    }

    let p_late = (skill - difficulty * 0.5 + 0.1).clamp(0.0, 0.6);
    let late_solve = if rng.random_bool(p_late) {
        draw(rng, clock.freeze + 60, clock.duration.saturating_sub(120))
    } else {
        None
    };
    match late_solve {
        Some(solve) => {
            for _ in 0..rng.random_range(0..=3u32) {
                if let Some(t) = draw(rng, clock.freeze + 30, solve - 30) {
                    push(rng, t, false, out);
                }
            }
            push(rng, solve, true, out);
        }
        None => {
            // A last-minute miss keeps the reveal honest.
            if rng.random_bool((skill * 0.25).clamp(0.0, 1.0)) {
                if let Some(t) = draw(rng, clock.freeze + 30, clock.duration.saturating_sub(30)) {
                    push(rng, t, false, out);
                }
            }
        }
    }
}
