//! Outbound shapes consumed by the presentation layer.
//!
//! Field names are a frozen contract (camelCase JSON). A snapshot is built
//! once and never mutated afterwards; holders share it behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{
    ContestId, ContestMeta, ContestStatus, Problem, ProblemIndex, ProblemResult, StandingsData,
    Verdict,
};

// ─── Standings snapshot ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHeader {
    pub id: ContestId,
    pub name: String,
    pub duration_seconds: u64,
    pub phase: ContestStatus,
    pub relative_time_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedContestant {
    pub handle: String,
    pub rank: u32,
    pub solved: u32,
    /// Total penalty in minutes.
    pub penalty: u64,
    pub problem_results: BTreeMap<ProblemIndex, ProblemResult>,
}

impl RankedContestant {
    pub fn result(&self, index: &str) -> Option<&ProblemResult> {
        self.problem_results.get(&ProblemIndex::new(index))
    }
}

/// One fully-computed scoreboard, valid as of `contest.relative_time_seconds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsSnapshot {
    pub contest: SnapshotHeader,
    pub problems: Vec<Problem>,
    pub contestants: Vec<RankedContestant>,
}

impl StandingsSnapshot {
    /// Format a live view straight from authoritative rows, no replay.
    pub fn from_standings(data: &StandingsData) -> Self {
        let contestants = data
            .rows
            .iter()
            .map(|row| RankedContestant {
                handle: row.handle.clone(),
                rank: row.rank,
                // ICPC rows report points == solved count.
                solved: row.points.max(0.0) as u32,
                penalty: row.penalty,
                problem_results: row.problem_results.clone(),
            })
            .collect();

        Self {
            contest: SnapshotHeader {
                id: data.contest.id,
                name: data.contest.name.clone(),
                duration_seconds: data.contest.duration_seconds,
                phase: data.contest.status,
                relative_time_seconds: data.contest.relative_time_seconds.unwrap_or(0),
            },
            problems: data.problems.as_slice().to_vec(),
            contestants,
        }
    }

    /// Wrap a replayed scoreboard with its header.
    pub fn replayed(
        contest: &ContestMeta,
        problems: &[Problem],
        contestants: Vec<RankedContestant>,
        phase: ContestStatus,
        relative_time_seconds: u64,
    ) -> Self {
        Self {
            contest: SnapshotHeader {
                id: contest.id,
                name: contest.name.clone(),
                duration_seconds: contest.duration_seconds,
                phase,
                relative_time_seconds,
            },
            problems: problems.to_vec(),
            contestants,
        }
    }

    pub fn contestant(&self, handle: &str) -> Option<&RankedContestant> {
        self.contestants.iter().find(|c| c.handle == handle)
    }

    pub fn total_solved(&self) -> u64 {
        self.contestants.iter().map(|c| u64::from(c.solved)).sum()
    }
}

// ─── Reveal payload ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealHeader {
    pub id: ContestId,
    pub name: String,
    pub duration_seconds: u64,
    pub freeze_time_seconds: u64,
}

/// Per-problem state as shown on the frozen board.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezeProblemResult {
    pub solved: bool,
    pub time: u64,
    pub wa_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealContestant {
    pub handle: String,
    pub freeze_solved_count: u32,
    pub freeze_penalty: u64,
    pub freeze_rank: u32,
    pub final_points: f64,
    pub final_penalty: u64,
    pub final_rank: u32,
    pub problem_results_at_freeze: BTreeMap<ProblemIndex, FreezeProblemResult>,
    pub problem_results_final: BTreeMap<ProblemIndex, ProblemResult>,
}

/// A submission hidden by the freeze, replayed one by one during the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindHourSubmission {
    pub handle: String,
    pub problem_index: ProblemIndex,
    pub problem_name: String,
    pub verdict: Verdict,
    pub relative_time_sec: u64,
    pub submission_id: u64,
    /// Counted rejections on this pair before this submission (pre-freeze + blind hour).
    pub wrong_attempts_before: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealPayload {
    pub contest: RevealHeader,
    pub problems: Vec<Problem>,
    /// Ordered by freeze rank.
    pub contestants: Vec<RevealContestant>,
    /// Ordered by relative time.
    pub blind_hour_submissions: Vec<BlindHourSubmission>,
}

impl RevealPayload {
    pub fn contestant(&self, handle: &str) -> Option<&RevealContestant> {
        self.contestants.iter().find(|c| c.handle == handle)
    }

    pub fn accepted_blind_hour_count(&self) -> usize {
        self.blind_hour_submissions
            .iter()
            .filter(|s| s.verdict.is_accepted())
            .count()
    }
}
