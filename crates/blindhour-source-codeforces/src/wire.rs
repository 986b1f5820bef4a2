//! Codeforces API payloads and their conversion into core types.
//!
//! Only the fields the scoreboard needs are decoded; everything else in
//! the API objects is ignored.

use std::collections::BTreeMap;

use serde::Deserialize;

use blindhour_core::types::{
    ContestMeta, ContestStatus, ContestantRow, ParticipantType, Problem, ProblemIndex,
    ProblemResult, ProblemSet, StandingsData, Submission, Verdict,
};

/// `{"status": "OK", "result": ...}` or `{"status": "FAILED", "comment": ...}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "status")]
pub enum Envelope<T> {
    #[serde(rename = "OK")]
    Ok { result: T },
    #[serde(rename = "FAILED")]
    Failed {
        #[serde(default)]
        comment: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub phase: ContestStatus,
    #[serde(default)]
    pub duration_seconds: u64,
    /// Negative before the contest starts.
    #[serde(default)]
    pub relative_time_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WireProblem {
    pub index: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    pub handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub participant_type: ParticipantType,
    #[serde(default)]
    pub team_name: Option<String>,
}

impl Party {
    /// Team name if present, else the first member, else `"unknown"`.
    pub fn display_handle(&self) -> String {
        if let Some(team) = self.team_name.as_deref().filter(|t| !t.is_empty()) {
            return team.to_string();
        }
        self.members
            .first()
            .map_or_else(|| "unknown".to_string(), |m| m.handle.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProblemResult {
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub rejected_attempt_count: u32,
    #[serde(default)]
    pub best_submission_time_seconds: Option<u64>,
}

impl From<&WireProblemResult> for ProblemResult {
    fn from(r: &WireProblemResult) -> Self {
        Self {
            solved: r.points > 0.0,
            time: r.best_submission_time_seconds.unwrap_or(0),
            rejected_attempts: r.rejected_attempt_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub party: Party,
    pub rank: u32,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub penalty: u64,
    #[serde(default)]
    pub problem_results: Vec<WireProblemResult>,
}

/// One page of `contest.standings`.
#[derive(Debug, Deserialize)]
pub struct StandingsPage {
    pub contest: Contest,
    #[serde(default)]
    pub problems: Vec<WireProblem>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSubmission {
    pub id: u64,
    #[serde(default)]
    pub relative_time_seconds: i64,
    pub problem: WireProblem,
    pub author: Party,
    /// Absent while the submission is still queued.
    #[serde(default)]
    pub verdict: Option<Verdict>,
    #[serde(default)]
    pub passed_test_count: Option<u32>,
}

impl From<WireSubmission> for Submission {
    fn from(s: WireSubmission) -> Self {
        Self {
            submission_id: s.id,
            handle: s.author.display_handle(),
            participant_type: s.author.participant_type,
            problem_index: ProblemIndex::new(s.problem.index),
            verdict: s.verdict.unwrap_or(Verdict::Testing),
            relative_time_seconds: u64::try_from(s.relative_time_seconds).unwrap_or(0),
            passed_test_count: s.passed_test_count,
        }
    }
}

impl From<Contest> for ContestMeta {
    fn from(c: Contest) -> Self {
        Self {
            id: c.id,
            name: c.name,
            duration_seconds: c.duration_seconds,
            status: c.phase,
            relative_time_seconds: c
                .relative_time_seconds
                .map(|t| u64::try_from(t).unwrap_or(0)),
        }
    }
}

/// Assemble the pages of one standings fetch.
///
/// `problemResults` are positional; a result past the end of the problem
/// list is keyed by its position.
pub fn assemble_standings(contest: Contest, problems: Vec<WireProblem>, rows: Vec<Row>) -> StandingsData {
    let problems = ProblemSet::new(
        problems
            .into_iter()
            .map(|p| Problem::new(p.index, p.name))
            .collect(),
    );
    let rows = rows
        .into_iter()
        .map(|row| {
            let problem_results: BTreeMap<ProblemIndex, ProblemResult> = row
                .problem_results
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let index = problems
                        .as_slice()
                        .get(i)
                        .map_or_else(|| ProblemIndex::new(i.to_string()), |p| p.index.clone());
                    (index, ProblemResult::from(r))
                })
                .collect();
            ContestantRow {
                handle: row.party.display_handle(),
                rank: row.rank,
                points: row.points,
                penalty: row.penalty,
                problem_results,
            }
        })
        .collect();

    StandingsData {
        contest: contest.into(),
        problems,
        rows,
    }
}
