//! Freeze/reveal reconstruction.
//!
//! Splits the full log at the freeze boundary: the pre-freeze half rebuilds
//! the frozen board, the post-freeze half becomes the blind-hour feed.
//! Pre-freeze solves are cross-checked against the authoritative final
//! results, so a solve that was later hacked away (and possibly re-solved
//! after the freeze) does not appear on the frozen board.

use std::collections::BTreeMap;

use crate::replay::{Roster, admit, chronological};
use crate::scoring::{ProblemState, rank_in_place};
use crate::snapshot::{
    BlindHourSubmission, FreezeProblemResult, RevealContestant, RevealHeader, RevealPayload,
};
use crate::types::{ContestMeta, ContestantRow, ProblemResult, ProblemSet, Submission};

/// Everything the reconstructor reads. Borrowed; nothing is retained.
#[derive(Debug, Clone, Copy)]
pub struct RevealInput<'a> {
    pub contest: &'a ContestMeta,
    pub problems: &'a ProblemSet,
    pub rows: &'a [ContestantRow],
    pub submissions: &'a [Submission],
}

/// Blind-hour bookkeeping for one pair.
#[derive(Debug, Clone, Copy, Default)]
struct BlindState {
    solved: bool,
    rejected: u32,
}

/// Build the complete reveal payload for a freeze at `freeze_seconds`.
///
/// Submissions strictly before the boundary are pre-freeze; those at or
/// after it are blind-hour events. Every qualifying blind-hour submission
/// is recorded, not only the accepted one.
pub fn reconstruct(input: RevealInput<'_>, freeze_seconds: u64) -> RevealPayload {
    let RevealInput {
        contest,
        problems,
        rows,
        submissions,
    } = input;
    let roster = Roster::from_rows(rows);
    let width = problems.len();
    let mut frozen = vec![vec![ProblemState::default(); width]; roster.len()];
    let mut blind = vec![vec![BlindState::default(); width]; roster.len()];
    let mut blind_hour_submissions = Vec::new();

    for sub in chronological(submissions) {
        let Some((who, slot)) = admit(sub, &roster, problems) else {
            continue;
        };
        let pre = &mut frozen[who][slot.get()];
        if sub.relative_time_seconds < freeze_seconds {
            pre.apply(sub);
            continue;
        }

        let hidden = &mut blind[who][slot.get()];
        if pre.solved || hidden.solved {
            continue;
        }
        blind_hour_submissions.push(BlindHourSubmission {
            handle: roster.handle(who).to_string(),
            problem_index: sub.problem_index.clone(),
            problem_name: problems.get(slot).name.clone(),
            verdict: sub.verdict,
            relative_time_sec: sub.relative_time_seconds,
            submission_id: sub.submission_id,
            wrong_attempts_before: pre.rejected + hidden.rejected,
        });
        if sub.verdict.is_accepted() {
            hidden.solved = true;
        } else if sub.verdict.is_counted_rejection() && sub.passed_any_test() {
            hidden.rejected += 1;
        }
    }
    blind_hour_submissions.sort_by_key(|s| s.relative_time_sec);

    let final_rows = first_row_per_handle(rows);
    let mut contestants: Vec<RevealContestant> = frozen
        .iter()
        .enumerate()
        .map(|(who, cells)| {
            let handle = roster.handle(who);
            freeze_view(handle, cells, final_rows.get(handle).copied(), problems, freeze_seconds)
        })
        .collect();
    rank_in_place(
        &mut contestants,
        |c| (c.freeze_solved_count, c.freeze_penalty),
        |c, rank| c.freeze_rank = rank,
    );

    RevealPayload {
        contest: RevealHeader {
            id: contest.id,
            name: contest.name.clone(),
            duration_seconds: contest.duration_seconds,
            freeze_time_seconds: freeze_seconds,
        },
        problems: problems.as_slice().to_vec(),
        contestants,
        blind_hour_submissions,
    }
}

fn first_row_per_handle(rows: &[ContestantRow]) -> BTreeMap<&str, &ContestantRow> {
    let mut by_handle = BTreeMap::new();
    for row in rows {
        by_handle.entry(row.handle.as_str()).or_insert(row);
    }
    by_handle
}

/// A candidate solve survives only if the final result still shows the
/// problem solved strictly before the freeze.
fn trusted(candidate: &ProblemState, fin: Option<&ProblemResult>, freeze_seconds: u64) -> bool {
    candidate.solved && fin.is_some_and(|f| f.solved && f.time < freeze_seconds)
}

fn freeze_view(
    handle: &str,
    cells: &[ProblemState],
    row: Option<&ContestantRow>,
    problems: &ProblemSet,
    freeze_seconds: u64,
) -> RevealContestant {
    let empty = BTreeMap::new();
    let final_results = row.map_or(&empty, |r| &r.problem_results);

    let mut solved_count = 0;
    let mut penalty = 0;
    let mut at_freeze = BTreeMap::new();
    for (slot, problem) in problems.iter() {
        let cell = &cells[slot.get()];
        let result = if trusted(cell, final_results.get(&problem.index), freeze_seconds) {
            solved_count += 1;
            penalty += cell.penalty();
            FreezeProblemResult {
                solved: true,
                time: cell.time,
                wa_count: cell.rejected,
            }
        } else {
            FreezeProblemResult {
                solved: false,
                time: 0,
                wa_count: cell.rejected,
            }
        };
        at_freeze.insert(problem.index.clone(), result);
    }

    RevealContestant {
        handle: handle.to_string(),
        freeze_solved_count: solved_count,
        freeze_penalty: penalty,
        freeze_rank: 0,
        final_points: row.map_or(0.0, |r| r.points),
        final_penalty: row.map_or(0, |r| r.penalty),
        final_rank: row.map_or(0, |r| r.rank),
        problem_results_at_freeze: at_freeze,
        problem_results_final: final_results.clone(),
    }
}
