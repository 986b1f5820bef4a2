//! Standings replay: fold a submission log into a ranked scoreboard as of
//! a cutoff time.
//!
//! Pure function over its inputs. Every structure built here is local to
//! one call.

use std::collections::{BTreeMap, HashMap};

use crate::scoring::{ProblemState, rank_in_place};
use crate::snapshot::RankedContestant;
use crate::types::{
    ContestantRow, ParticipantType, ProblemResult, ProblemSet, ProblemSlot, Submission,
};

/// Official contestants in first-appearance order of the source rows.
pub(crate) struct Roster<'a> {
    handles: Vec<&'a str>,
    positions: HashMap<&'a str, usize>,
}

impl<'a> Roster<'a> {
    pub fn from_rows(rows: &'a [ContestantRow]) -> Self {
        let mut handles = Vec::with_capacity(rows.len());
        let mut positions = HashMap::with_capacity(rows.len());
        for row in rows {
            let handle = row.handle.as_str();
            if !positions.contains_key(handle) {
                positions.insert(handle, handles.len());
                handles.push(handle);
            }
        }
        Self { handles, positions }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn handle(&self, position: usize) -> &'a str {
        self.handles[position]
    }

    fn position(&self, handle: &str) -> Option<usize> {
        self.positions.get(handle).copied()
    }
}

/// Locate the (contestant, problem) cell a submission affects, or `None`
/// when the submission must not touch the standings: unofficial author,
/// non-contestant participation, ignored verdict, or unknown problem.
pub(crate) fn admit(
    sub: &Submission,
    roster: &Roster<'_>,
    problems: &ProblemSet,
) -> Option<(usize, ProblemSlot)> {
    let who = roster.position(&sub.handle)?;
    if sub.participant_type != ParticipantType::Contestant || sub.verdict.is_ignored() {
        return None;
    }
    let slot = problems.slot(&sub.problem_index)?;
    Some((who, slot))
}

/// The log in ascending time order; equal timestamps keep log order.
pub(crate) fn chronological(submissions: &[Submission]) -> Vec<&Submission> {
    let mut ordered: Vec<&Submission> = submissions.iter().collect();
    ordered.sort_by_key(|s| s.relative_time_seconds);
    ordered
}

/// Scoreboard as of `cutoff_seconds` (inclusive).
///
/// Every official handle appears, including those with no submissions.
/// Submissions for problems outside `problems` are dropped.
pub fn standings_at(
    submissions: &[Submission],
    rows: &[ContestantRow],
    problems: &ProblemSet,
    cutoff_seconds: u64,
) -> Vec<RankedContestant> {
    let roster = Roster::from_rows(rows);
    let mut grid = vec![vec![ProblemState::default(); problems.len()]; roster.len()];

    for sub in chronological(submissions) {
        if sub.relative_time_seconds > cutoff_seconds {
            break;
        }
        if let Some((who, slot)) = admit(sub, &roster, problems) {
            grid[who][slot.get()].apply(sub);
        }
    }

    let mut standings: Vec<RankedContestant> = grid
        .iter()
        .enumerate()
        .map(|(who, cells)| summarize(roster.handle(who), cells, problems))
        .collect();
    rank_in_place(&mut standings, |c| (c.solved, c.penalty), |c, rank| c.rank = rank);
    standings
}

fn summarize(handle: &str, cells: &[ProblemState], problems: &ProblemSet) -> RankedContestant {
    let mut solved = 0;
    let mut penalty = 0;
    let mut problem_results = BTreeMap::new();
    for (slot, problem) in problems.iter() {
        let cell = cells[slot.get()];
        if cell.solved {
            solved += 1;
            penalty += cell.penalty();
        }
        problem_results.insert(
            problem.index.clone(),
            ProblemResult {
                solved: cell.solved,
                time: cell.time,
                rejected_attempts: cell.rejected,
            },
        );
    }
    RankedContestant {
        handle: handle.to_string(),
        rank: 0,
        solved,
        penalty,
        problem_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Problem, Verdict};

    fn row(handle: &str) -> ContestantRow {
        ContestantRow {
            handle: handle.into(),
            rank: 0,
            points: 0.0,
            penalty: 0,
            problem_results: BTreeMap::new(),
        }
    }

    fn sub(handle: &str, problem: &str, verdict: Verdict, t: u64) -> Submission {
        Submission {
            submission_id: t,
            handle: handle.into(),
            participant_type: ParticipantType::Contestant,
            problem_index: problem.into(),
            verdict,
            relative_time_seconds: t,
            passed_test_count: Some(1),
        }
    }

    fn problems() -> ProblemSet {
        ProblemSet::new(vec![Problem::new("A", "Alpha"), Problem::new("B", "Beta")])
    }

    #[test]
    fn silent_contestant_still_listed() {
        let rows = vec![row("busy"), row("quiet")];
        let subs = vec![sub("busy", "A", Verdict::Ok, 60)];
        let standings = standings_at(&subs, &rows, &problems(), 10_000);
        assert_eq!(standings.len(), 2);
        let quiet = standings.iter().find(|c| c.handle == "quiet").expect("listed");
        assert_eq!((quiet.solved, quiet.penalty, quiet.rank), (0, 0, 2));
        assert_eq!(quiet.problem_results.len(), 2);
    }

    #[test]
    fn unofficial_and_practice_submissions_are_skipped() {
        let rows = vec![row("official")];
        let mut practice = sub("official", "A", Verdict::Ok, 30);
        practice.participant_type = ParticipantType::Practice;
        let subs = vec![practice, sub("stranger", "A", Verdict::Ok, 40)];
        let standings = standings_at(&subs, &rows, &problems(), 10_000);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].solved, 0);
    }

    #[test]
    fn unknown_problem_is_dropped() {
        let rows = vec![row("u")];
        let subs = vec![sub("u", "Z", Verdict::Ok, 30), sub("u", "B", Verdict::Ok, 90)];
        let standings = standings_at(&subs, &rows, &problems(), 10_000);
        assert_eq!(standings[0].solved, 1);
        assert!(!standings[0].problem_results.contains_key(&crate::types::ProblemIndex::new("Z")));
    }

    #[test]
    fn ignored_verdicts_do_not_count() {
        let rows = vec![row("u")];
        let subs = vec![
            sub("u", "A", Verdict::CompilationError, 10),
            sub("u", "A", Verdict::Hacked, 20),
            sub("u", "A", Verdict::Ok, 120),
        ];
        let standings = standings_at(&subs, &rows, &problems(), 10_000);
        assert_eq!(standings[0].penalty, 2);
        assert_eq!(standings[0].result("A").map(|r| r.rejected_attempts), Some(0));
    }

    #[test]
    fn unsorted_log_is_replayed_chronologically() {
        let rows = vec![row("u")];
        let subs = vec![
            sub("u", "A", Verdict::Ok, 600),
            sub("u", "A", Verdict::WrongAnswer, 300),
        ];
        let standings = standings_at(&subs, &rows, &problems(), 10_000);
        assert_eq!(standings[0].penalty, 30);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let rows = vec![row("u")];
        let subs = vec![sub("u", "A", Verdict::Ok, 120)];
        assert_eq!(standings_at(&subs, &rows, &problems(), 119)[0].solved, 0);
        assert_eq!(standings_at(&subs, &rows, &problems(), 120)[0].solved, 1);
    }

    #[test]
    fn duplicate_rows_collapse_to_one_contestant() {
        let rows = vec![row("u"), row("u")];
        let standings = standings_at(&[], &rows, &problems(), 0);
        assert_eq!(standings.len(), 1);
    }
}
