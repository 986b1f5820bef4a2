//! ICPC scoring rules shared by replay, reconstruction, and simulation.

use std::cmp::Reverse;

use crate::types::Submission;

/// Minutes added per counted rejection before the accepted solve.
pub const WA_PENALTY_MINUTES: u64 = 20;

/// Penalty minutes for one solved problem.
pub fn solve_penalty(solve_time_seconds: u64, rejected_before: u32) -> u64 {
    solve_time_seconds / 60 + WA_PENALTY_MINUTES * u64::from(rejected_before)
}

/// Running state of one (contestant, problem) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ProblemState {
    pub solved: bool,
    pub time: u64,
    /// Counted rejections. Frozen once the pair is solved.
    pub rejected: u32,
}

impl ProblemState {
    /// Fold one admitted submission into the pair. First accepted solve wins.
    pub fn apply(&mut self, sub: &Submission) {
        if self.solved {
            return;
        }
        if sub.verdict.is_accepted() {
            self.solved = true;
            self.time = sub.relative_time_seconds;
        } else if sub.verdict.is_counted_rejection() && sub.passed_any_test() {
            self.rejected += 1;
        }
    }

    pub fn penalty(&self) -> u64 {
        if self.solved {
            solve_penalty(self.time, self.rejected)
        } else {
            0
        }
    }
}

/// Stable sort by solved count (desc) then penalty (asc), then hand out
/// ranks 1..=N. Ties keep input order and still get distinct ranks.
pub(crate) fn rank_in_place<T>(
    items: &mut [T],
    key: impl Fn(&T) -> (u32, u64),
    mut assign: impl FnMut(&mut T, u32),
) {
    items.sort_by_key(|item| {
        let (solved, penalty) = key(item);
        (Reverse(solved), penalty)
    });
    for (position, item) in items.iter_mut().enumerate() {
        let rank = u32::try_from(position + 1).unwrap_or(u32::MAX);
        assign(item, rank);
    }
}
