use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub type ContestId = u64;

// ─── Problems ─────────────────────────────────────────────────────

/// Short problem identifier (`"A"`, `"B1"`, ...), unique within a contest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemIndex(String);

impl ProblemIndex {
    pub fn new(index: impl Into<String>) -> Self {
        Self(index.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProblemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProblemIndex {
    fn from(index: &str) -> Self {
        Self::new(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub index: ProblemIndex,
    pub name: String,
}

impl Problem {
    pub fn new(index: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index: ProblemIndex::new(index),
            name: name.into(),
        }
    }
}

/// Position of a problem inside a [`ProblemSet`].
///
/// Only obtainable through [`ProblemSet::slot`], so holding one proves the
/// index was known to the contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemSlot(usize);

impl ProblemSlot {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Ordered, duplicate-free problem list of one contest.
///
/// Serializes as a plain JSON array of problems.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Problem>", into = "Vec<Problem>")]
pub struct ProblemSet {
    problems: Vec<Problem>,
    slots: HashMap<ProblemIndex, usize>,
}

impl ProblemSet {
    /// Build a problem set. A repeated index keeps its first occurrence.
    pub fn new(problems: Vec<Problem>) -> Self {
        let mut kept = Vec::with_capacity(problems.len());
        let mut slots = HashMap::with_capacity(problems.len());
        for problem in problems {
            if slots.contains_key(&problem.index) {
                continue;
            }
            slots.insert(problem.index.clone(), kept.len());
            kept.push(problem);
        }
        Self {
            problems: kept,
            slots,
        }
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn as_slice(&self) -> &[Problem] {
        &self.problems
    }

    /// Resolve an index to its slot. `None` means the contest does not know it.
    pub fn slot(&self, index: &ProblemIndex) -> Option<ProblemSlot> {
        self.slots.get(index).copied().map(ProblemSlot)
    }

    pub fn get(&self, slot: ProblemSlot) -> &Problem {
        &self.problems[slot.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProblemSlot, &Problem)> {
        self.problems
            .iter()
            .enumerate()
            .map(|(i, p)| (ProblemSlot(i), p))
    }
}

impl From<Vec<Problem>> for ProblemSet {
    fn from(problems: Vec<Problem>) -> Self {
        Self::new(problems)
    }
}

impl From<ProblemSet> for Vec<Problem> {
    fn from(set: ProblemSet) -> Self {
        set.problems
    }
}

// ─── Verdicts & participants ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Ok,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    PresentationError,
    IdlenessLimitExceeded,
    Testing,
    Skipped,
    CompilationError,
    Hacked,
    Challenged,
    /// Any verdict the scoreboard has no rule for. Neither solves nor penalizes.
    #[serde(other)]
    Other,
}

impl Verdict {
    /// Rejections that cost penalty time (given a prior test passed).
    pub const COUNTED_REJECTIONS: [Self; 6] = [
        Self::WrongAnswer,
        Self::TimeLimitExceeded,
        Self::MemoryLimitExceeded,
        Self::RuntimeError,
        Self::PresentationError,
        Self::IdlenessLimitExceeded,
    ];

    /// Verdicts that never touch the standings.
    pub const IGNORED: [Self; 5] = [
        Self::Testing,
        Self::Skipped,
        Self::CompilationError,
        Self::Hacked,
        Self::Challenged,
    ];

    pub fn is_accepted(self) -> bool {
        self == Self::Ok
    }

    pub fn is_counted_rejection(self) -> bool {
        Self::COUNTED_REJECTIONS.contains(&self)
    }

    pub fn is_ignored(self) -> bool {
        Self::IGNORED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::WrongAnswer => "WRONG_ANSWER",
            Self::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Self::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::PresentationError => "PRESENTATION_ERROR",
            Self::IdlenessLimitExceeded => "IDLENESS_LIMIT_EXCEEDED",
            Self::Testing => "TESTING",
            Self::Skipped => "SKIPPED",
            Self::CompilationError => "COMPILATION_ERROR",
            Self::Hacked => "HACKED",
            Self::Challenged => "CHALLENGED",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    Contestant,
    Practice,
    Virtual,
    Manager,
    OutOfCompetition,
    /// Also what an absent participant type decodes to, so it is never admitted.
    #[default]
    #[serde(other)]
    Other,
}

// ─── Submissions ──────────────────────────────────────────────────

/// One judged submission. Immutable fact of the contest log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub submission_id: u64,
    pub handle: String,
    #[serde(default)]
    pub participant_type: ParticipantType,
    pub problem_index: ProblemIndex,
    pub verdict: Verdict,
    pub relative_time_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed_test_count: Option<u32>,
}

impl Submission {
    /// Whether the judge reported at least one passed test.
    ///
    /// A rejection on the very first test carries no penalty.
    pub fn passed_any_test(&self) -> bool {
        self.passed_test_count.unwrap_or(0) > 0
    }
}

// ─── Authoritative results ────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResult {
    pub solved: bool,
    /// Seconds into the contest of the accepted solve, 0 if unsolved.
    pub time: u64,
    pub rejected_attempts: u32,
}

/// One official row of the source's standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestantRow {
    pub handle: String,
    pub rank: u32,
    pub points: f64,
    pub penalty: u64,
    pub problem_results: BTreeMap<ProblemIndex, ProblemResult>,
}

// ─── Contest ──────────────────────────────────────────────────────

/// Contest status as reported by the source (or synthesized by the simulation).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestStatus {
    Before,
    Coding,
    Frozen,
    PendingSystemTest,
    SystemTest,
    Finished,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ContestStatus {
    /// The contest is over as far as live tracking is concerned.
    pub fn is_concluded(self) -> bool {
        matches!(
            self,
            Self::Finished | Self::SystemTest | Self::PendingSystemTest
        )
    }

    /// Status of a replayed board `seconds` into a contest that freezes at
    /// `freeze_seconds` and lasts `duration_seconds`.
    pub fn at_offset(seconds: u64, freeze_seconds: u64, duration_seconds: u64) -> Self {
        if seconds >= duration_seconds {
            Self::Finished
        } else if seconds >= freeze_seconds {
            Self::Frozen
        } else {
            Self::Coding
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestMeta {
    pub id: ContestId,
    pub name: String,
    pub duration_seconds: u64,
    #[serde(rename = "phase", default)]
    pub status: ContestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_time_seconds: Option<u64>,
}

/// Complete standings fetch: contest metadata, problems, and all official rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsData {
    pub contest: ContestMeta,
    pub problems: ProblemSet,
    pub rows: Vec<ContestantRow>,
}
