//! Session lifecycle: pure transition table, no IO.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Setup,
    Live,
    Frozen,
    Reveal,
    /// Simulated clock ran out. Reads behave as `Frozen`.
    Ended,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Live => "live",
            Self::Frozen => "frozen",
            Self::Reveal => "reveal",
            Self::Ended => "ended",
        }
    }

    /// Phases that show a standings board.
    pub fn shows_standings(self) -> bool {
        matches!(self, Self::Live | Self::Frozen | Self::Ended)
    }

    pub fn apply(self, transition: Transition) -> Result<Phase, SessionError> {
        use Transition::*;
        let next = match (self, transition) {
            (_, Reset) => Phase::Setup,
            // Starting over is allowed from anywhere; the caller resets first.
            (_, Start) => Phase::Live,
            (Phase::Live, Freeze | AutoFreeze) => Phase::Frozen,
            (Phase::Live | Phase::Frozen, Finish) => Phase::Ended,
            (Phase::Live | Phase::Frozen | Phase::Ended, Reveal) => Phase::Reveal,
            (from, t) => {
                return Err(SessionError::InvalidTransition {
                    from,
                    to: t.target(),
                });
            }
        };
        Ok(next)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Freeze,
    /// Source reported the contest over, or the simulated clock passed the freeze.
    AutoFreeze,
    Finish,
    Reveal,
    Reset,
}

impl Transition {
    pub fn target(self) -> Phase {
        match self {
            Self::Start => Phase::Live,
            Self::Freeze | Self::AutoFreeze => Phase::Frozen,
            Self::Finish => Phase::Ended,
            Self::Reveal => Phase::Reveal,
            Self::Reset => Phase::Setup,
        }
    }
}
