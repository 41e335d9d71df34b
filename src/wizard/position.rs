use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a wizard instance currently is.
///
/// `Step` indices are 1-based. `Review` is a distinct terminal state rather
/// than an overloaded `N + 1`; `Submitting` and `Submitted` are outcomes of
/// the submission coordinator and are never valid navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Step(usize),
    Review,
    Submitting,
    Submitted,
}

impl Position {
    /// Ordinal used to decide whether a move is forward: `Step(i) = i`,
    /// `Review = step_count + 1`. `None` for the submission states.
    pub fn ordinal(self, step_count: usize) -> Option<usize> {
        match self {
            Position::Step(i) => Some(i),
            Position::Review => Some(step_count + 1),
            Position::Submitting | Position::Submitted => None,
        }
    }

    pub fn step_index(self) -> Option<usize> {
        match self {
            Position::Step(i) => Some(i),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Step(i) => write!(f, "step {}", i),
            Position::Review => write!(f, "review"),
            Position::Submitting => write!(f, "submitting"),
            Position::Submitted => write!(f, "submitted"),
        }
    }
}
