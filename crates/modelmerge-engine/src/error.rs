//! Error types for comparison sessions

use modelmerge_core::{ComparisonKey, ModelError, ResolutionKind};
use std::fmt;

use crate::session::SessionState;

/// Result type for engine operations.
pub type CompareResult<T> = Result<T, CompareError>;

/// Which side of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Errors raised by the matcher, merge builder and session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    /// Validation or dangling-reference failure from the model layer
    #[error(transparent)]
    Model(#[from] ModelError),

    /// `start` was given two snapshots with the same id
    #[error("cannot compare model '{0}' with itself")]
    IdenticalModel(String),

    /// Export attempted while decisions are pending
    #[error("{} unresolved conflict(s) block export: {}", .keys.len(), join_keys(.keys))]
    UnresolvedConflicts { keys: Vec<ComparisonKey> },

    /// Operation not valid in the session's current state
    #[error("'{operation}' requires a {expected} session, but the session is {actual}")]
    InvalidState {
        operation: &'static str,
        expected: SessionState,
        actual: SessionState,
    },

    /// No result with this key
    #[error("no comparison result named '{0}'")]
    UnknownResult(ComparisonKey),

    /// take-left on a `new` object or take-right on a `removed` one
    #[error("cannot {decision} '{key}': it does not exist in the {side} model")]
    MissingSide {
        key: ComparisonKey,
        decision: ResolutionKind,
        side: Side,
    },
}

fn join_keys(keys: &[ComparisonKey]) -> String {
    keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
}
