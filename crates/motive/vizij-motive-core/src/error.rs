//! Error types for the motive core.

use thiserror::Error;

use crate::ids::{ChildIndex, MotivatorKind};

/// Everything that can go wrong in the motive core.
///
/// Handle-layer variants (`InvalidMotivator`, `ChildModeMismatch`,
/// `ChildOutOfRange`) describe contract violations; accessors panic with their
/// display text. The remaining variants are ordinary recoverable failures.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MotiveError {
    /// A value accessor or mutator was called on a handle that is not bound.
    #[error("motivator is not bound to a live processor slot")]
    InvalidMotivator,

    /// A child operation was used in the wrong constant/driven mode.
    #[error("matrix child {child} is not {expected}")]
    ChildModeMismatch {
        child: ChildIndex,
        expected: &'static str,
    },

    /// A child operation index past the end of the ops list.
    #[error("matrix child {child} out of range (matrix has {count} operations)")]
    ChildOutOfRange { child: ChildIndex, count: usize },

    /// An init descriptor of the wrong dimension was handed to a handle.
    #[error("motivator kind '{kind}' cannot back a {expected} handle")]
    KindMismatch {
        kind: MotivatorKind,
        expected: &'static str,
    },

    /// Curve data that cannot be sampled.
    #[error("invalid spline: {reason}")]
    InvalidSpline { reason: String },

    /// JSON that does not match the expected schema.
    #[error("parse error: {reason}")]
    Parse { reason: String },

    /// Serialized table without the expected leading identifier.
    #[error("missing anim table identifier")]
    MissingIdentifier,

    /// External loader could not supply a curve.
    #[error("failed to load curve '{name}': {reason}")]
    CurveLoad { name: String, reason: String },
}

impl MotiveError {
    /// True for contract violations that accessors turn into panics.
    #[inline]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidMotivator | Self::ChildModeMismatch { .. } | Self::ChildOutOfRange { .. }
        )
    }
}

impl From<serde_json::Error> for MotiveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
