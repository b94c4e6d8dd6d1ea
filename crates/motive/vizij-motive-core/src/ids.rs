//! Identifiers shared by handles and processors.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Time unit used throughout the crate. The calling program decides the scale
/// (seconds in every test and fixture).
pub type MotiveTime = f32;

/// Index into the `ops` list a matrix motivator was initialized with.
pub type ChildIndex = usize;

/// Opaque slot index assigned by a processor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SlotIndex(pub u32);

impl SlotIndex {
    /// Sentinel held by bindings that are not attached to any slot.
    pub const INVALID: SlotIndex = SlotIndex(u32::MAX);

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            write!(f, "slot(invalid)")
        } else {
            write!(f, "slot({})", self.0)
        }
    }
}

/// The processor kinds an engine knows how to create.
///
/// The dimension of a kind decides which handle type can bind to it:
/// scalar kinds back [`Motivator1f`](crate::Motivator1f), `Matrix` backs
/// [`MotivatorMatrix4f`](crate::MotivatorMatrix4f).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum MotivatorKind {
    /// Hermite spline through the requested waypoints, or a followed curve.
    Smooth,
    /// Critically-damped spring toward each waypoint value, or a followed curve.
    Spring,
    /// 4x4 transform composed from basic operations.
    Matrix,
}

impl MotivatorKind {
    pub const ALL: [MotivatorKind; 3] = [Self::Smooth, Self::Spring, Self::Matrix];

    pub fn name(self) -> &'static str {
        match self {
            Self::Smooth => "smooth",
            Self::Spring => "spring",
            Self::Matrix => "matrix4f",
        }
    }

    /// Number of floats driven per slot.
    pub fn dimensions(self) -> usize {
        match self {
            Self::Smooth | Self::Spring => 1,
            Self::Matrix => 16,
        }
    }

    /// Lower priorities advance first. Matrix slots read their scalar children,
    /// so every scalar kind must settle before any matrix is recomposed.
    pub fn priority(self) -> u8 {
        match self {
            Self::Smooth | Self::Spring => 0,
            Self::Matrix => 1,
        }
    }

    #[inline]
    pub fn is_scalar(self) -> bool {
        self.dimensions() == 1
    }
}

impl fmt::Display for MotivatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Back-reference cell shared between a handle and the slot it owns.
///
/// The handle holds the only strong reference; the slot keeps a `Weak`. When a
/// processor relocates a slot it writes the new index here, which is all the
/// handle ever reads. Ownership checks compare the cell's address.
#[derive(Debug)]
pub struct SlotBinding {
    index: Cell<SlotIndex>,
}

impl SlotBinding {
    pub fn new() -> Self {
        Self {
            index: Cell::new(SlotIndex::INVALID),
        }
    }

    #[inline]
    pub fn index(&self) -> SlotIndex {
        self.index.get()
    }

    #[inline]
    pub(crate) fn set_index(&self, index: SlotIndex) {
        self.index.set(index);
    }
}

impl Default for SlotBinding {
    fn default() -> Self {
        Self::new()
    }
}
