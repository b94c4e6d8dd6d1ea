//! Processors: the per-kind owners and batch updaters of slot data.
//!
//! Every processor manages its slots through the same index contract
//! ([`MotiveProcessor`]); the dimension-specific traits add the typed
//! accessors that handles forward to.

pub mod matrix;
pub mod scalar;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use nalgebra::{Matrix4, Vector3};

use crate::config::Config;
use crate::ids::{ChildIndex, MotiveTime, MotivatorKind, SlotBinding, SlotIndex};
use crate::init::{MatrixOpKind, MotivatorInit};
use crate::spline::SplinePlayback;
use crate::target::MotiveTarget1f;

pub use matrix::{MatrixOperation, MatrixProcessor, OpValue};
pub use scalar::{HermiteLaw, ScalarProcessor, SeekLaw, SmoothProcessor, SpringLaw, SpringProcessor};

/// Index-management contract shared by every kind.
pub trait MotiveProcessor: fmt::Debug {
    fn kind(&self) -> MotivatorKind;

    /// Floats driven per slot.
    fn dimensions(&self) -> usize {
        self.kind().dimensions()
    }

    /// Step every allocated slot by `dt`. `dt == 0` must leave slots unchanged.
    fn advance_frame(&mut self, dt: MotiveTime);

    /// Free `index`. Other live indices stay valid until the next `defragment`.
    fn release_slot(&mut self, index: SlotIndex);

    /// Make `binding` the owner of `index` without touching slot data.
    fn transfer_binding(&mut self, index: SlotIndex, binding: &Rc<SlotBinding>);

    /// True iff `index` is allocated and owned by `binding`.
    fn is_owner(&self, index: SlotIndex, binding: &Rc<SlotBinding>) -> bool;

    /// Compact storage, repointing owners of relocated slots. Returns moves made.
    fn defragment(&mut self) -> usize;

    fn live_slots(&self) -> usize;
}

/// Scalar processors: one float per slot.
pub trait Processor1f: MotiveProcessor {
    fn allocate_slot(&mut self, init: &MotivatorInit, binding: &Rc<SlotBinding>) -> SlotIndex;

    fn value(&self, index: SlotIndex) -> f32;
    fn velocity(&self, index: SlotIndex) -> f32;
    fn target_value(&self, index: SlotIndex) -> f32;
    fn target_velocity(&self, index: SlotIndex) -> f32;
    /// `target_value - value`, along the shortest path for modular slots.
    fn difference(&self, index: SlotIndex) -> f32;
    /// Time left until the target is reached.
    fn target_time(&self, index: SlotIndex) -> MotiveTime;

    fn set_target(&mut self, index: SlotIndex, target: &MotiveTarget1f);
    fn set_spline(&mut self, index: SlotIndex, playback: &SplinePlayback);
}

/// Matrix processors: a 4x4 transform per slot, built from child operations.
pub trait ProcessorMatrix4f: MotiveProcessor {
    fn allocate_slot(&mut self, ops: Vec<MatrixOperation>, binding: &Rc<SlotBinding>) -> SlotIndex;

    fn value(&self, index: SlotIndex) -> Matrix4<f32>;
    fn child_count(&self, index: SlotIndex) -> usize;
    fn child_kind(&self, index: SlotIndex, child: ChildIndex) -> MatrixOpKind;
    fn child_value_1f(&self, index: SlotIndex, child: ChildIndex) -> f32;
    fn child_value_3f(&self, index: SlotIndex, child: ChildIndex) -> Vector3<f32>;

    fn set_child_target_1f(&mut self, index: SlotIndex, child: ChildIndex, target: &MotiveTarget1f);
    fn set_child_spline_1f(&mut self, index: SlotIndex, child: ChildIndex, playback: &SplinePlayback);
    fn set_child_value_1f(&mut self, index: SlotIndex, child: ChildIndex, value: f32);
    fn set_child_value_3f(&mut self, index: SlotIndex, child: ChildIndex, value: Vector3<f32>);
}

/// Shared reference to a processor of either dimension, as stored by the engine.
#[derive(Debug, Clone)]
pub enum ProcessorRef {
    Scalar(Rc<RefCell<dyn Processor1f>>),
    Matrix(Rc<RefCell<dyn ProcessorMatrix4f>>),
}

impl ProcessorRef {
    /// Construct the built-in processor for `kind`.
    pub fn create(kind: MotivatorKind, cfg: &Config) -> Self {
        match kind {
            MotivatorKind::Smooth => Self::Scalar(Rc::new(RefCell::new(SmoothProcessor::new(cfg)))),
            MotivatorKind::Spring => Self::Scalar(Rc::new(RefCell::new(SpringProcessor::new(cfg)))),
            MotivatorKind::Matrix => Self::Matrix(Rc::new(RefCell::new(MatrixProcessor::new(cfg)))),
        }
    }

    pub fn advance_frame(&self, dt: MotiveTime) {
        match self {
            Self::Scalar(p) => p.borrow_mut().advance_frame(dt),
            Self::Matrix(p) => p.borrow_mut().advance_frame(dt),
        }
    }

    pub fn defragment(&self) -> usize {
        match self {
            Self::Scalar(p) => p.borrow_mut().defragment(),
            Self::Matrix(p) => p.borrow_mut().defragment(),
        }
    }

    pub fn live_slots(&self) -> usize {
        match self {
            Self::Scalar(p) => p.borrow().live_slots(),
            Self::Matrix(p) => p.borrow().live_slots(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Rc<RefCell<dyn Processor1f>>> {
        match self {
            Self::Scalar(p) => Some(p),
            Self::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Rc<RefCell<dyn ProcessorMatrix4f>>> {
        match self {
            Self::Matrix(p) => Some(p),
            Self::Scalar(_) => None,
        }
    }
}
