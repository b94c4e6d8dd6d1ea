//! Handles: the user-facing side of a processor slot.
//!
//! A handle owns nothing but a [`SlotBinding`]; every accessor forwards to
//! the processor it is bound to. Handles are move-only. Moving a handle
//! moves the binding, so the slot follows without the processor noticing.
//! [`Motivator::take`] and [`Motivator::assign_from`] are the explicit forms
//! for code that needs to transfer out of a place it cannot move from.
//!
//! Accessing an unbound handle is a caller bug and panics; use
//! [`Motivator::is_valid`] or [`Motivator::check`] to test first.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use nalgebra::{Matrix4, Vector3};

use crate::engine::MotiveEngine;
use crate::error::MotiveError;
use crate::ids::{ChildIndex, MotiveTime, MotivatorKind, SlotBinding, SlotIndex};
use crate::init::{MatrixOpKind, MotivatorInit, OpSource};
use crate::processor::{MatrixOperation, MotiveProcessor, Processor1f, ProcessorMatrix4f};
use crate::spline::SplinePlayback;
use crate::target::MotiveTarget1f;

/// Handle to one slot of a processor of type `P`.
pub struct Motivator<P: ?Sized + MotiveProcessor> {
    processor: Option<Weak<RefCell<P>>>,
    binding: Option<Rc<SlotBinding>>,
}

/// Handle to a scalar slot.
pub type Motivator1f = Motivator<dyn Processor1f>;

/// Handle to a composed 4x4 matrix slot.
pub type MotivatorMatrix4f = Motivator<dyn ProcessorMatrix4f>;

impl<P: ?Sized + MotiveProcessor> Default for Motivator<P> {
    fn default() -> Self {
        Self {
            processor: None,
            binding: None,
        }
    }
}

impl<P: ?Sized + MotiveProcessor> Drop for Motivator<P> {
    fn drop(&mut self) {
        self.invalidate();
    }
}

impl<P: ?Sized + MotiveProcessor> fmt::Debug for Motivator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Motivator")
            .field("index", &self.index())
            .field("bound", &self.binding.is_some())
            .finish()
    }
}

#[cold]
fn invalid_handle() -> ! {
    panic!("{}", MotiveError::InvalidMotivator)
}

impl<P: ?Sized + MotiveProcessor> Motivator<P> {
    fn bind(&mut self, processor: &Rc<RefCell<P>>, binding: Rc<SlotBinding>) {
        self.processor = Some(Rc::downgrade(processor));
        self.binding = Some(binding);
    }

    /// Processor and index, if the processor is alive and still lists this
    /// handle as the owner of its slot.
    fn live(&self) -> Option<(Rc<RefCell<P>>, SlotIndex)> {
        let processor = self.processor.as_ref()?.upgrade()?;
        let binding = self.binding.as_ref()?;
        let index = binding.index();
        let owned = processor.borrow().is_owner(index, binding);
        owned.then_some((processor, index))
    }

    fn bound(&self) -> (Rc<RefCell<P>>, SlotIndex) {
        self.live().unwrap_or_else(|| invalid_handle())
    }

    fn read<R>(&self, f: impl FnOnce(&P, SlotIndex) -> R) -> R {
        let (processor, index) = self.bound();
        let processor = processor.borrow();
        f(&processor, index)
    }

    fn write<R>(&mut self, f: impl FnOnce(&mut P, SlotIndex) -> R) -> R {
        let (processor, index) = self.bound();
        let mut processor = processor.borrow_mut();
        f(&mut processor, index)
    }

    /// True iff bound to a live processor that confirms this handle owns its slot.
    pub fn is_valid(&self) -> bool {
        self.live().is_some()
    }

    pub fn check(&self) -> Result<(), MotiveError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MotiveError::InvalidMotivator)
        }
    }

    /// Release the bound slot, if any. Safe to call repeatedly.
    pub fn invalidate(&mut self) {
        let (Some(processor), Some(binding)) = (self.processor.take(), self.binding.take()) else {
            return;
        };
        let Some(processor) = processor.upgrade() else {
            return;
        };
        let index = binding.index();
        let borrowed = processor.try_borrow_mut();
        match borrowed {
            Ok(mut p) => {
                if p.is_owner(index, &binding) {
                    p.release_slot(index);
                }
            }
            // The slot's owner is now gone; compaction drops it.
            Err(_) => log::warn!("{index} released while its processor was in use"),
        }
    }

    /// Move the slot binding into a new handle, leaving this one invalid.
    ///
    /// Taking from an invalid handle returns an invalid handle.
    pub fn take(&mut self) -> Self {
        let mut taken = Self::default();
        if let Some((processor, index)) = self.live() {
            let fresh = Rc::new(SlotBinding::new());
            processor.borrow_mut().transfer_binding(index, &fresh);
            taken.bind(&processor, fresh);
        }
        self.processor = None;
        self.binding = None;
        taken
    }

    /// Release this handle's slot and take over `other`'s.
    pub fn assign_from(&mut self, other: &mut Self) {
        self.invalidate();
        let taken = other.take();
        *self = taken;
    }

    pub fn kind(&self) -> Option<MotivatorKind> {
        self.live().map(|(p, _)| p.borrow().kind())
    }

    /// Floats driven by the slot; zero when unbound.
    pub fn dimensions(&self) -> usize {
        self.kind().map_or(0, MotivatorKind::dimensions)
    }

    /// Current slot index, or `SlotIndex::INVALID`. Changes across relocation.
    pub fn index(&self) -> SlotIndex {
        self.binding
            .as_ref()
            .map_or(SlotIndex::INVALID, |b| b.index())
    }
}

impl Motivator1f {
    pub fn new(init: &MotivatorInit, engine: &mut MotiveEngine) -> Self {
        let mut motivator = Self::default();
        motivator.initialize(init, engine);
        motivator
    }

    /// Initialize and immediately set a target.
    pub fn with_target(init: &MotivatorInit, engine: &mut MotiveEngine, target: &MotiveTarget1f) -> Self {
        let mut motivator = Self::new(init, engine);
        if motivator.is_valid() {
            motivator.set_target(target);
        }
        motivator
    }

    /// Bind to a fresh slot of `init`'s kind, releasing any previous slot.
    /// A non-scalar kind leaves the handle invalid.
    pub fn initialize(&mut self, init: &MotivatorInit, engine: &mut MotiveEngine) {
        self.invalidate();
        let Some(processor) = engine.scalar_processor(init.kind()) else {
            log::error!(
                "{}",
                MotiveError::KindMismatch {
                    kind: init.kind(),
                    expected: "scalar"
                }
            );
            return;
        };
        let binding = Rc::new(SlotBinding::new());
        processor.borrow_mut().allocate_slot(init, &binding);
        self.bind(&processor, binding);
    }

    pub fn value(&self) -> f32 {
        self.read(|p, i| p.value(i))
    }

    pub fn velocity(&self) -> f32 {
        self.read(|p, i| p.velocity(i))
    }

    pub fn target_value(&self) -> f32 {
        self.read(|p, i| p.target_value(i))
    }

    pub fn target_velocity(&self) -> f32 {
        self.read(|p, i| p.target_velocity(i))
    }

    /// `target_value - value`, along the shortest path for modular slots.
    pub fn difference(&self) -> f32 {
        self.read(|p, i| p.difference(i))
    }

    pub fn target_time(&self) -> MotiveTime {
        self.read(|p, i| p.target_time(i))
    }

    pub fn set_target(&mut self, target: &MotiveTarget1f) {
        self.write(|p, i| p.set_target(i, target));
    }

    pub fn set_spline(&mut self, playback: &SplinePlayback) {
        self.write(|p, i| p.set_spline(i, playback));
    }
}

impl MotivatorMatrix4f {
    pub fn new(init: &MotivatorInit, engine: &mut MotiveEngine) -> Self {
        let mut motivator = Self::default();
        motivator.initialize(init, engine);
        motivator
    }

    /// Bind to a fresh matrix slot, creating a child scalar handle for every
    /// driven operation. Each child starts at its operation's identity value
    /// and then takes the operation's target, if any.
    ///
    /// A non-matrix init, or a driven child of non-scalar kind, leaves the
    /// handle invalid.
    pub fn initialize(&mut self, init: &MotivatorInit, engine: &mut MotiveEngine) {
        self.invalidate();
        let MotivatorInit::Matrix(matrix) = init else {
            log::error!(
                "{}",
                MotiveError::KindMismatch {
                    kind: init.kind(),
                    expected: "matrix"
                }
            );
            return;
        };
        let bad_child = matrix.ops.iter().find_map(|op| match &op.source {
            OpSource::Driven { init, .. } if !init.kind().is_scalar() => Some(init.kind()),
            _ => None,
        });
        if let Some(kind) = bad_child {
            log::error!(
                "{}",
                MotiveError::KindMismatch {
                    kind,
                    expected: "matrix child"
                }
            );
            return;
        }
        let Some(processor) = engine.matrix_processor(init.kind()) else {
            return;
        };

        // Children come first: the matrix processor must not be borrowed
        // while scalar processors are being allocated from.
        let ops: Vec<MatrixOperation> = matrix
            .ops
            .iter()
            .map(|op| match &op.source {
                OpSource::Constant(value) => MatrixOperation::constant(op.kind, *value),
                OpSource::Driven { init, target } => {
                    let start = MotiveTarget1f::current(op.kind.identity_value(), 0.0);
                    let mut child = Motivator1f::with_target(init, engine, &start);
                    if let Some(target) = target {
                        child.set_target(target);
                    }
                    MatrixOperation::driven(op.kind, child)
                }
            })
            .collect();

        let binding = Rc::new(SlotBinding::new());
        processor.borrow_mut().allocate_slot(ops, &binding);
        self.bind(&processor, binding);
    }

    pub fn value(&self) -> Matrix4<f32> {
        self.read(|p, i| p.value(i))
    }

    /// Translation column of the composed matrix.
    pub fn position(&self) -> Vector3<f32> {
        let m = self.value();
        Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
    }

    pub fn child_count(&self) -> usize {
        self.read(|p, i| p.child_count(i))
    }

    pub fn child_kind(&self, child: ChildIndex) -> MatrixOpKind {
        self.read(|p, i| p.child_kind(i, child))
    }

    pub fn child_value_1f(&self, child: ChildIndex) -> f32 {
        self.read(|p, i| p.child_value_1f(i, child))
    }

    pub fn child_value_3f(&self, child: ChildIndex) -> Vector3<f32> {
        self.read(|p, i| p.child_value_3f(i, child))
    }

    /// Retarget a driven child. Panics if `child` is constant.
    pub fn set_child_target_1f(&mut self, child: ChildIndex, target: &MotiveTarget1f) {
        self.write(|p, i| p.set_child_target_1f(i, child, target));
    }

    /// Start a driven child on a curve. Panics if `child` is constant.
    pub fn set_child_spline_1f(&mut self, child: ChildIndex, playback: &SplinePlayback) {
        self.write(|p, i| p.set_child_spline_1f(i, child, playback));
    }

    /// Set a constant child. Panics if `child` is driven.
    pub fn set_child_value_1f(&mut self, child: ChildIndex, value: f32) {
        self.write(|p, i| p.set_child_value_1f(i, child, value));
    }

    /// Set constant children `child..child + 3`.
    pub fn set_child_value_3f(&mut self, child: ChildIndex, value: Vector3<f32>) {
        self.write(|p, i| p.set_child_value_3f(i, child, value));
    }
}
