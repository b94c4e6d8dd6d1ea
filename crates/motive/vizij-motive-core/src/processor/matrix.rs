//! Matrix processor: composes a 4x4 transform per slot from an ordered list
//! of elementary operations.
//!
//! Each operation's value is either a constant held in the slot or the
//! current value of a child scalar handle. The child handles are owned by the
//! slot, so releasing the slot releases them.

use std::rc::Rc;

use nalgebra::{Matrix4, Vector3};

use crate::config::Config;
use crate::error::MotiveError;
use crate::ids::{ChildIndex, MotiveTime, MotivatorKind, SlotBinding, SlotIndex};
use crate::init::MatrixOpKind;
use crate::motivator::Motivator1f;
use crate::slots::SlotStore;
use crate::spline::SplinePlayback;
use crate::target::MotiveTarget1f;

use super::{MotiveProcessor, ProcessorMatrix4f};

/// Value source of one operation.
#[derive(Debug)]
pub enum OpValue {
    Constant(f32),
    Driven(Motivator1f),
}

impl OpValue {
    fn current(&self) -> f32 {
        match self {
            Self::Constant(v) => *v,
            Self::Driven(m) => m.value(),
        }
    }
}

#[derive(Debug)]
pub struct MatrixOperation {
    pub kind: MatrixOpKind,
    pub value: OpValue,
}

impl MatrixOperation {
    pub fn constant(kind: MatrixOpKind, value: f32) -> Self {
        Self {
            kind,
            value: OpValue::Constant(value),
        }
    }

    pub fn driven(kind: MatrixOpKind, child: Motivator1f) -> Self {
        Self {
            kind,
            value: OpValue::Driven(child),
        }
    }

    pub fn current(&self) -> f32 {
        self.value.current()
    }
}

#[derive(Debug)]
struct MatrixSlot {
    ops: Vec<MatrixOperation>,
    matrix: Matrix4<f32>,
}

impl MatrixSlot {
    fn new(ops: Vec<MatrixOperation>) -> Self {
        let mut slot = Self {
            ops,
            matrix: Matrix4::identity(),
        };
        slot.recompose();
        slot
    }

    /// Identity, right-multiplied by each operation in list order.
    fn recompose(&mut self) {
        self.matrix = self
            .ops
            .iter()
            .fold(Matrix4::identity(), |acc, op| acc * op.kind.matrix(op.current()));
    }

    fn op(&self, child: ChildIndex) -> &MatrixOperation {
        match self.ops.get(child) {
            Some(op) => op,
            None => out_of_range(child, self.ops.len()),
        }
    }

    fn op_mut(&mut self, child: ChildIndex) -> &mut MatrixOperation {
        let count = self.ops.len();
        match self.ops.get_mut(child) {
            Some(op) => op,
            None => out_of_range(child, count),
        }
    }

    fn driven_mut(&mut self, child: ChildIndex) -> &mut Motivator1f {
        match &mut self.op_mut(child).value {
            OpValue::Driven(m) => m,
            OpValue::Constant(_) => mode_mismatch(child, "driven"),
        }
    }

    fn constant_mut(&mut self, child: ChildIndex) -> &mut f32 {
        match &mut self.op_mut(child).value {
            OpValue::Constant(v) => v,
            OpValue::Driven(_) => mode_mismatch(child, "constant"),
        }
    }

    fn check_triple(&self, child: ChildIndex) {
        let count = self.ops.len();
        if child.checked_add(3).map_or(true, |end| end > count) {
            out_of_range(child.saturating_add(2), count);
        }
    }
}

#[cold]
fn out_of_range(child: ChildIndex, count: usize) -> ! {
    panic!("{}", MotiveError::ChildOutOfRange { child, count })
}

#[cold]
fn mode_mismatch(child: ChildIndex, expected: &'static str) -> ! {
    panic!("{}", MotiveError::ChildModeMismatch { child, expected })
}

#[derive(Debug)]
pub struct MatrixProcessor {
    slots: SlotStore<MatrixSlot>,
    defragment_on_advance: bool,
}

impl MatrixProcessor {
    pub fn new(cfg: &Config) -> Self {
        Self {
            slots: SlotStore::with_capacity(cfg.initial_slot_capacity),
            defragment_on_advance: cfg.defragment_on_advance,
        }
    }
}

impl MotiveProcessor for MatrixProcessor {
    fn kind(&self) -> MotivatorKind {
        MotivatorKind::Matrix
    }

    /// Children were advanced by their own processors earlier in the frame;
    /// this only recomposes.
    fn advance_frame(&mut self, _dt: MotiveTime) {
        if self.defragment_on_advance && self.slots.has_holes() {
            self.defragment();
        }
        for (_, slot) in self.slots.iter_mut() {
            slot.recompose();
        }
    }

    fn release_slot(&mut self, index: SlotIndex) {
        // Dropping the slot drops its child handles, which frees their scalar slots.
        self.slots.release(index);
    }

    fn transfer_binding(&mut self, index: SlotIndex, binding: &Rc<SlotBinding>) {
        let transferred = self.slots.transfer(index, binding);
        debug_assert!(transferred, "transfer from unallocated {index}");
    }

    fn is_owner(&self, index: SlotIndex, binding: &Rc<SlotBinding>) -> bool {
        self.slots.is_owner(index, binding)
    }

    fn defragment(&mut self) -> usize {
        let moved = self.slots.defragment();
        if moved > 0 {
            log::debug!("matrix processor relocated {moved} slots");
        }
        moved
    }

    fn live_slots(&self) -> usize {
        self.slots.live()
    }
}

impl ProcessorMatrix4f for MatrixProcessor {
    fn allocate_slot(&mut self, ops: Vec<MatrixOperation>, binding: &Rc<SlotBinding>) -> SlotIndex {
        self.slots.allocate(MatrixSlot::new(ops), binding)
    }

    fn value(&self, index: SlotIndex) -> Matrix4<f32> {
        self.slots.get(index).matrix
    }

    fn child_count(&self, index: SlotIndex) -> usize {
        self.slots.get(index).ops.len()
    }

    fn child_kind(&self, index: SlotIndex, child: ChildIndex) -> MatrixOpKind {
        self.slots.get(index).op(child).kind
    }

    fn child_value_1f(&self, index: SlotIndex, child: ChildIndex) -> f32 {
        self.slots.get(index).op(child).current()
    }

    /// Values of children `child`, `child + 1` and `child + 2`.
    fn child_value_3f(&self, index: SlotIndex, child: ChildIndex) -> Vector3<f32> {
        let slot = self.slots.get(index);
        slot.check_triple(child);
        Vector3::new(
            slot.ops[child].current(),
            slot.ops[child + 1].current(),
            slot.ops[child + 2].current(),
        )
    }

    fn set_child_target_1f(&mut self, index: SlotIndex, child: ChildIndex, target: &MotiveTarget1f) {
        let slot = self.slots.get_mut(index);
        slot.driven_mut(child).set_target(target);
        slot.recompose();
    }

    fn set_child_spline_1f(&mut self, index: SlotIndex, child: ChildIndex, playback: &SplinePlayback) {
        let slot = self.slots.get_mut(index);
        slot.driven_mut(child).set_spline(playback);
        slot.recompose();
    }

    fn set_child_value_1f(&mut self, index: SlotIndex, child: ChildIndex, value: f32) {
        let slot = self.slots.get_mut(index);
        *slot.constant_mut(child) = value;
        slot.recompose();
    }

    fn set_child_value_3f(&mut self, index: SlotIndex, child: ChildIndex, value: Vector3<f32>) {
        let slot = self.slots.get_mut(index);
        slot.check_triple(child);
        for (offset, v) in value.iter().enumerate() {
            *slot.constant_mut(child + offset) = *v;
        }
        slot.recompose();
    }
}
