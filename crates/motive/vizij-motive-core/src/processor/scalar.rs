//! Scalar processors.
//!
//! A scalar slot is in one of three modes:
//! - idle: holds its value,
//! - seeking: moves toward waypoints under the processor's [`SeekLaw`],
//! - following: samples a shared curve at a playback time advanced every frame.
//!
//! The laws differ only in how seeking behaves; index management, spline
//! following and modular wrap-around are shared by [`ScalarProcessor`].

use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::ids::{MotiveTime, MotivatorKind, SlotBinding, SlotIndex};
use crate::init::MotivatorInit;
use crate::range::{self, ModularRange};
use crate::slots::SlotStore;
use crate::spline::{SplineCursor, SplineNode, SplinePlayback, Spline1f};
use crate::target::{MotiveNode1f, MotiveTarget1f};

use super::{MotiveProcessor, Processor1f};

/// How a scalar kind moves toward waypoints.
pub trait SeekLaw: fmt::Debug + Default + 'static {
    type State: fmt::Debug + Clone;

    const KIND: MotivatorKind;

    /// Plan a move from the current state through `target`'s waypoints.
    /// `None` means there is nothing to seek and the slot goes idle.
    fn plan(
        &self,
        value: f32,
        velocity: f32,
        target: &MotiveTarget1f,
        range: Option<&ModularRange>,
    ) -> Option<Self::State>;

    /// Advance by `dt`, writing the new (possibly unnormalized) value and velocity.
    fn step(
        &self,
        state: &mut Self::State,
        value: &mut f32,
        velocity: &mut f32,
        dt: MotiveTime,
        range: Option<&ModularRange>,
    );

    /// Value and velocity the plan settles at.
    fn target(&self, state: &Self::State) -> (f32, f32);

    /// Time until the final waypoint.
    fn remaining(&self, state: &Self::State) -> MotiveTime;
}

#[derive(Clone, Debug)]
enum Mode<S> {
    Idle,
    Seeking(S),
    Following(SplineCursor),
}

/// Per-slot scalar state.
#[derive(Clone, Debug)]
struct ScalarSlot<S> {
    value: f32,
    velocity: f32,
    range: Option<ModularRange>,
    mode: Mode<S>,
}

impl<S> ScalarSlot<S> {
    fn new(range: Option<ModularRange>) -> Self {
        let value = range.map(|r| r.normalize(0.0)).unwrap_or(0.0);
        Self {
            value,
            velocity: 0.0,
            range,
            mode: Mode::Idle,
        }
    }

    fn advance<L: SeekLaw<State = S>>(&mut self, law: &L, dt: MotiveTime) {
        if dt == 0.0 {
            return;
        }
        let range = self.range.as_ref();
        match &mut self.mode {
            Mode::Idle => self.velocity = 0.0,
            Mode::Seeking(state) => {
                law.step(state, &mut self.value, &mut self.velocity, dt, range);
            }
            Mode::Following(cursor) => {
                cursor.advance(dt);
                let (value, velocity) = cursor.sample();
                self.value = value;
                self.velocity = velocity;
            }
        }
        self.value = range::normalize(range, self.value);
    }

    fn target<L: SeekLaw<State = S>>(&self, law: &L) -> (f32, f32) {
        let (value, velocity) = match &self.mode {
            Mode::Idle => (self.value, 0.0),
            Mode::Seeking(state) => law.target(state),
            Mode::Following(cursor) => cursor.target(),
        };
        (range::normalize(self.range.as_ref(), value), velocity)
    }

    fn remaining<L: SeekLaw<State = S>>(&self, law: &L) -> MotiveTime {
        match &self.mode {
            Mode::Idle => 0.0,
            Mode::Seeking(state) => law.remaining(state),
            Mode::Following(cursor) => cursor.remaining(),
        }
    }
}

/// Scalar processor generic over its seeking law.
#[derive(Debug)]
pub struct ScalarProcessor<L: SeekLaw> {
    law: L,
    slots: SlotStore<ScalarSlot<L::State>>,
    defragment_on_advance: bool,
}

/// Hermite-spline seeker (`MotivatorKind::Smooth`).
pub type SmoothProcessor = ScalarProcessor<HermiteLaw>;

/// Critically-damped spring seeker (`MotivatorKind::Spring`).
pub type SpringProcessor = ScalarProcessor<SpringLaw>;

impl<L: SeekLaw> ScalarProcessor<L> {
    pub fn new(cfg: &Config) -> Self {
        Self {
            law: L::default(),
            slots: SlotStore::with_capacity(cfg.initial_slot_capacity),
            defragment_on_advance: cfg.defragment_on_advance,
        }
    }

    fn slot(&self, index: SlotIndex) -> &ScalarSlot<L::State> {
        self.slots.get(index)
    }

    /// True while `index` is following a curve.
    pub fn is_following(&self, index: SlotIndex) -> bool {
        matches!(self.slot(index).mode, Mode::Following(_))
    }

    /// Playback position of a following slot.
    pub fn spline_time(&self, index: SlotIndex) -> Option<f32> {
        match &self.slot(index).mode {
            Mode::Following(cursor) => Some(cursor.time()),
            _ => None,
        }
    }
}

impl<L: SeekLaw> MotiveProcessor for ScalarProcessor<L> {
    fn kind(&self) -> MotivatorKind {
        L::KIND
    }

    fn advance_frame(&mut self, dt: MotiveTime) {
        if self.defragment_on_advance && self.slots.has_holes() {
            self.defragment();
        }
        let law = &self.law;
        for (_, slot) in self.slots.iter_mut() {
            slot.advance(law, dt);
        }
    }

    fn release_slot(&mut self, index: SlotIndex) {
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
            log::debug!("{} processor relocated {moved} slots", L::KIND);
        }
        moved
    }

    fn live_slots(&self) -> usize {
        self.slots.live()
    }
}

impl<L: SeekLaw> Processor1f for ScalarProcessor<L> {
    fn allocate_slot(&mut self, init: &MotivatorInit, binding: &Rc<SlotBinding>) -> SlotIndex {
        let range = init.scalar().and_then(|s| s.range);
        self.slots.allocate(ScalarSlot::new(range), binding)
    }

    fn value(&self, index: SlotIndex) -> f32 {
        self.slot(index).value
    }

    fn velocity(&self, index: SlotIndex) -> f32 {
        self.slot(index).velocity
    }

    fn target_value(&self, index: SlotIndex) -> f32 {
        self.slot(index).target(&self.law).0
    }

    fn target_velocity(&self, index: SlotIndex) -> f32 {
        self.slot(index).target(&self.law).1
    }

    fn difference(&self, index: SlotIndex) -> f32 {
        let slot = self.slot(index);
        let (target, _) = slot.target(&self.law);
        range::difference(slot.range.as_ref(), target, slot.value)
    }

    fn target_time(&self, index: SlotIndex) -> MotiveTime {
        self.slot(index).remaining(&self.law)
    }

    fn set_target(&mut self, index: SlotIndex, target: &MotiveTarget1f) {
        let law = &self.law;
        let slot = self.slots.get_mut(index);
        let range = slot.range;
        if let Some((value, velocity)) = target.current {
            slot.value = range::normalize(range.as_ref(), value);
            slot.velocity = velocity;
        }
        slot.mode = match law.plan(slot.value, slot.velocity, target, range.as_ref()) {
            Some(state) => Mode::Seeking(state),
            None => Mode::Idle,
        };
    }

    fn set_spline(&mut self, index: SlotIndex, playback: &SplinePlayback) {
        let slot = self.slots.get_mut(index);
        let range = slot.range;
        let cursor = SplineCursor::new(playback, slot.value, range.as_ref());
        let (value, velocity) = cursor.sample();
        slot.value = range::normalize(range.as_ref(), value);
        slot.velocity = velocity;
        slot.mode = Mode::Following(cursor);
    }
}

/// Frame deltas rarely sum exactly to a waypoint time in f32; a waypoint this
/// close counts as reached.
const ARRIVAL_TOLERANCE: MotiveTime = 1e-4;

fn arrived(time: MotiveTime, waypoint_time: MotiveTime) -> bool {
    waypoint_time - time <= ARRIVAL_TOLERANCE
}

// -- Hermite law --

/// Builds a Hermite spline from the current state through every waypoint and
/// follows it. Uses waypoint time, value and velocity. Holds the last value
/// once the final waypoint time has passed.
#[derive(Clone, Copy, Debug, Default)]
pub struct HermiteLaw;

#[derive(Clone, Debug)]
pub struct HermiteState {
    spline: Spline1f,
    time: MotiveTime,
}

impl SeekLaw for HermiteLaw {
    type State = HermiteState;

    const KIND: MotivatorKind = MotivatorKind::Smooth;

    fn plan(
        &self,
        value: f32,
        velocity: f32,
        target: &MotiveTarget1f,
        range: Option<&ModularRange>,
    ) -> Option<HermiteState> {
        if target.waypoints.is_empty() {
            return None;
        }
        let mut nodes = Vec::with_capacity(target.waypoints.len() + 1);
        nodes.push(SplineNode::new(0.0, value, velocity));
        let (mut prev_x, mut prev_y) = (0.0f32, value);
        for wp in &target.waypoints {
            // Modular waypoints are unwrapped so each segment takes the short way round.
            let x = wp.time.max(prev_x);
            let y = match range {
                Some(r) => prev_y + r.difference(wp.value, prev_y),
                None => wp.value,
            };
            nodes.push(SplineNode::new(x, y, wp.velocity));
            prev_x = x;
            prev_y = y;
        }
        Some(HermiteState {
            spline: Spline1f::from_sorted(nodes),
            time: 0.0,
        })
    }

    fn step(
        &self,
        state: &mut HermiteState,
        value: &mut f32,
        velocity: &mut f32,
        dt: MotiveTime,
        _range: Option<&ModularRange>,
    ) {
        let end = state.spline.end_x();
        state.time += dt;
        if arrived(state.time, end) {
            state.time = end;
        }
        let (v, d) = state.spline.sample(state.time);
        *value = v;
        *velocity = if state.time == end { 0.0 } else { d };
    }

    fn target(&self, state: &HermiteState) -> (f32, f32) {
        (state.spline.end_y(), state.spline.end_derivative())
    }

    fn remaining(&self, state: &HermiteState) -> MotiveTime {
        (state.spline.end_x() - state.time).max(0.0)
    }
}

// -- Spring law --

/// `omega * settle_time` at which a critically-damped spring released from
/// rest is within 1% of its target.
const SETTLE_FACTOR: f32 = 6.64;

/// Critically-damped spring toward each waypoint's value in turn.
///
/// The waypoint's time offset sets the stiffness so the spring is settled
/// when that time arrives; a zero offset snaps. Waypoint velocities are
/// ignored. The spring moves on to the next waypoint once the active one's
/// time has passed.
#[derive(Clone, Copy, Debug)]
pub struct SpringLaw {
    settle_factor: f32,
}

impl Default for SpringLaw {
    fn default() -> Self {
        Self {
            settle_factor: SETTLE_FACTOR,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpringState {
    waypoints: Vec<MotiveNode1f>,
    active: usize,
    elapsed: MotiveTime,
}

impl SpringState {
    fn segment_duration(&self) -> MotiveTime {
        let start = if self.active == 0 {
            0.0
        } else {
            self.waypoints[self.active - 1].time
        };
        self.waypoints[self.active].time - start
    }
}

impl SeekLaw for SpringLaw {
    type State = SpringState;

    const KIND: MotivatorKind = MotivatorKind::Spring;

    fn plan(
        &self,
        _value: f32,
        _velocity: f32,
        target: &MotiveTarget1f,
        _range: Option<&ModularRange>,
    ) -> Option<SpringState> {
        if target.waypoints.is_empty() {
            return None;
        }
        Some(SpringState {
            waypoints: target.waypoints.clone(),
            active: 0,
            elapsed: 0.0,
        })
    }

    fn step(
        &self,
        state: &mut SpringState,
        value: &mut f32,
        velocity: &mut f32,
        dt: MotiveTime,
        range: Option<&ModularRange>,
    ) {
        let goal = state.waypoints[state.active].value;
        let duration = state.segment_duration();
        if duration <= 0.0 {
            *value = goal;
            *velocity = 0.0;
        } else {
            // Exact critically-damped solution over dt.
            let omega = self.settle_factor / duration;
            let x = range::difference(range, *value, goal);
            let decay = (-omega * dt).exp();
            let tmp = (*velocity + omega * x) * dt;
            *value = goal + (x + tmp) * decay;
            *velocity = (*velocity - omega * tmp) * decay;
        }
        state.elapsed += dt;
        let last = state.waypoints[state.waypoints.len() - 1].time;
        if arrived(state.elapsed, last) {
            state.elapsed = state.elapsed.max(last);
        }
        while state.active + 1 < state.waypoints.len()
            && arrived(state.elapsed, state.waypoints[state.active].time)
        {
            state.active += 1;
        }
    }

    fn target(&self, state: &SpringState) -> (f32, f32) {
        let last = state.waypoints[state.waypoints.len() - 1];
        (last.value, 0.0)
    }

    fn remaining(&self, state: &SpringState) -> MotiveTime {
        let last = state.waypoints[state.waypoints.len() - 1];
        (last.time - state.elapsed).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn alloc<L: SeekLaw>(p: &mut ScalarProcessor<L>, init: &MotivatorInit) -> (Rc<SlotBinding>, SlotIndex) {
        let binding = Rc::new(SlotBinding::new());
        let index = p.allocate_slot(init, &binding);
        (binding, index)
    }

    #[test]
    fn hermite_passes_through_waypoints() {
        let mut p = SmoothProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &MotivatorInit::smooth());
        p.set_target(idx, &MotiveTarget1f::target(4.0, 0.0, 1.0).then(0.0, 0.0, 3.0));
        approx(p.target_time(idx), 3.0, 1e-6);
        for _ in 0..10 {
            p.advance_frame(0.1);
        }
        approx(p.value(idx), 4.0, 1e-4);
        for _ in 0..20 {
            p.advance_frame(0.1);
        }
        approx(p.value(idx), 0.0, 1e-4);
        // Thirty f32 steps of 0.1 land just short of 3.0; that still arrives.
        approx(p.velocity(idx), 0.0, 0.0);
        approx(p.target_time(idx), 0.0, 0.0);
        approx(p.target_value(idx), 0.0, 0.0);
    }

    #[test]
    fn hermite_arrives_after_sixtieths_sum_to_waypoint_time() {
        let mut p = SmoothProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &MotivatorInit::smooth());
        p.set_target(idx, &MotiveTarget1f::target(2.0, 0.0, 1.0));
        for _ in 0..60 {
            p.advance_frame(1.0 / 60.0);
        }
        approx(p.value(idx), 2.0, 0.0);
        approx(p.velocity(idx), 0.0, 0.0);
        approx(p.target_time(idx), 0.0, 0.0);
    }

    #[test]
    fn spring_reports_arrival_when_frames_sum_to_waypoint_time() {
        let mut p = SpringProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &MotivatorInit::spring());
        p.set_target(idx, &MotiveTarget1f::target(1.0, 0.0, 3.0));
        for _ in 0..30 {
            p.advance_frame(0.1);
        }
        approx(p.target_time(idx), 0.0, 0.0);
    }

    #[test]
    fn spring_converges_and_ignores_target_velocity() {
        let mut p = SpringProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &MotivatorInit::spring());
        p.set_target(idx, &MotiveTarget1f::current_to_target(0.0, 0.0, 10.0, 5.0, 1.0));
        approx(p.target_velocity(idx), 0.0, 0.0);
        for _ in 0..90 {
            p.advance_frame(1.0 / 60.0);
        }
        approx(p.value(idx), 10.0, 0.05);
        assert!(p.value(idx) <= 10.0, "critically damped spring must not overshoot");
    }

    #[test]
    fn spring_with_zero_time_snaps() {
        let mut p = SpringProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &MotivatorInit::spring());
        p.set_target(idx, &MotiveTarget1f::target(3.0, 0.0, 0.0));
        p.advance_frame(0.01);
        approx(p.value(idx), 3.0, 0.0);
    }

    #[test]
    fn spring_visits_waypoints_in_order() {
        let mut p = SpringProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &MotivatorInit::spring());
        p.set_target(idx, &MotiveTarget1f::target(5.0, 0.0, 1.0).then(-5.0, 0.0, 2.0));
        for _ in 0..50 {
            p.advance_frame(0.02);
        }
        assert!(p.value(idx) > 4.5, "first waypoint reached: {}", p.value(idx));
        for _ in 0..100 {
            p.advance_frame(0.02);
        }
        approx(p.value(idx), -5.0, 0.2);
    }

    #[test]
    fn following_reports_playback_time_until_retargeted() {
        let spline = Spline1f::from_sorted(vec![
            SplineNode::new(0.0, 0.0, 1.0),
            SplineNode::new(2.0, 2.0, 1.0),
        ]);
        let mut p = SpringProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &MotivatorInit::spring());
        assert!(!p.is_following(idx));
        assert_eq!(p.spline_time(idx), None);

        p.set_spline(idx, &SplinePlayback::new(std::sync::Arc::new(spline)).with_start_time(0.5));
        assert!(p.is_following(idx));
        p.advance_frame(0.25);
        approx(p.spline_time(idx).unwrap_or_default(), 0.75, 1e-6);
        approx(p.value(idx), 0.75, 1e-5);

        p.set_target(idx, &MotiveTarget1f::target(0.0, 0.0, 1.0));
        assert!(!p.is_following(idx));
        assert_eq!(p.spline_time(idx), None);
    }

    #[test]
    fn modular_hermite_takes_short_way_round() {
        let init = MotivatorInit::Smooth(crate::init::ScalarInit::modular(ModularRange::degrees()));
        let mut p = SmoothProcessor::new(&Config::default());
        let (_b, idx) = alloc(&mut p, &init);
        p.set_target(idx, &MotiveTarget1f::current_to_target(170.0, 0.0, -170.0, 0.0, 1.0));
        approx(p.difference(idx), 20.0, 1e-3);
        p.advance_frame(0.5);
        // Halfway along the short path is the seam, not zero.
        assert!(p.value(idx).abs() > 170.0, "value {}", p.value(idx));
        p.advance_frame(0.5);
        approx(p.value(idx), -170.0, 1e-3);
    }
}
