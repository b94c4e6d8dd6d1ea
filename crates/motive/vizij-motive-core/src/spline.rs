//! Curve data for spline-following slots.
//!
//! Model:
//! - A [`Spline1f`] is an ordered list of Hermite nodes `(x, y, derivative)`.
//!   `x` is time, `derivative` is dy/dx at the node.
//! - Between nodes the curve is a cubic Hermite segment; outside it clamps.
//! - A [`SplinePlayback`] describes how a slot should play a shared curve.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::MotiveError;
use crate::ids::MotiveTime;
use crate::interp::{ease_in_out_with_derivative, hermite, lerp_f32};
use crate::range::{self, ModularRange};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplineNode {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub derivative: f32,
}

impl SplineNode {
    pub fn new(x: f32, y: f32, derivative: f32) -> Self {
        Self { x, y, derivative }
    }
}

/// Piecewise cubic Hermite curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spline1f {
    nodes: Vec<SplineNode>,
}

impl Spline1f {
    /// Build a curve, rejecting empty, non-finite or out-of-order nodes.
    pub fn new(nodes: Vec<SplineNode>) -> Result<Self, MotiveError> {
        let spline = Self { nodes };
        spline.validate()?;
        Ok(spline)
    }

    /// Build from nodes already known to be sorted and finite.
    pub(crate) fn from_sorted(nodes: Vec<SplineNode>) -> Self {
        debug_assert!(!nodes.is_empty());
        Self { nodes }
    }

    /// Check basic invariants (at least one node, finite, non-decreasing x).
    pub fn validate(&self) -> Result<(), MotiveError> {
        if self.nodes.is_empty() {
            return Err(MotiveError::InvalidSpline {
                reason: "spline needs at least one node".into(),
            });
        }
        let mut last = f32::NEG_INFINITY;
        for (i, n) in self.nodes.iter().enumerate() {
            if !(n.x.is_finite() && n.y.is_finite() && n.derivative.is_finite()) {
                return Err(MotiveError::InvalidSpline {
                    reason: format!("node {i} is not finite"),
                });
            }
            if n.x < last {
                return Err(MotiveError::InvalidSpline {
                    reason: format!("node {i} goes back in time ({} < {last})", n.x),
                });
            }
            last = n.x;
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[SplineNode] {
        &self.nodes
    }

    #[inline]
    pub fn start_x(&self) -> f32 {
        self.nodes[0].x
    }

    #[inline]
    pub fn end_x(&self) -> f32 {
        self.nodes[self.nodes.len() - 1].x
    }

    #[inline]
    pub fn end_y(&self) -> f32 {
        self.nodes[self.nodes.len() - 1].y
    }

    #[inline]
    pub fn end_derivative(&self) -> f32 {
        self.nodes[self.nodes.len() - 1].derivative
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.end_x() - self.start_x()
    }

    /// Value and slope at `x`, clamped to the curve's domain.
    pub fn sample(&self, x: f32) -> (f32, f32) {
        let n = self.nodes.len();
        let idx = self.nodes.partition_point(|node| node.x <= x);
        if idx == 0 {
            let first = &self.nodes[0];
            return (first.y, first.derivative);
        }
        if idx == n {
            let last = &self.nodes[n - 1];
            return (last.y, last.derivative);
        }
        let a = &self.nodes[idx - 1];
        let b = &self.nodes[idx];
        let width = b.x - a.x;
        let t = (x - a.x) / width;
        hermite(a.y, a.derivative, b.y, b.derivative, t, width)
    }
}

/// Parse a curve asset from JSON (`{ "nodes": [ { "x", "y", "derivative" } ] }`).
pub fn parse_spline_json(s: &str) -> Result<Spline1f, MotiveError> {
    let spline: Spline1f = serde_json::from_str(s)?;
    spline.validate()?;
    Ok(spline)
}

/// How a slot should play a shared curve.
#[derive(Clone, Debug, PartialEq)]
pub struct SplinePlayback {
    pub spline: Arc<Spline1f>,
    /// Curve x at which playback starts.
    pub start_time: MotiveTime,
    /// Curve time advanced per unit of frame time. Negative plays backwards.
    pub playback_rate: f32,
    /// Wrap to the start after reaching the end.
    pub repeat: bool,
    /// When positive, fade from the slot's previous value into the curve over
    /// this long. Zero jumps to the curve immediately.
    pub blend_time: MotiveTime,
}

impl SplinePlayback {
    pub fn new(spline: Arc<Spline1f>) -> Self {
        let start_time = spline.start_x();
        Self {
            spline,
            start_time,
            playback_rate: 1.0,
            repeat: false,
            blend_time: 0.0,
        }
    }

    pub fn with_start_time(mut self, start_time: MotiveTime) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_rate(mut self, playback_rate: f32) -> Self {
        self.playback_rate = playback_rate;
        self
    }

    pub fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_blend(mut self, blend_time: MotiveTime) -> Self {
        self.blend_time = blend_time.max(0.0);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
struct BlendIn {
    offset: f32,
    duration: MotiveTime,
    elapsed: MotiveTime,
}

/// Playback position of one slot along a curve.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SplineCursor {
    spline: Arc<Spline1f>,
    time: f32,
    rate: f32,
    repeat: bool,
    blend: Option<BlendIn>,
}

impl SplineCursor {
    /// Start playback; `previous` is the slot value the blend fades out of.
    pub(crate) fn new(
        playback: &SplinePlayback,
        previous: f32,
        range: Option<&ModularRange>,
    ) -> Self {
        let mut cursor = Self {
            spline: Arc::clone(&playback.spline),
            time: playback.start_time,
            rate: playback.playback_rate,
            repeat: playback.repeat,
            blend: None,
        };
        cursor.wrap_or_clamp();
        if playback.blend_time > 0.0 {
            let (start_value, _) = cursor.spline.sample(cursor.time);
            cursor.blend = Some(BlendIn {
                offset: range::difference(range, previous, start_value),
                duration: playback.blend_time,
                elapsed: 0.0,
            });
        }
        cursor
    }

    pub(crate) fn time(&self) -> f32 {
        self.time
    }

    pub(crate) fn advance(&mut self, dt: MotiveTime) {
        if dt == 0.0 {
            return;
        }
        self.time += dt * self.rate;
        self.wrap_or_clamp();
        if let Some(blend) = &mut self.blend {
            blend.elapsed += dt;
            if blend.elapsed >= blend.duration {
                self.blend = None;
            }
        }
    }

    fn wrap_or_clamp(&mut self) {
        let start = self.spline.start_x();
        let end = self.spline.end_x();
        let span = end - start;
        if self.repeat && span > 0.0 {
            self.time = (self.time - start).rem_euclid(span) + start;
            if self.time >= end {
                self.time = start;
            }
        } else {
            self.time = self.time.clamp(start, end);
        }
    }

    /// True once a non-repeating cursor has reached the end it is moving toward.
    pub(crate) fn finished(&self) -> bool {
        if self.repeat {
            return false;
        }
        if self.rate >= 0.0 {
            self.time >= self.spline.end_x()
        } else {
            self.time <= self.spline.start_x()
        }
    }

    /// Current value and velocity (in frame time).
    pub(crate) fn sample(&self) -> (f32, f32) {
        let (mut value, slope) = self.spline.sample(self.time);
        let mut velocity = if self.finished() {
            0.0
        } else {
            slope * self.rate
        };
        if let Some(blend) = &self.blend {
            let u = blend.elapsed / blend.duration;
            let (eased, d_eased) = ease_in_out_with_derivative(u);
            value = lerp_f32(value + blend.offset, value, eased);
            velocity -= blend.offset * d_eased / blend.duration;
        }
        (value, velocity)
    }

    /// Frame time until the end is reached (zero when repeating or finished).
    pub(crate) fn remaining(&self) -> MotiveTime {
        if self.repeat || self.rate == 0.0 {
            return 0.0;
        }
        let remaining = if self.rate > 0.0 {
            (self.spline.end_x() - self.time) / self.rate
        } else {
            (self.time - self.spline.start_x()) / -self.rate
        };
        remaining.max(0.0)
    }

    /// Value and slope the cursor is heading for.
    pub(crate) fn target(&self) -> (f32, f32) {
        if self.rate >= 0.0 {
            (self.spline.end_y(), self.spline.end_derivative() * self.rate)
        } else {
            let first = &self.spline.nodes()[0];
            (first.y, first.derivative * self.rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn ramp() -> Arc<Spline1f> {
        Arc::new(
            Spline1f::new(vec![
                SplineNode::new(0.0, 0.0, 1.0),
                SplineNode::new(2.0, 2.0, 1.0),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn rejects_out_of_order_nodes() {
        let err = Spline1f::new(vec![
            SplineNode::new(1.0, 0.0, 0.0),
            SplineNode::new(0.5, 0.0, 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, MotiveError::InvalidSpline { .. }));
        assert!(Spline1f::new(Vec::new()).is_err());
    }

    #[test]
    fn sample_clamps_outside_domain() {
        let s = ramp();
        approx(s.sample(-1.0).0, 0.0, 1e-6);
        approx(s.sample(1.0).0, 1.0, 1e-5);
        approx(s.sample(5.0).0, 2.0, 1e-6);
    }

    #[test]
    fn repeating_cursor_wraps() {
        let mut c = SplineCursor::new(&SplinePlayback::new(ramp()).repeating(true), 0.0, None);
        c.advance(2.5);
        approx(c.time(), 0.5, 1e-5);
        assert!(!c.finished());
    }

    #[test]
    fn one_shot_cursor_stops_with_zero_velocity() {
        let mut c = SplineCursor::new(&SplinePlayback::new(ramp()), 0.0, None);
        c.advance(3.0);
        assert!(c.finished());
        let (v, vel) = c.sample();
        approx(v, 2.0, 1e-6);
        approx(vel, 0.0, 0.0);
        approx(c.remaining(), 0.0, 0.0);
    }

    #[test]
    fn blend_starts_at_previous_value() {
        let c = SplineCursor::new(&SplinePlayback::new(ramp()).with_blend(0.5), 7.0, None);
        approx(c.sample().0, 7.0, 1e-5);
        let mut c = c;
        c.advance(0.5);
        approx(c.sample().0, 0.5, 1e-5);
    }

    #[test]
    fn parses_json_curve() {
        let s = parse_spline_json(
            r#"{ "nodes": [ { "x": 0.0, "y": 1.0 }, { "x": 1.0, "y": 3.0, "derivative": 0.5 } ] }"#,
        )
        .unwrap();
        approx(s.end_y(), 3.0, 0.0);
        approx(s.nodes()[0].derivative, 0.0, 0.0);
        assert!(parse_spline_json(r#"{ "nodes": [] }"#).is_err());
    }
}
