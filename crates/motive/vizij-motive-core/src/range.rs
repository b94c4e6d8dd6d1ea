//! Modular value spaces (angles and other wrap-around quantities).

use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` that values wrap around in.
///
/// A scalar slot initialized with a range keeps its value normalized into the
/// interval and measures differences along the shortest path around it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModularRange {
    pub start: f32,
    pub end: f32,
}

impl ModularRange {
    pub fn new(start: f32, end: f32) -> Self {
        debug_assert!(end > start, "modular range must have positive width");
        Self { start, end }
    }

    /// `[-180, 180)`
    pub fn degrees() -> Self {
        Self::new(-180.0, 180.0)
    }

    /// `[-pi, pi)`
    pub fn radians() -> Self {
        Self::new(-std::f32::consts::PI, std::f32::consts::PI)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.end - self.start
    }

    /// Wrap `value` into `[start, end)`. Values already inside come back unchanged.
    pub fn normalize(&self, value: f32) -> f32 {
        if self.contains(value) {
            return value;
        }
        let width = self.width();
        let wrapped = (value - self.start).rem_euclid(width) + self.start;
        // rem_euclid can round up to exactly `width` for tiny negative inputs.
        if wrapped >= self.end {
            self.start
        } else {
            wrapped
        }
    }

    /// Wrap a delta into `[-width/2, width/2)`.
    pub fn wrap_delta(&self, delta: f32) -> f32 {
        let width = self.width();
        let half = 0.5 * width;
        let wrapped = (delta + half).rem_euclid(width) - half;
        if wrapped >= half {
            wrapped - width
        } else {
            wrapped
        }
    }

    /// Signed shortest-path `target - current`.
    #[inline]
    pub fn difference(&self, target: f32, current: f32) -> f32 {
        self.wrap_delta(target - current)
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.start && value < self.end
    }
}

/// `target - current`, taking the shortest path when `range` is modular.
#[inline]
pub fn difference(range: Option<&ModularRange>, target: f32, current: f32) -> f32 {
    match range {
        Some(r) => r.difference(target, current),
        None => target - current,
    }
}

/// Normalize into `range` when present.
#[inline]
pub fn normalize(range: Option<&ModularRange>, value: f32) -> f32 {
    match range {
        Some(r) => r.normalize(value),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn difference_takes_shortest_path() {
        let deg = ModularRange::degrees();
        approx(deg.difference(170.0, -170.0), -20.0, 1e-4);
        approx(deg.difference(10.0, 350.0), 20.0, 1e-4);
        approx(deg.difference(-170.0, 170.0), 20.0, 1e-4);
        approx(deg.difference(45.0, 15.0), 30.0, 1e-4);
    }

    #[test]
    fn normalize_wraps_into_half_open_interval() {
        let deg = ModularRange::degrees();
        approx(deg.normalize(350.0), -10.0, 1e-4);
        approx(deg.normalize(180.0), -180.0, 1e-4);
        approx(deg.normalize(-540.0), -180.0, 1e-4);
        approx(deg.normalize(725.0), 5.0, 1e-3);
        assert!(deg.contains(deg.normalize(-1e-9)));
    }

    #[test]
    fn free_functions_fall_back_to_plain_math() {
        approx(difference(None, 170.0, -170.0), 340.0, 1e-4);
        approx(normalize(None, 400.0), 400.0, 0.0);
        let rad = ModularRange::radians();
        approx(
            difference(Some(&rad), 3.0, -3.0),
            6.0 - std::f32::consts::TAU,
            1e-5,
        );
    }
}
