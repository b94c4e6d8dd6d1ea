//! Waypoint descriptors: what a scalar slot should do next.

use serde::{Deserialize, Serialize};

use crate::ids::MotiveTime;

/// One waypoint: reach `value` moving at `velocity`, `time` from now.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotiveNode1f {
    /// Offset from the moment the target is set. Waypoints should not go back in time;
    /// processors treat a decrease as an instant jump rather than reordering.
    pub time: MotiveTime,
    pub value: f32,
    #[serde(default)]
    pub velocity: f32,
}

impl MotiveNode1f {
    pub fn new(time: MotiveTime, value: f32, velocity: f32) -> Self {
        Self {
            time,
            value,
            velocity,
        }
    }
}

/// Current state override plus an ordered list of waypoints.
///
/// `current == None` keeps the slot's existing value and velocity. Waypoints
/// are consumed in the order given.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotiveTarget1f {
    #[serde(default)]
    pub current: Option<(f32, f32)>,
    #[serde(default)]
    pub waypoints: Vec<MotiveNode1f>,
}

impl MotiveTarget1f {
    /// Jump to `value`/`velocity` now; no waypoints.
    pub fn current(value: f32, velocity: f32) -> Self {
        Self {
            current: Some((value, velocity)),
            waypoints: Vec::new(),
        }
    }

    /// Keep the current state and head for `value`, arriving after `time`.
    pub fn target(value: f32, velocity: f32, time: MotiveTime) -> Self {
        Self {
            current: None,
            waypoints: vec![MotiveNode1f::new(time, value, velocity)],
        }
    }

    /// Jump to the current state, then head for the target.
    pub fn current_to_target(
        current_value: f32,
        current_velocity: f32,
        target_value: f32,
        target_velocity: f32,
        time: MotiveTime,
    ) -> Self {
        Self {
            current: Some((current_value, current_velocity)),
            waypoints: vec![MotiveNode1f::new(time, target_value, target_velocity)],
        }
    }

    /// Keep the current state and pass through `waypoints` in order.
    pub fn waypoints(waypoints: impl IntoIterator<Item = MotiveNode1f>) -> Self {
        Self {
            current: None,
            waypoints: waypoints.into_iter().collect(),
        }
    }

    /// Append a waypoint after the existing ones.
    pub fn then(mut self, value: f32, velocity: f32, time: MotiveTime) -> Self {
        self.waypoints.push(MotiveNode1f::new(time, value, velocity));
        self
    }

    /// The last waypoint, which is where the slot settles.
    pub fn final_node(&self) -> Option<&MotiveNode1f> {
        self.waypoints.last()
    }

    /// Time of the last waypoint (zero without waypoints).
    pub fn end_time(&self) -> MotiveTime {
        self.waypoints
            .iter()
            .fold(0.0, |acc: MotiveTime, n| acc.max(n.time))
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_keep_waypoint_order() {
        let t = MotiveTarget1f::target(1.0, 0.0, 0.5)
            .then(3.0, 0.0, 1.0)
            .then(2.0, 0.0, 2.0);
        let values: Vec<f32> = t.waypoints.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![1.0, 3.0, 2.0]);
        assert_eq!(t.final_node().map(|n| n.value), Some(2.0));
        assert_eq!(t.end_time(), 2.0);
        assert!(t.current.is_none());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let t: MotiveTarget1f =
            serde_json::from_str(r#"{ "waypoints": [ { "time": 1.0, "value": 4.0 } ] }"#).unwrap();
        assert_eq!(t.waypoints[0].velocity, 0.0);
        assert!(t.current.is_none());
        assert!(MotiveTarget1f::default().is_empty());
    }
}
