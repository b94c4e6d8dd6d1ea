//! Core configuration for vizij-motive-core.

use serde::{Deserialize, Serialize};

/// Configuration for processor sizing and per-frame behavior.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Capacity hint for each processor's slot storage.
    pub initial_slot_capacity: usize,

    /// Compact slot storage at the start of every `advance_frame`.
    /// When false, compaction only happens through `MotiveEngine::defragment`.
    pub defragment_on_advance: bool,

    /// Upper bound applied to a single frame's delta (e.g. after a debugger pause).
    pub max_delta_time: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_slot_capacity: 64,
            defragment_on_advance: true,
            max_delta_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "max_delta_time": 0.25 }"#).unwrap();
        assert_eq!(cfg.max_delta_time, Some(0.25));
        assert!(cfg.defragment_on_advance);
        assert_eq!(cfg.initial_slot_capacity, 64);
    }
}
