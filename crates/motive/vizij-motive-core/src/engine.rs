//! Engine: one processor per kind, advanced together once per frame.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::Config;
use crate::ids::{MotiveTime, MotivatorKind};
use crate::processor::{Processor1f, ProcessorMatrix4f, ProcessorRef};

/// Owns the processors. Handles keep only weak references, so dropping the
/// engine invalidates every handle created from it.
#[derive(Debug, Default)]
pub struct MotiveEngine {
    cfg: Config,
    /// Sorted by `(priority, kind)`; scalar kinds come before the matrix kind.
    processors: Vec<(MotivatorKind, ProcessorRef)>,
}

fn order_key(kind: MotivatorKind) -> (u8, MotivatorKind) {
    (kind.priority(), kind)
}

impl MotiveEngine {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            processors: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Processor for `kind`, created on first use.
    pub fn processor(&mut self, kind: MotivatorKind) -> &ProcessorRef {
        let pos = match self
            .processors
            .binary_search_by_key(&order_key(kind), |(k, _)| order_key(*k))
        {
            Ok(pos) => pos,
            Err(pos) => {
                log::debug!("creating {kind} processor");
                self.processors
                    .insert(pos, (kind, ProcessorRef::create(kind, &self.cfg)));
                pos
            }
        };
        &self.processors[pos].1
    }

    /// Scalar processor for `kind`; `None` if `kind` is not scalar.
    pub fn scalar_processor(&mut self, kind: MotivatorKind) -> Option<Rc<RefCell<dyn Processor1f>>> {
        if !kind.is_scalar() {
            return None;
        }
        self.processor(kind).as_scalar().cloned()
    }

    /// Matrix processor for `kind`; `None` if `kind` is scalar.
    pub fn matrix_processor(
        &mut self,
        kind: MotivatorKind,
    ) -> Option<Rc<RefCell<dyn ProcessorMatrix4f>>> {
        if kind.is_scalar() {
            return None;
        }
        self.processor(kind).as_matrix().cloned()
    }

    /// Advance every processor by `dt`.
    ///
    /// Negative or non-finite deltas are treated as zero. When
    /// `Config::max_delta_time` is set, larger deltas are clamped to it.
    pub fn advance_frame(&mut self, dt: MotiveTime) {
        let dt = self.sanitize_dt(dt);
        for (_, processor) in &self.processors {
            processor.advance_frame(dt);
        }
    }

    fn sanitize_dt(&self, dt: MotiveTime) -> MotiveTime {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("ignoring invalid frame delta {dt}");
            return 0.0;
        }
        match self.cfg.max_delta_time {
            Some(max) if dt > max => {
                log::warn!("clamping frame delta {dt} to {max}");
                max
            }
            _ => dt,
        }
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    pub fn has_processor(&self, kind: MotivatorKind) -> bool {
        self.processors.iter().any(|(k, _)| *k == kind)
    }

    /// Allocated slots of `kind` (zero if no processor exists yet).
    pub fn live_slots(&self, kind: MotivatorKind) -> usize {
        self.processors
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, p)| p.live_slots())
    }

    /// Compact every processor now. Returns the total number of relocated slots.
    pub fn defragment(&mut self) -> usize {
        self.processors.iter().map(|(_, p)| p.defragment()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processors_are_created_lazily_and_ordered() {
        let mut engine = MotiveEngine::default();
        assert_eq!(engine.processor_count(), 0);
        assert!(engine.matrix_processor(MotivatorKind::Matrix).is_some());
        assert!(engine.scalar_processor(MotivatorKind::Spring).is_some());
        assert!(engine.scalar_processor(MotivatorKind::Matrix).is_none());
        let kinds: Vec<_> = engine.processors.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![MotivatorKind::Spring, MotivatorKind::Matrix]);
        assert!(!engine.has_processor(MotivatorKind::Smooth));
    }

    #[test]
    fn invalid_deltas_are_sanitized() {
        let engine = MotiveEngine::new(Config {
            max_delta_time: Some(0.1),
            ..Config::default()
        });
        assert_eq!(engine.sanitize_dt(-1.0), 0.0);
        assert_eq!(engine.sanitize_dt(f32::NAN), 0.0);
        assert_eq!(engine.sanitize_dt(0.5), 0.1);
        assert_eq!(engine.sanitize_dt(0.05), 0.05);
    }
}
