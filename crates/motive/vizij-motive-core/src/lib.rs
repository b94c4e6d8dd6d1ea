//! Vizij Motive Core (engine-agnostic)
//!
//! Drives scalar and 4x4 matrix values toward targets or along curves, one
//! batched update per kind per frame. Callers hold lightweight handles
//! ([`Motivator1f`], [`MotivatorMatrix4f`]); the data lives in per-kind
//! processors owned by a [`MotiveEngine`], which may relocate it freely.

pub mod anim_table;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod init;
pub mod interp;
pub mod motivator;
pub mod processor;
pub mod range;
pub mod slots;
pub mod spline;
pub mod target;

// Re-exports for consumers (adapters)
pub use anim_table::{
    check_anim_table_identifier, has_anim_table_identifier, parse_anim_table_json, AnimActionDef, AnimListDef, AnimTable,
    AnimTableDef, CurveHandle, CurveLoader, MapCurveLoader, ANIM_TABLE_EXTENSION,
    ANIM_TABLE_IDENTIFIER,
};
pub use config::Config;
pub use engine::MotiveEngine;
pub use error::MotiveError;
pub use ids::{ChildIndex, MotiveTime, MotivatorKind, SlotBinding, SlotIndex};
pub use init::{MatrixInit, MatrixOpKind, MatrixOperationInit, MotivatorInit, OpSource, ScalarInit};
pub use motivator::{Motivator, Motivator1f, MotivatorMatrix4f};
pub use processor::{
    MatrixProcessor, MotiveProcessor, Processor1f, ProcessorMatrix4f, ProcessorRef,
    SmoothProcessor, SpringProcessor,
};
pub use range::ModularRange;
pub use spline::{parse_spline_json, Spline1f, SplineNode, SplinePlayback};
pub use target::{MotiveNode1f, MotiveTarget1f};

/// Re-exported so callers can name matrix and vector types without a direct dependency.
pub use nalgebra::{Matrix4, Vector3};
