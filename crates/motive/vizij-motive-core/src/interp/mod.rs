//! Interpolation helpers shared by curves and processors.
//!
//! Hermite segments back [`Spline1f`](crate::spline::Spline1f) sampling; the
//! cubic-bezier ease shapes the fade used when a curve blends in.

pub mod functions;

pub use functions::{ease_in_out, ease_in_out_with_derivative, hermite, lerp_f32};
