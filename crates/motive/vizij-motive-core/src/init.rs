//! Initializer descriptors: which processor a handle binds to and how its slot starts.

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::ids::MotivatorKind;
use crate::range::ModularRange;
use crate::target::MotiveTarget1f;

/// Per-slot settings shared by every scalar kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarInit {
    /// Wrap-around value space; `None` for ordinary linear values.
    #[serde(default)]
    pub range: Option<ModularRange>,
}

impl ScalarInit {
    pub fn modular(range: ModularRange) -> Self {
        Self { range: Some(range) }
    }
}

/// Declares a handle's kind and the kind-specific setup of its slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "init", rename_all = "snake_case")]
pub enum MotivatorInit {
    Smooth(ScalarInit),
    Spring(ScalarInit),
    Matrix(MatrixInit),
}

impl MotivatorInit {
    pub fn smooth() -> Self {
        Self::Smooth(ScalarInit::default())
    }

    pub fn spring() -> Self {
        Self::Spring(ScalarInit::default())
    }

    pub fn kind(&self) -> MotivatorKind {
        match self {
            Self::Smooth(_) => MotivatorKind::Smooth,
            Self::Spring(_) => MotivatorKind::Spring,
            Self::Matrix(_) => MotivatorKind::Matrix,
        }
    }

    /// Scalar settings, or `None` for matrix descriptors.
    pub fn scalar(&self) -> Option<&ScalarInit> {
        match self {
            Self::Smooth(s) | Self::Spring(s) => Some(s),
            Self::Matrix(_) => None,
        }
    }
}

/// One elementary transform. Rotations are in radians.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixOpKind {
    RotateAboutX,
    RotateAboutY,
    RotateAboutZ,
    TranslateX,
    TranslateY,
    TranslateZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    ScaleUniformly,
}

impl MatrixOpKind {
    /// Value that leaves the transform unchanged.
    pub fn identity_value(self) -> f32 {
        match self {
            Self::ScaleX | Self::ScaleY | Self::ScaleZ | Self::ScaleUniformly => 1.0,
            _ => 0.0,
        }
    }

    /// Homogeneous 4x4 matrix for this operation at `value`.
    pub fn matrix(self, value: f32) -> Matrix4<f32> {
        match self {
            Self::RotateAboutX => Matrix4::from_axis_angle(&Vector3::x_axis(), value),
            Self::RotateAboutY => Matrix4::from_axis_angle(&Vector3::y_axis(), value),
            Self::RotateAboutZ => Matrix4::from_axis_angle(&Vector3::z_axis(), value),
            Self::TranslateX => Matrix4::new_translation(&Vector3::new(value, 0.0, 0.0)),
            Self::TranslateY => Matrix4::new_translation(&Vector3::new(0.0, value, 0.0)),
            Self::TranslateZ => Matrix4::new_translation(&Vector3::new(0.0, 0.0, value)),
            Self::ScaleX => Matrix4::new_nonuniform_scaling(&Vector3::new(value, 1.0, 1.0)),
            Self::ScaleY => Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, value, 1.0)),
            Self::ScaleZ => Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 1.0, value)),
            Self::ScaleUniformly => Matrix4::new_nonuniform_scaling(&Vector3::repeat(value)),
        }
    }
}

/// Where an operation's value comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpSource {
    /// Fixed value, changeable with `set_child_value_1f`.
    Constant(f32),
    /// Driven by a child scalar slot of kind `init`, optionally started on `target`.
    Driven {
        init: MotivatorInit,
        #[serde(default)]
        target: Option<MotiveTarget1f>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixOperationInit {
    pub kind: MatrixOpKind,
    pub source: OpSource,
}

impl MatrixOperationInit {
    pub fn constant(kind: MatrixOpKind, value: f32) -> Self {
        Self {
            kind,
            source: OpSource::Constant(value),
        }
    }

    pub fn driven(kind: MatrixOpKind, init: MotivatorInit, target: Option<MotiveTarget1f>) -> Self {
        Self {
            kind,
            source: OpSource::Driven { init, target },
        }
    }

    pub fn is_driven(&self) -> bool {
        matches!(self.source, OpSource::Driven { .. })
    }
}

/// Ordered operation list; order defines multiplication order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixInit {
    pub ops: Vec<MatrixOperationInit>,
}

impl MatrixInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(mut self, kind: MatrixOpKind, value: f32) -> Self {
        self.ops.push(MatrixOperationInit::constant(kind, value));
        self
    }

    pub fn driven(
        mut self,
        kind: MatrixOpKind,
        init: MotivatorInit,
        target: Option<MotiveTarget1f>,
    ) -> Self {
        self.ops
            .push(MatrixOperationInit::driven(kind, init, target));
        self
    }

    /// Number of operations backed by a child scalar slot.
    pub fn driven_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_driven()).count()
    }
}

impl From<MatrixInit> for MotivatorInit {
    fn from(init: MatrixInit) -> Self {
        Self::Matrix(init)
    }
}
