//! Data types shared between the customizer library, its desktop shell and
//! model files on disk.

mod color;

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use color::{Color, ColorError};

/// Name of one independently colorable segment of the model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(String);

impl PartId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PartId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PartId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for PartId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PartId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Primitive shape used to build preview geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Cube {
        width: f64,
        height: f64,
        depth: f64,
    },
    Cylinder {
        radius: f64,
        height: f64,
    },
    Sphere {
        radius: f64,
    },
}

/// Placement of a shape; rotation is XYZ Euler angles in radians
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    pub fn at(position: [f64; 3]) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    pub fn with_rotation(mut self, rotation: [f64; 3]) -> Self {
        self.rotation = rotation;
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// One placed primitive belonging to a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub primitive: Primitive,
    #[serde(default)]
    pub transform: Transform,
}

/// A part as declared by the model: its name, starting color and geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub name: PartId,
    #[serde(default)]
    pub default_color: Color,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

/// Problems found while validating a model description
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model '{0}' declares no parts")]
    NoParts(String),
    #[error("model contains a part with an empty name")]
    EmptyPartName,
    #[error("part '{0}' is declared more than once")]
    DuplicatePart(String),
    #[error("model JSON parse error: {0}")]
    Parse(String),
}

/// The fixed set of parts a session works with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub name: String,
    pub parts: Vec<PartSpec>,
}

impl ModelDescription {
    /// Parse and validate a model from JSON.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| ModelError::Parse(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.parts.is_empty() {
            return Err(ModelError::NoParts(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for part in &self.parts {
            if part.name.as_str().trim().is_empty() {
                return Err(ModelError::EmptyPartName);
            }
            if !seen.insert(part.name.as_str()) {
                return Err(ModelError::DuplicatePart(part.name.to_string()));
            }
        }
        Ok(())
    }

    pub fn part_ids(&self) -> impl Iterator<Item = &PartId> {
        self.parts.iter().map(|p| &p.name)
    }

    /// Built-in sneaker: eight parts, all white.
    ///
    /// Shapes deliberately overlap (stripes over the upper, laces over the
    /// tongue) so pointer rays regularly cross more than one part.
    pub fn sneaker() -> Self {
        use std::f64::consts::FRAC_PI_2;

        let cube = |w: f64, h: f64, d: f64, pos: [f64; 3]| Shape {
            primitive: Primitive::Cube {
                width: w,
                height: h,
                depth: d,
            },
            transform: Transform::at(pos),
        };
        let part = |name: &str, shapes: Vec<Shape>| PartSpec {
            name: PartId::new(name),
            default_color: Color::white(),
            shapes,
        };

        Self {
            name: "sneaker".to_string(),
            parts: vec![
                part("laces", vec![cube(0.7, 0.06, 0.3, [0.15, 0.17, 0.0])]),
                part("mesh", vec![cube(1.6, 0.5, 0.72, [-0.1, -0.1, 0.0])]),
                part(
                    "caps",
                    vec![Shape {
                        primitive: Primitive::Cylinder {
                            radius: 0.34,
                            height: 0.7,
                        },
                        transform: Transform::at([0.72, -0.2, 0.0])
                            .with_rotation([FRAC_PI_2, 0.0, 0.0]),
                    }],
                ),
                part("inner", vec![cube(0.5, 0.08, 0.6, [-0.55, 0.16, 0.0])]),
                part("sole", vec![cube(2.0, 0.18, 0.8, [0.0, -0.45, 0.0])]),
                part("stripes", vec![cube(0.9, 0.12, 0.74, [0.0, -0.05, 0.0])]),
                part("band", vec![cube(0.2, 0.5, 0.76, [-0.85, -0.1, 0.0])]),
                part("patch", vec![cube(0.3, 0.25, 0.1, [-0.25, 0.28, 0.0])]),
            ],
        }
    }
}

impl Default for ModelDescription {
    fn default() -> Self {
        Self::sneaker()
    }
}
