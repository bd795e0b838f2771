//! Per-vertex attributes and the registries that reshape and blend them.
//!
//! Formats disagree on how many components an attribute has: OFF can carry
//! 4D positions, glTF colors are RGB or RGBA, texcoords are 2D almost
//! everywhere. Every attribute value is therefore one of three nalgebra vector
//! types, wrapped in [`AttributeValue`], and the [`AttributeSchema`] of a mesh
//! records what each slot is supposed to hold.
//!
//! Changing a slot's dimensionality goes through the [`ConverterRegistry`];
//! blending two values goes through the [`InterpolationRegistry`].

mod convert;
mod lerp;

pub use convert::{
    AttributeConverter, ConverterRegistry, Vec2ToVec3, Vec2ToVec4, Vec3ToVec2, Vec3ToVec4,
    Vec4ToVec2, Vec4ToVec3,
};
pub use lerp::{IdentityFallback, Interpolate, InterpolationRegistry, ScalarLerp, VectorLerp};

use std::fmt;

use nalgebra::{Vector2, Vector3, Vector4};

/// Well-known slot names.
pub mod slot {
    /// Vertex position.
    pub const POSITION: &str = "position";
    /// Vertex normal.
    pub const NORMAL: &str = "normal";
    /// Vertex tangent (xyz + handedness).
    pub const TANGENT: &str = "tangent";
    /// First texture coordinate set.
    pub const UV0: &str = "uv0";
    /// Second texture coordinate set.
    pub const UV1: &str = "uv1";
    /// First vertex color set.
    pub const COLOR0: &str = "color0";

    /// Name of the `n`th texture coordinate set.
    pub fn uv(n: usize) -> String {
        format!("uv{n}")
    }
}

/// Semantic meaning of an attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Spatial position.
    Position,
    /// Surface normal.
    Normal,
    /// Texture coordinate.
    TexCoord,
    /// Vertex color.
    Color,
    /// Tangent frame.
    Tangent,
    /// Anything else.
    Custom,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttributeKind::Position => "position",
            AttributeKind::Normal => "normal",
            AttributeKind::TexCoord => "texcoord",
            AttributeKind::Color => "color",
            AttributeKind::Tangent => "tangent",
            AttributeKind::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// A single attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    /// Two components.
    Vec2(Vector2<f64>),
    /// Three components.
    Vec3(Vector3<f64>),
    /// Four components.
    Vec4(Vector4<f64>),
}

impl AttributeValue {
    /// Number of components.
    #[inline]
    pub fn components(&self) -> usize {
        match self {
            AttributeValue::Vec2(_) => 2,
            AttributeValue::Vec3(_) => 3,
            AttributeValue::Vec4(_) => 4,
        }
    }

    /// Components as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        match self {
            AttributeValue::Vec2(v) => v.as_slice(),
            AttributeValue::Vec3(v) => v.as_slice(),
            AttributeValue::Vec4(v) => v.as_slice(),
        }
    }

    /// Build a value from 2, 3 or 4 components.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [x, y] => Some(AttributeValue::Vec2(Vector2::new(x, y))),
            [x, y, z] => Some(AttributeValue::Vec3(Vector3::new(x, y, z))),
            [x, y, z, w] => Some(AttributeValue::Vec4(Vector4::new(x, y, z, w))),
            _ => None,
        }
    }
}

impl From<Vector2<f64>> for AttributeValue {
    fn from(v: Vector2<f64>) -> Self {
        AttributeValue::Vec2(v)
    }
}

impl From<Vector3<f64>> for AttributeValue {
    fn from(v: Vector3<f64>) -> Self {
        AttributeValue::Vec3(v)
    }
}

impl From<Vector4<f64>> for AttributeValue {
    fn from(v: Vector4<f64>) -> Self {
        AttributeValue::Vec4(v)
    }
}

/// Declared shape of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeSpec {
    /// Semantic meaning.
    pub kind: AttributeKind,
    /// Component count (2, 3 or 4).
    pub components: usize,
}

impl AttributeSpec {
    /// Create a slot declaration.
    pub fn new(kind: AttributeKind, components: usize) -> Self {
        Self { kind, components }
    }

    /// Whether `value` has the declared component count.
    #[inline]
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        value.components() == self.components
    }
}

/// Ordered mapping from slot name to [`AttributeSpec`].
///
/// Order is significant: [`crate::mesh::VertexRecord`] stores its values in
/// schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSchema {
    slots: Vec<(String, AttributeSpec)>,
}

impl AttributeSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert) for static schemas.
    ///
    /// Use [`try_with`](Self::try_with) or [`insert`](Self::insert) for
    /// declarations that come from input.
    ///
    /// # Panics
    /// Panics if the slot is already declared or has an unsupported
    /// component count.
    pub fn with(mut self, name: &str, kind: AttributeKind, components: usize) -> Self {
        if let Err(e) = self.insert(name, AttributeSpec::new(kind, components)) {
            panic!("invalid schema declaration: {e}");
        }
        self
    }

    /// Fallible builder-style [`insert`](Self::insert).
    pub fn try_with(
        mut self,
        name: &str,
        kind: AttributeKind,
        components: usize,
    ) -> crate::Result<Self> {
        self.insert(name, AttributeSpec::new(kind, components))?;
        Ok(self)
    }

    /// Declare a new slot at the end of the schema.
    pub fn insert(&mut self, name: &str, spec: AttributeSpec) -> crate::Result<usize> {
        if !(2..=4).contains(&spec.components) {
            return Err(crate::MeshError::invalid_param(
                "components",
                spec.components,
                "attribute slots hold 2, 3 or 4 components",
            ));
        }
        if self.index_of(name).is_some() {
            return Err(crate::MeshError::schema_mismatch(format!(
                "slot '{name}' is declared twice"
            )));
        }
        self.slots.push((name.to_string(), spec));
        Ok(self.slots.len() - 1)
    }

    /// Position of `name` in the schema.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|(n, _)| n == name)
    }

    /// Declaration of `name`.
    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub(crate) fn spec_at_mut(&mut self, index: usize) -> Option<&mut AttributeSpec> {
        self.slots.get_mut(index).map(|(_, s)| s)
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Number of declared slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot is declared.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over `(name, spec)` in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeSpec)> {
        self.slots.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Slot names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(n, _)| n.as_str())
    }
}
