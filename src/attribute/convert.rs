//! Attribute converters keyed by exact source/target type pair.
//!
//! Lookups never chain: converting 2D to 4D uses the registered `2D → 4D`
//! converter, not `2D → 3D` followed by `3D → 4D`. A missing pair is a loud
//! [`MeshError::UnsupportedConversion`].
//!
//! # Built-in converters
//!
//! | Converter | Behavior |
//! |-----------|----------|
//! | [`Vec2ToVec3`] | `(x, y) → (x, y, 0)` |
//! | [`Vec2ToVec4`] | `(x, y) → (x, y, 0, 0)` |
//! | [`Vec3ToVec4`] | `(x, y, z) → (x, y, z, 0)` |
//! | [`Vec3ToVec2`] | `(x, y, z) → (x, y)`, **lossy** |
//! | [`Vec4ToVec2`] | `(x, y, z, w) → (x, y)`, **lossy** |
//! | [`Vec4ToVec3`] | `(x, y, z, w) → (x, y, z)`, **lossy** |
//!
//! Widening always fills the new components with `0`. Narrowing truncates
//! trailing components and never rescales (no perspective divide for 4D
//! positions, no renormalization for normals).

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{Vector2, Vector3, Vector4};

use super::AttributeValue;
use crate::error::{MeshError, Result};

/// A stateless conversion from `S` to `T`.
pub trait AttributeConverter<S, T>: Send + Sync {
    /// Convert one value.
    fn convert(&self, source: &S) -> T;
}

macro_rules! converter {
    ($(#[$doc:meta])* $name:ident, $from:ty => $to:ty, |$v:ident| $body:expr) => {
        $(#[$doc])*
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl AttributeConverter<$from, $to> for $name {
            #[inline]
            fn convert(&self, $v: &$from) -> $to {
                $body
            }
        }
    };
}

converter!(
    /// Widens 2D to 3D, `z = 0`.
    Vec2ToVec3, Vector2<f64> => Vector3<f64>, |v| Vector3::new(v.x, v.y, 0.0)
);
converter!(
    /// Widens 2D to 4D, `z = w = 0`.
    Vec2ToVec4, Vector2<f64> => Vector4<f64>, |v| Vector4::new(v.x, v.y, 0.0, 0.0)
);
converter!(
    /// Widens 3D to 4D, `w = 0`.
    Vec3ToVec4, Vector3<f64> => Vector4<f64>, |v| Vector4::new(v.x, v.y, v.z, 0.0)
);
converter!(
    /// Narrows 3D to 2D by dropping `z`. Lossy.
    Vec3ToVec2, Vector3<f64> => Vector2<f64>, |v| Vector2::new(v.x, v.y)
);
converter!(
    /// Narrows 4D to 2D by dropping `z` and `w`. Lossy.
    Vec4ToVec2, Vector4<f64> => Vector2<f64>, |v| Vector2::new(v.x, v.y)
);
converter!(
    /// Narrows 4D to 3D by dropping `w`. Lossy.
    Vec4ToVec3, Vector4<f64> => Vector3<f64>, |v| Vector3::new(v.x, v.y, v.z)
);

struct FnConverter<F>(F);

impl<S, T, F> AttributeConverter<S, T> for FnConverter<F>
where
    F: Fn(&S) -> T + Send + Sync,
{
    fn convert(&self, source: &S) -> T {
        (self.0)(source)
    }
}

/// Registry of converters keyed by `(TypeId of S, TypeId of T)`.
///
/// Populate it once, then share it read-only. [`ConverterRegistry::new`]
/// comes with the six vector converters pre-registered.
///
/// ```
/// use meshmux::attribute::ConverterRegistry;
/// use nalgebra::{Vector2, Vector4};
///
/// let registry = ConverterRegistry::new();
/// let wide: Vector4<f64> = registry.convert(&Vector2::new(1.0, 2.0)).unwrap();
/// assert_eq!(wide, Vector4::new(1.0, 2.0, 0.0, 0.0));
/// ```
pub struct ConverterRegistry {
    converters: HashMap<(TypeId, TypeId), Box<dyn Any + Send + Sync>>,
}

impl ConverterRegistry {
    /// Create a registry with the built-in vector converters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.insert::<Vector2<f64>, Vector3<f64>>(Arc::new(Vec2ToVec3));
        registry.insert::<Vector2<f64>, Vector4<f64>>(Arc::new(Vec2ToVec4));
        registry.insert::<Vector3<f64>, Vector4<f64>>(Arc::new(Vec3ToVec4));
        registry.insert::<Vector3<f64>, Vector2<f64>>(Arc::new(Vec3ToVec2));
        registry.insert::<Vector4<f64>, Vector2<f64>>(Arc::new(Vec4ToVec2));
        registry.insert::<Vector4<f64>, Vector3<f64>>(Arc::new(Vec4ToVec3));
        registry
    }

    /// Create a registry with no converters at all.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    fn insert<S: 'static, T: 'static>(&mut self, converter: Arc<dyn AttributeConverter<S, T>>) {
        self.converters
            .insert((TypeId::of::<S>(), TypeId::of::<T>()), Box::new(converter));
    }

    /// Register a converter for `S → T`.
    ///
    /// Registering a second converter for the same pair is a configuration
    /// error.
    pub fn register<S, T, C>(&mut self, converter: C) -> Result<()>
    where
        S: 'static,
        T: 'static,
        C: AttributeConverter<S, T> + 'static,
    {
        if self.contains::<S, T>() {
            return Err(MeshError::DuplicateConverter {
                from: type_name::<S>(),
                to: type_name::<T>(),
            });
        }
        self.insert::<S, T>(Arc::new(converter));
        Ok(())
    }

    /// Register a closure as the converter for `S → T`.
    pub fn register_fn<S, T, F>(&mut self, f: F) -> Result<()>
    where
        S: 'static,
        T: 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.register::<S, T, _>(FnConverter(f))
    }

    /// Whether a converter for `S → T` is registered.
    pub fn contains<S: 'static, T: 'static>(&self) -> bool {
        self.converters
            .contains_key(&(TypeId::of::<S>(), TypeId::of::<T>()))
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    fn lookup<S: 'static, T: 'static>(&self) -> Option<&Arc<dyn AttributeConverter<S, T>>> {
        self.converters
            .get(&(TypeId::of::<S>(), TypeId::of::<T>()))
            .and_then(|c| c.downcast_ref::<Arc<dyn AttributeConverter<S, T>>>())
    }

    /// Convert `value` with the converter registered for exactly `S → T`.
    pub fn convert<S: 'static, T: 'static>(&self, value: &S) -> Result<T> {
        let converter = self.lookup::<S, T>().ok_or(MeshError::UnsupportedConversion {
            from: type_name::<S>(),
            to: type_name::<T>(),
        })?;
        Ok(converter.convert(value))
    }

    /// Reshape a dynamically typed value to `components` components.
    ///
    /// Values already of that size are returned as-is; everything else goes
    /// through [`convert`](Self::convert).
    pub fn convert_value(&self, value: &AttributeValue, components: usize) -> Result<AttributeValue> {
        use AttributeValue::*;

        if value.components() == components {
            return Ok(*value);
        }

        match (value, components) {
            (Vec2(v), 3) => self.convert::<_, Vector3<f64>>(v).map(Vec3),
            (Vec2(v), 4) => self.convert::<_, Vector4<f64>>(v).map(Vec4),
            (Vec3(v), 2) => self.convert::<_, Vector2<f64>>(v).map(Vec2),
            (Vec3(v), 4) => self.convert::<_, Vector4<f64>>(v).map(Vec4),
            (Vec4(v), 2) => self.convert::<_, Vector2<f64>>(v).map(Vec2),
            (Vec4(v), 3) => self.convert::<_, Vector3<f64>>(v).map(Vec3),
            (_, n) => Err(MeshError::invalid_param(
                "components",
                n,
                "attribute values hold 2, 3 or 4 components",
            )),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.converters.len())
            .finish()
    }
}
