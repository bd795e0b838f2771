//! Linear interpolation providers keyed by value type.
//!
//! Providers compute `from * (1 - t) + to * t`, which returns exactly `from`
//! at `t = 0` and exactly `to` at `t = 1`. `t` is never clamped; values
//! outside `[0, 1]` extrapolate.
//!
//! Looking up a type with no provider does not fail. The registry falls back
//! to [`IdentityFallback`], returns `from` unchanged and reports
//! [`Diagnostic::UnsupportedInterpolation`] to its diagnostics sink. Callers
//! that depend on real blending should check
//! [`InterpolationRegistry::has_provider`] first.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{Vector2, Vector3, Vector4};

use super::AttributeValue;
use crate::diagnostics::{default_sink, Diagnostic, Diagnostics};

/// A stateless `lerp` strategy for values of type `T`.
pub trait Interpolate<T>: Send + Sync {
    /// Interpolate between `from` and `to` by `amount`.
    fn lerp(&self, from: &T, to: &T, amount: f64) -> T;
}

/// Scalar interpolation for `f64` and `f32`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarLerp;

impl Interpolate<f64> for ScalarLerp {
    #[inline]
    fn lerp(&self, from: &f64, to: &f64, amount: f64) -> f64 {
        from * (1.0 - amount) + to * amount
    }
}

impl Interpolate<f32> for ScalarLerp {
    #[inline]
    fn lerp(&self, from: &f32, to: &f32, amount: f64) -> f32 {
        let t = amount as f32;
        from * (1.0 - t) + to * t
    }
}

/// Component-wise interpolation for 2D, 3D and 4D vectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct VectorLerp;

macro_rules! impl_vector_lerp {
    ($($ty:ty),*) => {
        $(
            impl Interpolate<$ty> for VectorLerp {
                #[inline]
                fn lerp(&self, from: &$ty, to: &$ty, amount: f64) -> $ty {
                    from * (1.0 - amount) + to * amount
                }
            }
        )*
    };
}

impl_vector_lerp!(Vector2<f64>, Vector3<f64>, Vector4<f64>);

/// No-op provider: always returns `from`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityFallback;

impl<T: Clone> Interpolate<T> for IdentityFallback {
    #[inline]
    fn lerp(&self, from: &T, _to: &T, _amount: f64) -> T {
        from.clone()
    }
}

/// Registry of [`Interpolate`] providers keyed by value type.
///
/// [`InterpolationRegistry::new`] registers [`ScalarLerp`] for `f64`/`f32` and
/// [`VectorLerp`] for the three vector types.
///
/// ```
/// use meshmux::attribute::InterpolationRegistry;
///
/// let registry = InterpolationRegistry::new();
/// assert_eq!(registry.lerp(&2.0_f64, &4.0, 0.5), 3.0);
/// ```
pub struct InterpolationRegistry {
    providers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl InterpolationRegistry {
    /// Create a registry with the built-in providers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<f64, _>(ScalarLerp);
        registry.register::<f32, _>(ScalarLerp);
        registry.register::<Vector2<f64>, _>(VectorLerp);
        registry.register::<Vector3<f64>, _>(VectorLerp);
        registry.register::<Vector4<f64>, _>(VectorLerp);
        registry
    }

    /// Create a registry with no providers.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
            diagnostics: default_sink(),
        }
    }

    /// Route fallback diagnostics to `sink` instead of the log.
    pub fn with_diagnostics(mut self, sink: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Register `provider` for `T`, replacing any previous one.
    ///
    /// Returns `true` if a provider was replaced.
    pub fn register<T, P>(&mut self, provider: P) -> bool
    where
        T: 'static,
        P: Interpolate<T> + 'static,
    {
        let provider: Arc<dyn Interpolate<T>> = Arc::new(provider);
        self.providers
            .insert(TypeId::of::<T>(), Box::new(provider))
            .is_some()
    }

    /// Whether a real provider is registered for `T`.
    pub fn has_provider<T: 'static>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<T>())
    }

    fn lookup<T: 'static>(&self) -> Option<&Arc<dyn Interpolate<T>>> {
        self.providers
            .get(&TypeId::of::<T>())
            .and_then(|p| p.downcast_ref::<Arc<dyn Interpolate<T>>>())
    }

    /// Interpolate with the provider registered for `T`.
    ///
    /// Without a provider this returns `from` unchanged and reports the
    /// fallback to the diagnostics sink.
    pub fn lerp<T: Clone + 'static>(&self, from: &T, to: &T, amount: f64) -> T {
        match self.lookup::<T>() {
            Some(provider) => provider.lerp(from, to, amount),
            None => {
                self.diagnostics.report(Diagnostic::UnsupportedInterpolation {
                    type_name: type_name::<T>(),
                });
                IdentityFallback.lerp(from, to, amount)
            }
        }
    }

    /// Interpolate two dynamically typed values.
    ///
    /// Values of different sizes cannot be blended; `from` is returned and a
    /// diagnostic is reported.
    pub fn lerp_value(&self, from: &AttributeValue, to: &AttributeValue, amount: f64) -> AttributeValue {
        match (from, to) {
            (AttributeValue::Vec2(a), AttributeValue::Vec2(b)) => {
                AttributeValue::Vec2(self.lerp(a, b, amount))
            }
            (AttributeValue::Vec3(a), AttributeValue::Vec3(b)) => {
                AttributeValue::Vec3(self.lerp(a, b, amount))
            }
            (AttributeValue::Vec4(a), AttributeValue::Vec4(b)) => {
                AttributeValue::Vec4(self.lerp(a, b, amount))
            }
            _ => {
                self.diagnostics.report(Diagnostic::UnsupportedInterpolation {
                    type_name: type_name::<AttributeValue>(),
                });
                *from
            }
        }
    }
}

impl Default for InterpolationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InterpolationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpolationRegistry")
            .field("providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_scalar_midpoint() {
        let registry = InterpolationRegistry::new();
        assert_eq!(registry.lerp(&2.0_f64, &4.0, 0.5), 3.0);
        assert_eq!(registry.lerp(&2.0_f32, &4.0, 0.5), 3.0);
    }

    #[test]
    fn test_endpoints_exact() {
        let registry = InterpolationRegistry::new();
        let a = Vector3::new(0.1, -7.25, 3.3);
        let b = Vector3::new(9.0, 0.2, -1.7);

        assert_eq!(registry.lerp(&a, &b, 0.0), a);
        assert_eq!(registry.lerp(&a, &b, 1.0), b);
        assert_eq!(registry.lerp(&0.1_f64, &0.3, 0.0), 0.1);
        assert_eq!(registry.lerp(&0.1_f64, &0.3, 1.0), 0.3);
    }

    #[test]
    fn test_same_endpoints_stay_put() {
        let registry = InterpolationRegistry::new();
        let a = Vector4::new(1.0, 2.0, 3.0, 4.0);
        for t in [-2.0, 0.0, 0.25, 0.5, 1.0, 3.5] {
            let out = registry.lerp(&a, &a, t);
            assert!((out - a).norm() < EPS, "t={t}: {out:?}");
        }
        let v = Vector2::new(0.5, -0.25);
        assert_eq!(registry.lerp(&v, &v, 0.5), v);
    }

    #[test]
    fn test_no_clamping() {
        let registry = InterpolationRegistry::new();
        assert_eq!(registry.lerp(&0.0_f64, &10.0, 1.5), 15.0);
        assert_eq!(registry.lerp(&0.0_f64, &10.0, -0.5), -5.0);
    }

    #[test]
    fn test_unregistered_type_returns_from() {
        #[derive(Debug, Clone, PartialEq)]
        struct Opaque(u32);

        let sink = Arc::new(CollectingDiagnostics::new());
        let registry = InterpolationRegistry::new().with_diagnostics(sink.clone());

        assert!(!registry.has_provider::<Opaque>());
        let out = registry.lerp(&Opaque(1), &Opaque(9), 0.5);
        assert_eq!(out, Opaque(1));

        let events = sink.take();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Diagnostic::UnsupportedInterpolation { type_name } if type_name.contains("Opaque")
        ));
    }

    #[test]
    fn test_registered_lerp_reports_nothing() {
        let sink = Arc::new(CollectingDiagnostics::new());
        let registry = InterpolationRegistry::new().with_diagnostics(sink.clone());
        registry.lerp(&Vector3::zeros(), &Vector3::new(1.0, 1.0, 1.0), 0.5);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_custom_provider_replaces() {
        struct Step;
        impl Interpolate<f64> for Step {
            fn lerp(&self, from: &f64, to: &f64, amount: f64) -> f64 {
                if amount < 0.5 {
                    *from
                } else {
                    *to
                }
            }
        }

        let mut registry = InterpolationRegistry::new();
        assert!(registry.register::<f64, _>(Step));
        assert_eq!(registry.lerp(&1.0_f64, &2.0, 0.4), 1.0);
        assert_eq!(registry.lerp(&1.0_f64, &2.0, 0.6), 2.0);
    }

    #[test]
    fn test_lerp_value_mismatched_sizes() {
        let sink = Arc::new(CollectingDiagnostics::new());
        let registry = InterpolationRegistry::new().with_diagnostics(sink.clone());
        let a = AttributeValue::Vec2(Vector2::new(1.0, 2.0));
        let b = AttributeValue::Vec3(Vector3::new(1.0, 2.0, 3.0));

        assert_eq!(registry.lerp_value(&a, &b, 0.5), a);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_lerp_value_midpoint() {
        let registry = InterpolationRegistry::new();
        let a = AttributeValue::Vec2(Vector2::new(0.0, 0.0));
        let b = AttributeValue::Vec2(Vector2::new(2.0, 4.0));
        assert_eq!(
            registry.lerp_value(&a, &b, 0.5),
            AttributeValue::Vec2(Vector2::new(1.0, 2.0))
        );
    }
}
