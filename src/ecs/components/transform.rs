//! Transform components for ECS entities.

use glam::{DAffine2, DVec2};

/// Local-space transform. Stores position, rotation (radians), and scale separately.
///
/// For entities with a [`Parent`], the values are relative to the parent's world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: DVec2,
    pub rotation: f64,
    pub scale: DVec2,
}

impl Transform {
    /// Create an identity transform.
    pub fn identity() -> Self {
        Self {
            position: DVec2::ZERO,
            rotation: 0.0,
            scale: DVec2::ONE,
        }
    }

    /// Create a transform from a position.
    pub fn from_position(position: DVec2) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Create a transform from x/y coordinates.
    pub fn from_xy(x: f64, y: f64) -> Self {
        Self::from_position(DVec2::new(x, y))
    }

    /// Builder-style rotation setter.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder-style scale setter.
    pub fn with_scale(mut self, scale: DVec2) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to an affine transform (translation * rotation * scale).
    pub fn to_affine(&self) -> DAffine2 {
        DAffine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Decompose an affine transform into a Transform.
    ///
    /// Note: shear (non-uniform parent scale combined with child rotation) is lost.
    pub fn from_affine(affine: DAffine2) -> Self {
        let (scale, rotation, position) = affine.to_scale_angle_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// World-space transform. Updated every tick by [`transform_system`](crate::ecs::systems::transform_system).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform(pub DAffine2);

impl GlobalTransform {
    pub fn from_position(position: DVec2) -> Self {
        Self(DAffine2::from_translation(position))
    }

    /// World-space origin of the entity.
    #[inline]
    pub fn translation(&self) -> DVec2 {
        self.0.translation
    }
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self(DAffine2::IDENTITY)
    }
}

impl From<Transform> for GlobalTransform {
    fn from(transform: Transform) -> Self {
        Self(transform.to_affine())
    }
}

/// Reference to a parent entity.
///
/// The child looks up the parent's world transform but does not own it. Use
/// [`set_parent`](crate::ecs::systems::set_parent) to attach with cycle validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub hecs::Entity);

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        assert_eq!(t.position, DVec2::ZERO);
        assert_eq!(t.rotation, 0.0);
        assert_eq!(t.scale, DVec2::ONE);
        assert_eq!(t.to_affine(), DAffine2::IDENTITY);
    }

    #[test]
    fn test_from_position() {
        let t = Transform::from_xy(1.0, 2.0);
        assert_eq!(t.position, DVec2::new(1.0, 2.0));
        assert_eq!(t.rotation, 0.0);
        assert_eq!(t.scale, DVec2::ONE);
    }

    #[test]
    fn test_to_affine_rotates_then_translates() {
        let t = Transform::from_xy(10.0, 0.0).with_rotation(FRAC_PI_2);
        let p = t.to_affine().transform_point2(DVec2::new(1.0, 0.0));
        assert!((p - DVec2::new(10.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_affine_roundtrip() {
        let original = Transform {
            position: DVec2::new(1.0, 2.0),
            rotation: 0.7,
            scale: DVec2::new(2.0, 1.5),
        };
        let recovered = Transform::from_affine(original.to_affine());

        let eps = 1e-9;
        assert!((original.position - recovered.position).length() < eps);
        assert!((original.rotation - recovered.rotation).abs() < eps);
        assert!((original.scale - recovered.scale).length() < eps);
    }

    #[test]
    fn test_global_transform_default() {
        let gt = GlobalTransform::default();
        assert_eq!(gt.0, DAffine2::IDENTITY);
        assert_eq!(gt.translation(), DVec2::ZERO);
    }
}
