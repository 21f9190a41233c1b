//! Physics components for ECS entities.

use glam::DVec2;

/// Layer assigned to colliders that do not name one.
pub const DEFAULT_LAYER: &str = "default";

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RigidBodyType {
    /// Affected by gravity, velocity integration and collision correction.
    Dynamic,
    /// Immovable.
    Static,
    /// Position controlled by the host between ticks. Never corrected, but pushes dynamic bodies.
    Kinematic,
}

/// Rigid body component.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub body_type: RigidBodyType,
    /// Only consulted by [`CorrectionSplit::MassWeighted`](crate::physics::CorrectionSplit).
    pub mass: f64,
    pub velocity: DVec2,
    /// Constant acceleration added on top of gravity every tick.
    pub acceleration: DVec2,
    /// Gravity scale (default: 1.0 for dynamic bodies).
    pub gravity_scale: f64,
}

impl RigidBody {
    /// Create a new dynamic rigid body.
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            mass: 1.0,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            gravity_scale: 1.0,
        }
    }

    /// Create a new static rigid body.
    pub fn new_static() -> Self {
        Self {
            body_type: RigidBodyType::Static,
            mass: 0.0,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            gravity_scale: 0.0,
        }
    }

    /// Create a new kinematic rigid body.
    pub fn new_kinematic() -> Self {
        Self {
            body_type: RigidBodyType::Kinematic,
            ..Self::new_static()
        }
    }

    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f64) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == RigidBodyType::Dynamic
    }
}

/// Collider shape in the collider's local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    /// Axis-aligned in local space, centered on the part origin.
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
    /// Convex polygon, vertices relative to the part origin and wound consistently.
    Polygon { vertices: Vec<DVec2> },
}

impl ColliderShape {
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::Rectangle { width, height }
    }

    pub fn circle(radius: f64) -> Self {
        Self::Circle { radius }
    }

    pub fn polygon(vertices: impl Into<Vec<DVec2>>) -> Self {
        Self::Polygon {
            vertices: vertices.into(),
        }
    }
}

/// One convex piece of a collider, placed relative to the owning entity's transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderPart {
    pub shape: ColliderShape,
    pub offset: DVec2,
    pub rotation: f64,
}

impl ColliderPart {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            offset: DVec2::ZERO,
            rotation: 0.0,
        }
    }

    pub fn at(shape: ColliderShape, offset: DVec2) -> Self {
        Self {
            shape,
            offset,
            rotation: 0.0,
        }
    }
}

/// Collision detection component.
///
/// A collider owns one or more convex parts (e.g. a tilemap decomposed into rectangles). All parts
/// share the same layer settings and are reported as a single collider.
///
/// Without a [`RigidBody`] on the same entity the collider is immovable and treated as static.
/// It stays solid, so dynamic bodies are pushed out of it, unless `physics` is false.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub parts: Vec<ColliderPart>,
    /// Layer name, looked up in the [`CollisionLayerMatrix`](crate::physics::layers::CollisionLayerMatrix).
    pub layer: String,
    /// Layers this collider never interacts with, even if the matrix allows it.
    pub ignore_layers: Vec<String>,
    /// If false, generates collision events but no physics response (trigger).
    pub physics: bool,
    /// Inactive colliders are skipped entirely.
    pub active: bool,
}

impl Collider {
    /// Single-part collider on the default layer.
    pub fn new(shape: ColliderShape) -> Self {
        Self::compound(vec![ColliderPart::new(shape)])
    }

    /// Collider made of several convex parts.
    pub fn compound(parts: Vec<ColliderPart>) -> Self {
        Self {
            parts,
            layer: DEFAULT_LAYER.to_owned(),
            ignore_layers: Vec::new(),
            physics: true,
            active: true,
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn ignoring(mut self, layer: impl Into<String>) -> Self {
        self.ignore_layers.push(layer.into());
        self
    }

    /// Mark as trigger-only (events, no correction).
    pub fn trigger(mut self) -> Self {
        self.physics = false;
        self
    }

    pub fn with_part(mut self, part: ColliderPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::new(ColliderShape::Circle { radius: 0.5 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_constructors() {
        let d = RigidBody::new_dynamic();
        assert!(d.is_dynamic());
        assert_eq!(d.gravity_scale, 1.0);

        let s = RigidBody::new_static();
        assert_eq!(s.body_type, RigidBodyType::Static);
        assert_eq!(s.gravity_scale, 0.0);

        let k = RigidBody::new_kinematic().with_velocity(DVec2::X);
        assert_eq!(k.body_type, RigidBodyType::Kinematic);
        assert_eq!(k.velocity, DVec2::X);
    }

    #[test]
    fn test_collider_builders() {
        let c = Collider::new(ColliderShape::rectangle(2.0, 1.0))
            .with_layer("player")
            .ignoring("pickup")
            .trigger()
            .with_part(ColliderPart::at(ColliderShape::circle(1.0), DVec2::Y));

        assert_eq!(c.layer, "player");
        assert_eq!(c.ignore_layers, vec!["pickup".to_owned()]);
        assert!(!c.physics);
        assert!(c.active);
        assert_eq!(c.parts.len(), 2);
        assert_eq!(c.parts[1].offset, DVec2::Y);
    }

    #[test]
    fn test_default_collider_layer() {
        assert_eq!(Collider::default().layer, DEFAULT_LAYER);
    }
}
