//! Error types for the physics core.
//!
//! Configuration problems are reported once at load time through [`PhysicsError`]. Per-tick
//! anomalies never surface as errors; see [`diagnostics`](super::diagnostics).

use thiserror::Error;

/// Invalid collider shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("polygon has {count} vertices, at least 3 are required")]
    TooFewVertices { count: usize },

    #[error("polygon has zero signed area")]
    DegeneratePolygon,

    #[error("polygon is not convex")]
    NonConvexPolygon,

    #[error("{what} must be finite and positive, got {value}")]
    InvalidDimension { what: &'static str, value: f64 },

    #[error("collider has no parts")]
    Empty,
}

/// Errors reported by the physics core.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// A collider refers to a layer that the layer matrix does not declare.
    #[error("collider {entity:?} references unknown collision layer `{layer}`")]
    UnknownLayer { entity: hecs::Entity, layer: String },

    /// A collider part failed shape validation.
    #[error("collider {entity:?}, part {part}: {source}")]
    InvalidShape {
        entity: hecs::Entity,
        part: usize,
        #[source]
        source: ShapeError,
    },

    /// The transform hierarchy contains a cycle.
    #[error("transform hierarchy cycle detected at entity {entity:?}")]
    TransformCycle { entity: hecs::Entity },

    /// Configuration value is invalid.
    #[error("invalid physics configuration: {0}")]
    InvalidConfig(String),

    #[error("entity {0:?} does not exist")]
    NoSuchEntity(hecs::Entity),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let mut world = hecs::World::new();
        let entity = world.spawn(());

        let err = PhysicsError::UnknownLayer {
            entity,
            layer: "ghost".to_owned(),
        };
        assert!(err.to_string().contains("`ghost`"));

        let err = PhysicsError::InvalidShape {
            entity,
            part: 2,
            source: ShapeError::TooFewVertices { count: 2 },
        };
        let message = err.to_string();
        assert!(message.contains("part 2"));
        assert!(message.contains("at least 3"));
    }
}
