//! Rein 2D
//!
//! Discrete, fixed-timestep 2D collision detection and response on top of hecs.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - Components consumed from the host scene (transforms, colliders, rigid bodies)
//!    and transform hierarchy propagation
//! 2. **physics** - Integrator, uniform grid broadphase, collision layer matrix,
//!    SAT narrowphase, collision resolver and enter/stay/exit event tracking

pub mod ecs;
pub mod physics;

pub use ecs::prelude::*;

pub use physics::contact::{CollisionEvent, CollisionPair, CollisionState};
pub use physics::error::{PhysicsError, ShapeError};
pub use physics::layers::CollisionLayerMatrix;
pub use physics::{CellSize, CorrectionSplit, PhysicsConfig, PhysicsWorld};

// Re-export glam and hecs for convenience
pub use glam;
pub use hecs;
