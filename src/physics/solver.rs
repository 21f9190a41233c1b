//! Positional collision resolver.
//!
//! Each overlapping pair is pushed apart by its full penetration along the contact direction in
//! one pass, and the inward velocity of every corrected body is cancelled. Which body moves
//! depends on the motion kinds:
//!
//! | A \ B     | Static | Kinematic | Dynamic       |
//! |-----------|--------|-----------|---------------|
//! | Static    | -      | -         | B             |
//! | Kinematic | -      | -         | B             |
//! | Dynamic   | A      | A         | split A and B |
//!
//! Trigger pairs and pairs with no penetration are never touched.

use glam::DVec2;

use crate::ecs::components::physics::{RigidBody, RigidBodyType};

use super::contact::CollisionPair;
use super::rigid_body::{cancel_inward, translate};

/// How a dynamic–dynamic correction is shared between the two bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionSplit {
    /// Each body moves half the penetration.
    #[default]
    Equal,
    /// The lighter body moves more, in inverse proportion to `RigidBody::mass`.
    MassWeighted,
}

impl CorrectionSplit {
    /// Fractions of the penetration applied to (A, B).
    fn shares(self, mass_a: f64, mass_b: f64) -> (f64, f64) {
        match self {
            CorrectionSplit::Equal => (0.5, 0.5),
            CorrectionSplit::MassWeighted => {
                let total = mass_a + mass_b;
                if mass_a > 0.0 && mass_b > 0.0 && total.is_finite() {
                    (mass_b / total, mass_a / total)
                } else {
                    (0.5, 0.5)
                }
            }
        }
    }
}

/// Body data read once per pair.
#[derive(Clone, Copy)]
struct BodyState {
    kind: RigidBodyType,
    mass: f64,
}

impl BodyState {
    /// Colliders without a rigid body are immovable.
    fn read(world: &hecs::World, entity: hecs::Entity) -> Self {
        match world.get::<&RigidBody>(entity) {
            Ok(rb) => Self {
                kind: rb.body_type,
                mass: rb.mass,
            },
            Err(_) => Self {
                kind: RigidBodyType::Static,
                mass: 0.0,
            },
        }
    }
}

/// Resolve this tick's pairs in the given order. Returns the number of pairs that moved a body.
///
/// Callers pass pairs sorted by ascending collider identifier so the outcome does not depend on
/// broadphase enumeration order.
pub fn resolve_pairs(world: &hecs::World, pairs: &[CollisionPair], split: CorrectionSplit) -> usize {
    pairs
        .iter()
        .filter(|pair| resolve_pair(world, pair, split))
        .count()
}

/// Apply the correction for one pair. Returns `false` when nothing was changed.
pub fn resolve_pair(world: &hecs::World, pair: &CollisionPair, split: CorrectionSplit) -> bool {
    if pair.trigger || pair.penetration <= 0.0 {
        return false;
    }

    let a = BodyState::read(world, pair.entity_a);
    let b = BodyState::read(world, pair.entity_b);
    let push = pair.direction * pair.penetration;

    match (a.kind, b.kind) {
        (RigidBodyType::Dynamic, RigidBodyType::Dynamic) => {
            let (share_a, share_b) = split.shares(a.mass, b.mass);
            push_body(world, pair.entity_a, -push * share_a, pair.direction);
            push_body(world, pair.entity_b, push * share_b, -pair.direction);
        }
        (RigidBodyType::Dynamic, _) => {
            push_body(world, pair.entity_a, -push, pair.direction);
        }
        (_, RigidBodyType::Dynamic) => {
            push_body(world, pair.entity_b, push, -pair.direction);
        }
        _ => return false,
    }

    tracing::trace!(
        a = ?pair.entity_a,
        b = ?pair.entity_b,
        penetration = pair.penetration,
        "resolved contact"
    );
    true
}

/// Move a dynamic body and cancel its velocity toward the other body (`into`).
fn push_body(world: &hecs::World, entity: hecs::Entity, delta: DVec2, into: DVec2) {
    translate(world, entity, delta);
    if let Ok(mut rb) = world.get::<&mut RigidBody>(entity) {
        rb.velocity = cancel_inward(rb.velocity, into);
    }
}
