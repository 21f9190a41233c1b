//! Rigid body integration functions.

use glam::DVec2;

use crate::ecs::components::physics::{Collider, RigidBody};
use crate::ecs::components::transform::{GlobalTransform, Transform};
use crate::ecs::systems::transform::world_delta_to_local;

/// Advance every active dynamic body by one fixed step (semi-implicit Euler).
///
/// `v += (g * gravity_scale + a) * dt`, then `x += v * dt`. Static and kinematic bodies are left
/// alone, as are bodies whose collider is inactive. Returns the number of bodies advanced.
pub fn integrate(world: &mut hecs::World, gravity: DVec2, dt: f64) -> usize {
    integrate_with(world, gravity, dt, &mut Vec::new())
}

/// [`integrate`] with a caller-owned displacement buffer, reused across ticks.
pub fn integrate_with(
    world: &mut hecs::World,
    gravity: DVec2,
    dt: f64,
    moves: &mut Vec<(hecs::Entity, DVec2)>,
) -> usize {
    moves.clear();
    for (entity, (rb, collider)) in world.query_mut::<(&mut RigidBody, Option<&Collider>)>() {
        if !rb.is_dynamic() || collider.is_some_and(|c| !c.active) {
            continue;
        }
        rb.velocity += (gravity * rb.gravity_scale + rb.acceleration) * dt;
        moves.push((entity, rb.velocity * dt));
    }

    for &(entity, delta) in moves.iter() {
        translate(world, entity, delta);
    }
    moves.len()
}

/// Move an entity by a world-space displacement.
///
/// The delta is mapped into the parent's frame before it is added to the local position, and the
/// cached world translation is shifted so later readers in the same tick see the new position.
pub(crate) fn translate(world: &hecs::World, entity: hecs::Entity, delta: DVec2) {
    if delta == DVec2::ZERO {
        return;
    }
    let local = world_delta_to_local(world, entity, delta);
    if let Ok(mut transform) = world.get::<&mut Transform>(entity) {
        transform.position += local;
    }
    if let Ok(mut global) = world.get::<&mut GlobalTransform>(entity) {
        global.0.translation += delta;
    }
}

/// Remove the component of `velocity` pointing along `into` (a unit vector), if any.
///
/// Tangential motion is kept.
#[inline]
pub(crate) fn cancel_inward(velocity: DVec2, into: DVec2) -> DVec2 {
    let along = velocity.dot(into);
    if along > 0.0 {
        velocity - into * along
    } else {
        velocity
    }
}
