//! Transform hierarchy propagation system.

use glam::{DAffine2, DVec2};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ecs::components::transform::{GlobalTransform, Parent, Transform};
use crate::physics::error::PhysicsError;

type LocalEntry = (DAffine2, Option<hecs::Entity>);

/// Working storage for [`propagate_transforms`], kept between ticks so propagation does not
/// allocate once the scene size settles.
#[derive(Debug, Default)]
pub struct TransformScratch {
    locals: FxHashMap<hecs::Entity, LocalEntry>,
    order: Vec<hecs::Entity>,
    globals: FxHashMap<hecs::Entity, DAffine2>,
    chain: Vec<hecs::Entity>,
    on_chain: FxHashSet<hecs::Entity>,
}

impl TransformScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Propagate transforms through the Parent hierarchy.
///
/// Phase 1: Snapshot every local transform and its parent link.
/// Phase 2: Resolve world transforms bottom-up along each parent chain (iterative, memoized).
/// Phase 3: Write results into GlobalTransform.
///
/// A parent without a Transform (or a despawned parent) acts as the identity root. A cycle in the
/// hierarchy fails fast with [`PhysicsError::TransformCycle`] and leaves GlobalTransforms untouched.
pub fn transform_system(world: &mut hecs::World) -> Result<(), PhysicsError> {
    propagate_transforms(world, &mut TransformScratch::new())
}

/// [`transform_system`] with caller-owned working storage.
pub fn propagate_transforms(
    world: &mut hecs::World,
    scratch: &mut TransformScratch,
) -> Result<(), PhysicsError> {
    let TransformScratch {
        locals,
        order,
        globals,
        chain,
        on_chain,
    } = scratch;

    locals.clear();
    locals.extend(
        world
            .query_mut::<(&Transform, Option<&Parent>)>()
            .into_iter()
            .map(|(entity, (transform, parent))| (entity, (transform.to_affine(), parent.map(|p| p.0)))),
    );

    // Sorted so the reported cycle member does not depend on hash order.
    order.clear();
    order.extend(locals.keys().copied());
    order.sort_unstable_by_key(|e| e.to_bits());

    globals.clear();
    for &entity in order.iter() {
        resolve_global(entity, locals, globals, chain, on_chain)?;
    }

    for (entity, global) in world.query_mut::<&mut GlobalTransform>() {
        if let Some(matrix) = globals.get(&entity) {
            global.0 = *matrix;
        }
    }

    Ok(())
}

fn resolve_global(
    entity: hecs::Entity,
    locals: &FxHashMap<hecs::Entity, LocalEntry>,
    globals: &mut FxHashMap<hecs::Entity, DAffine2>,
    chain: &mut Vec<hecs::Entity>,
    on_chain: &mut FxHashSet<hecs::Entity>,
) -> Result<(), PhysicsError> {
    if globals.contains_key(&entity) {
        return Ok(());
    }

    chain.clear();
    on_chain.clear();

    // Walk up until an already-resolved ancestor or a root.
    let mut current = entity;
    let mut base = loop {
        if let Some(resolved) = globals.get(&current) {
            break *resolved;
        }
        let Some((_, parent)) = locals.get(&current) else {
            break DAffine2::IDENTITY;
        };
        if !on_chain.insert(current) {
            return Err(PhysicsError::TransformCycle { entity: current });
        }
        chain.push(current);
        match parent {
            Some(parent) => current = *parent,
            None => break DAffine2::IDENTITY,
        }
    };

    for link in chain.iter().rev() {
        if let Some((local, _)) = locals.get(link) {
            base = base * *local;
        }
        globals.insert(*link, base);
    }

    Ok(())
}

/// Attach `child` to `parent`, rejecting assignments that would create a cycle.
pub fn set_parent(
    world: &mut hecs::World,
    child: hecs::Entity,
    parent: hecs::Entity,
) -> Result<(), PhysicsError> {
    if !world.contains(child) {
        return Err(PhysicsError::NoSuchEntity(child));
    }
    if !world.contains(parent) {
        return Err(PhysicsError::NoSuchEntity(parent));
    }

    // An ancestor chain longer than the entity count means a cycle already exists above `parent`.
    let limit = world.len() as usize;
    let mut current = Some(parent);
    let mut steps = 0usize;
    while let Some(ancestor) = current {
        if ancestor == child || steps > limit {
            return Err(PhysicsError::TransformCycle { entity: ancestor });
        }
        current = world.get::<&Parent>(ancestor).ok().map(|p| p.0);
        steps += 1;
    }

    world
        .insert_one(child, Parent(parent))
        .map_err(|_| PhysicsError::NoSuchEntity(child))
}

/// Detach `child` from its parent. The local transform is kept as-is.
pub fn clear_parent(world: &mut hecs::World, child: hecs::Entity) {
    let _ = world.remove_one::<Parent>(child);
}

/// Convert a world-space displacement into the local frame that `entity`'s Transform lives in.
pub(crate) fn world_delta_to_local(world: &hecs::World, entity: hecs::Entity, delta: DVec2) -> DVec2 {
    let Some(parent) = world.get::<&Parent>(entity).ok().map(|p| p.0) else {
        return delta;
    };
    let Ok(parent_global) = world.get::<&GlobalTransform>(parent) else {
        return delta;
    };
    let linear = parent_global.0.matrix2;
    if linear.determinant().abs() < 1e-12 {
        return delta;
    }
    linear.inverse() * delta
}
