//! Shared scene builders for the physics benchmarks.

use glam::DVec2;
use rein::ecs::components::physics::{Collider, ColliderShape, RigidBody};
use rein::ecs::components::transform::{GlobalTransform, Transform};
use rein::physics::collider::Aabb;
use rein::{PhysicsConfig, PhysicsWorld};

/// Small deterministic generator so every run benchmarks the same scene.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

fn boxes(n: usize, extent: f64, min_half: f64, max_half: f64, seed: u64) -> Vec<Aabb> {
    let mut rng = Lcg::new(seed);
    (0..n)
        .map(|_| {
            let center = DVec2::new(rng.range(0.0, extent), rng.range(0.0, extent));
            let half = DVec2::splat(rng.range(min_half, max_half));
            Aabb::new(center - half, center + half)
        })
        .collect()
}

/// Equal-sized boxes packed densely enough for a few neighbors each.
pub fn setup_uniform_aabbs(n: usize) -> Vec<Aabb> {
    let extent = (n as f64).sqrt() * 2.0;
    boxes(n, extent, 0.5, 0.5, 1)
}

/// Mostly small boxes with a wide size spread.
pub fn setup_mixed_aabbs(n: usize) -> Vec<Aabb> {
    let extent = (n as f64).sqrt() * 3.0;
    boxes(n, extent, 0.1, 3.0, 2)
}

/// Boxes far apart; almost no candidate pairs.
pub fn setup_sparse_aabbs(n: usize) -> Vec<Aabb> {
    let extent = (n as f64).sqrt() * 20.0;
    boxes(n, extent, 0.5, 0.5, 3)
}

fn spawn_body(world: &mut hecs::World, position: DVec2, index: usize) -> hecs::Entity {
    let shape = match index % 3 {
        0 => ColliderShape::circle(0.5),
        1 => ColliderShape::rectangle(1.0, 0.8),
        _ => ColliderShape::polygon(vec![
            DVec2::new(-0.5, -0.4),
            DVec2::new(0.5, -0.4),
            DVec2::new(0.0, 0.5),
        ]),
    };
    world.spawn((
        Transform::from_position(position),
        GlobalTransform::from_position(position),
        Collider::new(shape),
        RigidBody::new_dynamic(),
    ))
}

fn spawn_floor(world: &mut hecs::World, width: f64) {
    world.spawn((
        Transform::from_xy(0.0, -1.0),
        GlobalTransform::from_position(DVec2::new(0.0, -1.0)),
        Collider::new(ColliderShape::rectangle(width, 2.0)),
    ));
}

/// A floor with `n` mixed dynamic bodies stacked in a grid above it.
pub fn setup_scene(n: usize) -> anyhow::Result<(hecs::World, PhysicsWorld)> {
    let mut world = hecs::World::new();
    let columns = (n as f64).sqrt().ceil().max(1.0) as usize;
    spawn_floor(&mut world, columns as f64 * 1.5 + 10.0);

    let left = -(columns as f64) * 0.75;
    for i in 0..n {
        let position = DVec2::new(left + (i % columns) as f64 * 1.5, 1.0 + (i / columns) as f64 * 1.2);
        spawn_body(&mut world, position, i);
    }

    let physics = PhysicsWorld::new(PhysicsConfig::default())?;
    physics.validate_scene(&world)?;
    Ok((world, physics))
}

/// Empty floor plus `initial` bodies scattered above it.
pub fn setup_mass_scene(initial: usize) -> anyhow::Result<(hecs::World, PhysicsWorld)> {
    let mut world = hecs::World::new();
    spawn_floor(&mut world, 60.0);

    let mut rng = Lcg::new(7);
    for i in 0..initial {
        let position = DVec2::new(rng.range(-25.0, 25.0), rng.range(2.0, 40.0));
        spawn_body(&mut world, position, i);
    }

    Ok((world, PhysicsWorld::new(PhysicsConfig::default())?))
}

/// Step `frames` frames, dropping `spawn_per_frame` new bodies in each.
pub fn run_mass_physics(
    world: &mut hecs::World,
    physics: &mut PhysicsWorld,
    frames: usize,
    spawn_per_frame: usize,
    seed: u64,
) -> anyhow::Result<()> {
    let mut rng = Lcg::new(seed.wrapping_add(11));
    for frame in 0..frames {
        for k in 0..spawn_per_frame {
            let position = DVec2::new(rng.range(-25.0, 25.0), 30.0);
            spawn_body(world, position, frame * spawn_per_frame + k);
        }
        physics.step(world, 1.0 / 60.0)?;
    }
    Ok(())
}
