//! CPU-based 2D physics: rigid body integration, collision detection and positional response.
//!
//! # Architecture
//!
//! The physics pipeline runs in a fixed timestep loop. One tick is:
//!
//! 1. Propagate transforms (fails fast on a hierarchy cycle, before anything is mutated)
//! 2. Integrate dynamic bodies (semi-implicit Euler)
//! 3. Build world-space shapes for every active collider, sorted by entity
//! 4. Broadphase collision detection (uniform grid over AABBs)
//! 5. Layer filter (collision layer matrix and per-collider ignore lists)
//! 6. Narrowphase collision detection (SAT with minimum translation vector)
//! 7. Resolve contacts in ascending entity order
//! 8. Update enter/stay/exit collision events
//!
//! Colliders that cannot take part in a tick (no transform, unknown layer, invalid shape) are
//! skipped and reported once through [`diagnostics`].

pub mod broadphase;
pub mod collider;
pub mod contact;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod layers;
pub mod narrowphase;
pub mod rigid_body;
pub mod solver;

use std::ops::Range;

use glam::DVec2;

use crate::ecs::components::physics::{Collider, RigidBody, DEFAULT_LAYER};
use crate::ecs::components::transform::GlobalTransform;
use crate::ecs::systems::transform::{propagate_transforms, TransformScratch};

pub use self::broadphase::CellSize;
pub use self::solver::CorrectionSplit;

use self::broadphase::UniformGrid;
use self::collider::{Aabb, WorldShape};
use self::contact::{CollisionEvent, CollisionPair, CollisionState};
use self::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use self::error::{PhysicsError, ShapeError};
use self::events::CollisionEvents;
use self::layers::{CollisionLayerMatrix, LayerMask};
use self::narrowphase::detect_compound;

/// Configuration for the physics simulation.
///
/// Immutable once handed to [`PhysicsWorld::new`].
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.81).
    pub gravity: DVec2,
    /// Fixed timestep for physics updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of ticks per [`PhysicsWorld::step`] call. Default: 4.
    pub max_substeps: u32,
    /// Broadphase cell edge. Default: derived from the median collider size.
    pub cell_size: CellSize,
    /// Overlaps up to this depth are not collisions. Default: 1e-4.
    pub epsilon: f64,
    /// Dynamic–dynamic correction split. Default: equal.
    pub split: CorrectionSplit,
    /// Which layers may interact. Default: `"default"` with itself.
    pub layers: CollisionLayerMatrix,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DVec2::new(0.0, -9.81),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            cell_size: CellSize::Auto,
            epsilon: narrowphase::DEFAULT_EPSILON,
            split: CorrectionSplit::Equal,
            layers: CollisionLayerMatrix::new().allow(DEFAULT_LAYER, DEFAULT_LAYER),
        }
    }
}

impl PhysicsConfig {
    /// Set the fixed timestep from a tick rate in Hz.
    pub fn with_tick_rate(mut self, hz: f64) -> Self {
        self.fixed_timestep = 1.0 / hz;
        self
    }

    pub fn with_gravity(mut self, gravity: DVec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_layers(mut self, layers: CollisionLayerMatrix) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_cell_size(mut self, cell_size: CellSize) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_split(mut self, split: CorrectionSplit) -> Self {
        self.split = split;
        self
    }

    fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "fixed timestep must be finite and positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max substeps must be at least 1".to_owned(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        if let Some(layer) = self.layers.overflow() {
            return Err(PhysicsError::InvalidConfig(format!(
                "layer `{layer}` exceeds the limit of {} collision layers",
                layers::MAX_LAYERS
            )));
        }
        if let CellSize::Fixed(size) = self.cell_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(PhysicsError::InvalidConfig(format!(
                    "cell size must be finite and positive, got {size}"
                )));
            }
        }
        Ok(())
    }
}

/// Counters from one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub tick: u64,
    /// Dynamic bodies advanced by the integrator.
    pub integrated: usize,
    /// Colliders that took part in collision detection.
    pub colliders: usize,
    /// Active colliders left out because of an anomaly.
    pub skipped: usize,
    /// Broadphase AABB pairs.
    pub candidate_pairs: usize,
    /// Candidates dropped by the layer filter.
    pub layer_rejected: usize,
    /// Pairs confirmed by the narrowphase.
    pub contacts: usize,
    /// Contacts that moved at least one body.
    pub corrected: usize,
}

/// A collider's world-space data for the current tick.
#[derive(Debug, Clone)]
struct Proxy {
    entity: hecs::Entity,
    trigger: bool,
    dynamic: bool,
    mask: LayerMask,
    shapes: Range<usize>,
    aabb: Aabb,
}

/// The main physics world managing simulation state.
///
/// A collider's motion kind comes from the [`RigidBody`] on the same entity. A collider without
/// one is immovable: it behaves like a static body, solid unless its `physics` flag is cleared,
/// in which case it is a trigger.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    accumulator: f64,
    tick: u64,
    broadphase: UniformGrid,
    proxies: Vec<Proxy>,
    shapes: Vec<WorldShape>,
    aabbs: Vec<Aabb>,
    contacts: Vec<CollisionPair>,
    transforms: TransformScratch,
    moves: Vec<(hecs::Entity, DVec2)>,
    events: CollisionEvents,
    diagnostics: Diagnostics,
    stats: StepStats,
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self {
            broadphase: UniformGrid::new(config.cell_size),
            config,
            accumulator: 0.0,
            tick: 0,
            proxies: Vec::new(),
            shapes: Vec::new(),
            aabbs: Vec::new(),
            contacts: Vec::new(),
            transforms: TransformScratch::new(),
            moves: Vec::new(),
            events: CollisionEvents::new(),
            diagnostics: Diagnostics::new(),
            stats: StepStats::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Check every collider against the configuration before the first tick.
    ///
    /// Fails on the first collider (in entity order) that names an undeclared layer or carries an
    /// invalid shape.
    pub fn validate_scene(&self, world: &hecs::World) -> Result<(), PhysicsError> {
        let mut query = world.query::<&Collider>();
        let mut colliders: Vec<(hecs::Entity, &Collider)> = query.iter().collect();
        colliders.sort_unstable_by_key(|(entity, _)| entity.to_bits());

        for (entity, collider) in colliders {
            for layer in std::iter::once(&collider.layer).chain(&collider.ignore_layers) {
                if !self.config.layers.contains_layer(layer) {
                    return Err(PhysicsError::UnknownLayer {
                        entity,
                        layer: layer.clone(),
                    });
                }
            }
            validate_parts(entity, collider)?;
        }
        Ok(())
    }

    /// Step the physics simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator so results do not depend on the frame rate. Returns the
    /// number of ticks run.
    pub fn step(&mut self, world: &mut hecs::World, delta_time: f64) -> Result<u32, PhysicsError> {
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.fixed_step(world)?;
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }

        Ok(substeps)
    }

    /// Run exactly one tick.
    pub fn fixed_step(&mut self, world: &mut hecs::World) -> Result<StepStats, PhysicsError> {
        let tick = self.tick + 1;
        let mut stats = StepStats {
            tick,
            ..StepStats::default()
        };

        // 1. Propagate transforms
        propagate_transforms(world, &mut self.transforms)?;

        // 2. Integrate dynamic bodies
        stats.integrated = rigid_body::integrate_with(
            world,
            self.config.gravity,
            self.config.fixed_timestep,
            &mut self.moves,
        );
        propagate_transforms(world, &mut self.transforms)?;

        // 3. World-space shapes
        stats.skipped = self.collect_proxies(world, tick);
        stats.colliders = self.proxies.len();

        // 4-6. Broadphase, layer filter, narrowphase
        self.contacts.clear();
        let candidates = self.broadphase.find_pairs(&self.aabbs);
        stats.candidate_pairs = candidates.len();
        for &(i, j) in candidates {
            let (a, b) = (&self.proxies[i], &self.proxies[j]);
            if !a.mask.allows(&b.mask, &self.config.layers) {
                stats.layer_rejected += 1;
                continue;
            }
            let Some(info) = detect_compound(
                &self.shapes[a.shapes.clone()],
                &self.shapes[b.shapes.clone()],
                self.config.epsilon,
            ) else {
                continue;
            };
            tracing::trace!(
                a = ?a.entity,
                b = ?b.entity,
                penetration = info.penetration,
                direction = ?info.direction,
                "contact"
            );
            // Proxies are sorted, so `a` has the lower identifier.
            self.contacts.push(CollisionPair::with_motion(
                a.entity,
                b.entity,
                info,
                a.trigger || b.trigger,
                a.dynamic,
                b.dynamic,
            ));
        }
        stats.contacts = self.contacts.len();

        // 7. Resolve
        stats.corrected = solver::resolve_pairs(world, &self.contacts, self.config.split);
        propagate_transforms(world, &mut self.transforms)?;

        // 8. Events
        self.events.update(tick, &self.contacts);

        self.tick = tick;
        self.stats = stats;
        tracing::debug!(
            tick,
            integrated = stats.integrated,
            colliders = stats.colliders,
            skipped = stats.skipped,
            candidates = stats.candidate_pairs,
            contacts = stats.contacts,
            corrected = stats.corrected,
            cell_size = self.broadphase.cell_size(),
            "physics tick"
        );
        Ok(stats)
    }

    /// Gather every usable active collider. Returns how many active colliders were skipped.
    fn collect_proxies(&mut self, world: &hecs::World, tick: u64) -> usize {
        self.proxies.clear();
        self.shapes.clear();
        self.aabbs.clear();
        self.diagnostics.prune(world);
        let mut skipped = 0;

        for (entity, (collider, global, body)) in world
            .query::<(&Collider, Option<&GlobalTransform>, Option<&RigidBody>)>()
            .iter()
        {
            if !collider.active {
                continue;
            }

            let Some(global) = global else {
                skipped += 1;
                self.diagnostics
                    .report(tick, entity, DiagnosticKind::MissingTransform, || {
                        format!("collider {entity:?} has no transform; skipped")
                    });
                continue;
            };

            let Some(mask) = LayerMask::resolve(&self.config.layers, collider) else {
                skipped += 1;
                self.diagnostics
                    .report(tick, entity, DiagnosticKind::UnknownLayer, || {
                        format!("collider {entity:?} uses unknown layer `{}`; skipped", collider.layer)
                    });
                continue;
            };

            if let Err(err) = validate_parts(entity, collider) {
                skipped += 1;
                self.diagnostics
                    .report(tick, entity, DiagnosticKind::InvalidShape, || format!("{err}; skipped"));
                continue;
            }

            let start = self.shapes.len();
            self.shapes
                .extend(collider.parts.iter().map(|part| part.to_world(global)));
            let shapes = start..self.shapes.len();
            let aabb = self.shapes[shapes.clone()]
                .iter()
                .map(WorldShape::aabb)
                .reduce(|acc, aabb| acc.union(&aabb))
                .unwrap_or_else(|| Aabb::new(global.translation(), global.translation()));

            self.proxies.push(Proxy {
                entity,
                trigger: !collider.physics,
                dynamic: body.is_some_and(RigidBody::is_dynamic),
                mask,
                shapes,
                aabb,
            });
        }

        self.proxies.sort_unstable_by_key(|proxy| proxy.entity.to_bits());
        self.aabbs.extend(self.proxies.iter().map(|proxy| proxy.aabb));
        skipped
    }

    /// Number of ticks run so far. Events report the tick they were produced on.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn last_stats(&self) -> &StepStats {
        &self.stats
    }

    /// Pairs that overlapped on the last tick, in ascending entity order.
    pub fn contacts(&self) -> &[CollisionPair] {
        &self.contacts
    }

    pub fn contacts_of(&self, entity: hecs::Entity) -> impl Iterator<Item = &CollisionPair> {
        self.contacts.iter().filter(move |pair| pair.involves(entity))
    }

    /// Every live collision event, in ascending pair order.
    pub fn events(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.iter()
    }

    pub fn events_of(&self, entity: hecs::Entity) -> impl Iterator<Item = &CollisionEvent> {
        self.events.involving(entity)
    }

    pub fn events_of_in_state(
        &self,
        entity: hecs::Entity,
        state: CollisionState,
    ) -> impl Iterator<Item = &CollisionEvent> {
        self.events
            .involving(entity)
            .filter(move |event| event.state == state)
    }

    pub fn event_between(&self, a: hecs::Entity, b: hecs::Entity) -> Option<&CollisionEvent> {
        self.events.get(a, b)
    }

    /// Colliders whose shapes contained `point` as of the last tick, in ascending entity order.
    pub fn colliders_at_point(&self, point: DVec2) -> Vec<hecs::Entity> {
        self.proxies
            .iter()
            .filter(|proxy| proxy.aabb.contains_point(point))
            .filter(|proxy| {
                self.shapes[proxy.shapes.clone()]
                    .iter()
                    .any(|shape| shape.contains_point(point))
            })
            .map(|proxy| proxy.entity)
            .collect()
    }

    /// Take every anomaly reported since the last call.
    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    /// Drop all collision events, e.g. when a scene is reloaded.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

fn validate_parts(entity: hecs::Entity, collider: &Collider) -> Result<(), PhysicsError> {
    if collider.parts.is_empty() {
        return Err(PhysicsError::InvalidShape {
            entity,
            part: 0,
            source: ShapeError::Empty,
        });
    }
    for (part, p) in collider.parts.iter().enumerate() {
        p.shape
            .validate()
            .map_err(|source| PhysicsError::InvalidShape { entity, part, source })?;
    }
    Ok(())
}
