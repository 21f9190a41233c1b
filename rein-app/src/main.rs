use anyhow::Context;
use clap::Parser;
use glam::DVec2;
use rein::ecs::components::physics::{Collider, ColliderPart, ColliderShape, RigidBody};
use rein::ecs::components::transform::{GlobalTransform, Transform};
use rein::{CellSize, CollisionLayerMatrix, CollisionState, CorrectionSplit, PhysicsConfig, PhysicsWorld};

/// Headless rein2d demo: balls drop into a pit swept by a kinematic paddle.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Number of balls to drop.
    #[arg(long, default_value_t = 64)]
    balls: usize,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Physics tick rate in Hz.
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Fixed broadphase cell size (derived from collider sizes when omitted).
    #[arg(long)]
    cell_size: Option<f64>,

    /// Split ball-ball corrections by mass instead of equally.
    #[arg(long)]
    mass_weighted: bool,
}

struct Scene {
    goal: hecs::Entity,
    paddle: hecs::Entity,
    balls: Vec<hecs::Entity>,
}

fn layers() -> CollisionLayerMatrix {
    CollisionLayerMatrix::from_rules([
        ("ball", vec!["ball", "terrain", "paddle", "sensor"]),
        ("terrain", vec![]),
        ("paddle", vec![]),
        ("sensor", vec![]),
    ])
}

fn build_scene(world: &mut hecs::World, balls: usize) -> Scene {
    // Pit: floor plus two walls as one compound static collider.
    world.spawn((
        Transform::identity(),
        GlobalTransform::default(),
        Collider::compound(vec![
            ColliderPart::at(ColliderShape::rectangle(40.0, 2.0), DVec2::new(0.0, -1.0)),
            ColliderPart::at(ColliderShape::rectangle(2.0, 30.0), DVec2::new(-21.0, 15.0)),
            ColliderPart::at(ColliderShape::rectangle(2.0, 30.0), DVec2::new(21.0, 15.0)),
        ])
        .with_layer("terrain"),
    ));

    // Ramp on the left.
    world.spawn((
        Transform::from_xy(-15.0, 0.0),
        GlobalTransform::default(),
        Collider::new(ColliderShape::polygon(vec![
            DVec2::new(-5.0, 0.0),
            DVec2::new(5.0, 0.0),
            DVec2::new(-5.0, 4.0),
        ]))
        .with_layer("terrain"),
    ));

    let goal = world.spawn((
        Transform::from_xy(15.0, 1.0),
        GlobalTransform::default(),
        Collider::new(ColliderShape::rectangle(6.0, 2.0))
            .with_layer("sensor")
            .trigger(),
    ));

    let paddle = world.spawn((
        Transform::from_xy(0.0, 6.0),
        GlobalTransform::default(),
        Collider::new(ColliderShape::rectangle(6.0, 0.5)).with_layer("paddle"),
        RigidBody::new_kinematic(),
    ));

    let balls = (0..balls)
        .map(|i| {
            let position = DVec2::new(-18.0 + (i % 18) as f64 * 2.0, 12.0 + (i / 18) as f64 * 2.2);
            let radius = 0.4 + (i % 3) as f64 * 0.15;
            world.spawn((
                Transform::from_position(position),
                GlobalTransform::default(),
                Collider::new(ColliderShape::circle(radius)).with_layer("ball"),
                RigidBody::new_dynamic()
                    .with_mass(radius * radius)
                    .with_velocity(DVec2::new(((i % 5) as f64 - 2.0) * 0.5, 0.0)),
            ))
        })
        .collect();

    Scene { goal, paddle, balls }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = PhysicsConfig::default()
        .with_tick_rate(cli.tick_rate)
        .with_layers(layers());
    if let Some(size) = cli.cell_size {
        config = config.with_cell_size(CellSize::Fixed(size));
    }
    if cli.mass_weighted {
        config = config.with_split(CorrectionSplit::MassWeighted);
    }

    let mut world = hecs::World::new();
    let mut physics = PhysicsWorld::new(config).context("Failed to create physics world")?;
    let scene = build_scene(&mut world, cli.balls);
    physics
        .validate_scene(&world)
        .context("Scene failed validation")?;

    log::info!(
        "Simulating {} balls for {} ticks at {} Hz",
        scene.balls.len(),
        cli.ticks,
        cli.tick_rate
    );

    let dt = physics.config().fixed_timestep;
    let mut scored = 0usize;
    for tick in 0..cli.ticks {
        // Sweep the paddle back and forth; kinematic bodies are moved by the host.
        if let Ok(mut transform) = world.get::<&mut Transform>(scene.paddle) {
            transform.position.x = 12.0 * (tick as f64 * dt * 0.8).sin();
        }

        physics.fixed_step(&mut world)?;

        for event in physics.events_of_in_state(scene.goal, CollisionState::Entered) {
            if let Some(ball) = event.other(scene.goal) {
                scored += 1;
                log::info!("tick {}: ball {:?} entered the goal", physics.tick(), ball);
            }
        }
        for event in physics.events_of_in_state(scene.goal, CollisionState::Exited) {
            if let Some(ball) = event.other(scene.goal) {
                log::debug!("tick {}: ball {:?} left the goal", physics.tick(), ball);
            }
        }

        for diagnostic in physics.drain_diagnostics() {
            log::warn!("{}", diagnostic.message);
        }
    }

    let stats = physics.last_stats();
    let resting = scene
        .balls
        .iter()
        .filter(|&&ball| {
            world
                .get::<&RigidBody>(ball)
                .map(|rb| rb.velocity.length() < 0.05)
                .unwrap_or(false)
        })
        .count();
    log::info!(
        "Done after {} ticks: {} goal entries, {} of {} balls at rest, {} contacts on the last tick",
        physics.tick(),
        scored,
        resting,
        scene.balls.len(),
        stats.contacts
    );

    Ok(())
}
