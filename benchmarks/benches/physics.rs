//! Physics benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- broadphase

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::{DAffine2, DVec2};
use rein::CellSize;
use rein::ecs::components::physics::ColliderShape;
use rein::physics::broadphase::UniformGrid;
use rein::physics::collider::WorldShape;
use rein::physics::narrowphase::{
    DEFAULT_EPSILON, circle_circle, detect_collision, polygonal_circle, polygonal_polygonal,
};
use rein2d_bench::*;

fn at(shape: ColliderShape, x: f64, y: f64, angle: f64) -> WorldShape {
    shape.to_world(&DAffine2::from_angle_translation(angle, DVec2::new(x, y)))
}

fn hexagon() -> ColliderShape {
    ColliderShape::polygon(
        (0..6)
            .map(|i| DVec2::from_angle(i as f64 * std::f64::consts::TAU / 6.0))
            .collect::<Vec<_>>(),
    )
}

// ---------------------------------------------------------------------------
// Broadphase
// ---------------------------------------------------------------------------

fn bench_broadphase(c: &mut Criterion) {
    let scenes: [(&str, fn(usize) -> Vec<rein::physics::collider::Aabb>); 3] = [
        ("broadphase/uniform", setup_uniform_aabbs),
        ("broadphase/mixed_sizes", setup_mixed_aabbs),
        ("broadphase/sparse", setup_sparse_aabbs),
    ];

    for (name, setup) in scenes {
        let mut group = c.benchmark_group(name);
        for &n in &[100, 500, 1000, 2000] {
            let aabbs = setup(n);
            let mut grid = UniformGrid::new(CellSize::Auto);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| grid.find_pairs(&aabbs).len());
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("broadphase/fixed_cell_1000");
        let aabbs = setup_mixed_aabbs(1000);
        for &size in &[0.5, 2.0, 8.0] {
            let mut grid = UniformGrid::new(CellSize::Fixed(size));
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| grid.find_pairs(&aabbs).len());
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

fn bench_narrowphase(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("narrowphase/circle_circle");
        let a = at(ColliderShape::circle(1.0), 0.0, 0.0, 0.0);
        let hit = at(ColliderShape::circle(1.0), 1.5, 0.0, 0.0);
        let miss = at(ColliderShape::circle(1.0), 5.0, 0.0, 0.0);
        group.bench_function("intersecting", |b| {
            b.iter(|| circle_circle(&a, &hit, DEFAULT_EPSILON));
        });
        group.bench_function("separated", |b| {
            b.iter(|| circle_circle(&a, &miss, DEFAULT_EPSILON));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/rect_rect");
        let a = at(ColliderShape::rectangle(2.0, 2.0), 0.0, 0.0, 0.0);
        let hit = at(ColliderShape::rectangle(2.0, 2.0), 1.5, 0.0, 0.0);
        let miss = at(ColliderShape::rectangle(2.0, 2.0), 5.0, 0.0, 0.0);
        let rotated = at(ColliderShape::rectangle(2.0, 2.0), 1.5, 0.0, 0.785);
        group.bench_function("intersecting", |b| {
            b.iter(|| polygonal_polygonal(&a, &hit, DEFAULT_EPSILON));
        });
        group.bench_function("separated", |b| {
            b.iter(|| polygonal_polygonal(&a, &miss, DEFAULT_EPSILON));
        });
        group.bench_function("rotated", |b| {
            b.iter(|| polygonal_polygonal(&a, &rotated, DEFAULT_EPSILON));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/polygon_circle");
        let a = at(hexagon(), 0.0, 0.0, 0.0);
        let hit = at(ColliderShape::circle(1.0), 1.5, 0.3, 0.0);
        let miss = at(ColliderShape::circle(1.0), 5.0, 0.0, 0.0);
        group.bench_function("intersecting", |b| {
            b.iter(|| polygonal_circle(&a, &hit, DEFAULT_EPSILON));
        });
        group.bench_function("separated", |b| {
            b.iter(|| polygonal_circle(&a, &miss, DEFAULT_EPSILON));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/dispatch");
        let shapes = [
            ("circle", ColliderShape::circle(1.0)),
            ("rect", ColliderShape::rectangle(2.0, 2.0)),
            ("hexagon", hexagon()),
        ];
        for (name_a, shape_a) in &shapes {
            for (name_b, shape_b) in &shapes {
                let a = at(shape_a.clone(), 0.0, 0.0, 0.0);
                let b_shape = at(shape_b.clone(), 1.5, 0.2, 0.3);
                group.bench_function(format!("{name_a}_{name_b}"), |b| {
                    b.iter(|| detect_collision(&a, &b_shape, DEFAULT_EPSILON));
                });
            }
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("pipeline/fixed_step");
        group.sample_size(30);
        for &n in &[50, 100, 500, 1000] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_scene(n).expect("scene setup"),
                    |(mut world, mut physics)| physics.fixed_step(&mut world).expect("tick"),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/sustained_10steps");
        group.sample_size(20);
        for &n in &[100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_scene(n).expect("scene setup"),
                    |(mut world, mut physics)| {
                        for _ in 0..10 {
                            physics.fixed_step(&mut world).expect("tick");
                        }
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/stages");
        let n = 500;

        group.bench_function("integrate_500", |b| {
            b.iter_batched(
                || setup_scene(n).expect("scene setup").0,
                |mut w| rein::physics::rigid_body::integrate(&mut w, DVec2::new(0.0, -9.81), 1.0 / 60.0),
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_function("transform_system_500", |b| {
            b.iter_batched(
                || setup_scene(n).expect("scene setup").0,
                |mut w| rein::transform_system(&mut w).expect("no cycles"),
                criterion::BatchSize::LargeInput,
            );
        });
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Mass physics (continuous spawn + step)
// ---------------------------------------------------------------------------

fn bench_mass_physics(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("mass_physics/spawn_rate");
        group.sample_size(10);
        for &spawn_per_frame in &[1, 3, 10] {
            group.bench_with_input(
                BenchmarkId::from_parameter(spawn_per_frame),
                &spawn_per_frame,
                |b, &spf| {
                    b.iter_batched(
                        || setup_mass_scene(0).expect("scene setup"),
                        |(mut world, mut physics)| {
                            run_mass_physics(&mut world, &mut physics, 60, spf, 0).expect("run");
                        },
                        criterion::BatchSize::LargeInput,
                    );
                },
            );
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("mass_physics/initial_bodies");
        group.sample_size(10);
        for &initial in &[0, 100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(initial), &initial, |b, &init| {
                b.iter_batched(
                    || setup_mass_scene(init).expect("scene setup"),
                    |(mut world, mut physics)| {
                        run_mass_physics(&mut world, &mut physics, 60, 3, init as u64).expect("run");
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }
}

criterion_group!(
    benches,
    bench_broadphase,
    bench_narrowphase,
    bench_pipeline,
    bench_mass_physics
);
criterion_main!(benches);
