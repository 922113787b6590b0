use std::num::NonZeroUsize;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use whorl::{
    Camera, IntegratorKind, RenderDriver, RenderSettings, Scene, SpiralOrder, TaskTable, TileGrid,
    WorkerCount,
    geometry::{ScreenSize, WorldPoint, WorldVector},
    scene::primitives::Sphere,
};

fn spiral_walk(c: &mut Criterion) {
    // 4K image, 64 pixel tiles.
    let grid = TileGrid::new(ScreenSize::new(3840, 2160), 64.try_into().unwrap()).unwrap();

    c.bench_function("spiral_walk_4k", |b| {
        b.iter(|| SpiralOrder::new(&grid).collect::<Vec<_>>())
    });
}

fn task_table_build(c: &mut Criterion) {
    let grid = TileGrid::new(ScreenSize::new(1024, 768), 64.try_into().unwrap()).unwrap();

    c.bench_function("task_table_1024x768", |b| {
        b.iter(|| TaskTable::build(&grid, 1))
    });
}

fn small_render(c: &mut Criterion) {
    let size = ScreenSize::new(256, 256);

    c.bench_function("render_256_normal", |b| {
        b.iter_batched(
            || {
                let scene = Scene {
                    object: Sphere {
                        center: WorldPoint::new(0.0, 0.0, -10.0),
                        radius: 4.0,
                    },
                };
                let camera = Camera::builder()
                    .center(WorldPoint::new(0.0, 0.0, 0.0))
                    .forward(WorldVector::new(0.0, 0.0, -1.0))
                    .up(WorldVector::new(0.0, 1.0, 0.0))
                    .resolution(size)
                    .film_width(36e-3)
                    .focal_length(50e-3)
                    .f_number(4.8)
                    .focus_distance(10.0)
                    .build();
                RenderDriver::builder()
                    .scene(scene)
                    .camera(camera)
                    .render_target(size)
                    .settings(RenderSettings {
                        sample_count: 4.try_into().unwrap(),
                        worker_count: WorkerCount::Manual(NonZeroUsize::new(4).unwrap()),
                        arena_capacity: 1 << 20,
                        poll_interval: Duration::from_millis(1),
                        ..Default::default()
                    })
                    .integrator(IntegratorKind::NormalShading)
                    .build()
            },
            |mut driver| driver.render().unwrap(),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(30));
    targets = spiral_walk, task_table_build, small_render
}
criterion_main!(benches);
