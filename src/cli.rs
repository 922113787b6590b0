use whorl::{
    Camera, ImageFileSink, IntegratorKind, OutputSink, RenderDriver, RenderSettings, SamplerKind,
    Scene,
    geometry::{HitRecord, Ray, ScreenSize, WorldBox, WorldPoint, WorldVector},
    scene::{
        Object,
        primitives::{Plane, Sphere},
    },
};

use indicatif::ProgressBar;
use nalgebra::Unit;

enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
}

impl Object for Primitive {
    fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        match self {
            Primitive::Sphere(sphere) => sphere.intersect(ray),
            Primitive::Plane(plane) => plane.intersect(ray),
        }
    }

    fn bounding_box(&self) -> WorldBox {
        match self {
            Primitive::Sphere(sphere) => sphere.bounding_box(),
            Primitive::Plane(plane) => plane.bounding_box(),
        }
    }
}

fn demo_scene() -> Scene<Vec<Primitive>> {
    Scene {
        object: vec![
            Primitive::Plane(Plane {
                point: WorldPoint::new(0.0, 0.0, 0.0),
                normal: Unit::new_normalize(WorldVector::new(0.0, 1.0, 0.0)),
            }),
            Primitive::Sphere(Sphere {
                center: WorldPoint::new(0.0, 1.0, -10.0),
                radius: 1.0,
            }),
            Primitive::Sphere(Sphere {
                center: WorldPoint::new(2.5, 0.75, -8.0),
                radius: 0.75,
            }),
            Primitive::Sphere(Sphere {
                center: WorldPoint::new(-2.5, 1.5, -12.0),
                radius: 1.5,
            }),
        ],
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let integrator = match args.next() {
        Some(name) => IntegratorKind::from_name(&name)?,
        None => IntegratorKind::AmbientOcclusion,
    };
    let sampler = match args.next() {
        Some(name) => SamplerKind::from_name(&name)?,
        None => SamplerKind::default(),
    };

    let size = ScreenSize::new(1024, 768);
    let camera = Camera::builder()
        .center(WorldPoint::new(0.0, 2.0, 0.0))
        .forward(WorldVector::new(0.0, -0.15, -1.0))
        .up(WorldVector::new(0.0, 1.0, 0.0))
        .resolution(size)
        .film_width(36e-3)
        .focal_length(50e-3)
        .f_number(4.8)
        .focus_distance(10.0)
        .build();

    let settings = RenderSettings {
        sample_count: 16.try_into().unwrap(),
        ..Default::default()
    };

    let mut driver = RenderDriver::builder()
        .scene(demo_scene())
        .camera(camera)
        .render_target(size)
        .sinks(vec![
            Box::new(ImageFileSink::new("whorl.png")) as Box<dyn OutputSink>,
        ])
        .settings(settings)
        .integrator(integrator)
        .sampler(sampler)
        .build();

    let bar = ProgressBar::no_length();
    let report = driver.render_with({
        let bar = bar.clone();
        move |progress| {
            bar.update(|ps| {
                ps.set_len(progress.total as u64);
                ps.set_pos(progress.finished as u64)
            })
        }
    })?;
    bar.finish();

    if let Some(report) = report {
        println!("Time spent on pre-processing : {:.2?}", report.pre_process_time);
        println!("Time spent on rendering      : {:.2?}", report.render_time);
        println!(
            "{} tasks, {} workers, {} samples per pixel",
            report.task_count, report.worker_count, report.samples_per_pixel
        );
    }

    Ok(())
}
