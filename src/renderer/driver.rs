use std::time::{Duration, Instant};

use bon::bon;
use thiserror::Error;

use crate::{
    arena::Arena,
    camera::Camera,
    geometry::ScreenSize,
    integrator::{IntegratorError, IntegratorKind},
    output::{OutputSink, SinkError},
    sampler::SamplerKind,
    scene::{Object, Scene},
};

use super::grid::{GridError, TileGrid};
use super::machinery::{self, Progress, RenderState};
use super::task::TaskTable;
use super::worker::Worker;
use super::RenderSettings;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Integrator(#[from] IntegratorError),

    #[error("Failed to spawn worker thread: {0}")]
    SpawnWorker(#[source] std::io::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Wall-clock accounting of a finished render.
#[derive(Clone, Debug)]
pub struct RenderReport {
    pub pre_process_time: Duration,
    pub render_time: Duration,
    pub task_count: usize,
    pub samples_per_pixel: u32,
    pub worker_count: usize,
}

/// Orchestrates a full render: precondition checks, scene pre-processing,
/// task generation, worker pool execution, output sink hooks and timing.
pub struct RenderDriver<O: Object> {
    scene: Scene<O>,
    camera: Option<Camera>,
    render_target: Option<ScreenSize>,
    sinks: Vec<Box<dyn OutputSink>>,
    settings: RenderSettings,
    integrator: IntegratorKind,
    sampler: SamplerKind,
}

#[bon]
impl<O: Object + Sync> RenderDriver<O> {
    #[builder]
    pub fn new(
        scene: Scene<O>,
        camera: Option<Camera>,
        render_target: Option<ScreenSize>,
        #[builder(default)] sinks: Vec<Box<dyn OutputSink>>,
        #[builder(default)] settings: RenderSettings,
        #[builder(default)] integrator: IntegratorKind,
        #[builder(default)] sampler: SamplerKind,
    ) -> Self {
        RenderDriver {
            scene,
            camera,
            render_target,
            sinks,
            settings,
            integrator,
            sampler,
        }
    }
}

impl<O: Object + Sync + 'static> RenderDriver<O> {
    pub fn render(&mut self) -> Result<Option<RenderReport>, RenderError> {
        self.render_with(|_| {})
    }

    /// Runs the full render, reporting progress through the callback on every
    /// monitor poll.
    ///
    /// A missing render target or camera is a recoverable no-op: a warning is
    /// logged and `Ok(None)` returned without generating tasks or spawning
    /// threads. All other failures abort the render.
    pub fn render_with(
        &mut self,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<Option<RenderReport>, RenderError> {
        let Some(target) = self.render_target else {
            log::warn!("There is no render target configured, can't render anything.");
            return Ok(None);
        };
        let Some(camera) = self.camera else {
            log::warn!("There is no camera attached, can't render anything.");
            return Ok(None);
        };
        if camera.get_resolution() != target {
            log::warn!(
                "camera resolution {}x{} differs from the render target {}x{}",
                camera.get_resolution().x,
                camera.get_resolution().y,
                target.x,
                target.y,
            );
        }

        let preprocess_started = Instant::now();
        self.scene.pre_process();
        let pre_process_time = preprocess_started.elapsed();

        let render_started = Instant::now();

        let grid = TileGrid::new(target, self.settings.tile_size)?;
        let samples_per_pixel = self
            .sampler
            .instantiate()
            .round_size(self.settings.sample_count.get());
        let tasks = TaskTable::build(&grid, samples_per_pixel);
        let task_count = tasks.len();

        let worker_count = self.settings.worker_count.resolve();
        log::info!(
            "rendering {}x{} with {} ({} spp, {} tasks, {} workers, {} cores detected)",
            target.x,
            target.y,
            self.integrator.name(),
            samples_per_pixel,
            task_count,
            worker_count,
            num_cpus::get(),
        );

        for sink in &self.sinks {
            sink.set_image_size(target);
        }
        for sink in &self.sinks {
            sink.pre_process();
        }

        let state = RenderState::new(&self.scene, &camera, &self.sinks, tasks, worker_count);

        // Per-worker private state is fully prepared before any thread
        // starts; a failed integrator setup aborts the render here.
        let cores = core_affinity::get_core_ids().unwrap_or_default();
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let mut integrator = self.integrator.instantiate::<O>();
            integrator.pre_process(&self.scene)?;
            workers.push(Worker::new(
                id,
                cores.get(id % cores.len().max(1)).copied(),
                Arena::with_capacity(self.settings.arena_capacity),
                integrator,
                self.sampler.instantiate(),
            ));
        }

        machinery::execute(&state, workers, self.settings.poll_interval, &mut on_progress)?;
        drop(state);

        for sink in &self.sinks {
            sink.post_process()?;
        }

        let report = RenderReport {
            pre_process_time,
            render_time: render_started.elapsed(),
            task_count,
            samples_per_pixel,
            worker_count,
        };
        log::info!(
            "render finished in {:.2?} (pre-processing {:.2?})",
            report.render_time,
            report.pre_process_time,
        );
        Ok(Some(report))
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use assert2::assert;

    use super::*;
    use crate::{
        geometry::{WorldPoint, WorldVector},
        renderer::{SampleBuffer, Tile, WorkerCount},
        scene::primitives::Sphere,
    };

    /// Records every hook invocation for assertions.
    #[derive(Default)]
    struct CountingSink {
        size_calls: AtomicUsize,
        pre_calls: AtomicUsize,
        post_calls: AtomicUsize,
        tiles: Mutex<Vec<Tile>>,
    }

    impl OutputSink for CountingSink {
        fn set_image_size(&self, _size: ScreenSize) {
            self.size_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn pre_process(&self) {
            self.pre_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn write_tile(&self, tile: Tile, _samples: &SampleBuffer) {
            self.tiles.lock().unwrap().push(tile);
        }

        fn post_process(&self) -> Result<(), SinkError> {
            self.post_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn enclosing_sphere() -> Scene<Sphere> {
        Scene {
            object: Sphere {
                center: WorldPoint::new(0.0, 0.0, 0.0),
                radius: 100.0,
            },
        }
    }

    fn test_camera(resolution: ScreenSize) -> Camera {
        Camera::builder()
            .center(WorldPoint::new(0.0, 0.0, 0.0))
            .forward(WorldVector::new(0.0, 0.0, -1.0))
            .up(WorldVector::new(0.0, 1.0, 0.0))
            .resolution(resolution)
            .film_width(36e-3)
            .focal_length(50e-3)
            .f_number(f32::INFINITY)
            .focus_distance(10.0)
            .build()
    }

    fn test_settings(workers: usize) -> RenderSettings {
        RenderSettings {
            worker_count: WorkerCount::Manual(NonZeroUsize::new(workers).unwrap()),
            sample_count: 4.try_into().unwrap(),
            arena_capacity: 1 << 20,
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[test]
    fn missing_render_target_is_a_noop() {
        let sink = Arc::new(CountingSink::default());
        let mut driver = RenderDriver::builder()
            .scene(enclosing_sphere())
            .camera(test_camera(ScreenSize::new(128, 128)))
            .sinks(vec![Box::new(Arc::clone(&sink)) as Box<dyn OutputSink>])
            .build();

        let report = driver.render().unwrap();

        assert!(report.is_none());
        assert!(sink.size_calls.load(Ordering::SeqCst) == 0);
        assert!(sink.pre_calls.load(Ordering::SeqCst) == 0);
        assert!(sink.post_calls.load(Ordering::SeqCst) == 0);
        assert!(sink.tiles.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_camera_is_a_noop() {
        let sink = Arc::new(CountingSink::default());
        let mut driver = RenderDriver::builder()
            .scene(enclosing_sphere())
            .render_target(ScreenSize::new(128, 128))
            .sinks(vec![Box::new(Arc::clone(&sink)) as Box<dyn OutputSink>])
            .build();

        let report = driver.render().unwrap();

        assert!(report.is_none());
        assert!(sink.tiles.lock().unwrap().is_empty());
    }

    /// 128x128 with 64 pixel tiles and four workers: four tasks, all four
    /// completed, every sink hook called once.
    #[test]
    fn end_to_end_four_tiles() {
        let sink = Arc::new(CountingSink::default());
        let framebuffer = Arc::new(crate::output::FramebufferSink::new());
        let size = ScreenSize::new(128, 128);
        let mut driver = RenderDriver::builder()
            .scene(enclosing_sphere())
            .camera(test_camera(size))
            .render_target(size)
            .sinks(vec![
                Box::new(Arc::clone(&sink)) as Box<dyn OutputSink>,
                Box::new(Arc::clone(&framebuffer)) as Box<dyn OutputSink>,
            ])
            .settings(test_settings(4))
            .build();

        let mut last_progress = Progress {
            finished: 0,
            total: 0,
        };
        let report = driver
            .render_with(|progress| last_progress = progress)
            .unwrap()
            .expect("preconditions hold, the render must run");

        assert!(report.task_count == 4);
        assert!(report.worker_count == 4);
        assert!(report.samples_per_pixel == 4);

        assert!(last_progress == Progress { finished: 4, total: 4 });

        assert!(sink.size_calls.load(Ordering::SeqCst) == 1);
        assert!(sink.pre_calls.load(Ordering::SeqCst) == 1);
        assert!(sink.post_calls.load(Ordering::SeqCst) == 1);

        let mut origins: Vec<_> = sink
            .tiles
            .lock()
            .unwrap()
            .iter()
            .map(|tile| (tile.x, tile.y))
            .collect();
        origins.sort_unstable();
        assert!(origins == vec![(0, 0), (0, 64), (64, 0), (64, 64)]);

        // Inside the enclosing sphere every primary ray hits, so every
        // pixel of the resolved image is opaque.
        let image = framebuffer.image().lock().unwrap();
        assert!(image.dimensions() == (128, 128));
        assert!(image.pixels().all(|pixel| pixel.0[3] == 255));
    }

    #[test]
    fn ambient_occlusion_end_to_end() {
        let size = ScreenSize::new(64, 64);
        let framebuffer = Arc::new(crate::output::FramebufferSink::new());
        let mut driver = RenderDriver::builder()
            .scene(enclosing_sphere())
            .camera(test_camera(size))
            .render_target(size)
            .sinks(vec![Box::new(Arc::clone(&framebuffer)) as Box<dyn OutputSink>])
            .settings(test_settings(2))
            .integrator(IntegratorKind::AmbientOcclusion)
            .build();

        let report = driver.render().unwrap().unwrap();
        assert!(report.task_count == 1);

        let image = framebuffer.image().lock().unwrap();
        assert!(image.pixels().all(|pixel| pixel.0[3] == 255));
    }
}
