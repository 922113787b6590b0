use std::sync::Mutex;

use index_vec::IndexVec;

use crate::util::Rgba;

use super::grid::{Tile, TileGrid};
use super::spiral::SpiralOrder;

index_vec::define_index_type! {
    /// Task identifiers are assigned in spiral emission order, 0-based.
    pub struct TaskId = u32;
}

/// One radiance sample, positioned on the film in absolute pixel coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PixelSample {
    pub img_x: f32,
    pub img_y: f32,
    pub radiance: Rgba,
}

/// Sample storage for one task, `width × height × samples_per_pixel` entries.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    width: u32,
    height: u32,
    samples_per_pixel: u32,
    samples: Vec<PixelSample>,
}

impl SampleBuffer {
    pub fn new(width: u32, height: u32, samples_per_pixel: u32) -> SampleBuffer {
        let len = width as usize * height as usize * samples_per_pixel as usize;
        SampleBuffer {
            width,
            height,
            samples_per_pixel,
            samples: vec![PixelSample::default(); len],
        }
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn slot(&self, x: u32, y: u32) -> std::ops::Range<usize> {
        debug_assert!(x < self.width && y < self.height);
        let start =
            (y as usize * self.width as usize + x as usize) * self.samples_per_pixel as usize;
        start..start + self.samples_per_pixel as usize
    }

    /// The sample set of the pixel at tile-local coordinates (x, y).
    pub fn pixel_samples(&self, x: u32, y: u32) -> &[PixelSample] {
        &self.samples[self.slot(x, y)]
    }

    pub fn pixel_samples_mut(&mut self, x: u32, y: u32) -> &mut [PixelSample] {
        let slot = self.slot(x, y);
        &mut self.samples[slot]
    }

    /// Box-filter resolve of one pixel: the average of its samples.
    pub fn resolve(&self, x: u32, y: u32) -> Rgba {
        let samples = self.pixel_samples(x, y);
        let sum = samples
            .iter()
            .fold(Rgba::new(0.0, 0.0, 0.0, 0.0), |acc, sample| {
                acc + sample.radiance
            });
        sum * (1.0 / samples.len() as f32)
    }
}

/// One unit of render work: a tile plus its owned sample storage.
///
/// The buffer stays with the task until a worker claims it; the worker takes
/// it out exactly once, fills it, hands the samples to the output sinks and
/// then drops it. It is never handed out twice.
#[derive(Debug)]
pub struct RenderTask {
    pub id: TaskId,
    pub tile: Tile,
    buffer: Mutex<Option<SampleBuffer>>,
}

impl RenderTask {
    fn new(id: TaskId, tile: Tile, samples_per_pixel: u32) -> RenderTask {
        RenderTask {
            id,
            tile,
            buffer: Mutex::new(Some(SampleBuffer::new(
                tile.width,
                tile.height,
                samples_per_pixel,
            ))),
        }
    }

    /// Transfers ownership of the sample buffer to the claiming worker.
    pub fn take_buffer(&self) -> SampleBuffer {
        self.buffer
            .lock()
            .expect("Poisoned lock!")
            .take()
            .expect("Task buffer taken twice; tasks are claimed at most once")
    }
}

/// The immutable, ordered work list for one render invocation.
#[derive(Debug)]
pub struct TaskTable {
    tasks: IndexVec<TaskId, RenderTask>,
}

impl TaskTable {
    /// Materializes the grid's spiral order into concrete render tasks.
    /// A single sequential pass; ids follow emission order.
    pub fn build(grid: &TileGrid, samples_per_pixel: u32) -> TaskTable {
        let mut tasks = IndexVec::with_capacity(grid.cell_count() as usize);
        for (cx, cy) in SpiralOrder::new(grid) {
            let id = tasks.next_idx();
            tasks.push(RenderTask::new(id, grid.tile(cx, cy), samples_per_pixel));
        }

        TaskTable { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> &RenderTask {
        &self.tasks[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderTask> {
        self.tasks.iter()
    }
}
