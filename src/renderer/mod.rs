mod driver;
mod grid;
mod machinery;
mod spiral;
mod task;
mod worker;

use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

pub use driver::{RenderDriver, RenderError, RenderReport};
pub use grid::{GridError, Tile, TileGrid};
pub use machinery::Progress;
pub use spiral::SpiralOrder;
pub use task::{PixelSample, RenderTask, SampleBuffer, TaskId, TaskTable};

use crate::arena::DEFAULT_ARENA_CAPACITY;

/// Number of worker threads in the pool.
#[derive(Copy, Clone, Debug)]
pub enum WorkerCount {
    /// One worker per detected hardware thread.
    Auto,
    Manual(NonZeroUsize),
}

impl WorkerCount {
    pub fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get().max(1),
            WorkerCount::Manual(count) => count.get(),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub tile_size: NonZeroU32,
    /// Requested samples per pixel; the sampler rounds it to a count it can
    /// actually produce.
    pub sample_count: NonZeroU32,
    pub worker_count: WorkerCount,
    /// Scratch arena capacity per worker, in bytes.
    pub arena_capacity: usize,
    /// Progress monitor poll interval.
    pub poll_interval: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            tile_size: NonZeroU32::new(64).unwrap(),
            sample_count: NonZeroU32::new(16).unwrap(),
            worker_count: WorkerCount::Auto,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            poll_interval: Duration::from_millis(50),
        }
    }
}
