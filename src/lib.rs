mod arena;
mod camera;
pub mod geometry;
mod integrator;
mod output;
mod renderer;
mod sampler;
pub mod scene;
mod util;

pub use crate::arena::Arena;
pub use crate::camera::Camera;
pub use crate::integrator::{
    Integrator, IntegratorError, IntegratorKind, RenderView, UnknownIntegrator,
};
pub use crate::output::{FramebufferSink, ImageFileSink, OutputSink, SinkError};
pub use crate::renderer::{
    GridError, PixelSample, Progress, RenderDriver, RenderError, RenderReport, RenderSettings,
    RenderTask, SampleBuffer, SpiralOrder, TaskId, TaskTable, Tile, TileGrid, WorkerCount,
};
pub use crate::sampler::{
    RandomSampler, SampleOffset, Sampler, SamplerKind, StratifiedSampler, UnknownSampler,
};
pub use crate::util::Rgba;
pub use scene::Scene;
