use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use thiserror::Error;

use crate::geometry::ScreenSize;
use crate::renderer::{SampleBuffer, Tile};
use crate::util::color_to_image;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

/// Accumulates finished tile samples into a final image representation.
///
/// Workers call `write_tile` concurrently; tiles are pairwise disjoint by
/// construction, so a sink only has to be safe for concurrent writes to
/// non-overlapping pixel regions.
pub trait OutputSink: Send + Sync {
    /// Sizes the sink's backing storage. Called once per render, before any
    /// tasks are generated.
    fn set_image_size(&self, size: ScreenSize);

    /// Runs before workers start.
    fn pre_process(&self) {}

    /// Accepts the samples of one finished tile.
    fn write_tile(&self, tile: Tile, samples: &SampleBuffer);

    /// Runs after all workers finished.
    fn post_process(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Arc<S> {
    fn set_image_size(&self, size: ScreenSize) {
        (**self).set_image_size(size)
    }

    fn pre_process(&self) {
        (**self).pre_process()
    }

    fn write_tile(&self, tile: Tile, samples: &SampleBuffer) {
        (**self).write_tile(tile, samples)
    }

    fn post_process(&self) -> Result<(), SinkError> {
        (**self).post_process()
    }
}

/// In-memory sink resolving samples into an RGBA framebuffer.
pub struct FramebufferSink {
    image: Mutex<RgbaImage>,
}

impl FramebufferSink {
    pub fn new() -> FramebufferSink {
        FramebufferSink {
            image: Mutex::new(RgbaImage::new(0, 0)),
        }
    }

    pub fn image(&self) -> &Mutex<RgbaImage> {
        &self.image
    }
}

impl Default for FramebufferSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for FramebufferSink {
    fn set_image_size(&self, size: ScreenSize) {
        *self.image.lock().expect("Poisoned lock!") = RgbaImage::new(size.x, size.y);
    }

    fn write_tile(&self, tile: Tile, samples: &SampleBuffer) {
        let mut image = self.image.lock().expect("Poisoned lock!");
        for (x, y) in tile.pixels() {
            let resolved = samples.resolve(x - tile.x, y - tile.y);
            image.put_pixel(x, y, color_to_image(resolved));
        }
    }
}

/// Sink that resolves into a framebuffer and saves it to disk when the
/// render finishes. The format follows the file extension.
pub struct ImageFileSink {
    path: PathBuf,
    framebuffer: FramebufferSink,
}

impl ImageFileSink {
    pub fn new(path: impl Into<PathBuf>) -> ImageFileSink {
        ImageFileSink {
            path: path.into(),
            framebuffer: FramebufferSink::new(),
        }
    }
}

impl OutputSink for ImageFileSink {
    fn set_image_size(&self, size: ScreenSize) {
        self.framebuffer.set_image_size(size);
    }

    fn write_tile(&self, tile: Tile, samples: &SampleBuffer) {
        self.framebuffer.write_tile(tile, samples);
    }

    fn post_process(&self) -> Result<(), SinkError> {
        self.framebuffer
            .image()
            .lock()
            .expect("Poisoned lock!")
            .save(&self.path)?;
        log::info!("wrote {}", self.path.display());
        Ok(())
    }
}
