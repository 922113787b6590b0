use rand::{SeedableRng, rngs::SmallRng};
use rand_distr::Distribution as _;
use thiserror::Error;

use crate::{
    arena::Arena,
    camera::Camera,
    geometry::{FloatType, HitRecord, Ray, WorldVector},
    renderer::{PixelSample, SampleBuffer, Tile},
    sampler::{SampleOffset, Sampler},
    scene::{Object, Scene},
    util::Rgba,
};

/// Shared read-mostly inputs of a render, borrowed by every worker.
#[derive(Copy, Clone)]
pub struct RenderView<'a, O: Object> {
    pub scene: &'a Scene<O>,
    pub camera: &'a Camera,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegratorError {
    #[error("integrator setup failed: {0}")]
    Setup(String),
}

/// The rendering algorithm. Each worker owns a private instance, so
/// implementations may keep mutable state (RNG, statistics, scratch) without
/// synchronization.
pub trait Integrator<O: Object>: Send {
    /// One-time per-worker setup. Runs on the driver thread before the worker
    /// spawns; a failure aborts the render before any thread starts.
    fn pre_process(&mut self, scene: &Scene<O>) -> Result<(), IntegratorError>;

    /// Computes radiance samples for every pixel of `tile` into `out`.
    fn render_tile(
        &mut self,
        view: RenderView<'_, O>,
        tile: Tile,
        sampler: &mut dyn Sampler,
        arena: &mut Arena,
        out: &mut SampleBuffer,
    );
}

/// Shades hit points by the absolute cosine between ray and surface normal.
pub struct NormalShading {
    rng: SmallRng,
}

impl NormalShading {
    pub fn new() -> NormalShading {
        NormalShading {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl Default for NormalShading {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Object> Integrator<O> for NormalShading {
    fn pre_process(&mut self, _scene: &Scene<O>) -> Result<(), IntegratorError> {
        Ok(())
    }

    fn render_tile(
        &mut self,
        view: RenderView<'_, O>,
        tile: Tile,
        sampler: &mut dyn Sampler,
        arena: &mut Arena,
        out: &mut SampleBuffer,
    ) {
        let spp = out.samples_per_pixel() as usize;
        for (x, y) in tile.pixels() {
            let offsets: &mut [SampleOffset] = arena.alloc_slice(spp);
            sampler.fill_samples(offsets);

            let slot = out.pixel_samples_mut(x - tile.x, y - tile.y);
            for (offset, sample) in offsets.iter().zip(slot) {
                let film_u = x as f32 + offset.u;
                let film_v = y as f32 + offset.v;
                let ray = view.camera.sample_ray(film_u, film_v, &mut self.rng);

                let radiance = match view.scene.object.intersect(&ray) {
                    Some(hit) => {
                        let dot = ray.direction.dot(&hit.normal).abs();
                        Rgba::new(dot, dot, dot, 1.0)
                    }
                    None => Rgba::new(0.0, 0.0, 0.0, 0.0),
                };

                *sample = PixelSample {
                    img_x: film_u,
                    img_y: film_v,
                    radiance,
                };
            }
        }
    }
}

/// Shades hit points by hemisphere visibility within a fixed radius.
pub struct AmbientOcclusion {
    rng: SmallRng,
    occlusion_rays: u32,
    max_distance: FloatType,
}

impl AmbientOcclusion {
    pub fn new() -> AmbientOcclusion {
        Self::with_params(8, 5.0)
    }

    pub fn with_params(occlusion_rays: u32, max_distance: FloatType) -> AmbientOcclusion {
        AmbientOcclusion {
            rng: SmallRng::from_os_rng(),
            occlusion_rays,
            max_distance,
        }
    }

    /// Uniform hemisphere direction around the hit normal.
    fn hemisphere_direction(&mut self, hit: &HitRecord) -> WorldVector {
        let point: [f32; 3] = rand_distr::UnitSphere.sample(&mut self.rng);
        let direction = WorldVector::new(point[0], point[1], point[2]);
        if direction.dot(&hit.normal) < 0.0 {
            -direction
        } else {
            direction
        }
    }

    fn visibility<O: Object>(&mut self, scene: &Scene<O>, hit: &HitRecord) -> FloatType {
        const SHADOW_BIAS: FloatType = 1e-3;

        let mut unoccluded = 0;
        for _ in 0..self.occlusion_rays {
            let direction = self.hemisphere_direction(hit);
            let shadow_ray = Ray::new(
                hit.point + hit.normal.as_ref() * SHADOW_BIAS,
                direction,
            );
            let occluded = scene
                .object
                .intersect(&shadow_ray)
                .is_some_and(|occluder| occluder.t < self.max_distance);
            if !occluded {
                unoccluded += 1;
            }
        }
        unoccluded as FloatType / self.occlusion_rays as FloatType
    }
}

impl Default for AmbientOcclusion {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Object> Integrator<O> for AmbientOcclusion {
    fn pre_process(&mut self, _scene: &Scene<O>) -> Result<(), IntegratorError> {
        if self.occlusion_rays == 0 {
            return Err(IntegratorError::Setup(
                "ambient occlusion needs at least one occlusion ray".to_string(),
            ));
        }
        if self.max_distance <= 0.0 {
            return Err(IntegratorError::Setup(
                "ambient occlusion distance must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn render_tile(
        &mut self,
        view: RenderView<'_, O>,
        tile: Tile,
        sampler: &mut dyn Sampler,
        arena: &mut Arena,
        out: &mut SampleBuffer,
    ) {
        let spp = out.samples_per_pixel() as usize;
        for (x, y) in tile.pixels() {
            let offsets: &mut [SampleOffset] = arena.alloc_slice(spp);
            sampler.fill_samples(offsets);

            let slot = out.pixel_samples_mut(x - tile.x, y - tile.y);
            for (offset, sample) in offsets.iter().zip(slot) {
                let film_u = x as f32 + offset.u;
                let film_v = y as f32 + offset.v;
                let ray = view.camera.sample_ray(film_u, film_v, &mut self.rng);

                let radiance = match view.scene.object.intersect(&ray) {
                    Some(mut hit) => {
                        // Occlusion is gathered on the ray-facing side.
                        if ray.direction.dot(&hit.normal) > 0.0 {
                            hit.normal = nalgebra::Unit::new_unchecked(-hit.normal.into_inner());
                        }
                        let visibility = self.visibility(view.scene, &hit);
                        Rgba::new(visibility, visibility, visibility, 1.0)
                    }
                    None => Rgba::new(0.0, 0.0, 0.0, 0.0),
                };

                *sample = PixelSample {
                    img_x: film_u,
                    img_y: film_v,
                    radiance,
                };
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no integrator with the name `{0}`")]
pub struct UnknownIntegrator(pub String);

/// The closed set of rendering algorithms the driver can instantiate.
///
/// Selecting by name yields a typed error for unknown names, so a failed
/// instantiation can never leak an invalid algorithm into the worker pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum IntegratorKind {
    #[default]
    NormalShading,
    AmbientOcclusion,
}

impl IntegratorKind {
    pub fn from_name(name: &str) -> Result<IntegratorKind, UnknownIntegrator> {
        match name {
            "normal" => Ok(IntegratorKind::NormalShading),
            "ao" | "ambient_occlusion" => Ok(IntegratorKind::AmbientOcclusion),
            _ => Err(UnknownIntegrator(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntegratorKind::NormalShading => "normal",
            IntegratorKind::AmbientOcclusion => "ao",
        }
    }

    /// A fresh private instance for one worker.
    pub fn instantiate<O: Object + 'static>(&self) -> Box<dyn Integrator<O>> {
        match self {
            IntegratorKind::NormalShading => Box::new(NormalShading::new()),
            IntegratorKind::AmbientOcclusion => Box::new(AmbientOcclusion::new()),
        }
    }
}
