use bytemuck::{Pod, Zeroable};
use rand::{Rng as _, SeedableRng, rngs::SmallRng};
use thiserror::Error;

/// Largest per-pixel sample count a caller may request.
pub const MAX_SAMPLES_PER_PIXEL: u32 = 1024;

/// A single 2D sample position within a pixel, both coordinates in [0, 1).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SampleOffset {
    pub u: f32,
    pub v: f32,
}

/// Produces per-pixel sample sets for a rendering algorithm.
///
/// Each worker owns a private instance, so implementations are free to keep
/// mutable state (an RNG, scratch) without synchronization.
pub trait Sampler: Send {
    /// Rounds a requested per-pixel sample count to the closest count this
    /// sampler can actually produce. Deterministic and monotonically
    /// non-decreasing in `requested`.
    fn round_size(&self, requested: u32) -> u32;

    /// Fills `out` with one sample set. `out.len()` must be a count
    /// previously returned by `round_size`.
    fn fill_samples(&mut self, out: &mut [SampleOffset]);
}

/// Uniform independent samples.
pub struct RandomSampler {
    rng: SmallRng,
}

impl RandomSampler {
    pub fn new() -> RandomSampler {
        Self::with_rng(SmallRng::from_os_rng())
    }

    pub fn with_rng(rng: SmallRng) -> RandomSampler {
        RandomSampler { rng }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn round_size(&self, requested: u32) -> u32 {
        requested.clamp(1, MAX_SAMPLES_PER_PIXEL)
    }

    fn fill_samples(&mut self, out: &mut [SampleOffset]) {
        for offset in out {
            offset.u = self.rng.random_range(0.0..1.0);
            offset.v = self.rng.random_range(0.0..1.0);
        }
    }
}

/// Jittered stratified samples on a k×k sub-pixel grid.
pub struct StratifiedSampler {
    rng: SmallRng,
}

impl StratifiedSampler {
    pub fn new() -> StratifiedSampler {
        Self::with_rng(SmallRng::from_os_rng())
    }

    pub fn with_rng(rng: SmallRng) -> StratifiedSampler {
        StratifiedSampler { rng }
    }
}

impl Default for StratifiedSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for StratifiedSampler {
    /// Rounds to the nearest perfect square, at least 1.
    fn round_size(&self, requested: u32) -> u32 {
        let clamped = requested.clamp(1, MAX_SAMPLES_PER_PIXEL);
        let root = clamped.isqrt();
        let below = root * root;
        let above = (root + 1) * (root + 1);
        if clamped - below <= above - clamped {
            below
        } else {
            above
        }
    }

    fn fill_samples(&mut self, out: &mut [SampleOffset]) {
        let k = out.len().isqrt();
        debug_assert_eq!(k * k, out.len(), "stratified sample count must be square");

        // Rounding of (cell + jitter) / k can land exactly on 1.0; offsets
        // must stay inside the half-open pixel.
        const ALMOST_ONE: f32 = 1.0 - f32::EPSILON;

        let inv_k = 1.0 / k as f32;
        for (i, offset) in out.iter_mut().enumerate() {
            let cx = (i % k) as f32;
            let cy = (i / k) as f32;
            offset.u = ((cx + self.rng.random_range(0.0..1.0)) * inv_k).min(ALMOST_ONE);
            offset.v = ((cy + self.rng.random_range(0.0..1.0)) * inv_k).min(ALMOST_ONE);
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no sampler with the name `{0}`")]
pub struct UnknownSampler(pub String);

/// The closed set of sampler implementations the driver can instantiate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SamplerKind {
    Random,
    #[default]
    Stratified,
}

impl SamplerKind {
    pub fn from_name(name: &str) -> Result<SamplerKind, UnknownSampler> {
        match name {
            "random" => Ok(SamplerKind::Random),
            "stratified" => Ok(SamplerKind::Stratified),
            _ => Err(UnknownSampler(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SamplerKind::Random => "random",
            SamplerKind::Stratified => "stratified",
        }
    }

    pub fn instantiate(&self) -> Box<dyn Sampler> {
        match self {
            SamplerKind::Random => Box::new(RandomSampler::new()),
            SamplerKind::Stratified => Box::new(StratifiedSampler::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(SamplerKind::Random)]
    #[test_case(SamplerKind::Stratified)]
    fn round_size_is_monotone(kind: SamplerKind) {
        let sampler = kind.instantiate();
        let mut previous = 0;
        for requested in 0..=MAX_SAMPLES_PER_PIXEL + 8 {
            let rounded = sampler.round_size(requested);
            assert!(rounded >= previous, "requested {}", requested);
            assert!(rounded >= 1);
            previous = rounded;
        }
    }

    #[test_case(1 => 1)]
    #[test_case(2 => 1)]
    #[test_case(3 => 4)]
    #[test_case(16 => 16)]
    #[test_case(20 => 16)]
    #[test_case(24 => 25)]
    #[test_case(0 => 1)]
    #[test_case(100_000 => 1024)]
    fn stratified_rounds_to_a_square(requested: u32) -> u32 {
        StratifiedSampler::new().round_size(requested)
    }

    proptest! {
        #[test]
        fn offsets_stay_inside_the_pixel(seed in any::<u64>(), requested in 1..64u32) {
            for kind in [SamplerKind::Random, SamplerKind::Stratified] {
                let mut sampler: Box<dyn Sampler> = match kind {
                    SamplerKind::Random => {
                        Box::new(RandomSampler::with_rng(SmallRng::seed_from_u64(seed)))
                    }
                    SamplerKind::Stratified => {
                        Box::new(StratifiedSampler::with_rng(SmallRng::seed_from_u64(seed)))
                    }
                };
                let spp = sampler.round_size(requested);
                let mut out = vec![SampleOffset::default(); spp as usize];
                sampler.fill_samples(&mut out);
                for offset in &out {
                    prop_assert!((0.0..1.0).contains(&offset.u));
                    prop_assert!((0.0..1.0).contains(&offset.v));
                }
            }
        }

        /// Sample i stays inside stratum i of the sub-pixel grid, so every
        /// stratum gets exactly one sample.
        #[test]
        fn stratified_samples_are_stratified(seed in any::<u64>(), k in 1..8usize) {
            let mut sampler = StratifiedSampler::with_rng(SmallRng::seed_from_u64(seed));
            let mut out = vec![SampleOffset::default(); k * k];
            sampler.fill_samples(&mut out);

            for (i, offset) in out.iter().enumerate() {
                let cx = (i % k) as f32;
                let cy = (i / k) as f32;
                let inv_k = 1.0 / k as f32;
                prop_assert!(offset.u >= cx * inv_k && offset.u <= (cx + 1.0) * inv_k);
                prop_assert!(offset.v >= cy * inv_k && offset.v <= (cy + 1.0) * inv_k);
            }
        }
    }

    #[test]
    fn registry_resolves_known_names() {
        assert!(SamplerKind::from_name("random") == Ok(SamplerKind::Random));
        assert!(SamplerKind::from_name("stratified") == Ok(SamplerKind::Stratified));
        assert!(SamplerKind::from_name("sobol") == Err(UnknownSampler("sobol".to_string())));
    }
}
