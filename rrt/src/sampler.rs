use rand::prelude::*;
use statrs::distribution::Normal;

use crate::error::SamplerError;
use crate::point::Point;

/// Source of candidate points for the planner. The planner asks for one point around `base` per
/// iteration, with `spread` controlling how far from `base` it should usually land.
pub trait Sampler {
    fn sample(&mut self, base: &Point, spread: f32) -> Result<Point, SamplerError>;
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    #[inline(always)]
    fn sample(&mut self, base: &Point, spread: f32) -> Result<Point, SamplerError> {
        (**self).sample(base, spread)
    }
}

/// Draws both coordinates independently from a normal distribution centered at `base`, using
/// `spread` as the standard deviation.
#[derive(Debug, Clone)]
pub struct GaussianSampler<R = StdRng> {
    rng: R,
}

impl GaussianSampler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        GaussianSampler::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GaussianSampler<R> {
    pub fn new(rng: R) -> Self {
        GaussianSampler { rng }
    }
}

impl<R: Rng> Sampler for GaussianSampler<R> {
    fn sample(&mut self, base: &Point, spread: f32) -> Result<Point, SamplerError> {
        if !spread.is_finite() || spread < 0.0 {
            return Err(SamplerError::InvalidSpread(spread));
        }
        // A normal distribution needs a positive deviation. With no spread every draw is the mean.
        if spread == 0.0 {
            return Ok(*base);
        }

        let mut draw = |mean: f32| -> Result<f32, SamplerError> {
            let normal = Normal::new(mean as f64, spread as f64)
                .map_err(|_| SamplerError::InvalidSpread(spread))?;
            Ok(normal.sample(&mut self.rng) as f32)
        };

        Ok(Point::new(draw(base.x)?, draw(base.y)?))
    }
}
