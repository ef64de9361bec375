//! Uniform points strategy - best Fibonacci sphere sample, no refinement.

use crate::compute::{Cancelled, Candidate, FibonacciSphere, SearchContext};
use crate::schema::UniformPointsConfig;

#[derive(Debug, Clone)]
pub struct UniformPoints {
    config: UniformPointsConfig,
}

impl UniformPoints {
    pub fn new(config: UniformPointsConfig) -> Self {
        Self { config }
    }

    pub fn run(&mut self, ctx: &mut SearchContext) -> Result<Candidate, Cancelled> {
        let sphere = FibonacciSphere::new(self.config.n);
        log::info!("Sampling {} uniform points", sphere.len());

        // The sphere always holds at least one point.
        let mut best = ctx.request_position(sphere.first(), false)?;
        for point in sphere.iter().skip(1) {
            let result = ctx.request_position(point, false)?;
            log::debug!(
                "Volume at ({:.3}, {:.3}, {:.3}): {}",
                point.x,
                point.y,
                point.z,
                result.volume
            );
            best = best.min_volume(result);
        }

        Ok(best)
    }
}
