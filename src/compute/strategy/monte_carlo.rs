//! Monte Carlo strategy - random restarts, each polished, then the winner
//! refined.

use std::f32::consts::TAU;

use nalgebra::Vector3;
use rand::prelude::*;
use rand_distr::Uniform;

use crate::compute::{Cancelled, Candidate, HookeJeeves, SearchContext, keep_best};
use crate::schema::MonteCarloConfig;

use super::refine;

/// Uniform sampler of unit directions: azimuth in `[0, 2π)`, polar angle
/// `acos(u)` with `u` uniform in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct DirectionSampler {
    azimuth: Uniform<f32>,
    cos_polar: Uniform<f32>,
}

impl Default for DirectionSampler {
    fn default() -> Self {
        Self {
            azimuth: Uniform::new(0.0, TAU),
            cos_polar: Uniform::new_inclusive(-1.0, 1.0),
        }
    }
}

impl DirectionSampler {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f32> {
        let theta = self.azimuth.sample(rng);
        let phi = self.cos_polar.sample(rng).acos();
        Vector3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
    }
}

pub struct MonteCarlo {
    config: MonteCarloConfig,
    rng: StdRng,
    sampler: DirectionSampler,
}

impl MonteCarlo {
    pub fn new(config: MonteCarloConfig) -> Self {
        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::debug!("Monte Carlo seed {seed}");
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            sampler: DirectionSampler::default(),
        }
    }

    pub fn run(&mut self, ctx: &mut SearchContext) -> Result<Candidate, Cancelled> {
        log::info!("Generating and optimizing {} random candidates", self.config.n);

        let mut best = None;
        for trial in 0..self.config.n {
            let direction = self.sampler.sample(&mut self.rng);
            let start = ctx.request_position(direction, false)?;

            let polished = HookeJeeves::new(ctx, self.config.coarse).optimize()?;
            log::debug!(
                "Trial {trial}: volume {} -> {}",
                start.volume,
                polished.volume
            );
            best = keep_best(best, polished);
        }

        refine(ctx, best, self.config.fine)
    }
}
