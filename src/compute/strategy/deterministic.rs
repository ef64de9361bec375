//! Deterministic strategy.
//!
//! 1. Sample the Fibonacci sphere and keep the K lowest volumes.
//! 2. Polish each of the K with a coarse local search.
//! 3. Refine the best polished point with a fine local search.

use crate::compute::{
    BestK, Cancelled, Candidate, FibonacciSphere, HookeJeeves, SearchContext, keep_best,
};
use crate::schema::DeterministicConfig;

use super::refine;

#[derive(Debug, Clone)]
pub struct Deterministic {
    config: DeterministicConfig,
}

impl Deterministic {
    pub fn new(config: DeterministicConfig) -> Self {
        Self { config }
    }

    pub fn run(&mut self, ctx: &mut SearchContext) -> Result<Candidate, Cancelled> {
        let best_k = self.select_candidates(ctx)?;

        log::info!("Optimizing best {} candidates", best_k.len());
        let mut best = None;
        for (i, candidate) in best_k.into_worst_first().enumerate() {
            ctx.reposition(&candidate)?;
            let polished = HookeJeeves::new(ctx, self.config.coarse).optimize()?;
            log::debug!(
                "Candidate {i}: volume {} -> {}",
                candidate.volume,
                polished.volume
            );
            best = keep_best(best, polished);
        }

        refine(ctx, best, self.config.fine)
    }

    fn select_candidates(&self, ctx: &mut SearchContext) -> Result<BestK, Cancelled> {
        let sphere = FibonacciSphere::new(self.config.n);
        log::info!(
            "Finding best {} of {} candidates",
            self.config.k,
            sphere.len()
        );

        let mut best_k = BestK::new(self.config.k);
        let mut status = Ok(());
        sphere.for_each_until(|point| {
            status = ctx
                .request_position(point, false)
                .map(|result| {
                    best_k.offer(result);
                });
            status.is_ok()
        });
        status?;

        Ok(best_k)
    }
}
