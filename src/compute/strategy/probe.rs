//! Probe strategy - repeats one move to exercise an evaluator pipeline.

use crate::compute::{Cancelled, Candidate, Move, SearchContext};
use crate::schema::ProbeConfig;

/// Issues the configured move on every request and remembers the best pose.
///
/// Always issues at least one request. Without `max_requests` it only stops
/// when the channel is cancelled.
#[derive(Debug, Clone)]
pub struct Probe {
    config: ProbeConfig,
}

impl Probe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn run(&mut self, ctx: &mut SearchContext) -> Result<Candidate, Cancelled> {
        let step = Move::new(self.config.step[0], self.config.step[1]);

        let mut best = ctx.request_move(step, false)?;
        let mut requests = 1usize;

        while self
            .config
            .max_requests
            .is_none_or(|limit| requests < limit)
        {
            let result = ctx.request_move(step, false)?;
            log::trace!("Probe {requests}: volume {}", result.volume);
            best = best.min_volume(result);
            requests += 1;
        }

        Ok(best)
    }
}
