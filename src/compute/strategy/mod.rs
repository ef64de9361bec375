//! Search strategies and their dispatch.
//!
//! Every strategy drives a [`SearchContext`] to completion and returns its
//! best candidate, or [`Cancelled`] the moment any request is cancelled.
//! Only [`run_search`] publishes a result, and only for completed runs.

mod deterministic;
mod monte_carlo;
mod probe;
mod uniform_points;

use std::sync::Arc;
use std::time::Instant;

pub use deterministic::Deterministic;
pub use monte_carlo::{DirectionSampler, MonteCarlo};
pub use probe::Probe;
pub use uniform_points::UniformPoints;

use crate::schema::{LocalSearchParams, SearchAlgorithm, StrategyKind};

use super::{Cancelled, Candidate, EvaluatorChannel, HookeJeeves, SearchContext};

/// Run the selected strategy on `ctx` without publishing.
pub fn run_strategy(
    ctx: &mut SearchContext,
    algorithm: &SearchAlgorithm,
) -> Result<Candidate, Cancelled> {
    match algorithm {
        SearchAlgorithm::Probe(cfg) => Probe::new(cfg.clone()).run(ctx),
        SearchAlgorithm::UniformPoints(cfg) => UniformPoints::new(cfg.clone()).run(ctx),
        SearchAlgorithm::Deterministic(cfg) => Deterministic::new(cfg.clone()).run(ctx),
        SearchAlgorithm::MonteCarlo(cfg) => MonteCarlo::new(cfg.clone()).run(ctx),
    }
}

/// Search-thread entry point: run to completion and publish via `finish`.
///
/// Returns the published result, or `None` if the run was cancelled.
pub fn run_search(
    channel: Arc<EvaluatorChannel>,
    algorithm: &SearchAlgorithm,
) -> Option<Candidate> {
    let kind = algorithm.kind();
    let start = Instant::now();
    let mut ctx = SearchContext::new(channel);
    log::info!("Starting {kind} search");

    match run_strategy(&mut ctx, algorithm) {
        Ok(best) => {
            log::info!(
                "{kind} search finished: volume {} after {} requests in {:.2}s",
                best.volume,
                ctx.request_count(),
                start.elapsed().as_secs_f32()
            );
            ctx.finish(best);
            Some(best)
        }
        Err(Cancelled) => {
            log::info!(
                "{kind} search cancelled after {} requests",
                ctx.request_count()
            );
            None
        }
    }
}

/// Like [`run_search`], selecting default parameters by identifier.
/// Unknown identifiers do nothing.
pub fn run_search_by_id(channel: Arc<EvaluatorChannel>, strategy_id: &str) -> Option<Candidate> {
    match strategy_id.parse::<StrategyKind>() {
        Ok(kind) => run_search(channel, &SearchAlgorithm::from_kind(kind)),
        Err(err) => {
            log::warn!("{err}; nothing to run");
            None
        }
    }
}

/// Reposition onto the best polished point and run the fine local search.
fn refine(
    ctx: &mut SearchContext,
    best: Option<Candidate>,
    params: LocalSearchParams,
) -> Result<Candidate, Cancelled> {
    match best {
        Some(best) => {
            log::info!("Optimizing best candidate (volume {})", best.volume);
            ctx.reposition(&best)?;
        }
        None => log::warn!("No candidates to refine, starting from the current pose"),
    }
    HookeJeeves::new(ctx, params).optimize()
}
