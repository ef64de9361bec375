//! Hooke–Jeeves pattern search over the two move axes.
//!
//! Exploration probes each axis with `±delta` from the current point and keeps
//! strict improvements. When exploration beats the base point, the search
//! jumps again along the same direction (pattern move) and explores from
//! there, for as long as that keeps improving. Otherwise the step is halved
//! until it drops to the tolerance.

use serde::{Deserialize, Serialize};

use crate::schema::LocalSearchParams;

use super::channel::Cancelled;
use super::context::SearchContext;
use super::orientation::{Candidate, Move, Orientation};

/// Why a local search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalStopReason {
    /// Step size fell to the tolerance.
    Converged,
    /// Exploration pass limit reached.
    StepLimit,
}

/// Counters for one local search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalSearchStats {
    /// Exploration passes (each probes both axes).
    pub explorations: usize,
    /// Pattern moves issued.
    pub pattern_moves: usize,
    /// Times the step was halved.
    pub step_reductions: usize,
    /// Base volume after every base update, starting volume first.
    pub base_volumes: Vec<f32>,
    pub stop_reason: Option<LocalStopReason>,
}

/// Pattern search driven through a [`SearchContext`].
///
/// Starts from the context's current result.
pub struct HookeJeeves<'a> {
    ctx: &'a mut SearchContext,
    params: LocalSearchParams,
    delta: f32,
    base: Candidate,
    current: Candidate,
    direction: Move,
    stats: LocalSearchStats,
}

impl<'a> HookeJeeves<'a> {
    pub fn new(ctx: &'a mut SearchContext, params: LocalSearchParams) -> Self {
        let start = ctx.current();
        Self {
            ctx,
            params,
            delta: params.delta_start,
            base: start,
            current: start,
            direction: Move::zeros(),
            stats: LocalSearchStats {
                base_volumes: vec![start.volume],
                ..Default::default()
            },
        }
    }

    pub fn best(&self) -> Candidate {
        self.base
    }

    pub fn best_volume(&self) -> f32 {
        self.base.volume
    }

    pub fn best_orientation(&self) -> Orientation {
        self.base.orientation
    }

    pub fn stats(&self) -> &LocalSearchStats {
        &self.stats
    }

    /// Current exploration step.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    fn exhausted(&self) -> bool {
        self.stats.explorations >= self.params.max_steps
    }

    /// Run to convergence. Returns the best point, or [`Cancelled`] as soon
    /// as any request is cancelled.
    pub fn optimize(&mut self) -> Result<Candidate, Cancelled> {
        let reason = loop {
            if self.exhausted() {
                break LocalStopReason::StepLimit;
            }

            self.base = self.ctx.request_orientation(self.base.orientation, false)?;
            self.current = self.base;
            self.explore()?;

            if self.current.improves_on(&self.base) {
                if !self.pattern_phase()? {
                    break LocalStopReason::StepLimit;
                }
                continue;
            }

            self.delta *= 0.5;
            self.stats.step_reductions += 1;
            log::debug!("Step reduced to {}", self.delta);
            if self.delta <= self.params.delta_end {
                break LocalStopReason::Converged;
            }
        };

        // Leave the evaluator on the best point.
        self.base = self.ctx.request_orientation(self.base.orientation, false)?;

        log::debug!(
            "Local search {:?}: volume {} after {} explorations, {} pattern moves",
            reason,
            self.base.volume,
            self.stats.explorations,
            self.stats.pattern_moves
        );
        self.stats.stop_reason = Some(reason);
        Ok(self.base)
    }

    /// Repeat pattern moves while exploration keeps beating the base.
    ///
    /// Returns `false` when the exploration budget ran out.
    fn pattern_phase(&mut self) -> Result<bool, Cancelled> {
        loop {
            self.base = self.current;
            self.stats.base_volumes.push(self.base.volume);

            self.current = self.ctx.request_move(self.direction, false)?;
            self.stats.pattern_moves += 1;

            if self.exhausted() {
                return Ok(false);
            }
            self.explore()?;

            if !self.current.improves_on(&self.base) {
                return Ok(true);
            }
        }
    }

    fn explore(&mut self) -> Result<(), Cancelled> {
        self.stats.explorations += 1;
        self.direction = Move::zeros();
        for axis in 0..2 {
            self.explore_axis(axis)?;
        }
        Ok(())
    }

    fn explore_axis(&mut self, axis: usize) -> Result<(), Cancelled> {
        for sign in [1.0, -1.0] {
            let mut step = Move::zeros();
            step[axis] = sign * self.delta;

            let probe = self.ctx.request_move(step, false)?;
            if probe.improves_on(&self.current) {
                self.current = probe;
                self.direction[axis] = step[axis];
                return Ok(());
            }

            self.ctx.request_orientation(self.current.orientation, true)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::testing::{position_target_evaluator, with_evaluator};
    use crate::compute::{EvaluatorChannel, VolumeEvaluator};
    use nalgebra::Vector3;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn target() -> Vector3<f32> {
        Vector3::new(0.3, -0.4, 0.85).normalize()
    }

    fn params(delta_start: f32, delta_end: f32, max_steps: usize) -> LocalSearchParams {
        LocalSearchParams {
            delta_start,
            delta_end,
            max_steps,
        }
    }

    #[test]
    fn test_converges_on_quadratic() {
        let ((best, stats), _) = with_evaluator(position_target_evaluator(target()), |ctx| {
            ctx.request_orientation(Orientation::identity(), false).unwrap();
            let mut hj = HookeJeeves::new(ctx, params(0.1, 1e-4, 10_000));
            let best = hj.optimize().unwrap();
            assert_eq!(hj.best(), best);
            (best, hj.stats().clone())
        });

        assert_eq!(stats.stop_reason, Some(LocalStopReason::Converged));
        assert!(best.volume < 1e-4, "volume {}", best.volume);
        let angle = best.orientation.position().angle(&target());
        assert!(angle < 1e-2, "angle {angle}");
    }

    #[test]
    fn test_base_volume_never_increases() {
        let (stats, _) = with_evaluator(position_target_evaluator(target()), |ctx| {
            ctx.request_position(Vector3::new(-0.2, 0.5, 0.6), false).unwrap();
            let mut hj = HookeJeeves::new(ctx, LocalSearchParams::coarse());
            hj.optimize().unwrap();
            hj.stats().clone()
        });

        assert!(stats.pattern_moves > 0);
        assert!(stats.base_volumes.len() > 1);
        assert!(
            stats.base_volumes.windows(2).all(|w| w[1] <= w[0]),
            "{:?}",
            stats.base_volumes
        );
    }

    #[test]
    fn test_constant_volume_request_schedule() {
        let ((best, stats, requests), evaluations) = with_evaluator(|_: &Orientation| 7.0, |ctx| {
            ctx.request_orientation(Orientation::identity(), false).unwrap();
            let before = ctx.request_count();
            let mut hj = HookeJeeves::new(ctx, params(0.1, 0.03, 100));
            let best = hj.optimize().unwrap();
            let stats = hj.stats().clone();
            (best, stats, ctx.request_count() - before)
        });

        // 0.1 -> 0.05 -> 0.025: two passes of (reset + 2 axes x 4) plus the final resync.
        assert_eq!(stats.explorations, 2);
        assert_eq!(stats.step_reductions, 2);
        assert_eq!(stats.pattern_moves, 0);
        assert_eq!(requests, 19);
        assert_eq!(best, Candidate::new(7.0, Orientation::identity()));
        // Reverts are repositions, not evaluations.
        assert_eq!(evaluations, 1 + 2 * (1 + 4) + 1);
    }

    #[test]
    fn test_step_limit() {
        let (stats, _) = with_evaluator(position_target_evaluator(target()), |ctx| {
            ctx.request_orientation(Orientation::identity(), false).unwrap();
            let mut hj = HookeJeeves::new(ctx, params(0.001, 1e-9, 3));
            hj.optimize().unwrap();
            hj.stats().clone()
        });

        assert_eq!(stats.stop_reason, Some(LocalStopReason::StepLimit));
        assert!(stats.explorations <= 3);
    }

    #[test]
    fn test_zero_step_budget_returns_evaluated_point() {
        let ((best, stats), evaluations) = with_evaluator(|_: &Orientation| 3.0, |ctx| {
            let mut hj = HookeJeeves::new(ctx, params(0.1, 0.03, 0));
            let best = hj.optimize().unwrap();
            (best, hj.stats().clone())
        });

        assert_eq!(stats.stop_reason, Some(LocalStopReason::StepLimit));
        assert_eq!(best.volume, 3.0);
        assert_eq!(evaluations, 1);
    }

    #[test]
    fn test_cancellation_aborts() {
        let channel = Arc::new(EvaluatorChannel::new());
        let evaluations = Arc::new(AtomicUsize::new(0));

        let evaluator = {
            let channel = Arc::clone(&channel);
            let evaluations = Arc::clone(&evaluations);
            let mut inner = position_target_evaluator(target());
            move |o: &Orientation| {
                if evaluations.fetch_add(1, Ordering::SeqCst) == 20 {
                    channel.shutdown();
                }
                inner.evaluate(o)
            }
        };

        let service = {
            let channel = Arc::clone(&channel);
            std::thread::spawn(move || {
                crate::compute::EvaluatorService::new(evaluator).serve(&channel)
            })
        };

        let mut ctx = crate::compute::SearchContext::new(Arc::clone(&channel));
        ctx.request_orientation(Orientation::identity(), false).unwrap();
        let result = HookeJeeves::new(&mut ctx, LocalSearchParams::fine()).optimize();

        assert_eq!(result, Err(Cancelled));
        assert_eq!(service.join().unwrap(), None);
        assert_eq!(evaluations.load(Ordering::SeqCst), 21);
    }
}
