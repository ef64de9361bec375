//! Search context - the request surface strategies and the local optimizer use.

use std::sync::Arc;

use nalgebra::Vector3;

use super::channel::{Cancelled, EvaluatorChannel};
use super::orientation::{Candidate, EvaluationResult, Move, Orientation};

/// Wraps an [`EvaluatorChannel`] with the last answer the evaluator gave.
///
/// After a successful request `current()` is exactly that request's result.
/// After [`Cancelled`] its value is unspecified and must not be used.
#[derive(Debug)]
pub struct SearchContext {
    channel: Arc<EvaluatorChannel>,
    current: Candidate,
    requests: u64,
}

impl SearchContext {
    pub fn new(channel: Arc<EvaluatorChannel>) -> Self {
        Self {
            channel,
            current: Candidate::new(f32::MAX, Orientation::identity()),
            requests: 0,
        }
    }

    pub fn request_orientation(
        &mut self,
        orientation: Orientation,
        skip_recompute: bool,
    ) -> Result<EvaluationResult, Cancelled> {
        let result = self
            .channel
            .request_orientation(orientation, skip_recompute)?;
        Ok(self.record(result))
    }

    pub fn request_position(
        &mut self,
        position: Vector3<f32>,
        skip_recompute: bool,
    ) -> Result<EvaluationResult, Cancelled> {
        let result = self.channel.request_position(position, skip_recompute)?;
        Ok(self.record(result))
    }

    pub fn request_move(
        &mut self,
        delta: Move,
        skip_recompute: bool,
    ) -> Result<EvaluationResult, Cancelled> {
        let result = self.channel.request_move(delta, skip_recompute)?;
        Ok(self.record(result))
    }

    /// Reposition the evaluator onto a known candidate without re-evaluating,
    /// then adopt the candidate's volume as current.
    pub fn reposition(&mut self, candidate: &Candidate) -> Result<(), Cancelled> {
        self.request_orientation(candidate.orientation, true)?;
        self.current = *candidate;
        Ok(())
    }

    fn record(&mut self, result: EvaluationResult) -> EvaluationResult {
        self.current = result;
        self.requests += 1;
        result
    }

    pub fn current(&self) -> Candidate {
        self.current
    }

    pub fn current_volume(&self) -> f32 {
        self.current.volume
    }

    pub fn current_orientation(&self) -> Orientation {
        self.current.orientation
    }

    /// Number of answered requests.
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    /// Publish the final result.
    pub fn finish(&self, best: Candidate) {
        self.channel.finish(best);
    }
}
