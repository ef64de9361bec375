//! Evaluator side of the channel.
//!
//! The expensive volume computation lives behind [`VolumeEvaluator`]. An
//! [`EvaluatorService`] owns the realized pose, turns channel requests into
//! orientations, and answers them one at a time.

use super::channel::{EvaluatorChannel, Request};
use super::orientation::{Candidate, EvaluationResult, Orientation};

/// Volume oracle: lower is better.
///
/// Must be safe to call repeatedly and deterministic for a fixed orientation
/// up to floating-point noise.
pub trait VolumeEvaluator {
    fn evaluate(&mut self, orientation: &Orientation) -> f32;
}

impl<F> VolumeEvaluator for F
where
    F: FnMut(&Orientation) -> f32,
{
    fn evaluate(&mut self, orientation: &Orientation) -> f32 {
        self(orientation)
    }
}

/// Services channel requests against a [`VolumeEvaluator`].
pub struct EvaluatorService<E> {
    evaluator: E,
    pose: Candidate,
    evaluations: u64,
    repositions: u64,
}

impl<E: VolumeEvaluator> EvaluatorService<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            pose: Candidate::new(f32::MAX, Orientation::identity()),
            evaluations: 0,
            repositions: 0,
        }
    }

    /// Pose and volume the evaluator currently holds.
    pub fn pose(&self) -> Candidate {
        self.pose
    }

    /// Number of real (non-skipped) evaluations.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Number of `skip_recompute` requests answered by echo.
    pub fn repositions(&self) -> u64 {
        self.repositions
    }

    pub fn into_inner(self) -> E {
        self.evaluator
    }

    /// Realize one request and return the answer to post.
    pub fn apply(&mut self, request: &Request) -> EvaluationResult {
        let orientation = match *request {
            Request::Orientation { orientation, .. } => orientation,
            Request::Position { position, .. } => Orientation::from_position(&position),
            Request::Move { delta, .. } => self.pose.orientation.apply_move(&delta),
            Request::Done(result) => return result,
        };

        let volume = if request.skip_recompute() {
            self.repositions += 1;
            self.pose.volume
        } else {
            self.evaluations += 1;
            self.evaluator.evaluate(&orientation)
        };

        self.pose = Candidate::new(volume, orientation);
        self.pose
    }

    /// Answer requests until the search finishes or the channel shuts down.
    ///
    /// Returns the published result, or `None` if the run was cancelled.
    pub fn serve(&mut self, channel: &EvaluatorChannel) -> Option<EvaluationResult> {
        while let Some(request) = channel.wait_for_request() {
            if let Request::Done(result) = request {
                log::debug!(
                    "Search finished after {} evaluations ({} repositions)",
                    self.evaluations,
                    self.repositions
                );
                return Some(result);
            }
            let answer = self.apply(&request);
            channel.notify_result(answer.volume, answer.orientation);
        }
        log::debug!("Evaluator released by shutdown");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{Move, SearchContext};
    use nalgebra::Vector3;
    use std::sync::Arc;
    use std::thread;

    fn height_evaluator(orientation: &Orientation) -> f32 {
        -orientation.position().z
    }

    #[test]
    fn test_apply_position_request() {
        let mut service = EvaluatorService::new(height_evaluator);
        let answer = service.apply(&Request::Position {
            position: Vector3::new(0.0, 0.6, 0.8),
            skip_recompute: false,
        });
        assert!((answer.volume + 0.8).abs() < 1e-5);
        assert!((answer.orientation.position() - Vector3::new(0.0, 0.6, 0.8)).norm() < 1e-5);
        assert_eq!(service.evaluations(), 1);
    }

    #[test]
    fn test_skip_recompute_echoes_volume() {
        let mut service = EvaluatorService::new(height_evaluator);
        let first = service.apply(&Request::Position {
            position: Vector3::z(),
            skip_recompute: false,
        });
        let moved = service.apply(&Request::Move {
            delta: Move::new(0.4, 0.0),
            skip_recompute: true,
        });
        assert_eq!(moved.volume, first.volume);
        assert!(moved.orientation.angle_to(&first.orientation) > 0.39);
        assert_eq!(service.evaluations(), 1);
        assert_eq!(service.repositions(), 1);
    }

    #[test]
    fn test_context_skip_move_keeps_volume() {
        let channel = Arc::new(EvaluatorChannel::new());
        let evaluator = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || EvaluatorService::new(height_evaluator).serve(&channel))
        };

        let mut ctx = SearchContext::new(Arc::clone(&channel));
        let start = ctx
            .request_position(Vector3::new(0.0, 0.6, 0.8), false)
            .unwrap();
        let moved = ctx.request_move(Move::new(0.0, 0.25), true).unwrap();

        assert_eq!(ctx.current_volume(), start.volume);
        assert_eq!(ctx.current_orientation(), moved.orientation);
        assert!(moved.orientation.angle_to(&start.orientation) > 0.2);

        // A real move re-evaluates from the new pose.
        let evaluated = ctx.request_move(Move::zeros(), false).unwrap();
        assert!((evaluated.volume - start.volume).abs() > 1e-3);
        assert_eq!(ctx.request_count(), 3);

        ctx.finish(evaluated);
        assert_eq!(evaluator.join().unwrap(), Some(evaluated));
    }

    #[test]
    fn test_context_reposition_adopts_candidate() {
        let channel = Arc::new(EvaluatorChannel::new());
        let evaluator = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                let mut service = EvaluatorService::new(height_evaluator);
                service.serve(&channel);
                service.evaluations()
            })
        };

        let mut ctx = SearchContext::new(Arc::clone(&channel));
        let target = Candidate::new(-5.0, Orientation::from_position(&Vector3::x()));
        ctx.reposition(&target).unwrap();
        assert_eq!(ctx.current(), target);

        channel.shutdown();
        assert_eq!(evaluator.join().unwrap(), 0);
    }

    #[test]
    fn test_serve_returns_none_on_shutdown() {
        let channel = Arc::new(EvaluatorChannel::new());
        let evaluator = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || EvaluatorService::new(|_: &Orientation| 1.0).serve(&channel))
        };
        channel.shutdown();
        assert_eq!(evaluator.join().unwrap(), None);
    }
}
