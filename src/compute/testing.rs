//! Test helpers: synthetic evaluators and a channel harness.

use std::sync::Arc;
use std::thread;

use nalgebra::Vector3;

use super::{EvaluatorChannel, EvaluatorService, Orientation, SearchContext, VolumeEvaluator};

/// Squared distance between the sphere position and `target`.
pub fn position_target_evaluator(
    target: Vector3<f32>,
) -> impl FnMut(&Orientation) -> f32 + Send + 'static {
    move |orientation: &Orientation| (orientation.position() - target).norm_squared()
}

/// Run `search` on this thread against `evaluator` serviced on another.
///
/// Returns the search's value and the number of real evaluations.
pub fn with_evaluator<E, R, F>(evaluator: E, search: F) -> (R, u64)
where
    E: VolumeEvaluator + Send + 'static,
    F: FnOnce(&mut SearchContext) -> R,
{
    let channel = Arc::new(EvaluatorChannel::new());
    let service = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            let mut service = EvaluatorService::new(evaluator);
            service.serve(&channel);
            service.evaluations()
        })
    };

    let mut ctx = SearchContext::new(Arc::clone(&channel));
    let value = search(&mut ctx);

    channel.shutdown();
    let evaluations = service.join().expect("evaluator thread panicked");
    (value, evaluations)
}
