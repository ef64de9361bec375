//! Run control - owns the search thread bound to one evaluator channel.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::schema::SearchAlgorithm;

use super::channel::EvaluatorChannel;
use super::evaluator::{EvaluatorService, VolumeEvaluator};
use super::orientation::{Candidate, EvaluationResult};
use super::strategy::{run_search, run_search_by_id};

/// Shuts the channel down when a search thread exits without publishing,
/// so an evaluator blocked on the channel is released.
struct ReleaseOnExit(Arc<EvaluatorChannel>);

impl Drop for ReleaseOnExit {
    fn drop(&mut self) {
        if self.0.final_result().is_none() && !self.0.is_shutting_down() {
            if thread::panicking() {
                log::error!("Search thread panicked, releasing evaluator");
            }
            self.0.shutdown();
        }
    }
}

/// Starts, stops and observes searches on a shared [`EvaluatorChannel`].
///
/// The evaluator side of the channel is serviced elsewhere, for example by
/// an [`EvaluatorService`] in a render loop.
pub struct SearchRunner {
    channel: Arc<EvaluatorChannel>,
    handle: Option<JoinHandle<()>>,
}

impl Default for SearchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchRunner {
    pub fn new() -> Self {
        Self::with_channel(Arc::new(EvaluatorChannel::new()))
    }

    pub fn with_channel(channel: Arc<EvaluatorChannel>) -> Self {
        Self {
            channel,
            handle: None,
        }
    }

    /// Channel to hand to the evaluator side.
    pub fn channel(&self) -> &Arc<EvaluatorChannel> {
        &self.channel
    }

    /// Stop any previous run, then start `algorithm` on a new thread.
    pub fn start(&mut self, algorithm: SearchAlgorithm) {
        self.spawn(move |channel| {
            run_search(channel, &algorithm);
        });
    }

    /// Start with default parameters by identifier. Unknown identifiers
    /// start a no-op run.
    pub fn start_by_id(&mut self, strategy_id: &str) {
        let strategy_id = strategy_id.to_string();
        self.spawn(move |channel| {
            run_search_by_id(channel, &strategy_id);
        });
    }

    fn spawn<F>(&mut self, search: F)
    where
        F: FnOnce(Arc<EvaluatorChannel>) + Send + 'static,
    {
        self.stop();
        self.channel.reset();

        let channel = Arc::clone(&self.channel);
        self.handle = Some(thread::spawn(move || {
            let _release = ReleaseOnExit(Arc::clone(&channel));
            search(channel);
        }));
    }

    /// Cancel the run and wait for the search thread to exit.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.channel.shutdown();
            if handle.join().is_err() {
                log::error!("Search thread panicked");
            }
        }
    }

    /// Whether a search thread is still working.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn final_result(&self) -> Option<EvaluationResult> {
        self.channel.final_result()
    }

    /// Block until the search publishes. Never returns for a cancelled run.
    pub fn await_final_result(&self) -> EvaluationResult {
        self.channel.await_final_result()
    }

    pub fn await_final_result_timeout(&self, timeout: Duration) -> Option<EvaluationResult> {
        self.channel.await_final_result_timeout(timeout)
    }
}

impl Drop for SearchRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Summary of a blocking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Published result; `None` if the run was cancelled.
    pub best: Option<Candidate>,
    /// Real evaluations performed.
    pub evaluations: u64,
    /// Requests answered without evaluating.
    pub repositions: u64,
    /// Wall-clock time (in seconds).
    pub elapsed_seconds: f64,
}

/// Run `algorithm` on a search thread while servicing `evaluator` on the
/// calling thread.
pub fn run_blocking<E: VolumeEvaluator>(
    algorithm: &SearchAlgorithm,
    evaluator: E,
) -> SearchOutcome {
    let start = Instant::now();
    let channel = Arc::new(EvaluatorChannel::new());

    let search = {
        let channel = Arc::clone(&channel);
        let algorithm = algorithm.clone();
        thread::spawn(move || {
            let _release = ReleaseOnExit(Arc::clone(&channel));
            run_search(channel, &algorithm);
        })
    };

    let mut service = EvaluatorService::new(evaluator);
    let best = service.serve(&channel);
    if search.join().is_err() {
        log::error!("Search thread panicked");
    }

    SearchOutcome {
        best,
        evaluations: service.evaluations(),
        repositions: service.repositions(),
        elapsed_seconds: start.elapsed().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Orientation;
    use crate::schema::{DeterministicConfig, MonteCarloConfig, UniformPointsConfig};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn spawn_service<E>(
        channel: Arc<EvaluatorChannel>,
        evaluator: E,
    ) -> JoinHandle<Option<Candidate>>
    where
        E: VolumeEvaluator + Send + 'static,
    {
        thread::spawn(move || EvaluatorService::new(evaluator).serve(&channel))
    }

    #[test]
    fn test_run_to_completion() {
        let mut runner = SearchRunner::new();
        runner.start(SearchAlgorithm::UniformPoints(UniformPointsConfig { n: 4 }));
        let service = spawn_service(Arc::clone(runner.channel()), |o: &Orientation| {
            o.position().x
        });

        let result = runner.await_final_result();
        assert_eq!(service.join().unwrap(), Some(result));
        assert_eq!(runner.final_result(), Some(result));

        runner.stop();
        assert!(!runner.is_running());
    }

    #[test]
    fn test_stop_mid_run_publishes_nothing() {
        let evaluations = Arc::new(AtomicU64::new(0));
        let mut runner = SearchRunner::new();
        runner.start(SearchAlgorithm::Deterministic(DeterministicConfig::default()));

        let service = {
            let evaluations = Arc::clone(&evaluations);
            spawn_service(Arc::clone(runner.channel()), move |_: &Orientation| {
                evaluations.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_micros(200));
                1.0
            })
        };

        while evaluations.load(Ordering::SeqCst) < 20 {
            thread::yield_now();
        }
        assert!(runner.is_running());

        runner.stop();
        assert!(!runner.is_running());
        assert_eq!(service.join().unwrap(), None);
        assert_eq!(runner.final_result(), None);
        assert_eq!(
            runner.await_final_result_timeout(Duration::from_millis(50)),
            None
        );
    }

    /// Shut the channel down from inside the evaluator on its `cancel_at`-th
    /// evaluation and check that nothing is published.
    fn assert_cancelled_at(algorithm: SearchAlgorithm, cancel_at: u64) {
        let mut runner = SearchRunner::new();
        runner.start(algorithm);

        let channel = Arc::clone(runner.channel());
        let mut evaluations = 0;
        let service = spawn_service(Arc::clone(runner.channel()), move |_: &Orientation| {
            evaluations += 1;
            if evaluations == cancel_at {
                channel.shutdown();
            }
            1.0
        });

        assert_eq!(service.join().unwrap(), None);
        runner.stop();
        assert_eq!(runner.final_result(), None);
    }

    // With a constant volume, Deterministic { n: 10, k: 3 } samples 21 points,
    // then spends 11 evaluations polishing each candidate (up to 54), then
    // 61 on the fine refinement.

    #[test]
    fn test_cancel_while_polishing_candidates() {
        let algorithm = SearchAlgorithm::Deterministic(DeterministicConfig {
            n: 10,
            k: 3,
            ..Default::default()
        });
        assert_cancelled_at(algorithm, 30);
    }

    #[test]
    fn test_cancel_while_refining() {
        let algorithm = SearchAlgorithm::Deterministic(DeterministicConfig {
            n: 10,
            k: 3,
            ..Default::default()
        });
        assert_cancelled_at(algorithm, 70);
    }

    #[test]
    fn test_cancel_during_monte_carlo_trial() {
        // Each trial is one sample plus 11 polishing evaluations.
        let algorithm = SearchAlgorithm::MonteCarlo(MonteCarloConfig {
            n: 3,
            random_seed: Some(9),
            ..Default::default()
        });
        assert_cancelled_at(algorithm, 15);
    }

    #[test]
    fn test_phase_evaluation_counts() {
        let outcome = run_blocking(
            &SearchAlgorithm::Deterministic(DeterministicConfig {
                n: 10,
                k: 3,
                ..Default::default()
            }),
            |_: &Orientation| 1.0,
        );
        assert_eq!(outcome.evaluations, 21 + 3 * 11 + 61);
        assert!(outcome.best.is_some());
    }

    #[test]
    fn test_restart_after_stop() {
        let mut runner = SearchRunner::new();
        runner.start(SearchAlgorithm::UniformPoints(UniformPointsConfig { n: 2 }));
        runner.stop();

        runner.start(SearchAlgorithm::UniformPoints(UniformPointsConfig { n: 2 }));
        let service = spawn_service(Arc::clone(runner.channel()), |_: &Orientation| 3.0);
        assert_eq!(runner.await_final_result().volume, 3.0);
        assert!(service.join().unwrap().is_some());
    }

    #[test]
    fn test_unknown_id_releases_evaluator() {
        let mut runner = SearchRunner::new();
        runner.start_by_id("hill_climb");
        let service = spawn_service(Arc::clone(runner.channel()), |_: &Orientation| 1.0);

        assert_eq!(service.join().unwrap(), None);
        runner.stop();
        assert_eq!(runner.final_result(), None);
    }

    #[test]
    fn test_start_by_id() {
        let mut runner = SearchRunner::new();
        runner.start_by_id("uniform_points");
        let service = spawn_service(Arc::clone(runner.channel()), |o: &Orientation| {
            o.position().y
        });
        let result = runner.await_final_result();
        assert_eq!(service.join().unwrap(), Some(result));
        // Default uniform sampling has 21 points; the best sits low in y.
        assert!(result.volume < -0.8);
    }

    #[test]
    fn test_run_blocking_counts() {
        let outcome = run_blocking(
            &SearchAlgorithm::UniformPoints(UniformPointsConfig { n: 5 }),
            |o: &Orientation| o.position().z,
        );
        assert_eq!(outcome.evaluations, 11);
        assert_eq!(outcome.repositions, 0);
        assert!(outcome.best.is_some());
    }
}
