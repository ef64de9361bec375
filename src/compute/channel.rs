//! Evaluator channel - single-slot rendezvous between a search thread and an
//! evaluator thread.
//!
//! The search side posts one [`Request`] and blocks until the evaluator answers
//! with [`EvaluatorChannel::notify_result`]. A request call waits for the slot
//! to be free before posting and consumes its own response before returning,
//! so at most one request is ever in flight even with several search callers.
//! [`EvaluatorChannel::shutdown`] wakes every waiter; request calls then return
//! [`Cancelled`] and the evaluator side sees `None`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use nalgebra::Vector3;

use super::orientation::{EvaluationResult, Move, Orientation};

/// The channel is shutting down; the search must stop without publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Evaluator channel is shutting down")]
pub struct Cancelled;

/// Work handed to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    /// Set an absolute orientation.
    Orientation {
        orientation: Orientation,
        skip_recompute: bool,
    },
    /// Look at the origin from a point on the sphere.
    Position {
        position: Vector3<f32>,
        skip_recompute: bool,
    },
    /// Rotate incrementally from the current pose.
    Move { delta: Move, skip_recompute: bool },
    /// The search finished with this result; no more work follows.
    Done(EvaluationResult),
}

impl Request {
    /// Reposition only: echo the previous volume instead of evaluating.
    pub fn skip_recompute(&self) -> bool {
        match self {
            Request::Orientation { skip_recompute, .. }
            | Request::Position { skip_recompute, .. }
            | Request::Move { skip_recompute, .. } => *skip_recompute,
            Request::Done(_) => false,
        }
    }
}

/// Rendezvous state. Transitions happen only under the channel lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Search side owns the slot and may post a request.
    AwaitingRequest,
    /// A request is posted and not yet picked up.
    RequestPending,
    /// The evaluator picked up the request and is computing.
    EvaluatorBusy,
    /// A response is posted for the search side.
    ResponseReady,
    /// The search published its final result.
    Finished,
    /// Cancelled; every waiter returns.
    ShuttingDown,
}

#[derive(Debug)]
struct Slot {
    state: ChannelState,
    request: Option<Request>,
    response: Option<EvaluationResult>,
    final_result: Option<EvaluationResult>,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: ChannelState::AwaitingRequest,
            request: None,
            response: None,
            final_result: None,
        }
    }
}

/// Monitor shared by the search thread and the evaluator thread.
#[derive(Debug)]
pub struct EvaluatorChannel {
    slot: Mutex<Slot>,
    signal: Condvar,
}

impl Default for EvaluatorChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorChannel {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::new()),
            signal: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_until<'a, F>(&self, guard: MutexGuard<'a, Slot>, mut ready: F) -> MutexGuard<'a, Slot>
    where
        F: FnMut(&Slot) -> bool,
    {
        self.signal
            .wait_while(guard, |slot| !ready(slot))
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current protocol state.
    pub fn state(&self) -> ChannelState {
        self.lock().state
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state() == ChannelState::ShuttingDown
    }

    // ------------------------------------------------------------------
    // Search side
    // ------------------------------------------------------------------

    /// Request an evaluation at an absolute orientation.
    pub fn request_orientation(
        &self,
        orientation: Orientation,
        skip_recompute: bool,
    ) -> Result<EvaluationResult, Cancelled> {
        self.request(Request::Orientation {
            orientation,
            skip_recompute,
        })
    }

    /// Request an evaluation looking from a point on the sphere.
    pub fn request_position(
        &self,
        position: Vector3<f32>,
        skip_recompute: bool,
    ) -> Result<EvaluationResult, Cancelled> {
        self.request(Request::Position {
            position,
            skip_recompute,
        })
    }

    /// Request an evaluation after an incremental move.
    pub fn request_move(
        &self,
        delta: Move,
        skip_recompute: bool,
    ) -> Result<EvaluationResult, Cancelled> {
        self.request(Request::Move {
            delta,
            skip_recompute,
        })
    }

    fn request(&self, request: Request) -> Result<EvaluationResult, Cancelled> {
        // Queue behind any request already in flight.
        let slot = self.lock();
        let mut slot = self.wait_until(slot, |s| {
            matches!(
                s.state,
                ChannelState::AwaitingRequest | ChannelState::Finished | ChannelState::ShuttingDown
            )
        });
        if slot.state != ChannelState::AwaitingRequest {
            return Err(Cancelled);
        }

        slot.request = Some(request);
        slot.response = None;
        slot.state = ChannelState::RequestPending;
        log::trace!("Posted {request:?}");
        self.signal.notify_all();

        let mut slot = self.wait_until(slot, |s| {
            matches!(
                s.state,
                ChannelState::ResponseReady | ChannelState::ShuttingDown
            )
        });
        if slot.state == ChannelState::ShuttingDown {
            return Err(Cancelled);
        }

        slot.state = ChannelState::AwaitingRequest;
        self.signal.notify_all();
        slot.response.take().ok_or(Cancelled)
    }

    /// Publish the final answer and release the evaluator.
    ///
    /// Ignored once the channel is shutting down: cancelled runs never publish.
    pub fn finish(&self, result: EvaluationResult) {
        let mut slot = self.lock();
        if slot.state == ChannelState::ShuttingDown {
            log::debug!("Dropping final result of a cancelled run");
            return;
        }
        slot.request = Some(Request::Done(result));
        slot.final_result = Some(result);
        slot.state = ChannelState::Finished;
        log::trace!("Finished with volume {}", result.volume);
        self.signal.notify_all();
    }

    // ------------------------------------------------------------------
    // Evaluator side
    // ------------------------------------------------------------------

    /// Block until there is work. `None` means the channel shut down.
    ///
    /// Returns [`Request::Done`] once the search has finished.
    pub fn wait_for_request(&self) -> Option<Request> {
        let slot = self.lock();
        let slot = self.wait_until(slot, |s| {
            matches!(
                s.state,
                ChannelState::RequestPending | ChannelState::Finished | ChannelState::ShuttingDown
            )
        });
        Self::take_request(slot)
    }

    /// Non-blocking variant of [`wait_for_request`](Self::wait_for_request)
    /// for evaluators driven by a frame loop.
    pub fn poll_request(&self) -> Option<Request> {
        Self::take_request(self.lock())
    }

    fn take_request(mut slot: MutexGuard<'_, Slot>) -> Option<Request> {
        match slot.state {
            ChannelState::RequestPending => {
                slot.state = ChannelState::EvaluatorBusy;
                slot.request.take()
            }
            ChannelState::Finished => slot.final_result.map(Request::Done),
            _ => None,
        }
    }

    /// Answer the request currently in service and wake the search side.
    pub fn notify_result(&self, volume: f32, orientation: Orientation) {
        let mut slot = self.lock();
        if slot.state != ChannelState::EvaluatorBusy {
            if slot.state != ChannelState::ShuttingDown {
                log::warn!("Result posted with no request in service ({:?})", slot.state);
            }
            return;
        }
        slot.response = Some(EvaluationResult::new(volume, orientation));
        slot.state = ChannelState::ResponseReady;
        self.signal.notify_all();
    }

    /// Cancel the run and wake everyone blocked on the channel.
    pub fn shutdown(&self) {
        let mut slot = self.lock();
        slot.state = ChannelState::ShuttingDown;
        slot.request = None;
        slot.response = None;
        log::trace!("Channel shutting down");
        self.signal.notify_all();
    }

    /// Return to `AwaitingRequest` so a new run can use the channel.
    pub fn reset(&self) {
        let mut slot = self.lock();
        *slot = Slot::new();
        self.signal.notify_all();
    }

    // ------------------------------------------------------------------
    // Owner side
    // ------------------------------------------------------------------

    /// Final result, if the search has published one.
    pub fn final_result(&self) -> Option<EvaluationResult> {
        self.lock().final_result
    }

    /// Block until the search publishes its result.
    ///
    /// Never returns for a cancelled run.
    pub fn await_final_result(&self) -> EvaluationResult {
        let mut slot = self.lock();
        loop {
            if let Some(result) = slot.final_result {
                return result;
            }
            slot = self
                .signal
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`await_final_result`](Self::await_final_result) with a deadline.
    pub fn await_final_result_timeout(&self, timeout: Duration) -> Option<EvaluationResult> {
        let slot = self.lock();
        let (slot, _) = self
            .signal
            .wait_timeout_while(slot, timeout, |s| s.final_result.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        slot.final_result
    }
}
