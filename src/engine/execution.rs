//! The driver loop: an owned frame stack pushed through interceptors.

use crate::engine::flow::{Flow, Interceptor};
use crate::engine::frame::{Frame, FrameContext, FrameState};
use crate::error::InterceptorError;
use std::sync::Arc;

/// Result of driving an execution as far as it can go.
pub enum Outcome<S> {
    /// Every frame unwound; the final subject is returned. A failure that a
    /// failure hook handled also completes.
    Completed(S),
    /// An interceptor paused the run. Call [`Execution::proceed`] on the
    /// handle when the external event occurs, or [`Execution::cancel`] to
    /// unwind it.
    Paused(Execution<S>),
    /// The run failed and no failure hook handled the error.
    Failed(InterceptorError),
}

impl<S> Outcome<S> {
    /// Unwrap the completed subject; panics on `Paused` or `Failed`.
    /// Intended for tests and callers that know the pipeline cannot suspend.
    pub fn expect_completed(self) -> S {
        match self {
            Outcome::Completed(subject) => subject,
            Outcome::Paused(_) => panic!("pipeline paused, expected completion"),
            Outcome::Failed(error) => panic!("pipeline failed: {error}"),
        }
    }
}

impl<S> std::fmt::Debug for Outcome<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed(_) => f.write_str("Completed"),
            Outcome::Paused(_) => f.write_str("Paused"),
            Outcome::Failed(error) => write!(f, "Failed({error})"),
        }
    }
}

/// One in-flight pipeline run: an explicit stack of frames, innermost last.
///
/// The loop is single-threaded and cooperative per call. Independent calls
/// own independent stacks and may run on different threads freely.
pub struct Execution<S> {
    stack: Vec<Frame<S>>,
    /// Set when a failure hook ran to completion, consuming the error.
    handled: bool,
}

impl<S: 'static> Execution<S> {
    pub(crate) fn new(interceptors: Arc<Vec<Interceptor<S>>>, subject: S) -> Self {
        Self {
            stack: vec![Frame::new(interceptors, subject)],
            handled: false,
        }
    }

    /// Resume a paused run at the same frame and cursor.
    pub fn proceed(self) -> Outcome<S> {
        tracing::trace!(frames = self.stack.len(), "resuming paused execution");
        self.run()
    }

    /// Cancel a paused run. The innermost frame is marked to finish
    /// everything, so every registered hook still runs before the frames are
    /// discarded.
    pub fn cancel(mut self) -> Outcome<S> {
        if let Some(top) = self.stack.last_mut() {
            top.state = FrameState::FinishedAll;
            top.index -= 1;
        }
        tracing::debug!("cancelling paused execution");
        self.run()
    }

    /// Drive frames until the stack empties or an interceptor pauses.
    pub(crate) fn run(mut self) -> Outcome<S> {
        loop {
            // A fully unwound frame (cursor at -1) is removed; its terminal
            // state propagates into the parent frame.
            if self.stack.last().is_some_and(|top| top.index < 0) {
                let mut done = self
                    .stack
                    .pop()
                    .unwrap_or_else(|| unreachable!("checked non-empty"));
                match self.stack.last_mut() {
                    None => {
                        return match done.state {
                            FrameState::Failed if !self.handled => {
                                let error = done
                                    .error
                                    .take()
                                    .unwrap_or_else(|| unreachable!("failed frame holds error"));
                                tracing::debug!(error = %error, "execution failed");
                                Outcome::Failed(error)
                            }
                            _ => Outcome::Completed(done.subject),
                        };
                    }
                    Some(parent) => match done.state {
                        FrameState::FinishedAll => {
                            parent.state = FrameState::FinishedAll;
                            parent.index -= 1;
                        }
                        FrameState::Failed => {
                            let error = done
                                .error
                                .take()
                                .unwrap_or_else(|| unreachable!("failed frame holds error"));
                            parent.merge_failure(error);
                            parent.index -= 1;
                        }
                        FrameState::Finished | FrameState::Executing => {}
                    },
                }
                continue;
            }

            let top = self
                .stack
                .last_mut()
                .unwrap_or_else(|| unreachable!("stack empties only via frame removal"));

            // All interceptors ran forward; start the success unwind.
            if top.index as usize == top.interceptors.len()
                && top.state == FrameState::Executing
            {
                top.state = FrameState::Finished;
                top.index -= 1;
                continue;
            }

            let current = top.index as usize;
            match top.state {
                FrameState::Finished | FrameState::FinishedAll => {
                    if let Some(hook) = top.hooks[current].on_success.pop() {
                        if let Err(error) = hook(&mut top.subject) {
                            // A failing success hook flips this frame onto
                            // the failure unwind path at the same cursor.
                            top.record_failure(error);
                        }
                    } else {
                        top.index -= 1;
                    }
                }
                FrameState::Failed => {
                    if let Some(hook) = top.hooks[current].on_fail.pop() {
                        let error = top
                            .error
                            .as_mut()
                            .unwrap_or_else(|| unreachable!("failed frame holds error"));
                        match hook(&mut top.subject, error) {
                            Ok(()) => self.handled = true,
                            Err(later) => error.suppress(later),
                        }
                    } else {
                        top.index -= 1;
                    }
                }
                FrameState::Executing => {
                    top.repeat_index = top.index;
                    top.index += 1;
                    let interceptor = Arc::clone(&top.interceptors[current]);
                    let mut ctx = FrameContext::new(&mut top.hooks[current]);
                    match interceptor(&mut ctx, &mut top.subject) {
                        Flow::Continue => {}
                        Flow::Finish => {
                            top.state = FrameState::Finished;
                            top.index -= 1;
                        }
                        Flow::FinishAll => {
                            top.state = FrameState::FinishedAll;
                            top.index -= 1;
                        }
                        Flow::Repeat => {
                            top.index = top.repeat_index;
                        }
                        Flow::Fail(error) => {
                            tracing::debug!(
                                interceptor = current,
                                error = %error,
                                "interceptor failed"
                            );
                            top.record_failure(error);
                            top.index -= 1;
                        }
                        Flow::Pause => {
                            tracing::trace!(frames = self.stack.len(), "execution paused");
                            return Outcome::Paused(self);
                        }
                        Flow::Fork { subject, pipeline } => {
                            tracing::trace!(depth = self.stack.len() + 1, "forking nested pipeline");
                            self.stack.push(Frame::new(pipeline.interceptors(), subject));
                        }
                    }
                }
            }
        }
    }
}

impl<S> Drop for Execution<S> {
    fn drop(&mut self) {
        // A paused run that is dropped never ran its unwind hooks. That is a
        // resource leak on the caller's side, worth surfacing.
        if !self.stack.is_empty() {
            tracing::warn!(
                frames = self.stack.len(),
                "paused execution dropped without proceed() or cancel(); unwind hooks did not run"
            );
        }
    }
}
