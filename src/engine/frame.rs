//! Execution-stack frames and the interceptor-facing frame view.

use crate::engine::flow::Interceptor;
use crate::error::{BoxError, InterceptorError};
use std::sync::Arc;

/// Hook run while a frame unwinds successfully.
pub type SuccessHook<S> = Box<dyn FnOnce(&mut S) -> Result<(), BoxError> + Send>;

/// Hook run while a frame unwinds after a failure. Receives the frame's
/// accumulated error; returning an error chains it as suppressed.
pub type FailHook<S> = Box<dyn FnOnce(&mut S, &InterceptorError) -> Result<(), BoxError> + Send>;

/// Hooks registered by one interceptor, drained most-recent-first during
/// unwind.
pub(crate) struct HookSet<S> {
    pub(crate) on_success: Vec<SuccessHook<S>>,
    pub(crate) on_fail: Vec<FailHook<S>>,
}

impl<S> HookSet<S> {
    fn new() -> Self {
        Self {
            on_success: Vec::new(),
            on_fail: Vec::new(),
        }
    }
}

/// The view of the current frame handed to an executing interceptor.
///
/// Interceptors use it to register unwind hooks; everything else is steered
/// through the returned [`Flow`](crate::engine::Flow).
pub struct FrameContext<'a, S> {
    hooks: &'a mut HookSet<S>,
}

impl<'a, S> FrameContext<'a, S> {
    pub(crate) fn new(hooks: &'a mut HookSet<S>) -> Self {
        Self { hooks }
    }

    /// Register a hook to run when this frame unwinds successfully.
    ///
    /// Hooks run in reverse registration order, mirroring nested scoped
    /// resource release.
    pub fn on_success<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut S) -> Result<(), BoxError> + Send + 'static,
    {
        self.hooks.on_success.push(Box::new(hook));
    }

    /// Register a hook to run when this frame unwinds after a failure.
    pub fn on_fail<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut S, &InterceptorError) -> Result<(), BoxError> + Send + 'static,
    {
        self.hooks.on_fail.push(Box::new(hook));
    }
}

/// Frame lifecycle: `Executing` until a terminal signal, then unwinding in
/// one of the three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameState {
    Executing,
    Finished,
    FinishedAll,
    Failed,
}

/// One activation record: a single (possibly forked) pipeline run.
pub(crate) struct Frame<S> {
    pub(crate) subject: S,
    pub(crate) interceptors: Arc<Vec<Interceptor<S>>>,
    /// Cursor into the interceptor list; `-1` means fully unwound.
    pub(crate) index: isize,
    /// Index of the most recently started interceptor, for `Flow::Repeat`.
    pub(crate) repeat_index: isize,
    pub(crate) state: FrameState,
    pub(crate) error: Option<InterceptorError>,
    /// One hook set per interceptor index.
    pub(crate) hooks: Vec<HookSet<S>>,
}

impl<S> Frame<S> {
    pub(crate) fn new(interceptors: Arc<Vec<Interceptor<S>>>, subject: S) -> Self {
        let hooks = (0..interceptors.len()).map(|_| HookSet::new()).collect();
        Self {
            subject,
            interceptors,
            index: 0,
            repeat_index: 0,
            state: FrameState::Executing,
            error: None,
            hooks,
        }
    }

    /// Record a failure on this frame. The first error becomes the cause;
    /// later ones chain as suppressed.
    pub(crate) fn record_failure(&mut self, error: BoxError) {
        match &mut self.error {
            Some(existing) => existing.suppress(error),
            None => self.error = Some(InterceptorError::new(error)),
        }
        self.state = FrameState::Failed;
    }

    /// Absorb a failed child frame's error, as if the failure happened here.
    pub(crate) fn merge_failure(&mut self, error: InterceptorError) {
        match &mut self.error {
            Some(existing) => {
                existing.suppress(error.into());
            }
            None => self.error = Some(error),
        }
        self.state = FrameState::Failed;
    }
}
