//! Control signals returned by interceptors.

use crate::engine::frame::FrameContext;
use crate::error::BoxError;
use crate::pipeline::Pipeline;
use std::sync::Arc;

/// A unit of middleware logic bound to a phase.
///
/// An interceptor may mutate the subject, register success/failure hooks on
/// its frame, and steer execution through the returned [`Flow`].
pub type Interceptor<S> =
    Arc<dyn Fn(&mut FrameContext<'_, S>, &mut S) -> Flow<S> + Send + Sync>;

/// What an interceptor asks the engine to do next.
pub enum Flow<S> {
    /// Run the next interceptor.
    Continue,
    /// Skip the remaining interceptors of this pipeline and unwind it.
    Finish,
    /// Skip the remaining interceptors of this pipeline and every enclosing
    /// pipeline; unwind hooks still run for all of them.
    FinishAll,
    /// Suspend the run. The caller receives a resume handle and must call
    /// `proceed()` when the external event occurs.
    Pause,
    /// Run the current interceptor again.
    Repeat,
    /// Run a nested pipeline to completion (or pause) before this frame
    /// continues.
    Fork {
        subject: S,
        pipeline: Arc<Pipeline<S>>,
    },
    /// Record the error on this frame and unwind it through failure hooks.
    Fail(BoxError),
}

impl<S> Flow<S> {
    /// Shorthand for `Flow::Fail` from any boxable error.
    pub fn fail(error: impl Into<BoxError>) -> Self {
        Flow::Fail(error.into())
    }

    /// Shorthand for `Flow::Fork` on a shared pipeline.
    pub fn fork(subject: S, pipeline: &Arc<Pipeline<S>>) -> Self {
        Flow::Fork {
            subject,
            pipeline: Arc::clone(pipeline),
        }
    }
}

impl<S> std::fmt::Debug for Flow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Continue => f.write_str("Continue"),
            Flow::Finish => f.write_str("Finish"),
            Flow::FinishAll => f.write_str("FinishAll"),
            Flow::Pause => f.write_str("Pause"),
            Flow::Repeat => f.write_str("Repeat"),
            Flow::Fork { .. } => f.write_str("Fork"),
            Flow::Fail(error) => write!(f, "Fail({error})"),
        }
    }
}
