//! Error definitions for pipeline configuration and execution.

use thiserror::Error;

/// Boxed error type carried by failing interceptors and transform handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by pipeline configuration and execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A phase was referenced (for interception or relative insertion)
    /// that is not registered in the phase set.
    #[error("phase `{0}` was not registered for this pipeline")]
    UnknownPhase(String),

    /// An interceptor (or a hook, or a transform handler running inside an
    /// interceptor) failed and no failure hook handled the error.
    #[error(transparent)]
    Interceptor(#[from] InterceptorError),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// An error recorded on an executing frame.
///
/// The first failure becomes the cause; further failures observed while the
/// frame (or its ancestors) unwind are chained as suppressed errors, so no
/// error is silently lost.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct InterceptorError {
    cause: BoxError,
    suppressed: Vec<BoxError>,
}

impl InterceptorError {
    pub fn new(cause: BoxError) -> Self {
        Self {
            cause,
            suppressed: Vec::new(),
        }
    }

    /// The original failure.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync) {
        self.cause.as_ref()
    }

    /// Errors observed after the cause, in the order they occurred.
    pub fn suppressed(&self) -> &[BoxError] {
        &self.suppressed
    }

    /// Chain a later error without losing the original cause.
    pub fn suppress(&mut self, error: BoxError) {
        self.suppressed.push(error);
    }
}

/// Build an ad-hoc boxed error from a message.
///
/// Convenience for interceptors that fail with a plain message rather than a
/// dedicated error type.
pub fn message_error(message: impl Into<String>) -> BoxError {
    Box::new(MessageError(message.into()))
}

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);
