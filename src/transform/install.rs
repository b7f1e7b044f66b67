//! Wiring a transform registry into a pipeline phase.

use crate::engine::Flow;
use crate::error::PipelineResult;
use crate::phase::Phase;
use crate::pipeline::Pipeline;
use crate::transform::handler::AnyValue;
use crate::transform::registry::{Rewrite, TransformRegistry};
use crate::transform::visited::Visited;
use std::sync::Arc;

/// Disjoint views into a subject needed by one transform step.
pub struct TransformParts<'a, C> {
    /// The dispatch context handed to predicates and handlers.
    pub context: &'a C,
    /// The outgoing payload being rewritten. `None` skips the pass.
    pub payload: &'a mut Option<AnyValue>,
    /// Per-call visited set; lives on the subject so it survives the
    /// `Flow::Repeat` round trips of a single call.
    pub visited: &'a mut Visited,
}

/// A pipeline subject that carries a transformable payload.
pub trait Transformable {
    type Context: 'static;

    /// Borrow the context, payload, and visited set at once.
    fn transform_parts(&mut self) -> TransformParts<'_, Self::Context>;
}

/// Install the registry's rewrite pass into `phase` of `pipeline`.
///
/// The interceptor applies one rewrite step per invocation and asks the
/// engine to repeat it, so interceptors inserted into the same phase after a
/// rewrite observe each intermediate payload. The pass ends when a full scan
/// finds no applicable unvisited handler.
pub fn install<S>(
    registry: &Arc<TransformRegistry<S::Context>>,
    pipeline: &Pipeline<S>,
    phase: &Phase,
) -> PipelineResult<()>
where
    S: Transformable + 'static,
{
    let registry = Arc::clone(registry);
    pipeline.intercept(phase, move |_, subject: &mut S| {
        let parts = subject.transform_parts();
        let Some(value) = parts.payload.take() else {
            return Flow::Continue;
        };
        match registry.transform_step(parts.context, value, parts.visited) {
            Ok(Rewrite::Rewritten(next)) => {
                *parts.payload = Some(next);
                Flow::Repeat
            }
            Ok(Rewrite::Unchanged(done)) => {
                *parts.payload = Some(done);
                Flow::Continue
            }
            Err(error) => Flow::Fail(error),
        }
    })
}
