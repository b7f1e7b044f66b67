//! Phased interceptor pipeline and type-directed transform registry.
//!
//! The building blocks an HTTP client/server toolkit hangs its features on:
//! an execution engine that pushes a subject through ordered, phase-scoped
//! interceptors, with short-circuiting, nested forks, suspension, and
//! structured unwind hooks, and a registry that rewrites a payload to a
//! fixpoint by dispatching on its runtime type.
//!
//! Wire codecs, transports, and routing live elsewhere: collaborators build
//! pipelines, register interceptors and handlers, and call `execute`.

pub mod engine;
pub mod error;
pub mod phase;
pub mod pipeline;
pub mod transform;

pub use engine::{Execution, Flow, FrameContext, Interceptor, Outcome};
pub use error::{BoxError, InterceptorError, PipelineError, PipelineResult};
pub use phase::{Phase, PhaseRelation, PhaseSet};
pub use pipeline::Pipeline;
pub use transform::{install, AnyValue, TransformRegistry, Transformable, Visited};
