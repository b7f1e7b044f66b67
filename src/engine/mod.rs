//! Pipeline execution engine.
//!
//! # Data Flow
//! ```text
//! Pipeline::execute(subject)
//!     → execution.rs (Execution: owned frame stack, driver loop)
//!     → frame.rs (Frame: cursor, state, per-interceptor hooks)
//!     → flow.rs (Flow: control signal returned by each interceptor)
//!     → Outcome: Completed / Paused / Failed
//! ```
//!
//! # Design Decisions
//! - Control signals are plain enum values, never unwinding
//! - One frame per (possibly forked) pipeline run; the stack is owned data
//! - Hooks run in reverse registration order while a frame unwinds
//! - Pause hands the whole machine back to the caller; proceed re-enters it

pub mod execution;
pub mod flow;
pub mod frame;

pub use execution::{Execution, Outcome};
pub use flow::{Flow, Interceptor};
pub use frame::FrameContext;
