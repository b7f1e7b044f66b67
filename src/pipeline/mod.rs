//! Pipeline binding: a phase set tied to a subject type.
//!
//! # Responsibilities
//! - Own one phase set per pipeline
//! - Register interceptors into named phases
//! - Expose a lock-free flattened interceptor snapshot to the engine
//! - Kick off executions
//!
//! # Design Decisions
//! - Registration happens under a write lock; execution reads a snapshot
//!   swapped atomically, so late registration never blocks running calls
//! - The snapshot is rebuilt eagerly on every mutation (read-mostly workload)

pub mod pipeline;

pub use pipeline::Pipeline;
