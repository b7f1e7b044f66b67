//! Type-directed transform registry.
//!
//! # Data Flow
//! ```text
//! register::<T>(predicate, transform)
//!     → handler.rs (Handler: id, predicate, apply)
//!     → registry.rs (per-type handler lists, parent chain, caches)
//! transform(context, value)
//!     → graph.rs (supertype lookup order for the value's runtime type)
//!     → visited.rs (bitset of already-applied handler ids)
//!     → rewrite to a fixpoint, child handlers before parent handlers
//! install(registry, pipeline, phase)
//!     → install.rs (one rewrite step per pass, Flow::Repeat until done)
//! ```
//!
//! # Design Decisions
//! - Runtime dispatch on `TypeId`; the supertype graph is supplied
//!   explicitly by the collaborator, never reflected
//! - Every successful rewrite restarts the handler scan so earlier-registered
//!   handlers of the new type keep their priority
//! - The visited set guarantees termination even when a handler's output
//!   still matches its own predicate
//! - Caches are evicted entry-by-entry on registration, never flushed

pub mod graph;
pub mod handler;
pub mod install;
pub mod registry;
pub mod visited;

pub use handler::AnyValue;
pub use install::{install, TransformParts, Transformable};
pub use registry::{Rewrite, TransformRegistry};
pub use visited::Visited;
