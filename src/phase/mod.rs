//! Phase registration subsystem.
//!
//! # Data Flow
//! ```text
//! Phase created (identity marker)
//!     → phase.rs (Phase, PhaseRelation)
//!     → set.rs (PhaseSet: ordered entries, relative insertion, merge)
//!     → flatten() produces the interceptor list the engine executes
//! ```
//!
//! # Design Decisions
//! - Phases compare by identity, not by name (two "Call" phases are distinct)
//! - Relative insertion records its relation so merges can replay it
//! - Flattening is the only consumer-facing view of interceptor order

pub mod phase;
pub mod set;

pub use phase::{Phase, PhaseRelation};
pub use set::PhaseSet;
