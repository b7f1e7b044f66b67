//! Phase markers and their relative-position relations.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_PHASE_ID: AtomicU64 = AtomicU64::new(0);

/// A named insertion point in a pipeline's interceptor list.
///
/// Equality is identity-based: every call to [`Phase::new`] produces a
/// distinct phase, even when the name repeats. Clones share the identity.
#[derive(Clone)]
pub struct Phase {
    id: u64,
    name: Arc<str>,
}

impl Phase {
    /// Create a new phase with the given display name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_PHASE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    /// Display name of the phase. Not unique.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Phase {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Phase {}

impl std::hash::Hash for Phase {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase({})", self.name)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How a phase was positioned when it was registered.
///
/// Retained per entry so that merging one phase set into another can replay
/// the same relative positioning against the destination.
#[derive(Debug, Clone)]
pub enum PhaseRelation {
    /// Appended at the end of the set.
    Last,
    /// Inserted immediately before the referenced phase.
    Before(Phase),
    /// Inserted immediately after the referenced phase.
    After(Phase),
}
