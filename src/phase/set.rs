//! Ordered phase set with relative insertion and merging.

use crate::engine::Interceptor;
use crate::error::{PipelineError, PipelineResult};
use crate::phase::{Phase, PhaseRelation};

/// One phase of a set: its identity, how it was positioned, and the
/// interceptors registered into it.
struct PhaseEntry<S> {
    phase: Phase,
    relation: PhaseRelation,
    interceptors: Vec<Interceptor<S>>,
}

impl<S> PhaseEntry<S> {
    fn duplicate(&self) -> Self {
        Self {
            phase: self.phase.clone(),
            relation: self.relation.clone(),
            interceptors: self.interceptors.clone(),
        }
    }
}

/// An ordered collection of phases and their interceptor lists.
///
/// A phase appears at most once. Relative insertion against an absent
/// reference fails with [`PipelineError::UnknownPhase`].
pub struct PhaseSet<S> {
    entries: Vec<PhaseEntry<S>>,
    interceptor_count: usize,
}

impl<S> Default for PhaseSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> PhaseSet<S> {
    /// Create an empty phase set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            interceptor_count: 0,
        }
    }

    /// Create a phase set from phases appended in order.
    pub fn from_phases(phases: impl IntoIterator<Item = Phase>) -> Self {
        let mut set = Self::new();
        for phase in phases {
            set.add(phase);
        }
        set
    }

    fn index_of(&self, phase: &Phase) -> Option<usize> {
        self.entries.iter().position(|e| e.phase == *phase)
    }

    /// True if the phase is registered in this set.
    pub fn contains(&self, phase: &Phase) -> bool {
        self.index_of(phase).is_some()
    }

    /// Phases in execution order.
    pub fn phases(&self) -> Vec<Phase> {
        self.entries.iter().map(|e| e.phase.clone()).collect()
    }

    /// Total number of registered interceptors across all phases.
    pub fn interceptor_count(&self) -> usize {
        self.interceptor_count
    }

    /// Append `phase` at the end. No-op if already present.
    pub fn add(&mut self, phase: Phase) {
        if self.contains(&phase) {
            return;
        }
        self.entries.push(PhaseEntry {
            phase,
            relation: PhaseRelation::Last,
            interceptors: Vec::new(),
        });
    }

    /// Insert `phase` immediately before `reference`. No-op if `phase` is
    /// already present; fails if `reference` is not registered.
    pub fn insert_before(&mut self, reference: &Phase, phase: Phase) -> PipelineResult<()> {
        if self.contains(&phase) {
            return Ok(());
        }
        let index = self
            .index_of(reference)
            .ok_or_else(|| PipelineError::UnknownPhase(reference.name().to_string()))?;
        self.entries.insert(
            index,
            PhaseEntry {
                phase,
                relation: PhaseRelation::Before(reference.clone()),
                interceptors: Vec::new(),
            },
        );
        Ok(())
    }

    /// Insert `phase` immediately after `reference`. No-op if `phase` is
    /// already present; fails if `reference` is not registered.
    pub fn insert_after(&mut self, reference: &Phase, phase: Phase) -> PipelineResult<()> {
        if self.contains(&phase) {
            return Ok(());
        }
        let index = self
            .index_of(reference)
            .ok_or_else(|| PipelineError::UnknownPhase(reference.name().to_string()))?;
        self.entries.insert(
            index + 1,
            PhaseEntry {
                phase,
                relation: PhaseRelation::After(reference.clone()),
                interceptors: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append an interceptor to a registered phase.
    pub fn intercept(&mut self, phase: &Phase, interceptor: Interceptor<S>) -> PipelineResult<()> {
        let index = self
            .index_of(phase)
            .ok_or_else(|| PipelineError::UnknownPhase(phase.name().to_string()))?;
        self.entries[index].interceptors.push(interceptor);
        self.interceptor_count += 1;
        Ok(())
    }

    /// Merge another phase set into this one, preserving this set's order.
    ///
    /// Phases already present only receive the other set's interceptors.
    /// Absent phases are inserted by replaying their recorded relation.
    /// Entries whose relation reference is not present yet are retried after
    /// the rest of the pass, so the physical order of `other` cannot make a
    /// valid merge fail; a pass with no progress reports the first missing
    /// reference.
    pub fn merge(&mut self, other: &PhaseSet<S>) -> PipelineResult<()> {
        let mut pending: Vec<&PhaseEntry<S>> = other.entries.iter().collect();

        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut progressed = false;

            for entry in pending {
                if let Some(index) = self.index_of(&entry.phase) {
                    self.entries[index]
                        .interceptors
                        .extend(entry.interceptors.iter().cloned());
                    self.interceptor_count += entry.interceptors.len();
                    progressed = true;
                    continue;
                }

                let inserted_at = match &entry.relation {
                    PhaseRelation::Last => {
                        self.entries.push(entry.duplicate());
                        Some(self.entries.len() - 1)
                    }
                    PhaseRelation::Before(reference) => self.index_of(reference).map(|index| {
                        self.entries.insert(index, entry.duplicate());
                        index
                    }),
                    PhaseRelation::After(reference) => self.index_of(reference).map(|index| {
                        self.entries.insert(index + 1, entry.duplicate());
                        index + 1
                    }),
                };

                match inserted_at {
                    Some(_) => {
                        self.interceptor_count += entry.interceptors.len();
                        progressed = true;
                    }
                    None => deferred.push(entry),
                }
            }

            if !progressed {
                let missing = deferred
                    .first()
                    .map(|entry| match &entry.relation {
                        PhaseRelation::Before(r) | PhaseRelation::After(r) => {
                            r.name().to_string()
                        }
                        PhaseRelation::Last => entry.phase.name().to_string(),
                    })
                    .unwrap_or_default();
                return Err(PipelineError::UnknownPhase(missing));
            }
            pending = deferred;
        }
        Ok(())
    }

    /// An owned copy of this set. Interceptor handles are shared, entries
    /// and relations are copied.
    pub fn duplicate(&self) -> Self {
        Self {
            entries: self.entries.iter().map(|entry| entry.duplicate()).collect(),
            interceptor_count: self.interceptor_count,
        }
    }

    /// Interceptors concatenated in phase order.
    pub fn flatten(&self) -> Vec<Interceptor<S>> {
        let mut flat = Vec::with_capacity(self.interceptor_count);
        for entry in &self.entries {
            flat.extend(entry.interceptors.iter().cloned());
        }
        flat
    }
}
