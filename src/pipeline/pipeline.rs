//! Phase-scoped interceptor registration and execution entry point.

use crate::engine::{Execution, Flow, FrameContext, Interceptor, Outcome};
use crate::error::PipelineResult;
use crate::phase::{Phase, PhaseSet};
use arc_swap::ArcSwap;
use std::sync::{Arc, PoisonError, RwLock};

/// A phase set bound to a subject type, ready to execute.
///
/// Built once at configuration time and read-mostly afterwards; the engine
/// never takes the registration lock.
pub struct Pipeline<S> {
    phases: RwLock<PhaseSet<S>>,
    flattened: ArcSwap<Vec<Interceptor<S>>>,
}

impl<S: 'static> Pipeline<S> {
    /// Create a pipeline with phases appended in order.
    pub fn new(phases: impl IntoIterator<Item = Phase>) -> Self {
        Self::from_phase_set(PhaseSet::from_phases(phases))
    }

    /// Create a pipeline around an already-built phase set.
    pub fn from_phase_set(set: PhaseSet<S>) -> Self {
        let flattened = ArcSwap::from_pointee(set.flatten());
        Self {
            phases: RwLock::new(set),
            flattened,
        }
    }

    fn write_phases(&self) -> std::sync::RwLockWriteGuard<'_, PhaseSet<S>> {
        self.phases.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_phases(&self) -> std::sync::RwLockReadGuard<'_, PhaseSet<S>> {
        self.phases.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a phase at the end. No-op if already present.
    pub fn add_phase(&self, phase: Phase) {
        let mut set = self.write_phases();
        set.add(phase);
        self.flattened.store(Arc::new(set.flatten()));
    }

    /// Insert a phase immediately before `reference`.
    pub fn insert_phase_before(&self, reference: &Phase, phase: Phase) -> PipelineResult<()> {
        let mut set = self.write_phases();
        set.insert_before(reference, phase)?;
        self.flattened.store(Arc::new(set.flatten()));
        Ok(())
    }

    /// Insert a phase immediately after `reference`.
    pub fn insert_phase_after(&self, reference: &Phase, phase: Phase) -> PipelineResult<()> {
        let mut set = self.write_phases();
        set.insert_after(reference, phase)?;
        self.flattened.store(Arc::new(set.flatten()));
        Ok(())
    }

    /// Register an interceptor into a phase of this pipeline.
    ///
    /// Fails with `UnknownPhase` when the phase is not in the bound set.
    pub fn intercept<F>(&self, phase: &Phase, interceptor: F) -> PipelineResult<()>
    where
        F: Fn(&mut FrameContext<'_, S>, &mut S) -> Flow<S> + Send + Sync + 'static,
    {
        let mut set = self.write_phases();
        set.intercept(phase, Arc::new(interceptor))?;
        self.flattened.store(Arc::new(set.flatten()));
        tracing::debug!(
            phase = phase.name(),
            interceptors = set.interceptor_count(),
            "interceptor registered"
        );
        Ok(())
    }

    /// Merge another pipeline's phases and interceptors into this one,
    /// preserving this pipeline's relative phase order.
    pub fn merge(&self, other: &Pipeline<S>) -> PipelineResult<()> {
        // Copy under `other`'s read lock and release it before taking our
        // write lock; holding both would hang a self-merge and lets crossed
        // merges deadlock.
        let other_set = other.read_phases().duplicate();
        let mut set = self.write_phases();
        set.merge(&other_set)?;
        self.flattened.store(Arc::new(set.flatten()));
        tracing::debug!(
            phases = set.phases().len(),
            interceptors = set.interceptor_count(),
            "pipeline merged"
        );
        Ok(())
    }

    /// Phases in execution order.
    pub fn phases(&self) -> Vec<Phase> {
        self.read_phases().phases()
    }

    /// True if no interceptor is installed, regardless of phase count.
    pub fn is_empty(&self) -> bool {
        self.read_phases().interceptor_count() == 0
    }

    /// Current flattened interceptor snapshot, in phase order.
    pub fn interceptors(&self) -> Arc<Vec<Interceptor<S>>> {
        self.flattened.load_full()
    }

    /// Push `subject` through the pipeline's interceptors in phase order.
    pub fn execute(&self, subject: S) -> Outcome<S> {
        Execution::new(self.interceptors(), subject).run()
    }
}
