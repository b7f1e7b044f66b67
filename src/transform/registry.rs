//! The type-keyed handler table and its dispatch loop.

use crate::error::BoxError;
use crate::transform::graph::TypeGraph;
use crate::transform::handler::{AnyValue, DynPredicate, DynTransform, Handler};
use crate::transform::visited::Visited;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Result of one dispatch step.
pub enum Rewrite {
    /// A handler rewrote the value; scan again from the start.
    Rewritten(AnyValue),
    /// No unvisited handler applied; the value is at its fixpoint.
    Unchanged(AnyValue),
}

/// A type-keyed table of transform handlers with parent/child chaining.
///
/// An application-scoped registry holds the defaults; request-scoped children
/// search their own handlers first and fall back to the parent. The supertype
/// graph and the handler-id allocator are shared across the whole chain, so
/// a single visited bitset covers any dispatch.
pub struct TransformRegistry<C> {
    parent: Option<Arc<TransformRegistry<C>>>,
    graph: Arc<TypeGraph>,
    next_id: Arc<AtomicUsize>,
    handlers: RwLock<HashMap<TypeId, Vec<Arc<Handler<C>>>>>,
    /// Lazily computed applicable-handler list per observed runtime type,
    /// covering this registry level only.
    cache: DashMap<TypeId, Arc<Vec<Arc<Handler<C>>>>>,
}

impl<C: 'static> Default for TransformRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> TransformRegistry<C> {
    /// Create a root (application-scoped) registry.
    pub fn new() -> Self {
        Self {
            parent: None,
            graph: Arc::new(TypeGraph::new()),
            next_id: Arc::new(AtomicUsize::new(0)),
            handlers: RwLock::new(HashMap::new()),
            cache: DashMap::new(),
        }
    }

    /// Create a child registry whose handlers take precedence over this
    /// registry's for the same runtime type.
    pub fn child(self: &Arc<Self>) -> TransformRegistry<C> {
        TransformRegistry {
            parent: Some(Arc::clone(self)),
            graph: Arc::clone(&self.graph),
            next_id: Arc::clone(&self.next_id),
            handlers: RwLock::new(HashMap::new()),
            cache: DashMap::new(),
        }
    }

    /// Declare `Super` a supertype of `Sub` in the shared graph.
    ///
    /// Supertype keys are usually marker types; handlers registered for them
    /// use [`register_dyn`](Self::register_dyn) since the concrete values
    /// they see are of other Rust types.
    pub fn relate<Sub: Any, Super: Any>(&self) {
        self.relate_ids(TypeId::of::<Sub>(), TypeId::of::<Super>());
    }

    /// Type-erased form of [`relate`](Self::relate), for callers holding raw
    /// `TypeId`s.
    pub fn relate_ids(&self, sub: TypeId, sup: TypeId) {
        self.graph.relate(sub, sup);
        self.evict_where_order_mentions(sub);
    }

    /// Register a handler for values of exactly type `T`.
    pub fn register<T, P, F>(&self, predicate: P, transform: F)
    where
        T: Any + Send,
        P: Fn(&C, &T) -> bool + Send + Sync + 'static,
        F: Fn(&C, &T) -> Result<Option<AnyValue>, BoxError> + Send + Sync + 'static,
    {
        let predicate: DynPredicate<C> = Box::new(move |ctx, value| {
            value
                .downcast_ref::<T>()
                .map(|typed| predicate(ctx, typed))
                .unwrap_or(false)
        });
        let apply: DynTransform<C> = Box::new(move |ctx, value| match value.downcast_ref::<T>() {
            Some(typed) => transform(ctx, typed),
            None => Ok(None),
        });
        self.register_dyn(
            TypeId::of::<T>(),
            std::any::type_name::<T>(),
            predicate,
            apply,
        );
    }

    /// Register a type-erased handler under an arbitrary key type.
    ///
    /// Used for supertype (marker) keys whose matching values are concrete
    /// values of other runtime types.
    pub fn register_dyn(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        predicate: DynPredicate<C>,
        apply: DynTransform<C>,
    ) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut table = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
            table.entry(type_id).or_default().push(Arc::new(Handler {
                id,
                type_name,
                predicate,
                apply,
            }));
        }
        self.evict_where_order_mentions(type_id);
        tracing::debug!(handler = id, key = type_name, "transform handler registered");
    }

    /// Evict cached handler lists whose key's lookup order includes `ty`,
    /// i.e. every cached type that would consult handlers registered for
    /// `ty`. Other entries stay. The parent chain is walked so a stale list
    /// cannot survive at any ancestor level when an edge or handler is added
    /// through a child.
    fn evict_where_order_mentions(&self, ty: TypeId) {
        self.cache
            .retain(|key, _| !self.graph.lookup_order(*key).contains(&ty));
        if let Some(parent) = &self.parent {
            parent.evict_where_order_mentions(ty);
        }
    }

    /// Applicable handlers for a runtime type: this registry's (exact type
    /// first, then supertypes in lookup order), then the parent chain's.
    pub(crate) fn handlers_for(&self, ty: TypeId) -> Vec<Arc<Handler<C>>> {
        let own = self.own_handlers_for(ty);
        match &self.parent {
            Some(parent) => {
                let mut all = own.as_ref().clone();
                all.extend(parent.handlers_for(ty));
                all
            }
            None => own.as_ref().clone(),
        }
    }

    fn own_handlers_for(&self, ty: TypeId) -> Arc<Vec<Arc<Handler<C>>>> {
        if let Some(hit) = self.cache.get(&ty) {
            return Arc::clone(&hit);
        }

        let order = self.graph.lookup_order(ty);
        let table = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut applicable = Vec::new();
        for key in order.iter() {
            if let Some(handlers) = table.get(key) {
                applicable.extend(handlers.iter().cloned());
            }
        }
        drop(table);

        let applicable = Arc::new(applicable);
        self.cache.insert(ty, Arc::clone(&applicable));
        applicable
    }

    /// Apply at most one successful rewrite.
    ///
    /// Scans the applicable handlers from the start for the first unvisited
    /// handler whose predicate accepts the value. A handler that reports "no
    /// change" is marked visited and the scan continues; a rewrite returns
    /// immediately so the caller can restart the scan (the new value may
    /// match earlier-priority handlers, possibly of a different type).
    pub fn transform_step(
        &self,
        context: &C,
        value: AnyValue,
        visited: &mut Visited,
    ) -> Result<Rewrite, BoxError> {
        let ty = (*value).type_id();
        let handlers = self.handlers_for(ty);

        for handler in &handlers {
            if visited.contains(handler.id) {
                continue;
            }
            if !(handler.predicate)(context, value.as_ref()) {
                continue;
            }
            visited.insert(handler.id);
            match (handler.apply)(context, value.as_ref())? {
                Some(next) => {
                    tracing::trace!(
                        handler = handler.id,
                        key = handler.type_name,
                        "value rewritten"
                    );
                    return Ok(Rewrite::Rewritten(next));
                }
                // Identical result: handler is spent, keep scanning.
                None => continue,
            }
        }
        Ok(Rewrite::Unchanged(value))
    }

    /// Rewrite `value` to a fixpoint.
    ///
    /// Each rewrite restarts the handler scan from the beginning; the visited
    /// set guarantees no handler fires twice within one call, so the loop
    /// terminates even when a handler's output matches its own predicate.
    pub fn transform(&self, context: &C, value: AnyValue) -> Result<AnyValue, BoxError> {
        let mut visited = Visited::new();
        let mut current = value;
        loop {
            match self.transform_step(context, current, &mut visited)? {
                Rewrite::Rewritten(next) => current = next,
                Rewrite::Unchanged(done) => return Ok(done),
            }
        }
    }
}
