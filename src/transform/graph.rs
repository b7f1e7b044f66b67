//! Collaborator-supplied supertype graph with a cached lookup order.

use dashmap::DashMap;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Explicit subtype → supertype edges between runtime types.
///
/// Rust has no runtime subtyping to reflect on, so collaborators declare the
/// relationships they care about (typically marker types standing for
/// abstract payload categories). The graph caches, per type, the order in
/// which handler tables should be consulted: the type itself first, then its
/// supertypes with every subtype ahead of its supertypes.
pub struct TypeGraph {
    edges: RwLock<HashMap<TypeId, Vec<TypeId>>>,
    order_cache: DashMap<TypeId, Arc<Vec<TypeId>>>,
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    pub fn new() -> Self {
        Self {
            edges: RwLock::new(HashMap::new()),
            order_cache: DashMap::new(),
        }
    }

    /// Declare `sup` a direct supertype of `sub`. Duplicate edges are
    /// ignored. Cached lookup orders that mention `sub` are evicted.
    pub fn relate(&self, sub: TypeId, sup: TypeId) {
        let mut edges = self.edges.write().unwrap_or_else(PoisonError::into_inner);
        let supers = edges.entry(sub).or_default();
        if !supers.contains(&sup) {
            supers.push(sup);
        }
        drop(edges);

        self.order_cache
            .retain(|_, order| !order.contains(&sub));
    }

    /// The handler lookup order for `ty`: `ty` first, then its supertype
    /// closure in reverse-topological order (subtypes before supertypes).
    pub fn lookup_order(&self, ty: TypeId) -> Arc<Vec<TypeId>> {
        if let Some(hit) = self.order_cache.get(&ty) {
            return Arc::clone(&hit);
        }

        let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        postorder(ty, &edges, &mut seen, &mut order);
        drop(edges);
        order.reverse();

        let order = Arc::new(order);
        self.order_cache.insert(ty, Arc::clone(&order));
        order
    }
}

fn postorder(
    ty: TypeId,
    edges: &HashMap<TypeId, Vec<TypeId>>,
    seen: &mut HashSet<TypeId>,
    order: &mut Vec<TypeId>,
) {
    if !seen.insert(ty) {
        return;
    }
    if let Some(supers) = edges.get(&ty) {
        for sup in supers {
            postorder(*sup, edges, seen, order);
        }
    }
    order.push(ty);
}
