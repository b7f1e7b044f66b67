//! Registered transform handlers.

use crate::error::BoxError;
use std::any::Any;

/// A payload flowing through transform dispatch: any sendable value.
pub type AnyValue = Box<dyn Any + Send>;

/// Type-erased predicate over (context, value).
pub type DynPredicate<C> = Box<dyn Fn(&C, &dyn Any) -> bool + Send + Sync>;

/// Type-erased transform body. `Ok(Some(next))` rewrites the value,
/// `Ok(None)` leaves it as is (the handler is still marked visited).
pub type DynTransform<C> =
    Box<dyn Fn(&C, &dyn Any) -> Result<Option<AnyValue>, BoxError> + Send + Sync>;

/// One registered handler: a monotonically assigned id (for the visited
/// bitset), a predicate, and the transform body.
pub(crate) struct Handler<C> {
    pub(crate) id: usize,
    pub(crate) type_name: &'static str,
    pub(crate) predicate: DynPredicate<C>,
    pub(crate) apply: DynTransform<C>,
}
