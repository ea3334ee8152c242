//! Compiled step handlers.

use super::{Flow, Outcome};
use std::fmt;
use std::sync::Arc;

/// A compiled callable accepting `T` under flow `F`.
///
/// Handlers are what [`Pipeline::compile`](crate::pipeline::Pipeline::compile)
/// returns, and what selectors receive as branch continuations. They are cheap
/// to clone and safe to share across threads.
pub struct Handler<T, F: Flow> {
    inner: Arc<dyn Fn(T, F::Ctx) -> Outcome<F> + Send + Sync>,
}

impl<T, F: Flow> Handler<T, F> {
    /// Wraps a function as a handler.
    pub fn new<H>(func: H) -> Self
    where
        H: Fn(T, F::Ctx) -> Outcome<F> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(func),
        }
    }

    /// Wraps an already shared function.
    #[must_use]
    pub fn from_arc(inner: Arc<dyn Fn(T, F::Ctx) -> Outcome<F> + Send + Sync>) -> Self {
        Self { inner }
    }

    /// Invokes the handler.
    pub fn call(&self, input: T, ctx: F::Ctx) -> Outcome<F> {
        (self.inner)(input, ctx)
    }
}

impl<T, F> Handler<T, F>
where
    F: Flow<Ctx = ()>,
{
    /// Invokes a handler of a flow that threads no context.
    pub fn run(&self, input: T) -> Outcome<F> {
        (self.inner)(input, ())
    }
}

impl<T, F: Flow> Clone for Handler<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F: Flow> fmt::Debug for Handler<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("input", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
