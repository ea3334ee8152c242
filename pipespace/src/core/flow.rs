//! Execution models.
//!
//! Every step handler is a function `(input, ctx) -> Eff<Value>`. A [`Flow`]
//! fixes the three things that vary between execution models:
//!
//! - `Ctx`: an extra argument threaded through every call. `()` for plain
//!   flows, a [`CancellationToken`] for cancellable ones. The engine never
//!   looks at it.
//! - `Value`: what a whole invocation produces. `()` for fire-and-forget
//!   pipelines.
//! - `Eff<T>`: how a step yields a `T`. [`Immediate`] returns it directly,
//!   [`Deferred`] returns a boxed future.

use crate::cancellation::CancellationToken;
use futures::future::BoxFuture;
use std::marker::PhantomData;

/// An execution model for compiled pipelines.
pub trait Flow: Send + Sync + 'static {
    /// Extra argument passed to every step.
    type Ctx: Clone + Send + Sync + 'static;

    /// Result of invoking a compiled pipeline.
    type Value: Send + 'static;

    /// How a step yields a value of type `T`.
    type Eff<T: Send + 'static>;

    /// Feeds the value produced by `eff` into `k`.
    fn bind<T, K>(eff: Self::Eff<T>, k: K) -> Self::Eff<Self::Value>
    where
        T: Send + 'static,
        K: FnOnce(T) -> Self::Eff<Self::Value> + Send + 'static;

    /// Lifts a plain value.
    fn pure<T: Send + 'static>(value: T) -> Self::Eff<T>;
}

/// The result type of a step handler under flow `F`.
pub type Outcome<F> = <F as Flow>::Eff<<F as Flow>::Value>;

/// Synchronous execution: steps return their values directly and invoking a
/// pipeline blocks the caller until the terminal step returns.
pub struct Immediate<R = (), C = ()>(PhantomData<fn() -> (R, C)>);

impl<R, C> Flow for Immediate<R, C>
where
    R: Send + 'static,
    C: Clone + Send + Sync + 'static,
{
    type Ctx = C;
    type Value = R;
    type Eff<T: Send + 'static> = T;

    fn bind<T, K>(eff: Self::Eff<T>, k: K) -> Self::Eff<Self::Value>
    where
        T: Send + 'static,
        K: FnOnce(T) -> Self::Eff<Self::Value> + Send + 'static,
    {
        k(eff)
    }

    fn pure<T: Send + 'static>(value: T) -> Self::Eff<T> {
        value
    }
}

/// Asynchronous execution: steps return boxed futures. Suspension only
/// happens where step bodies await; the engine schedules nothing itself.
pub struct Deferred<R = (), C = ()>(PhantomData<fn() -> (R, C)>);

impl<R, C> Flow for Deferred<R, C>
where
    R: Send + 'static,
    C: Clone + Send + Sync + 'static,
{
    type Ctx = C;
    type Value = R;
    type Eff<T: Send + 'static> = BoxFuture<'static, T>;

    fn bind<T, K>(eff: Self::Eff<T>, k: K) -> Self::Eff<Self::Value>
    where
        T: Send + 'static,
        K: FnOnce(T) -> Self::Eff<Self::Value> + Send + 'static,
    {
        Box::pin(async move {
            let value = eff.await;
            k(value).await
        })
    }

    fn pure<T: Send + 'static>(value: T) -> Self::Eff<T> {
        Box::pin(futures::future::ready(value))
    }
}

/// Synchronous pipeline with no result.
pub type Action = Immediate<(), ()>;

/// Synchronous pipeline producing `R`.
pub type Func<R> = Immediate<R, ()>;

/// Synchronous pipeline with no result, threading a cancellation token.
pub type CancellableAction = Immediate<(), CancellationToken>;

/// Synchronous pipeline producing `R`, threading a cancellation token.
pub type CancellableFunc<R> = Immediate<R, CancellationToken>;

/// Asynchronous pipeline with no result.
pub type AsyncAction = Deferred<(), ()>;

/// Asynchronous pipeline producing `R`.
pub type AsyncFunc<R> = Deferred<R, ()>;

/// Asynchronous pipeline with no result, threading a cancellation token.
pub type CancellableAsyncAction = Deferred<(), CancellationToken>;

/// Asynchronous pipeline producing `R`, threading a cancellation token.
pub type CancellableAsyncFunc<R> = Deferred<R, CancellationToken>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_bind_is_application() {
        let out = <Func<i32> as Flow>::bind(4, |v: i32| v * 3);
        assert_eq!(out, 12);
    }

    #[test]
    fn test_immediate_pure() {
        let out: i32 = <Func<i32> as Flow>::pure(7);
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn test_deferred_bind_sequences_futures() {
        let first = <AsyncFunc<String> as Flow>::pure(21);
        let out = <AsyncFunc<String> as Flow>::bind(first, |v: i32| {
            <AsyncFunc<String> as Flow>::pure(format!("value={}", v * 2))
        });
        assert_eq!(out.await, "value=42");
    }
}
