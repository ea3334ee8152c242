//! Linear steps.

use super::{Continuing, Step, StepCore, Transform};
use crate::core::{Flow, Handler, StepKind, StepName};
use std::fmt;

/// Applies a transform and passes the result on.
pub struct LinearStep<I, O, F>
where
    O: Send + 'static,
    F: Flow,
{
    core: StepCore<Transform<I, O, F>>,
}

impl<I, O, F> LinearStep<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(name: StepName, is_entry: bool, transform: Transform<I, O, F>) -> Self {
        Self {
            core: StepCore::new(name, StepKind::Linear, is_entry, transform),
        }
    }
}

impl<I, O, F> Step for LinearStep<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Flow,
{
    type Delegate = Transform<I, O, F>;

    fn core(&self) -> &StepCore<Self::Delegate> {
        &self.core
    }
}

impl<I, O, F> Continuing<I, F> for LinearStep<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Flow,
{
    type Out = O;

    fn bind_next(&self, next: Handler<O, F>) -> Handler<I, F> {
        let transform = self.core.resolve();
        Handler::new(move |input: I, ctx: F::Ctx| {
            let next = next.clone();
            let produced = transform(input, ctx.clone());
            F::bind::<O, _>(produced, move |output| next.call(output, ctx))
        })
    }
}

impl<I, O, F> fmt::Debug for LinearStep<I, O, F>
where
    O: Send + 'static,
    F: Flow,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearStep").field("core", &self.core).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AsyncFunc, Func};
    use crate::mutators::{AddingMode, Mutator};
    use futures::FutureExt;
    use std::sync::Arc;

    fn add_ten() -> LinearStep<i32, i32, Func<i32>> {
        LinearStep::new(
            StepName::new("add_ten", "main"),
            true,
            Arc::new(|x: i32, ()| x + 10),
        )
    }

    #[test]
    fn test_linear_invokes_continuation_with_result() {
        let step = add_ten();
        let handler = step.bind_next(Handler::new(|x: i32, ()| x * 100));

        assert_eq!(handler.run(5), 1500);
    }

    #[test]
    fn test_linear_metadata() {
        let step = add_ten();
        assert_eq!(step.kind(), StepKind::Linear);
        assert!(step.is_entry());
        assert_eq!(step.name().to_string(), "main/add_ten");
        assert!(step.mutators().is_empty());
    }

    #[test]
    fn test_mutators_resolved_at_bind_time() {
        let step = add_ten();
        let plain = step.bind_next(Handler::new(|x: i32, ()| x));

        step.mutators()
            .add_mutator(
                Mutator::new("double_input", 1, |inner: Transform<i32, i32, Func<i32>>| {
                    let wrapped: Transform<i32, i32, Func<i32>> =
                        Arc::new(move |x: i32, ctx: ()| inner(x * 2, ctx));
                    wrapped
                }),
                AddingMode::ExactPlace,
            )
            .unwrap();
        let mutated = step.bind_next(Handler::new(|x: i32, ()| x));

        assert_eq!(plain.run(5), 15);
        assert_eq!(mutated.run(5), 20);
    }

    #[tokio::test]
    async fn test_linear_deferred() {
        let step: LinearStep<i32, String, AsyncFunc<String>> = LinearStep::new(
            StepName::new("render", "main"),
            true,
            Arc::new(|x: i32, ()| async move { format!("#{x}") }.boxed()),
        );

        let handler = step.bind_next(Handler::new(|s: String, ()| {
            async move { format!("{s}!") }.boxed()
        }));

        assert_eq!(handler.run(7).await, "#7!");
    }
}
