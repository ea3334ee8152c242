//! Conditional steps whose branches reconverge on the step's continuation.

use super::{Continuing, Selector, Step, StepCore};
use crate::core::{Flow, Handler, StepKind, StepName};
use crate::pipeline::OpenPipeline;
use std::fmt;

/// Optionally routes the input through a branch.
///
/// The selector receives the input, the compiled branch and the step's
/// continuation. The branch is compiled against that same continuation, so
/// calling either leads to the same place.
pub struct IfStep<I, B, N, F: Flow> {
    core: StepCore<Selector<I, B, N, F>>,
    branch: OpenPipeline<B, N, F>,
}

impl<I, B, N, F> IfStep<I, B, N, F>
where
    I: Send + 'static,
    B: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(
        name: StepName,
        is_entry: bool,
        selector: Selector<I, B, N, F>,
        branch: OpenPipeline<B, N, F>,
    ) -> Self {
        Self {
            core: StepCore::new(name, StepKind::If, is_entry, selector),
            branch,
        }
    }

    /// Returns the branch taken when the condition holds.
    #[must_use]
    pub fn branch(&self) -> &OpenPipeline<B, N, F> {
        &self.branch
    }
}

impl<I, B, N, F> Step for IfStep<I, B, N, F>
where
    I: Send + 'static,
    B: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    type Delegate = Selector<I, B, N, F>;

    fn core(&self) -> &StepCore<Self::Delegate> {
        &self.core
    }
}

impl<I, B, N, F> Continuing<I, F> for IfStep<I, B, N, F>
where
    I: Send + 'static,
    B: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    type Out = N;

    fn bind_next(&self, next: Handler<N, F>) -> Handler<I, F> {
        let selector = self.core.resolve();
        let on_true = self.branch.compile_into(next.clone());
        Handler::new(move |input: I, ctx: F::Ctx| {
            selector(input, ctx, on_true.clone(), next.clone())
        })
    }
}

impl<I, B, N, F: Flow> fmt::Debug for IfStep<I, B, N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IfStep")
            .field("core", &self.core)
            .field("branch", &self.branch.name())
            .finish()
    }
}

/// Routes the input through one of two branches.
///
/// Both branches are compiled against the step's continuation.
pub struct IfElseStep<I, BT, BF, N, F: Flow> {
    core: StepCore<Selector<I, BT, BF, F>>,
    on_true: OpenPipeline<BT, N, F>,
    on_false: OpenPipeline<BF, N, F>,
}

impl<I, BT, BF, N, F> IfElseStep<I, BT, BF, N, F>
where
    I: Send + 'static,
    BT: Send + 'static,
    BF: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(
        name: StepName,
        is_entry: bool,
        selector: Selector<I, BT, BF, F>,
        on_true: OpenPipeline<BT, N, F>,
        on_false: OpenPipeline<BF, N, F>,
    ) -> Self {
        Self {
            core: StepCore::new(name, StepKind::IfElse, is_entry, selector),
            on_true,
            on_false,
        }
    }

    /// Returns the branch for a true condition.
    #[must_use]
    pub fn true_branch(&self) -> &OpenPipeline<BT, N, F> {
        &self.on_true
    }

    /// Returns the branch for a false condition.
    #[must_use]
    pub fn false_branch(&self) -> &OpenPipeline<BF, N, F> {
        &self.on_false
    }
}

impl<I, BT, BF, N, F> Step for IfElseStep<I, BT, BF, N, F>
where
    I: Send + 'static,
    BT: Send + 'static,
    BF: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    type Delegate = Selector<I, BT, BF, F>;

    fn core(&self) -> &StepCore<Self::Delegate> {
        &self.core
    }
}

impl<I, BT, BF, N, F> Continuing<I, F> for IfElseStep<I, BT, BF, N, F>
where
    I: Send + 'static,
    BT: Send + 'static,
    BF: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    type Out = N;

    fn bind_next(&self, next: Handler<N, F>) -> Handler<I, F> {
        let selector = self.core.resolve();
        let on_true = self.on_true.compile_into(next.clone());
        let on_false = self.on_false.compile_into(next);
        Handler::new(move |input: I, ctx: F::Ctx| {
            selector(input, ctx, on_true.clone(), on_false.clone())
        })
    }
}

impl<I, BT, BF, N, F: Flow> fmt::Debug for IfElseStep<I, BT, BF, N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IfElseStep")
            .field("core", &self.core)
            .field("on_true", &self.on_true.name())
            .field("on_false", &self.on_false.name())
            .finish()
    }
}
