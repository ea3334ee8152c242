//! Chain nodes and the fluent cursor that extends them.
//!
//! A chain is a linked list running from the tail back to the entry. Each
//! node owns its predecessor, so compiling walks tail to head: the tail
//! builds its local handler first and hands it to its predecessor as that
//! predecessor's continuation.

use super::builder::PipelineBuilder;
use super::definition::{OpenPipeline, Pipeline};
use crate::core::{Flow, Handler, Outcome, StepInfo};
use crate::errors::PipespaceError;
use crate::space::Space;
use crate::steps::{
    Cases, Continuing, ForkStep, HandlerStep, IfElseStep, IfStep, LinearStep, MultiForkStep,
    SwitchStep, Terminating,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A non-terminal chain segment from entry type `E` to a tail producing `O`.
pub(crate) trait Link<E, O, F: Flow>: Send + Sync {
    /// Builds the segment's handler, wiring the tail to `next`.
    fn build_handler(&self, next: Handler<O, F>) -> Handler<E, F>;

    /// Appends the segment's steps, entry first.
    fn collect_steps(&self, out: &mut Vec<StepInfo>);
}

/// A chain segment ending in a terminal step.
pub(crate) trait Terminal<E, F: Flow>: Send + Sync {
    /// Builds the segment's handler.
    fn build_handler(&self) -> Handler<E, F>;

    /// Appends the segment's steps, entry first.
    fn collect_steps(&self, out: &mut Vec<StepInfo>);
}

/// What precedes a node: nothing (the node is the entry) or another segment.
pub(crate) enum Upstream<E, I, F: Flow> {
    Entry(fn(Handler<I, F>) -> Handler<E, F>),
    Step(Arc<dyn Link<E, I, F>>),
}

impl<E, F: Flow> Upstream<E, E, F> {
    pub(crate) fn entry() -> Self {
        Self::Entry(std::convert::identity)
    }
}

impl<E, I, F: Flow> Upstream<E, I, F> {
    fn is_entry(&self) -> bool {
        matches!(self, Self::Entry(_))
    }

    fn attach(&self, local: Handler<I, F>) -> Handler<E, F> {
        match self {
            Self::Entry(finish) => finish(local),
            Self::Step(link) => link.build_handler(local),
        }
    }

    fn collect_steps(&self, out: &mut Vec<StepInfo>) {
        if let Self::Step(link) = self {
            link.collect_steps(out);
        }
    }
}

/// A registered step together with its predecessor.
pub(crate) struct Node<E, I, S, F: Flow> {
    upstream: Upstream<E, I, F>,
    step: Arc<S>,
}

impl<E, I, S, F> Link<E, S::Out, F> for Node<E, I, S, F>
where
    E: 'static,
    I: 'static,
    S: Continuing<I, F>,
    F: Flow,
{
    fn build_handler(&self, next: Handler<S::Out, F>) -> Handler<E, F> {
        debug!(step = %self.step.name(), kind = %self.step.kind(), "Assembling step handler");
        self.upstream.attach(self.step.bind_next(next))
    }

    fn collect_steps(&self, out: &mut Vec<StepInfo>) {
        self.upstream.collect_steps(out);
        out.push(self.step.info());
    }
}

impl<E, I, S, F> Terminal<E, F> for Node<E, I, S, F>
where
    E: 'static,
    I: 'static,
    S: Terminating<I, F>,
    F: Flow,
{
    fn build_handler(&self) -> Handler<E, F> {
        debug!(step = %self.step.name(), kind = %self.step.kind(), "Assembling step handler");
        self.upstream.attach(self.step.bind_terminal())
    }

    fn collect_steps(&self, out: &mut Vec<StepInfo>) {
        self.upstream.collect_steps(out);
        out.push(self.step.info());
    }
}

impl<'s, E, F> PipelineBuilder<'s, E, F>
where
    E: Send + 'static,
    F: Flow,
{
    /// Registers a continuing step behind `upstream`.
    pub(crate) fn extend<I, S>(
        mut self,
        upstream: Upstream<E, I, F>,
        step: S,
    ) -> Result<Chain<'s, E, S::Out, F>, PipespaceError>
    where
        I: 'static,
        S: Continuing<I, F>,
    {
        let step = self.register(step)?;
        if upstream.is_entry() {
            self.set_entry(step.info());
        }
        Ok(Chain {
            builder: self,
            tail: Arc::new(Node { upstream, step }),
        })
    }

    /// Registers a terminal step behind `upstream`.
    pub(crate) fn finish<I, S>(
        mut self,
        upstream: Upstream<E, I, F>,
        step: S,
    ) -> Result<TerminalChain<'s, E, F>, PipespaceError>
    where
        I: 'static,
        S: Terminating<I, F>,
    {
        let step = self.register(step)?;
        if upstream.is_entry() {
            self.set_entry(step.info());
        }
        Ok(TerminalChain {
            builder: self,
            tail: Arc::new(Node { upstream, step }),
        })
    }
}

/// Fluent position after a non-terminal step whose output is `O`.
///
/// Each `then_*` call registers one more step in the space and moves the
/// cursor past it. Name uniqueness is enforced at registration; a failed
/// call leaves the space as it was.
pub struct Chain<'s, E, O, F: Flow> {
    builder: PipelineBuilder<'s, E, F>,
    tail: Arc<dyn Link<E, O, F>>,
}

impl<'s, E, O, F> Chain<'s, E, O, F>
where
    E: Send + 'static,
    O: Send + 'static,
    F: Flow,
{
    /// Returns the name of the pipeline under construction.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        self.builder.name()
    }

    /// Returns the space steps are registered in.
    #[must_use]
    pub fn space(&self) -> &'s Space {
        self.builder.space()
    }

    /// Appends a linear step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already taken.
    pub fn then_linear<N, T>(
        self,
        name: &str,
        transform: T,
    ) -> Result<Chain<'s, E, N, F>, PipespaceError>
    where
        N: Send + 'static,
        T: Fn(O, F::Ctx) -> F::Eff<N> + Send + Sync + 'static,
    {
        let name = self.builder.qualify(name)?;
        let step = LinearStep::<O, N, F>::new(name, false, Arc::new(transform));
        self.builder.extend(Upstream::Step(self.tail), step)
    }

    /// Appends an If step whose branch is built by `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if `branch`
    /// fails.
    pub fn then_if<B, N, S, P>(
        self,
        name: &str,
        selector: S,
        branch: P,
    ) -> Result<Chain<'s, E, N, F>, PipespaceError>
    where
        B: Send + 'static,
        N: Send + 'static,
        S: Fn(O, F::Ctx, Handler<B, F>, Handler<N, F>) -> Outcome<F> + Send + Sync + 'static,
        P: FnOnce(&'s Space) -> Result<OpenPipeline<B, N, F>, PipespaceError>,
    {
        let name = self.builder.qualify(name)?;
        let space = self.builder.space();
        space.atomically(move || {
            let branch = branch(space)?;
            let step = IfStep::<O, B, N, F>::new(name, false, Arc::new(selector), branch);
            self.builder.extend(Upstream::Step(self.tail), step)
        })
    }

    /// Appends an IfElse step whose branches are built by `on_true` and
    /// `on_false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn then_if_else<BT, BF, N, S, PT, PF>(
        self,
        name: &str,
        selector: S,
        on_true: PT,
        on_false: PF,
    ) -> Result<Chain<'s, E, N, F>, PipespaceError>
    where
        BT: Send + 'static,
        BF: Send + 'static,
        N: Send + 'static,
        S: Fn(O, F::Ctx, Handler<BT, F>, Handler<BF, F>) -> Outcome<F> + Send + Sync + 'static,
        PT: FnOnce(&'s Space) -> Result<OpenPipeline<BT, N, F>, PipespaceError>,
        PF: FnOnce(&'s Space) -> Result<OpenPipeline<BF, N, F>, PipespaceError>,
    {
        let name = self.builder.qualify(name)?;
        let space = self.builder.space();
        space.atomically(move || {
            let on_true = on_true(space)?;
            let on_false = on_false(space)?;
            let step = IfElseStep::<O, BT, BF, N, F>::new(
                name,
                false,
                Arc::new(selector),
                on_true,
                on_false,
            );
            self.builder.extend(Upstream::Step(self.tail), step)
        })
    }

    /// Appends a Switch step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn then_switch<B, D, N, S, PC, PD>(
        self,
        name: &str,
        selector: S,
        cases: PC,
        default: PD,
    ) -> Result<Chain<'s, E, N, F>, PipespaceError>
    where
        B: Send + 'static,
        D: Send + 'static,
        N: Send + 'static,
        S: Fn(O, F::Ctx, Cases<B, D, F>) -> Outcome<F> + Send + Sync + 'static,
        PC: FnOnce(&'s Space) -> Result<HashMap<String, OpenPipeline<B, N, F>>, PipespaceError>,
        PD: FnOnce(&'s Space) -> Result<OpenPipeline<D, N, F>, PipespaceError>,
    {
        let name = self.builder.qualify(name)?;
        let space = self.builder.space();
        space.atomically(move || {
            let cases = cases(space)?;
            let default = default(space)?;
            let step = SwitchStep::<O, B, D, N, F>::new(
                name,
                false,
                Arc::new(selector),
                cases,
                default,
            );
            self.builder.extend(Upstream::Step(self.tail), step)
        })
    }

    /// Ends the chain with a Fork step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn then_fork<A, B, S, PL, PR>(
        self,
        name: &str,
        selector: S,
        left: PL,
        right: PR,
    ) -> Result<TerminalChain<'s, E, F>, PipespaceError>
    where
        A: Send + 'static,
        B: Send + 'static,
        S: Fn(O, F::Ctx, Handler<A, F>, Handler<B, F>) -> Outcome<F> + Send + Sync + 'static,
        PL: FnOnce(&'s Space) -> Result<Pipeline<A, F>, PipespaceError>,
        PR: FnOnce(&'s Space) -> Result<Pipeline<B, F>, PipespaceError>,
    {
        let name = self.builder.qualify(name)?;
        let space = self.builder.space();
        space.atomically(move || {
            let left = left(space)?;
            let right = right(space)?;
            let step = ForkStep::<O, A, B, F>::new(
                name,
                false,
                Arc::new(selector),
                left,
                right,
            );
            self.builder.finish(Upstream::Step(self.tail), step)
        })
    }

    /// Ends the chain with a MultiFork step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn then_multi_fork<B, D, S, PC, PD>(
        self,
        name: &str,
        selector: S,
        cases: PC,
        default: PD,
    ) -> Result<TerminalChain<'s, E, F>, PipespaceError>
    where
        B: Send + 'static,
        D: Send + 'static,
        S: Fn(O, F::Ctx, Cases<B, D, F>) -> Outcome<F> + Send + Sync + 'static,
        PC: FnOnce(&'s Space) -> Result<HashMap<String, Pipeline<B, F>>, PipespaceError>,
        PD: FnOnce(&'s Space) -> Result<Pipeline<D, F>, PipespaceError>,
    {
        let name = self.builder.qualify(name)?;
        let space = self.builder.space();
        space.atomically(move || {
            let cases = cases(space)?;
            let default = default(space)?;
            let step = MultiForkStep::<O, B, D, F>::new(
                name,
                false,
                Arc::new(selector),
                cases,
                default,
            );
            self.builder.finish(Upstream::Step(self.tail), step)
        })
    }

    /// Ends the chain with a handler step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already taken.
    pub fn handle_with<H>(
        self,
        name: &str,
        handler: H,
    ) -> Result<TerminalChain<'s, E, F>, PipespaceError>
    where
        H: Fn(O, F::Ctx) -> Outcome<F> + Send + Sync + 'static,
    {
        let name = self.builder.qualify(name)?;
        let step = HandlerStep::<O, F>::new(name, false, Arc::new(handler));
        self.builder.finish(Upstream::Step(self.tail), step)
    }

    /// Wraps the chain into an open pipeline and registers it.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline name was taken in the meantime.
    pub fn build_open_pipeline(self) -> Result<OpenPipeline<E, O, F>, PipespaceError> {
        let (space, name, entry) = self.builder.into_parts()?;
        let pipeline = OpenPipeline::new(name, entry, self.tail);
        space.register_pipeline(pipeline.name(), false, pipeline.clone())?;
        Ok(pipeline)
    }
}

impl<E, O, F: Flow> fmt::Debug for Chain<'_, E, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

/// Fluent position after a terminal step.
pub struct TerminalChain<'s, E, F: Flow> {
    builder: PipelineBuilder<'s, E, F>,
    tail: Arc<dyn Terminal<E, F>>,
}

impl<E, F> TerminalChain<'_, E, F>
where
    E: Send + 'static,
    F: Flow,
{
    /// Returns the name of the pipeline under construction.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        self.builder.name()
    }

    /// Wraps the chain into a pipeline and registers it.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline name was taken in the meantime.
    pub fn build_pipeline(self) -> Result<Pipeline<E, F>, PipespaceError> {
        let (space, name, entry) = self.builder.into_parts()?;
        let pipeline = Pipeline::new(name, space.id(), entry, self.tail);
        space.register_pipeline(pipeline.name(), true, pipeline.clone())?;
        Ok(pipeline)
    }
}

impl<E, F: Flow> fmt::Debug for TerminalChain<'_, E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalChain")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Func;
    use crate::errors::{PipespaceError, SpaceError};
    use crate::space::Space;

    #[test]
    fn test_then_linear_threads_types() {
        let space = Space::new();
        let handler = space
            .create_pipeline::<&'static str, Func<String>>("main")
            .unwrap()
            .start_with_linear("len", |s: &'static str, ()| s.len())
            .unwrap()
            .then_linear("double", |n: usize, ()| n * 2)
            .unwrap()
            .handle_with("render", |n: usize, ()| format!("{n} chars"))
            .unwrap()
            .build_pipeline()
            .unwrap()
            .compile();

        assert_eq!(handler.run("abc"), "6 chars");
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let space = Space::new();
        let err = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_linear("step", |x: i32, ()| x)
            .unwrap()
            .handle_with("step", |x: i32, ()| x)
            .unwrap_err();

        assert!(matches!(
            err,
            PipespaceError::Space(SpaceError::DuplicateStepName { .. })
        ));
        assert_eq!(space.step_count(), 1);
        assert!(!space.contains_pipeline("main"));
    }

    #[test]
    fn test_branch_failure_propagates() {
        let space = Space::new();
        let err = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_if(
                "check",
                |x: i32, (), branch, next| {
                    if x > 0 {
                        branch.call(x, ())
                    } else {
                        next.call(x, ())
                    }
                },
                |space| {
                    space
                        .create_pipeline::<i32, Func<i32>>("bad/name")?
                        .start_with_linear("inner", |x: i32, ()| x)?
                        .build_open_pipeline()
                },
            )
            .unwrap_err();

        assert_eq!(err.code(), "SPACE-008-INVALID_NAME");
        assert!(!space.contains_step("main", "check"));
    }
}
