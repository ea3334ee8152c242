//! Terminal branching into independent pipelines.
//!
//! Fork branches are complete pipelines of their own. The step has no
//! continuation, so whatever a branch returns is what the whole invocation
//! returns.

use super::{CaseSelector, Cases, Selector, Step, StepCore, Terminating};
use crate::core::{Flow, Handler, StepKind, StepName};
use crate::pipeline::Pipeline;
use std::collections::HashMap;
use std::fmt;

/// Hands the input to one of two independent pipelines.
pub struct ForkStep<I, A, B, F: Flow> {
    core: StepCore<Selector<I, A, B, F>>,
    left: Pipeline<A, F>,
    right: Pipeline<B, F>,
}

impl<I, A, B, F> ForkStep<I, A, B, F>
where
    I: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(
        name: StepName,
        is_entry: bool,
        selector: Selector<I, A, B, F>,
        left: Pipeline<A, F>,
        right: Pipeline<B, F>,
    ) -> Self {
        Self {
            core: StepCore::new(name, StepKind::Fork, is_entry, selector),
            left,
            right,
        }
    }

    /// Returns the first branch.
    #[must_use]
    pub fn left(&self) -> &Pipeline<A, F> {
        &self.left
    }

    /// Returns the second branch.
    #[must_use]
    pub fn right(&self) -> &Pipeline<B, F> {
        &self.right
    }
}

impl<I, A, B, F> Step for ForkStep<I, A, B, F>
where
    I: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Flow,
{
    type Delegate = Selector<I, A, B, F>;

    fn core(&self) -> &StepCore<Self::Delegate> {
        &self.core
    }
}

impl<I, A, B, F> Terminating<I, F> for ForkStep<I, A, B, F>
where
    I: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    F: Flow,
{
    fn bind_terminal(&self) -> Handler<I, F> {
        let selector = self.core.resolve();
        let left = self.left.compile();
        let right = self.right.compile();
        Handler::new(move |input: I, ctx: F::Ctx| {
            selector(input, ctx, left.clone(), right.clone())
        })
    }
}

impl<I, A, B, F: Flow> fmt::Debug for ForkStep<I, A, B, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkStep")
            .field("core", &self.core)
            .field("left", &self.left.name())
            .field("right", &self.right.name())
            .finish()
    }
}

/// Hands the input to one of several keyed pipelines or the default.
pub struct MultiForkStep<I, B, D, F: Flow> {
    core: StepCore<CaseSelector<I, B, D, F>>,
    cases: HashMap<String, Pipeline<B, F>>,
    default: Pipeline<D, F>,
}

impl<I, B, D, F> MultiForkStep<I, B, D, F>
where
    I: Send + 'static,
    B: Send + 'static,
    D: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(
        name: StepName,
        is_entry: bool,
        selector: CaseSelector<I, B, D, F>,
        cases: HashMap<String, Pipeline<B, F>>,
        default: Pipeline<D, F>,
    ) -> Self {
        Self {
            core: StepCore::new(name, StepKind::MultiFork, is_entry, selector),
            cases,
            default,
        }
    }

    /// Returns the pipeline registered under `key`.
    #[must_use]
    pub fn case(&self, key: &str) -> Option<&Pipeline<B, F>> {
        self.cases.get(key)
    }

    /// Returns the default pipeline.
    #[must_use]
    pub fn default_branch(&self) -> &Pipeline<D, F> {
        &self.default
    }

    /// Returns the case keys in sorted order.
    #[must_use]
    pub fn case_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.cases.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl<I, B, D, F> Step for MultiForkStep<I, B, D, F>
where
    I: Send + 'static,
    B: Send + 'static,
    D: Send + 'static,
    F: Flow,
{
    type Delegate = CaseSelector<I, B, D, F>;

    fn core(&self) -> &StepCore<Self::Delegate> {
        &self.core
    }
}

impl<I, B, D, F> Terminating<I, F> for MultiForkStep<I, B, D, F>
where
    I: Send + 'static,
    B: Send + 'static,
    D: Send + 'static,
    F: Flow,
{
    fn bind_terminal(&self) -> Handler<I, F> {
        let selector = self.core.resolve();
        let compiled = self
            .cases
            .iter()
            .map(|(key, branch)| (key.clone(), branch.compile()))
            .collect();
        let cases = Cases::new(compiled, self.default.compile());
        Handler::new(move |input: I, ctx: F::Ctx| selector(input, ctx, cases.clone()))
    }
}

impl<I, B, D, F: Flow> fmt::Debug for MultiForkStep<I, B, D, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.cases.keys().collect();
        keys.sort_unstable();
        f.debug_struct("MultiForkStep")
            .field("core", &self.core)
            .field("cases", &keys)
            .field("default", &self.default.name())
            .finish()
    }
}
