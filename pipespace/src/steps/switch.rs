//! Multi-way branching that reconverges on the step's continuation.

use super::{CaseSelector, Cases, Continuing, Step, StepCore};
use crate::core::{Flow, Handler, StepKind, StepName};
use crate::pipeline::OpenPipeline;
use std::collections::HashMap;
use std::fmt;

/// Routes the input through one of several keyed branches or the default.
///
/// Every case and the default are compiled against the step's continuation.
pub struct SwitchStep<I, B, D, N, F: Flow> {
    core: StepCore<CaseSelector<I, B, D, F>>,
    cases: HashMap<String, OpenPipeline<B, N, F>>,
    default: OpenPipeline<D, N, F>,
}

impl<I, B, D, N, F> SwitchStep<I, B, D, N, F>
where
    I: Send + 'static,
    B: Send + 'static,
    D: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(
        name: StepName,
        is_entry: bool,
        selector: CaseSelector<I, B, D, F>,
        cases: HashMap<String, OpenPipeline<B, N, F>>,
        default: OpenPipeline<D, N, F>,
    ) -> Self {
        Self {
            core: StepCore::new(name, StepKind::Switch, is_entry, selector),
            cases,
            default,
        }
    }

    /// Returns the branch registered under `key`.
    #[must_use]
    pub fn case(&self, key: &str) -> Option<&OpenPipeline<B, N, F>> {
        self.cases.get(key)
    }

    /// Returns the default branch.
    #[must_use]
    pub fn default_branch(&self) -> &OpenPipeline<D, N, F> {
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

impl<I, B, D, N, F> Step for SwitchStep<I, B, D, N, F>
where
    I: Send + 'static,
    B: Send + 'static,
    D: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    type Delegate = CaseSelector<I, B, D, F>;

    fn core(&self) -> &StepCore<Self::Delegate> {
        &self.core
    }
}

impl<I, B, D, N, F> Continuing<I, F> for SwitchStep<I, B, D, N, F>
where
    I: Send + 'static,
    B: Send + 'static,
    D: Send + 'static,
    N: Send + 'static,
    F: Flow,
{
    type Out = N;

    fn bind_next(&self, next: Handler<N, F>) -> Handler<I, F> {
        let selector = self.core.resolve();
        let compiled = self
            .cases
            .iter()
            .map(|(key, branch)| (key.clone(), branch.compile_into(next.clone())))
            .collect();
        let cases = Cases::new(compiled, self.default.compile_into(next));
        Handler::new(move |input: I, ctx: F::Ctx| selector(input, ctx, cases.clone()))
    }
}

impl<I, B, D, N, F: Flow> fmt::Debug for SwitchStep<I, B, D, N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.cases.keys().collect();
        keys.sort_unstable();
        f.debug_struct("SwitchStep")
            .field("core", &self.core)
            .field("cases", &keys)
            .field("default", &self.default.name())
            .finish()
    }
}
