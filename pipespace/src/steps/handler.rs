//! Terminal handler steps.

use super::{Consumer, Step, StepCore, Terminating};
use crate::core::{Flow, Handler, StepKind, StepName};
use std::fmt;

/// Consumes the input and produces the pipeline's value.
pub struct HandlerStep<I, F: Flow> {
    core: StepCore<Consumer<I, F>>,
}

impl<I, F> HandlerStep<I, F>
where
    I: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(name: StepName, is_entry: bool, consumer: Consumer<I, F>) -> Self {
        Self {
            core: StepCore::new(name, StepKind::Handler, is_entry, consumer),
        }
    }
}

impl<I, F> Step for HandlerStep<I, F>
where
    I: Send + 'static,
    F: Flow,
{
    type Delegate = Consumer<I, F>;

    fn core(&self) -> &StepCore<Self::Delegate> {
        &self.core
    }
}

impl<I, F> Terminating<I, F> for HandlerStep<I, F>
where
    I: Send + 'static,
    F: Flow,
{
    fn bind_terminal(&self) -> Handler<I, F> {
        Handler::from_arc(self.core.resolve())
    }
}

impl<I, F: Flow> fmt::Debug for HandlerStep<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerStep").field("core", &self.core).finish()
    }
}
