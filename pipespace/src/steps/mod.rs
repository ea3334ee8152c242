//! Step kinds and their compile-time behavior.
//!
//! Each step owns a delegate (the caller-supplied transform, selector or
//! terminal function) and the [`StepMutators`] wrapping it. Steps are
//! registered in a [`Space`](crate::space::Space) under their qualified
//! [`StepName`] and stay immutable apart from their mutators.

mod cases;
mod conditional;
mod fork;
mod handler;
mod linear;
mod switch;

pub use cases::Cases;
pub use conditional::{IfElseStep, IfStep};
pub use fork::{ForkStep, MultiForkStep};
pub use handler::HandlerStep;
pub use linear::LinearStep;
pub use switch::SwitchStep;

use crate::core::{Flow, Handler, Outcome, StepInfo, StepKind, StepName};
use crate::mutators::{Mutator, StepMutators};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// Delegate of a [`LinearStep`]: maps the step input to the next step's input.
pub type Transform<I, O, F> =
    Arc<dyn Fn(I, <F as Flow>::Ctx) -> <F as Flow>::Eff<O> + Send + Sync>;

/// Delegate of [`IfStep`], [`IfElseStep`] and [`ForkStep`]: receives the input
/// and two compiled continuations and decides which one to call.
pub type Selector<I, L, R, F> =
    Arc<dyn Fn(I, <F as Flow>::Ctx, Handler<L, F>, Handler<R, F>) -> Outcome<F> + Send + Sync>;

/// Delegate of [`SwitchStep`] and [`MultiForkStep`]: receives the input and
/// the keyed branches.
pub type CaseSelector<I, B, D, F> =
    Arc<dyn Fn(I, <F as Flow>::Ctx, Cases<B, D, F>) -> Outcome<F> + Send + Sync>;

/// Delegate of a [`HandlerStep`]: consumes the input.
pub type Consumer<I, F> = Arc<dyn Fn(I, <F as Flow>::Ctx) -> Outcome<F> + Send + Sync>;

/// State shared by every step kind.
pub struct StepCore<D> {
    name: StepName,
    kind: StepKind,
    is_entry: bool,
    delegate: D,
    mutators: Mutex<StepMutators<D>>,
}

impl<D: Clone> StepCore<D> {
    pub(crate) fn new(name: StepName, kind: StepKind, is_entry: bool, delegate: D) -> Self {
        Self {
            name,
            kind,
            is_entry,
            delegate,
            mutators: Mutex::new(StepMutators::new()),
        }
    }

    /// Returns the delegate wrapped by the current mutators.
    ///
    /// The mutators are snapshotted first, so wrap functions run without the
    /// step's lock held and may look the step up again.
    pub(crate) fn resolve(&self) -> D {
        let snapshot: Vec<Mutator<D>> = self.mutators.lock().iter().cloned().collect();
        snapshot
            .iter()
            .fold(self.delegate.clone(), |delegate, mutator| mutator.apply(delegate))
    }
}

impl<D> fmt::Debug for StepCore<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepCore")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("is_entry", &self.is_entry)
            .field("mutators", &*self.mutators.lock())
            .finish()
    }
}

/// Common accessors of every step kind.
pub trait Step: Send + Sync + 'static {
    /// The delegate type mutators wrap.
    type Delegate: Clone + Send + Sync + 'static;

    /// Returns the shared step state.
    fn core(&self) -> &StepCore<Self::Delegate>;

    /// Returns the qualified step name.
    fn name(&self) -> &StepName {
        &self.core().name
    }

    /// Returns the step kind.
    fn kind(&self) -> StepKind {
        self.core().kind
    }

    /// Returns true if the step starts its pipeline.
    fn is_entry(&self) -> bool {
        self.core().is_entry
    }

    /// Locks the step's mutators for inspection or editing.
    ///
    /// Edits take effect on the next compile of any pipeline containing the
    /// step. Compiling a pipeline that contains the step while the guard is
    /// alive deadlocks; prefer [`with_mutators`](Self::with_mutators) when
    /// the edit fits in a closure.
    fn mutators(&self) -> MutexGuard<'_, StepMutators<Self::Delegate>> {
        self.core().mutators.lock()
    }

    /// Runs `edit` with the step's mutators locked and returns its result.
    fn with_mutators<T>(&self, edit: impl FnOnce(&mut StepMutators<Self::Delegate>) -> T) -> T {
        edit(&mut self.core().mutators.lock())
    }

    /// Returns a descriptor of the step.
    fn info(&self) -> StepInfo {
        StepInfo {
            name: self.name().clone(),
            kind: self.kind(),
            is_entry: self.is_entry(),
        }
    }
}

/// A step that hands its result to a continuation.
pub(crate) trait Continuing<I, F: Flow>: Step {
    /// The continuation's input type.
    type Out: Send + 'static;

    /// Builds this step's handler wired to `next`.
    fn bind_next(&self, next: Handler<Self::Out, F>) -> Handler<I, F>;
}

/// A step that ends its chain.
pub(crate) trait Terminating<I, F: Flow>: Step {
    /// Builds this step's handler.
    fn bind_terminal(&self) -> Handler<I, F>;
}
