//! Step mutators.
//!
//! A mutator is a named, prioritized function that wraps a step's delegate
//! (its transform, selector or terminal function). Mutators are attached to
//! steps after the chain is declared and are resolved every time a pipeline
//! is compiled.

mod collection;
mod configurator;
mod mutator;

pub use collection::StepMutators;
pub use configurator::{ConfigureAction, MutatorsConfigurator};
pub use mutator::{AddingMode, Mutator};
