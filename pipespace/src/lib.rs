//! # Pipespace
//!
//! Composable processing pipelines with prioritized interception.
//!
//! Pipespace builds immutable chains of steps that compile into a single
//! callable:
//!
//! - **Linear steps** transform a value and pass it on
//! - **If / IfElse / Switch steps** route through branch pipelines that
//!   reconverge on the step's continuation
//! - **Fork / MultiFork steps** hand off to independent pipelines
//! - **Handler steps** end a chain
//!
//! Every step carries a collection of **mutators**: named, prioritized
//! wrappers around the step's delegate, applied each time a pipeline is
//! compiled. Steps and pipelines live in a [`Space`](space::Space), which
//! enforces name uniqueness and offers typed lookups.
//!
//! One [`Flow`](core::Flow) abstraction covers synchronous and asynchronous
//! execution, with or without a cancellation token, with or without a result.
//!
//! ## Quick Start
//!
//! ```rust
//! use pipespace::prelude::*;
//!
//! let space = Space::new();
//! let pipeline = space
//!     .create_pipeline::<i32, Func<i32>>("main")?
//!     .start_with_linear("add_ten", |x: i32, ()| x + 10)?
//!     .handle_with("consume", |x: i32, ()| x)?
//!     .build_pipeline()?;
//!
//! assert_eq!(pipeline.compile().run(5), 15);
//! # Ok::<(), PipespaceError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::type_complexity
)]

pub mod cancellation;
pub mod core;
pub mod errors;
pub mod mutators;
pub mod observability;
pub mod pipeline;
pub mod space;
pub mod steps;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::core::{
        Action, AsyncAction, AsyncFunc, CancellableAction, CancellableAsyncAction,
        CancellableAsyncFunc, CancellableFunc, Deferred, Flow, Func, Handler, Immediate,
        StepInfo, StepKind, StepName,
    };
    pub use crate::errors::{BuildError, MutatorError, PipespaceError, SpaceError};
    pub use crate::mutators::{AddingMode, Mutator, MutatorsConfigurator, StepMutators};
    pub use crate::observability::{init_tracing, TracingConfig};
    pub use crate::pipeline::{Chain, OpenPipeline, Pipeline, PipelineBuilder, TerminalChain};
    pub use crate::space::{Space, SpaceConfig};
    pub use crate::steps::{
        CaseSelector, Cases, Consumer, ForkStep, HandlerStep, IfElseStep, IfStep, LinearStep,
        MultiForkStep, Selector, Step, SwitchStep, Transform,
    };
}
