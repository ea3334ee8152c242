//! Core types shared by every part of the engine.
//!
//! This module contains:
//! - The [`Flow`] execution-model abstraction and its two implementations
//! - Compiled [`Handler`]s
//! - Step kinds, qualified names and descriptors

mod flow;
mod handler;
mod kind;
mod name;

pub use flow::{
    Action, AsyncAction, AsyncFunc, CancellableAction, CancellableAsyncAction,
    CancellableAsyncFunc, CancellableFunc, Deferred, Flow, Func, Immediate, Outcome,
};
pub use handler::Handler;
pub use kind::StepKind;
pub use name::{StepInfo, StepName, NAME_SEPARATOR};
