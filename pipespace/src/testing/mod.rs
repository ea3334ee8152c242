//! Testing utilities for pipespace pipelines.
//!
//! This module provides:
//! - [`CallRecorder`], an ordered event log shared between closures
//! - Mutator builders that record entry and exit around a step delegate

mod recorder;

pub use recorder::{recording_handler_mutator, recording_transform_mutator, CallRecorder};
