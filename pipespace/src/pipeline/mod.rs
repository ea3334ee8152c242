//! Pipeline construction and compilation.
//!
//! This module provides:
//! - [`PipelineBuilder`], which starts a chain
//! - [`Chain`] and [`TerminalChain`], the fluent positions that extend it
//! - [`Pipeline`] and [`OpenPipeline`], the finished results

mod builder;
mod chain;
mod definition;


pub use builder::PipelineBuilder;
pub use chain::{Chain, TerminalChain};
pub use definition::{OpenPipeline, Pipeline};
