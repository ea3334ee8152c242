//! The per-composition registry.
//!
//! A [`Space`] owns every step and pipeline created through it. Spaces are
//! ordinary values: applications create as many as they need and pass them
//! to the code that wires pipelines together.

mod config;
mod registry;

pub use config::SpaceConfig;
pub use registry::Space;
