//! Qualified step names and step descriptors.

use super::StepKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when rendering a [`StepName`].
pub const NAME_SEPARATOR: char = '/';

/// A step name qualified by the pipeline that owns it.
///
/// This is the key under which a step is registered in a
/// [`Space`](crate::space::Space).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepName {
    /// The owning pipeline name.
    pub pipeline: String,
    /// The step's local name.
    pub step: String,
}

impl StepName {
    /// Creates a qualified step name.
    #[must_use]
    pub fn new(step: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            step: step.into(),
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pipeline, NAME_SEPARATOR, self.step)
    }
}

/// Describes one step in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    /// The qualified step name.
    pub name: StepName,
    /// The step kind.
    pub kind: StepKind,
    /// Whether the step starts its pipeline.
    pub is_entry: bool,
}
