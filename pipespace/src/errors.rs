//! Error types for pipespace.
//!
//! Every error here is raised while constructing or configuring pipelines.
//! Failures inside user-supplied transforms and selectors are never caught or
//! wrapped; they travel through compiled handlers unchanged.

use crate::core::{StepKind, StepName};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for pipespace operations.
#[derive(Debug, Error)]
pub enum PipespaceError {
    /// A registry error occurred.
    #[error("{0}")]
    Space(#[from] SpaceError),

    /// A pipeline could not be built.
    #[error("{0}")]
    Build(#[from] BuildError),

    /// A mutator collection rejected an edit.
    #[error("{0}")]
    Mutator(#[from] MutatorError),

    /// Logging could not be initialised.
    #[error("Observability error: {0}")]
    Observability(String),
}

impl PipespaceError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Space(err) => err.code(),
            Self::Build(err) => err.code(),
            Self::Mutator(err) => err.code(),
            Self::Observability(_) => "OBS-001-INIT",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = match self {
            Self::Space(err) => err.to_dict(),
            Self::Build(err) => err.to_dict(),
            Self::Mutator(err) => err.to_dict(),
            Self::Observability(_) => {
                let mut map = HashMap::new();
                map.insert("type".to_string(), serde_json::json!("Observability"));
                map
            }
        };

        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Some(hint) = ErrorSuggestions::get(self.code()) {
            map.insert("fix_hint".to_string(), serde_json::json!(hint));
        }
        map
    }
}

/// Errors raised by a [`Space`](crate::space::Space).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpaceError {
    /// A step with the same qualified name is already registered.
    #[error("Step '{name}' is already registered")]
    DuplicateStepName {
        /// The conflicting step name.
        name: StepName,
    },

    /// A pipeline with the same name is already registered.
    #[error("Pipeline '{name}' is already registered")]
    DuplicatePipelineName {
        /// The conflicting pipeline name.
        name: String,
    },

    /// No step is registered under the name.
    #[error("Step '{name}' not found")]
    StepNotFound {
        /// The requested step name.
        name: StepName,
    },

    /// No pipeline is registered under the name.
    #[error("Pipeline '{name}' not found")]
    PipelineNotFound {
        /// The requested pipeline name.
        name: String,
    },

    /// The step exists but is of a different kind.
    #[error("Step '{name}' is a {actual} step, expected a {expected} step")]
    UnexpectedStepKind {
        /// The requested step name.
        name: StepName,
        /// The requested kind.
        expected: StepKind,
        /// The registered kind.
        actual: StepKind,
    },

    /// The step has the requested kind but different input/output types.
    #[error("Step '{name}' does not have type {expected_type}")]
    StepTypeMismatch {
        /// The requested step name.
        name: StepName,
        /// The requested step type.
        expected_type: &'static str,
    },

    /// The pipeline exists but is not of the requested type.
    #[error("Pipeline '{name}' does not have type {expected_type}")]
    PipelineTypeMismatch {
        /// The requested pipeline name.
        name: String,
        /// The requested pipeline type.
        expected_type: &'static str,
    },

    /// A step or pipeline name failed validation.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl SpaceError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateStepName { .. } => "SPACE-001-DUPLICATE_STEP",
            Self::DuplicatePipelineName { .. } => "SPACE-002-DUPLICATE_PIPELINE",
            Self::StepNotFound { .. } => "SPACE-003-STEP_NOT_FOUND",
            Self::PipelineNotFound { .. } => "SPACE-004-PIPELINE_NOT_FOUND",
            Self::UnexpectedStepKind { .. } => "SPACE-005-UNEXPECTED_KIND",
            Self::StepTypeMismatch { .. } => "SPACE-006-STEP_TYPE",
            Self::PipelineTypeMismatch { .. } => "SPACE-007-PIPELINE_TYPE",
            Self::InvalidName { .. } => "SPACE-008-INVALID_NAME",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::DuplicateStepName { name } => {
                map.insert("type".to_string(), serde_json::json!("DuplicateStepName"));
                map.insert("step".to_string(), serde_json::json!(name.to_string()));
            }
            Self::DuplicatePipelineName { name } => {
                map.insert("type".to_string(), serde_json::json!("DuplicatePipelineName"));
                map.insert("pipeline".to_string(), serde_json::json!(name));
            }
            Self::StepNotFound { name } => {
                map.insert("type".to_string(), serde_json::json!("StepNotFound"));
                map.insert("step".to_string(), serde_json::json!(name.to_string()));
            }
            Self::PipelineNotFound { name } => {
                map.insert("type".to_string(), serde_json::json!("PipelineNotFound"));
                map.insert("pipeline".to_string(), serde_json::json!(name));
            }
            Self::UnexpectedStepKind {
                name,
                expected,
                actual,
            } => {
                map.insert("type".to_string(), serde_json::json!("UnexpectedStepKind"));
                map.insert("step".to_string(), serde_json::json!(name.to_string()));
                map.insert("expected".to_string(), serde_json::json!(expected));
                map.insert("actual".to_string(), serde_json::json!(actual));
            }
            Self::StepTypeMismatch {
                name,
                expected_type,
            } => {
                map.insert("type".to_string(), serde_json::json!("StepTypeMismatch"));
                map.insert("step".to_string(), serde_json::json!(name.to_string()));
                map.insert("expected_type".to_string(), serde_json::json!(expected_type));
            }
            Self::PipelineTypeMismatch {
                name,
                expected_type,
            } => {
                map.insert("type".to_string(), serde_json::json!("PipelineTypeMismatch"));
                map.insert("pipeline".to_string(), serde_json::json!(name));
                map.insert("expected_type".to_string(), serde_json::json!(expected_type));
            }
            Self::InvalidName { name, reason } => {
                map.insert("type".to_string(), serde_json::json!("InvalidName"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
        }

        map
    }
}

/// Errors raised while finishing a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The builder never recorded an entry step.
    #[error("Pipeline '{pipeline}' has no entry step")]
    MissingEntryStep {
        /// The pipeline name.
        pipeline: String,
    },

    /// A pipeline was compiled against a space it was not built in.
    #[error("Pipeline '{pipeline}' belongs to space {expected}, not space {actual}")]
    SpaceMismatch {
        /// The pipeline name.
        pipeline: String,
        /// The id of the space the pipeline was built in.
        expected: u64,
        /// The id of the space passed in.
        actual: u64,
    },
}

impl BuildError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingEntryStep { .. } => "BUILD-001-MISSING_ENTRY",
            Self::SpaceMismatch { .. } => "BUILD-002-SPACE_MISMATCH",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        match self {
            Self::MissingEntryStep { pipeline } => {
                map.insert("type".to_string(), serde_json::json!("MissingEntryStep"));
                map.insert("pipeline".to_string(), serde_json::json!(pipeline));
            }
            Self::SpaceMismatch {
                pipeline,
                expected,
                actual,
            } => {
                map.insert("type".to_string(), serde_json::json!("SpaceMismatch"));
                map.insert("pipeline".to_string(), serde_json::json!(pipeline));
                map.insert("expected".to_string(), serde_json::json!(expected));
                map.insert("actual".to_string(), serde_json::json!(actual));
            }
        }
        map
    }
}

/// Errors raised by a [`StepMutators`](crate::mutators::StepMutators) collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutatorError {
    /// The requested priority slot is taken.
    #[error("Priority {priority} is already reserved by mutator '{occupant}'")]
    PriorityReserved {
        /// The requested priority.
        priority: i32,
        /// The mutator occupying the slot.
        occupant: String,
    },

    /// Another slot already holds a mutator with this name.
    #[error("Mutator name '{name}' is already used at priority {priority}")]
    NameAlreadyUsed {
        /// The duplicated name.
        name: String,
        /// The priority of the existing mutator.
        priority: i32,
    },

    /// No mutator is registered at the priority.
    #[error("No mutator at priority {priority}")]
    MutatorNotFound {
        /// The requested priority.
        priority: i32,
    },

    /// Every slot in the scan direction is taken.
    #[error("No free priority slot found from {requested}")]
    NoFreePriority {
        /// The priority the scan started from.
        requested: i32,
    },
}

impl MutatorError {
    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PriorityReserved { .. } => "MUTATOR-001-PRIORITY_RESERVED",
            Self::NameAlreadyUsed { .. } => "MUTATOR-002-NAME_USED",
            Self::MutatorNotFound { .. } => "MUTATOR-003-NOT_FOUND",
            Self::NoFreePriority { .. } => "MUTATOR-004-NO_FREE_SLOT",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        match self {
            Self::PriorityReserved { priority, occupant } => {
                map.insert("type".to_string(), serde_json::json!("PriorityReserved"));
                map.insert("priority".to_string(), serde_json::json!(priority));
                map.insert("occupant".to_string(), serde_json::json!(occupant));
            }
            Self::NameAlreadyUsed { name, priority } => {
                map.insert("type".to_string(), serde_json::json!("NameAlreadyUsed"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("priority".to_string(), serde_json::json!(priority));
            }
            Self::MutatorNotFound { priority } => {
                map.insert("type".to_string(), serde_json::json!("MutatorNotFound"));
                map.insert("priority".to_string(), serde_json::json!(priority));
            }
            Self::NoFreePriority { requested } => {
                map.insert("type".to_string(), serde_json::json!("NoFreePriority"));
                map.insert("requested".to_string(), serde_json::json!(requested));
            }
        }
        map
    }
}

/// Provides default suggestions for common error codes.
pub struct ErrorSuggestions;

impl ErrorSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "SPACE-001-DUPLICATE_STEP" => Some(
                "Step names must be unique within a pipeline. \
                 Check whether the same chain was attached twice.",
            ),
            "SPACE-002-DUPLICATE_PIPELINE" => Some(
                "Pipeline names must be unique within a space. \
                 Rename one of the pipelines or reuse the registered one by name.",
            ),
            "SPACE-003-STEP_NOT_FOUND" | "SPACE-004-PIPELINE_NOT_FOUND" => Some(
                "Check the pipeline and step names for typos and make sure the \
                 pipeline was built before it is looked up.",
            ),
            "SPACE-005-UNEXPECTED_KIND" => Some(
                "Use the lookup matching the kind the step was declared with.",
            ),
            "SPACE-006-STEP_TYPE" | "SPACE-007-PIPELINE_TYPE" => Some(
                "The lookup's type parameters must match the input and output \
                 types the step or pipeline was declared with.",
            ),
            "BUILD-001-MISSING_ENTRY" => Some(
                "Start the pipeline with one of the start_with_* methods before building it.",
            ),
            "BUILD-002-SPACE_MISMATCH" => Some(
                "Pass the space the pipeline was created from, or look the pipeline \
                 up in the other space and compile that one.",
            ),
            "MUTATOR-001-PRIORITY_RESERVED" => Some(
                "Pick a free priority, or add with BeforeIfReserved / AfterIfReserved \
                 to take the nearest free slot.",
            ),
            "MUTATOR-002-NAME_USED" => Some(
                "Mutator names are unique per step. Use replace or add_or_replace \
                 to change an existing mutator.",
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_error_messages() {
        let err = SpaceError::UnexpectedStepKind {
            name: StepName::new("route", "main"),
            expected: StepKind::Fork,
            actual: StepKind::Linear,
        };

        assert_eq!(
            err.to_string(),
            "Step 'main/route' is a linear step, expected a fork step"
        );
        assert_eq!(err.code(), "SPACE-005-UNEXPECTED_KIND");
    }

    #[test]
    fn test_space_error_to_dict() {
        let err = SpaceError::UnexpectedStepKind {
            name: StepName::new("route", "main"),
            expected: StepKind::Fork,
            actual: StepKind::Linear,
        };

        let dict = err.to_dict();
        assert_eq!(dict.get("type").unwrap(), "UnexpectedStepKind");
        assert_eq!(dict.get("expected").unwrap(), "fork");
        assert_eq!(dict.get("actual").unwrap(), "linear");
    }

    #[test]
    fn test_umbrella_error_to_dict() {
        let err: PipespaceError = MutatorError::PriorityReserved {
            priority: 3,
            occupant: "audit".to_string(),
        }
        .into();

        let dict = err.to_dict();
        assert_eq!(dict.get("code").unwrap(), "MUTATOR-001-PRIORITY_RESERVED");
        assert_eq!(dict.get("occupant").unwrap(), "audit");
        assert!(dict.contains_key("fix_hint"));
        assert_eq!(
            dict.get("message").unwrap(),
            "Priority 3 is already reserved by mutator 'audit'"
        );
    }

    #[test]
    fn test_build_error_code() {
        let err: PipespaceError = BuildError::MissingEntryStep {
            pipeline: "main".to_string(),
        }
        .into();
        assert_eq!(err.code(), "BUILD-001-MISSING_ENTRY");
        assert_eq!(err.to_string(), "Pipeline 'main' has no entry step");
    }

    #[test]
    fn test_space_mismatch_details() {
        let err = BuildError::SpaceMismatch {
            pipeline: "main".to_string(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Pipeline 'main' belongs to space 1, not space 2");
        let dict = err.to_dict();
        assert_eq!(dict.get("expected").unwrap(), 1);
        assert_eq!(dict.get("actual").unwrap(), 2);
        assert!(ErrorSuggestions::get(err.code()).is_some());
    }

    #[test]
    fn test_suggestions() {
        assert!(ErrorSuggestions::get("SPACE-001-DUPLICATE_STEP").is_some());
        assert!(ErrorSuggestions::get("MUTATOR-004-NO_FREE_SLOT").is_none());
        assert!(ErrorSuggestions::get("UNKNOWN").is_none());
    }
}
