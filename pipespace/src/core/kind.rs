//! Step kind tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The shape of a step within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Applies a transform and hands the result to the continuation.
    Linear,
    /// Optionally routes through one branch before reconverging.
    If,
    /// Routes through one of two branches that reconverge.
    IfElse,
    /// Routes through one of many keyed branches (or a default) that reconverge.
    Switch,
    /// Hands the input to one of two independent terminal pipelines.
    Fork,
    /// Hands the input to one of many keyed terminal pipelines (or a default).
    MultiFork,
    /// Consumes the input; ends the chain.
    Handler,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::If => write!(f, "if"),
            Self::IfElse => write!(f, "if_else"),
            Self::Switch => write!(f, "switch"),
            Self::Fork => write!(f, "fork"),
            Self::MultiFork => write!(f, "multi_fork"),
            Self::Handler => write!(f, "handler"),
        }
    }
}

impl StepKind {
    /// Returns true if a step of this kind ends its chain.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Handler | Self::Fork | Self::MultiFork)
    }

    /// Returns true if the branches of this kind share the step's continuation.
    #[must_use]
    pub fn reconverges(&self) -> bool {
        matches!(self, Self::If | Self::IfElse | Self::Switch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(StepKind::Linear.to_string(), "linear");
        assert_eq!(StepKind::IfElse.to_string(), "if_else");
        assert_eq!(StepKind::MultiFork.to_string(), "multi_fork");
    }

    #[test]
    fn test_kind_serde_matches_display() {
        let json = serde_json::to_string(&StepKind::MultiFork).unwrap();
        assert_eq!(json, "\"multi_fork\"");

        let parsed: StepKind = serde_json::from_str("\"if_else\"").unwrap();
        assert_eq!(parsed, StepKind::IfElse);
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(StepKind::Handler.is_terminal());
        assert!(StepKind::Fork.is_terminal());
        assert!(StepKind::MultiFork.is_terminal());
        assert!(!StepKind::Linear.is_terminal());
        assert!(!StepKind::Switch.is_terminal());
    }

    #[test]
    fn test_reconverging_kinds() {
        assert!(StepKind::If.reconverges());
        assert!(StepKind::Switch.reconverges());
        assert!(!StepKind::Fork.reconverges());
        assert!(!StepKind::Linear.reconverges());
    }
}
