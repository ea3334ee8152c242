//! Named, prioritized wrappers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How [`StepMutators::add_mutator`](super::StepMutators::add_mutator)
/// treats an occupied priority slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddingMode {
    /// Insert at exactly the requested priority or fail.
    #[default]
    ExactPlace,
    /// Walk down from the requested priority to the first free slot.
    BeforeIfReserved,
    /// Walk up from the requested priority to the first free slot.
    AfterIfReserved,
}

/// A named wrapper around a step delegate of type `D`.
///
/// The wrap function receives the delegate built so far and returns the
/// delegate that replaces it.
pub struct Mutator<D> {
    name: String,
    priority: i32,
    wrap: Arc<dyn Fn(D) -> D + Send + Sync>,
}

impl<D> Mutator<D> {
    /// Creates a new mutator.
    pub fn new<W>(name: impl Into<String>, priority: i32, wrap: W) -> Self
    where
        W: Fn(D) -> D + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            wrap: Arc::new(wrap),
        }
    }

    /// Returns the mutator name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the mutator priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns a copy of this mutator at another priority.
    #[must_use]
    pub fn with_priority(&self, priority: i32) -> Self {
        Self {
            name: self.name.clone(),
            priority,
            wrap: Arc::clone(&self.wrap),
        }
    }

    /// Applies the wrap function.
    pub fn apply(&self, delegate: D) -> D {
        (self.wrap)(delegate)
    }
}

impl<D> Clone for Mutator<D> {
    fn clone(&self) -> Self {
        self.with_priority(self.priority)
    }
}

impl<D> fmt::Debug for Mutator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutator")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutator_apply() {
        let m: Mutator<i32> = Mutator::new("double", 1, |v| v * 2);
        assert_eq!(m.name(), "double");
        assert_eq!(m.priority(), 1);
        assert_eq!(m.apply(21), 42);
    }

    #[test]
    fn test_with_priority_keeps_wrap() {
        let m: Mutator<i32> = Mutator::new("inc", 1, |v| v + 1);
        let moved = m.with_priority(9);
        assert_eq!(moved.priority(), 9);
        assert_eq!(moved.name(), "inc");
        assert_eq!(moved.apply(1), 2);
    }

    #[test]
    fn test_default_mode_is_exact() {
        assert_eq!(AddingMode::default(), AddingMode::ExactPlace);
    }
}
