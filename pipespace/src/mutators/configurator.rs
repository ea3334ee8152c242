//! Deferred mutator configuration.

use crate::errors::PipespaceError;
use crate::space::Space;
use std::fmt;
use tracing::debug;

/// A configuration action run against a [`Space`].
pub type ConfigureAction = Box<dyn Fn(&Space) -> Result<(), PipespaceError> + Send + Sync>;

/// Accumulates actions that attach mutators to steps.
///
/// Actions run in registration order, once per
/// [`Pipeline::compile_with`](crate::pipeline::Pipeline::compile_with) call,
/// right before the pipeline's handlers are assembled. They typically look
/// up steps through the typed `Space::get_*_step` methods and edit their
/// mutators.
#[derive(Default)]
pub struct MutatorsConfigurator {
    actions: Vec<ConfigureAction>,
}

impl MutatorsConfigurator {
    /// Creates an empty configurator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action, builder style.
    #[must_use]
    pub fn configure<A>(mut self, action: A) -> Self
    where
        A: Fn(&Space) -> Result<(), PipespaceError> + Send + Sync + 'static,
    {
        self.add(action);
        self
    }

    /// Adds an action.
    pub fn add<A>(&mut self, action: A)
    where
        A: Fn(&Space) -> Result<(), PipespaceError> + Send + Sync + 'static,
    {
        self.actions.push(Box::new(action));
    }

    /// Runs every action against `space`, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error an action raises.
    pub fn apply(&self, space: &Space) -> Result<(), PipespaceError> {
        debug!(
            space = space.label(),
            actions = self.actions.len(),
            "Applying mutator configuration"
        );
        for action in &self.actions {
            action(space)?;
        }
        Ok(())
    }

    /// Returns the number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if no actions were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for MutatorsConfigurator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutatorsConfigurator")
            .field("action_count", &self.actions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SpaceError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_actions_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = seen.clone();
        let second = seen.clone();

        let configurator = MutatorsConfigurator::new()
            .configure(move |_space| {
                first.lock().push(1);
                Ok(())
            })
            .configure(move |_space| {
                second.lock().push(2);
                Ok(())
            });

        assert_eq!(configurator.len(), 2);
        configurator.apply(&Space::new()).unwrap();
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn test_apply_stops_at_first_error() {
        let reached = Arc::new(Mutex::new(false));
        let flag = reached.clone();

        let configurator = MutatorsConfigurator::new()
            .configure(|space| {
                space.get_pipeline::<i32, crate::core::Action>("missing")?;
                Ok(())
            })
            .configure(move |_space| {
                *flag.lock() = true;
                Ok(())
            });

        let err = configurator.apply(&Space::new()).unwrap_err();
        assert!(matches!(
            err,
            PipespaceError::Space(SpaceError::PipelineNotFound { .. })
        ));
        assert!(!*reached.lock());
    }
}
