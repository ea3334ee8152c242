//! Finished pipelines.

use super::chain::{Link, Terminal};
use crate::core::{Flow, Handler, StepInfo};
use crate::errors::{BuildError, PipespaceError};
use crate::mutators::MutatorsConfigurator;
use crate::space::Space;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A pipeline ending in a terminal step.
///
/// Every call to [`compile`](Self::compile) assembles a fresh handler from
/// the current mutator state. Handlers compiled earlier keep the mutators
/// they were built with.
pub struct Pipeline<E, F: Flow> {
    name: String,
    space_id: u64,
    entry: StepInfo,
    tail: Arc<dyn Terminal<E, F>>,
}

impl<E, F: Flow> Pipeline<E, F> {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry step.
    #[must_use]
    pub fn entry(&self) -> &StepInfo {
        &self.entry
    }
}

impl<E, F> Pipeline<E, F>
where
    E: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(
        name: String,
        space_id: u64,
        entry: StepInfo,
        tail: Arc<dyn Terminal<E, F>>,
    ) -> Self {
        Self {
            name,
            space_id,
            entry,
            tail,
        }
    }

    /// Lists the steps from entry to tail.
    ///
    /// Branch bodies are separate pipelines and are not included.
    #[must_use]
    pub fn steps(&self) -> Vec<StepInfo> {
        let mut steps = Vec::new();
        self.tail.collect_steps(&mut steps);
        steps
    }

    /// Assembles a handler for the pipeline.
    pub fn compile(&self) -> Handler<E, F> {
        let handler = self.tail.build_handler();
        info!(pipeline = %self.name, entry = %self.entry.name, "Compiled pipeline");
        handler
    }

    /// Runs `configurator` against `space`, then compiles.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SpaceMismatch`] if `space` is not the space the
    /// pipeline was built in, or the first error a configuration action
    /// raises. Nothing is compiled in either case.
    pub fn compile_with(
        &self,
        space: &Space,
        configurator: &MutatorsConfigurator,
    ) -> Result<Handler<E, F>, PipespaceError> {
        if space.id() != self.space_id {
            return Err(BuildError::SpaceMismatch {
                pipeline: self.name.clone(),
                expected: self.space_id,
                actual: space.id(),
            }
            .into());
        }
        configurator.apply(space)?;
        Ok(self.compile())
    }
}

impl<E, F: Flow> Clone for Pipeline<E, F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            space_id: self.space_id,
            entry: self.entry.clone(),
            tail: Arc::clone(&self.tail),
        }
    }
}

impl<E, F: Flow> fmt::Debug for Pipeline<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("entry", &self.entry.name)
            .finish_non_exhaustive()
    }
}

/// A pipeline whose tail still expects a continuation of type `O`.
///
/// Open pipelines are the bodies of If, IfElse and Switch branches: the
/// parent step compiles them against its own continuation.
pub struct OpenPipeline<E, O, F: Flow> {
    name: String,
    entry: StepInfo,
    tail: Arc<dyn Link<E, O, F>>,
}

impl<E, O, F: Flow> OpenPipeline<E, O, F> {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry step.
    #[must_use]
    pub fn entry(&self) -> &StepInfo {
        &self.entry
    }
}

impl<E, O, F> OpenPipeline<E, O, F>
where
    E: Send + 'static,
    O: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(name: String, entry: StepInfo, tail: Arc<dyn Link<E, O, F>>) -> Self {
        Self { name, entry, tail }
    }

    /// Lists the steps from entry to tail.
    #[must_use]
    pub fn steps(&self) -> Vec<StepInfo> {
        let mut steps = Vec::new();
        self.tail.collect_steps(&mut steps);
        steps
    }

    /// Assembles a handler whose tail hands its result to `next`.
    pub fn compile_into(&self, next: Handler<O, F>) -> Handler<E, F> {
        self.tail.build_handler(next)
    }
}

impl<E, O, F: Flow> Clone for OpenPipeline<E, O, F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entry: self.entry.clone(),
            tail: Arc::clone(&self.tail),
        }
    }
}

impl<E, O, F: Flow> fmt::Debug for OpenPipeline<E, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenPipeline")
            .field("name", &self.name)
            .field("entry", &self.entry.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Func, Handler, StepKind};
    use crate::mutators::{AddingMode, Mutator, MutatorsConfigurator};
    use crate::space::Space;
    use crate::steps::{Consumer, Step};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_steps_listed_entry_first() {
        let space = Space::new();
        let pipeline = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_linear("a", |x: i32, ()| x + 1)
            .unwrap()
            .then_linear("b", |x: i32, ()| x * 2)
            .unwrap()
            .handle_with("c", |x: i32, ()| x)
            .unwrap()
            .build_pipeline()
            .unwrap();

        let steps = pipeline.steps();
        let names: Vec<String> = steps.iter().map(|s| s.name.to_string()).collect();
        assert_eq!(names, vec!["main/a", "main/b", "main/c"]);
        assert!(steps[0].is_entry);
        assert!(!steps[1].is_entry);
        assert_eq!(steps[2].kind, StepKind::Handler);
        assert_eq!(pipeline.entry().name.step, "a");
    }

    #[test]
    fn test_open_pipeline_compiles_into_continuation() {
        let space = Space::new();
        let open = space
            .create_pipeline::<i32, Func<String>>("body")
            .unwrap()
            .start_with_linear("square", |x: i32, ()| x * x)
            .unwrap()
            .build_open_pipeline()
            .unwrap();

        let handler = open.compile_into(Handler::new(|x: i32, ()| format!("={x}")));
        assert_eq!(handler.run(6), "=36");
        assert_eq!(open.steps().len(), 1);
    }

    #[test]
    fn test_each_compile_builds_fresh_handler() {
        let space = Space::new();
        let builds = Arc::new(AtomicUsize::new(0));
        let pipeline = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_handler("id", |x: i32, ()| x)
            .unwrap()
            .build_pipeline()
            .unwrap();

        let counter = Arc::clone(&builds);
        space
            .get_handler_step::<i32, Func<i32>>("main", "id")
            .unwrap()
            .mutators()
            .add_mutator(
                Mutator::new("count", 1, move |inner: Consumer<i32, Func<i32>>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    inner
                }),
                AddingMode::ExactPlace,
            )
            .unwrap();

        let first = pipeline.compile();
        let second = pipeline.compile();
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(first.run(1), second.run(1));
    }

    #[test]
    fn test_compile_with_rejects_foreign_space() {
        let space = Space::new();
        let other = Space::new();
        let pipeline = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_handler("id", |x: i32, ()| x)
            .unwrap()
            .build_pipeline()
            .unwrap();

        let applied = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&applied);
        let configurator = MutatorsConfigurator::new().configure(move |_space| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = pipeline.compile_with(&other, &configurator).unwrap_err();
        assert_eq!(err.code(), "BUILD-002-SPACE_MISMATCH");
        assert!(err.to_string().contains("'main'"));
        assert_eq!(applied.load(Ordering::SeqCst), 0);

        let handler = pipeline.compile_with(&space, &configurator).unwrap();
        assert_eq!(handler.run(4), 4);
        assert_eq!(applied.load(Ordering::SeqCst), 1);
        assert_ne!(space.id(), other.id());
    }
}
