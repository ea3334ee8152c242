//! The step and pipeline registry.

use super::SpaceConfig;
use crate::core::{Flow, Handler, StepKind, StepName};
use crate::errors::{PipespaceError, SpaceError};
use crate::mutators::MutatorsConfigurator;
use crate::pipeline::{OpenPipeline, Pipeline, PipelineBuilder};
use crate::steps::{
    ForkStep, HandlerStep, IfElseStep, IfStep, LinearStep, MultiForkStep, Step, SwitchStep,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

type Erased = Arc<dyn Any + Send + Sync>;

struct RegisteredStep {
    kind: StepKind,
    step: Erased,
}

struct RegisteredPipeline {
    closed: bool,
    pipeline: Erased,
}

static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(1);

/// The keys registered at some point in time.
pub(crate) struct Checkpoint {
    steps: HashSet<StepName>,
    pipelines: HashSet<String>,
}

/// Registry of every step and pipeline of one composition.
///
/// Steps are keyed by their qualified [`StepName`], pipelines by name. A
/// registration whose key is taken fails and leaves the space unchanged.
/// Entries are stored type-erased; the typed lookups check the step kind
/// first and then the concrete type.
pub struct Space {
    id: u64,
    config: SpaceConfig,
    steps: DashMap<StepName, RegisteredStep>,
    pipelines: DashMap<String, RegisteredPipeline>,
}

impl Space {
    /// Creates an empty space with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty space with the given configuration.
    #[must_use]
    pub fn with_config(config: SpaceConfig) -> Self {
        Self {
            id: NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            steps: DashMap::new(),
            pipelines: DashMap::new(),
        }
    }

    /// Returns an identifier unique to this space within the process.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Returns the label used in log events.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.config.label
    }

    /// Starts building a pipeline named `name` accepting `E` under flow `F`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or a pipeline with that name
    /// is already registered.
    pub fn create_pipeline<E, F>(&self, name: &str) -> Result<PipelineBuilder<'_, E, F>, SpaceError>
    where
        E: Send + 'static,
        F: Flow,
    {
        self.validate_name(name)?;
        if self.pipelines.contains_key(name) {
            return Err(SpaceError::DuplicatePipelineName {
                name: name.to_string(),
            });
        }
        Ok(PipelineBuilder::new(self, name.to_string()))
    }

    pub(crate) fn validate_name(&self, name: &str) -> Result<(), SpaceError> {
        self.config.validate_name(name)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            steps: self.steps.iter().map(|entry| entry.key().clone()).collect(),
            pipelines: self.pipelines.iter().map(|entry| entry.key().clone()).collect(),
        }
    }

    /// Drops every step and pipeline registered after `checkpoint`.
    pub(crate) fn rollback(&self, checkpoint: &Checkpoint) {
        let steps = self.steps.len();
        let pipelines = self.pipelines.len();
        self.steps.retain(|name, _| checkpoint.steps.contains(name));
        self.pipelines.retain(|name, _| checkpoint.pipelines.contains(name));
        debug!(
            space = %self.config.label,
            steps = steps - self.steps.len(),
            pipelines = pipelines - self.pipelines.len(),
            "Rolled back declaration"
        );
    }

    /// Runs `declare`; if it fails, removes whatever it registered.
    ///
    /// Branch bodies register their pipelines while a step is being declared,
    /// so a step that is rejected afterwards would otherwise leave them
    /// behind.
    pub(crate) fn atomically<T, E>(&self, declare: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let checkpoint = self.checkpoint();
        let result = declare();
        if result.is_err() {
            self.rollback(&checkpoint);
        }
        result
    }

    pub(crate) fn register_step<S: Step>(&self, step: S) -> Result<Arc<S>, SpaceError> {
        match self.steps.entry(step.name().clone()) {
            Entry::Occupied(entry) => Err(SpaceError::DuplicateStepName {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                debug!(
                    space = %self.config.label,
                    step = %step.name(),
                    kind = %step.kind(),
                    is_entry = step.is_entry(),
                    "Registered step"
                );
                let step = Arc::new(step);
                let erased: Erased = step.clone();
                entry.insert(RegisteredStep {
                    kind: step.kind(),
                    step: erased,
                });
                Ok(step)
            }
        }
    }

    pub(crate) fn register_pipeline<P>(
        &self,
        name: &str,
        closed: bool,
        pipeline: P,
    ) -> Result<(), SpaceError>
    where
        P: Any + Send + Sync,
    {
        match self.pipelines.entry(name.to_string()) {
            Entry::Occupied(_) => Err(SpaceError::DuplicatePipelineName {
                name: name.to_string(),
            }),
            Entry::Vacant(entry) => {
                debug!(space = %self.config.label, pipeline = name, closed, "Registered pipeline");
                entry.insert(RegisteredPipeline {
                    closed,
                    pipeline: Arc::new(pipeline),
                });
                Ok(())
            }
        }
    }

    fn typed_step<S: Step>(
        &self,
        pipeline: &str,
        step: &str,
        expected: StepKind,
    ) -> Result<Arc<S>, SpaceError> {
        let name = StepName::new(step, pipeline);
        let erased = {
            let entry = self
                .steps
                .get(&name)
                .ok_or_else(|| SpaceError::StepNotFound { name: name.clone() })?;
            if entry.kind != expected {
                return Err(SpaceError::UnexpectedStepKind {
                    name,
                    expected,
                    actual: entry.kind,
                });
            }
            Arc::clone(&entry.step)
        };
        erased.downcast::<S>().map_err(|_| SpaceError::StepTypeMismatch {
            name,
            expected_type: type_name::<S>(),
        })
    }

    /// Looks up a linear step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, of another kind, or of
    /// another type.
    pub fn get_linear_step<I, O, F>(
        &self,
        pipeline: &str,
        step: &str,
    ) -> Result<Arc<LinearStep<I, O, F>>, SpaceError>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Flow,
    {
        self.typed_step(pipeline, step, StepKind::Linear)
    }

    /// Looks up an If step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, of another kind, or of
    /// another type.
    pub fn get_if_step<I, B, N, F>(
        &self,
        pipeline: &str,
        step: &str,
    ) -> Result<Arc<IfStep<I, B, N, F>>, SpaceError>
    where
        I: Send + 'static,
        B: Send + 'static,
        N: Send + 'static,
        F: Flow,
    {
        self.typed_step(pipeline, step, StepKind::If)
    }

    /// Looks up an IfElse step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, of another kind, or of
    /// another type.
    pub fn get_if_else_step<I, BT, BF, N, F>(
        &self,
        pipeline: &str,
        step: &str,
    ) -> Result<Arc<IfElseStep<I, BT, BF, N, F>>, SpaceError>
    where
        I: Send + 'static,
        BT: Send + 'static,
        BF: Send + 'static,
        N: Send + 'static,
        F: Flow,
    {
        self.typed_step(pipeline, step, StepKind::IfElse)
    }

    /// Looks up a Switch step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, of another kind, or of
    /// another type.
    pub fn get_switch_step<I, B, D, N, F>(
        &self,
        pipeline: &str,
        step: &str,
    ) -> Result<Arc<SwitchStep<I, B, D, N, F>>, SpaceError>
    where
        I: Send + 'static,
        B: Send + 'static,
        D: Send + 'static,
        N: Send + 'static,
        F: Flow,
    {
        self.typed_step(pipeline, step, StepKind::Switch)
    }

    /// Looks up a Fork step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, of another kind, or of
    /// another type.
    pub fn get_fork_step<I, A, B, F>(
        &self,
        pipeline: &str,
        step: &str,
    ) -> Result<Arc<ForkStep<I, A, B, F>>, SpaceError>
    where
        I: Send + 'static,
        A: Send + 'static,
        B: Send + 'static,
        F: Flow,
    {
        self.typed_step(pipeline, step, StepKind::Fork)
    }

    /// Looks up a MultiFork step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, of another kind, or of
    /// another type.
    pub fn get_multi_fork_step<I, B, D, F>(
        &self,
        pipeline: &str,
        step: &str,
    ) -> Result<Arc<MultiForkStep<I, B, D, F>>, SpaceError>
    where
        I: Send + 'static,
        B: Send + 'static,
        D: Send + 'static,
        F: Flow,
    {
        self.typed_step(pipeline, step, StepKind::MultiFork)
    }

    /// Looks up a handler step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, of another kind, or of
    /// another type.
    pub fn get_handler_step<I, F>(
        &self,
        pipeline: &str,
        step: &str,
    ) -> Result<Arc<HandlerStep<I, F>>, SpaceError>
    where
        I: Send + 'static,
        F: Flow,
    {
        self.typed_step(pipeline, step, StepKind::Handler)
    }

    fn typed_pipeline<P>(&self, name: &str, closed: bool) -> Result<P, SpaceError>
    where
        P: Any + Clone,
    {
        let entry = self
            .pipelines
            .get(name)
            .ok_or_else(|| SpaceError::PipelineNotFound {
                name: name.to_string(),
            })?;
        let mismatch = || SpaceError::PipelineTypeMismatch {
            name: name.to_string(),
            expected_type: type_name::<P>(),
        };
        if entry.closed != closed {
            return Err(mismatch());
        }
        entry.pipeline.downcast_ref::<P>().cloned().ok_or_else(mismatch)
    }

    /// Looks up a pipeline ending in a terminal step.
    ///
    /// # Errors
    ///
    /// Returns an error if no pipeline has that name or the registered one
    /// is open or of another type.
    pub fn get_pipeline<E, F>(&self, name: &str) -> Result<Pipeline<E, F>, SpaceError>
    where
        E: Send + 'static,
        F: Flow,
    {
        self.typed_pipeline(name, true)
    }

    /// Looks up an open pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if no pipeline has that name or the registered one
    /// is closed or of another type.
    pub fn get_open_pipeline<E, O, F>(
        &self,
        name: &str,
    ) -> Result<OpenPipeline<E, O, F>, SpaceError>
    where
        E: Send + 'static,
        O: Send + 'static,
        F: Flow,
    {
        self.typed_pipeline(name, false)
    }

    /// Looks up a pipeline and compiles it, applying `configurator` first
    /// when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or a configuration action fails.
    pub fn compile_pipeline<E, F>(
        &self,
        name: &str,
        configurator: Option<&MutatorsConfigurator>,
    ) -> Result<Handler<E, F>, PipespaceError>
    where
        E: Send + 'static,
        F: Flow,
    {
        let pipeline = self.get_pipeline::<E, F>(name)?;
        match configurator {
            Some(configurator) => pipeline.compile_with(self, configurator),
            None => Ok(pipeline.compile()),
        }
    }

    /// Returns the kind of a registered step.
    #[must_use]
    pub fn step_kind(&self, pipeline: &str, step: &str) -> Option<StepKind> {
        self.steps.get(&StepName::new(step, pipeline)).map(|entry| entry.kind)
    }

    /// Returns true if the step is registered.
    #[must_use]
    pub fn contains_step(&self, pipeline: &str, step: &str) -> bool {
        self.steps.contains_key(&StepName::new(step, pipeline))
    }

    /// Returns true if a pipeline with this name is registered.
    #[must_use]
    pub fn contains_pipeline(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    /// Returns the number of registered steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns the number of registered pipelines.
    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns the registered pipeline names in sorted order.
    #[must_use]
    pub fn pipeline_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pipelines
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Returns the local names of the steps registered under `pipeline`, sorted.
    #[must_use]
    pub fn step_names(&self, pipeline: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .steps
            .iter()
            .filter(|entry| entry.key().pipeline == pipeline)
            .map(|entry| entry.key().step.clone())
            .collect();
        names.sort();
        names
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::with_config(SpaceConfig::default())
    }
}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Space")
            .field("id", &self.id)
            .field("label", &self.config.label)
            .field("steps", &self.steps.len())
            .field("pipelines", &self.pipeline_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Action, Func};
    use crate::mutators::{AddingMode, Mutator};
    use crate::steps::Transform;
    use pretty_assertions::assert_eq;

    fn populated() -> Space {
        let space = Space::new();
        space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_linear("add_ten", |x: i32, ()| x + 10)
            .unwrap()
            .handle_with("consume", |x: i32, ()| x)
            .unwrap()
            .build_pipeline()
            .unwrap();
        space
    }

    #[test]
    fn test_typed_lookup() {
        let space = populated();
        let step = space.get_linear_step::<i32, i32, Func<i32>>("main", "add_ten").unwrap();
        assert_eq!(step.name().to_string(), "main/add_ten");
        assert_eq!(space.step_kind("main", "consume"), Some(StepKind::Handler));
    }

    #[test]
    fn test_lookup_missing_step() {
        let space = populated();
        let err = space.get_linear_step::<i32, i32, Func<i32>>("main", "nope").unwrap_err();
        assert_eq!(
            err,
            SpaceError::StepNotFound {
                name: StepName::new("nope", "main")
            }
        );
    }

    #[test]
    fn test_lookup_wrong_kind() {
        let space = populated();
        let err = space.get_handler_step::<i32, Func<i32>>("main", "add_ten").unwrap_err();
        assert_eq!(
            err,
            SpaceError::UnexpectedStepKind {
                name: StepName::new("add_ten", "main"),
                expected: StepKind::Handler,
                actual: StepKind::Linear,
            }
        );
    }

    #[test]
    fn test_lookup_wrong_types() {
        let space = populated();
        let err = space.get_linear_step::<i32, String, Func<i32>>("main", "add_ten").unwrap_err();
        assert_eq!(err.code(), "SPACE-006-STEP_TYPE");

        let err = space.get_linear_step::<i32, i32, Action>("main", "add_ten").unwrap_err();
        assert!(matches!(err, SpaceError::StepTypeMismatch { .. }));
    }

    #[test]
    fn test_pipeline_lookup() {
        let space = populated();
        let pipeline = space.get_pipeline::<i32, Func<i32>>("main").unwrap();
        assert_eq!(pipeline.compile().run(5), 15);

        assert!(matches!(
            space.get_pipeline::<i32, Func<i32>>("other"),
            Err(SpaceError::PipelineNotFound { .. })
        ));
        assert!(matches!(
            space.get_pipeline::<String, Func<i32>>("main"),
            Err(SpaceError::PipelineTypeMismatch { .. })
        ));
        assert!(matches!(
            space.get_open_pipeline::<i32, i32, Func<i32>>("main"),
            Err(SpaceError::PipelineTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_open_pipeline_lookup() {
        let space = Space::new();
        space
            .create_pipeline::<i32, Func<i32>>("body")
            .unwrap()
            .start_with_linear("inc", |x: i32, ()| x + 1)
            .unwrap()
            .build_open_pipeline()
            .unwrap();

        let open = space.get_open_pipeline::<i32, i32, Func<i32>>("body").unwrap();
        assert_eq!(open.name(), "body");
        assert!(space.get_pipeline::<i32, Func<i32>>("body").is_err());
    }

    #[test]
    fn test_duplicate_pipeline_name() {
        let space = populated();
        let err = space.create_pipeline::<i32, Func<i32>>("main").unwrap_err();
        assert_eq!(
            err,
            SpaceError::DuplicatePipelineName {
                name: "main".to_string()
            }
        );
        assert_eq!(space.pipeline_count(), 1);
        assert_eq!(space.step_count(), 2);
    }

    #[test]
    fn test_compile_pipeline_with_configurator() {
        let space = populated();
        let configurator = MutatorsConfigurator::new().configure(|space| {
            space
                .get_linear_step::<i32, i32, Func<i32>>("main", "add_ten")?
                .mutators()
                .add_mutator(
                    Mutator::new("double", 1, |inner: Transform<i32, i32, Func<i32>>| {
                        let wrapped: Transform<i32, i32, Func<i32>> =
                            Arc::new(move |x: i32, ctx: ()| inner(x * 2, ctx));
                        wrapped
                    }),
                    AddingMode::ExactPlace,
                )?;
            Ok(())
        });

        let plain = space.compile_pipeline::<i32, Func<i32>>("main", None).unwrap();
        let doubled = space
            .compile_pipeline::<i32, Func<i32>>("main", Some(&configurator))
            .unwrap();
        assert_eq!(plain.run(5), 15);
        assert_eq!(doubled.run(5), 20);
    }

    #[test]
    fn test_introspection() {
        let space = populated();
        assert!(space.contains_step("main", "add_ten"));
        assert!(!space.contains_step("other", "add_ten"));
        assert!(space.contains_pipeline("main"));
        assert_eq!(space.pipeline_names(), vec!["main".to_string()]);
        assert_eq!(space.step_names("main"), vec!["add_ten".to_string(), "consume".to_string()]);
        assert_eq!(space.label(), "default");
    }

    #[test]
    fn test_custom_config() {
        let config = SpaceConfig::new()
            .with_label("orders")
            .with_validate_names(false);
        let space = Space::with_config(config);
        assert_eq!(space.label(), "orders");
        assert!(space.create_pipeline::<i32, Func<i32>>("a/b").is_ok());
    }
}
