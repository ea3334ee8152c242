//! Pipeline builder: the starting point of every chain.

use super::chain::{Chain, TerminalChain, Upstream};
use super::definition::{OpenPipeline, Pipeline};
use crate::core::{Flow, Handler, Outcome, StepInfo, StepName};
use crate::errors::{BuildError, PipespaceError, SpaceError};
use crate::space::Space;
use crate::steps::{
    Cases, ForkStep, HandlerStep, IfElseStep, IfStep, LinearStep, MultiForkStep, Step, SwitchStep,
};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Builds a pipeline accepting `E` under flow `F`.
///
/// Obtained from [`Space::create_pipeline`]. The first `start_with_*` call
/// registers the entry step and returns a [`Chain`] (or a [`TerminalChain`]
/// for terminal steps) that continues the pipeline.
pub struct PipelineBuilder<'s, E, F: Flow> {
    space: &'s Space,
    name: String,
    entry: Option<StepInfo>,
    _types: PhantomData<fn(E) -> F>,
}

impl<'s, E, F> PipelineBuilder<'s, E, F>
where
    E: Send + 'static,
    F: Flow,
{
    pub(crate) fn new(space: &'s Space, name: String) -> Self {
        Self {
            space,
            name,
            entry: None,
            _types: PhantomData,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the space steps are registered in.
    #[must_use]
    pub fn space(&self) -> &'s Space {
        self.space
    }

    /// Returns the entry step, once one has been added.
    #[must_use]
    pub fn entry(&self) -> Option<&StepInfo> {
        self.entry.as_ref()
    }

    /// Validates a local step name and qualifies it with the pipeline name.
    ///
    /// Fails early on a taken name so branch bodies are not built for a
    /// step that cannot be registered.
    pub(crate) fn qualify(&self, step: &str) -> Result<StepName, SpaceError> {
        self.space.validate_name(step)?;
        let name = StepName::new(step, self.name.as_str());
        if self.space.contains_step(&self.name, step) {
            return Err(SpaceError::DuplicateStepName { name });
        }
        Ok(name)
    }

    pub(crate) fn register<S: Step>(&self, step: S) -> Result<Arc<S>, SpaceError> {
        self.space.register_step(step)
    }

    pub(crate) fn set_entry(&mut self, entry: StepInfo) {
        self.entry = Some(entry);
    }

    pub(crate) fn into_parts(self) -> Result<(&'s Space, String, StepInfo), BuildError> {
        match self.entry {
            Some(entry) => Ok((self.space, self.name, entry)),
            None => Err(BuildError::MissingEntryStep {
                pipeline: self.name,
            }),
        }
    }

    /// Starts the pipeline with a linear step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already taken.
    pub fn start_with_linear<O, T>(
        self,
        name: &str,
        transform: T,
    ) -> Result<Chain<'s, E, O, F>, PipespaceError>
    where
        O: Send + 'static,
        T: Fn(E, F::Ctx) -> F::Eff<O> + Send + Sync + 'static,
    {
        let name = self.qualify(name)?;
        let step = LinearStep::<E, O, F>::new(name, true, Arc::new(transform));
        self.extend(Upstream::entry(), step)
    }

    /// Starts the pipeline with an If step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if `branch`
    /// fails.
    pub fn start_with_if<B, N, S, P>(
        self,
        name: &str,
        selector: S,
        branch: P,
    ) -> Result<Chain<'s, E, N, F>, PipespaceError>
    where
        B: Send + 'static,
        N: Send + 'static,
        S: Fn(E, F::Ctx, Handler<B, F>, Handler<N, F>) -> Outcome<F> + Send + Sync + 'static,
        P: FnOnce(&'s Space) -> Result<OpenPipeline<B, N, F>, PipespaceError>,
    {
        let name = self.qualify(name)?;
        let space = self.space;
        space.atomically(move || {
            let branch = branch(space)?;
            let step = IfStep::<E, B, N, F>::new(name, true, Arc::new(selector), branch);
            self.extend(Upstream::entry(), step)
        })
    }

    /// Starts the pipeline with an IfElse step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn start_with_if_else<BT, BF, N, S, PT, PF>(
        self,
        name: &str,
        selector: S,
        on_true: PT,
        on_false: PF,
    ) -> Result<Chain<'s, E, N, F>, PipespaceError>
    where
        BT: Send + 'static,
        BF: Send + 'static,
        N: Send + 'static,
        S: Fn(E, F::Ctx, Handler<BT, F>, Handler<BF, F>) -> Outcome<F> + Send + Sync + 'static,
        PT: FnOnce(&'s Space) -> Result<OpenPipeline<BT, N, F>, PipespaceError>,
        PF: FnOnce(&'s Space) -> Result<OpenPipeline<BF, N, F>, PipespaceError>,
    {
        let name = self.qualify(name)?;
        let space = self.space;
        space.atomically(move || {
            let on_true = on_true(space)?;
            let on_false = on_false(space)?;
            let step = IfElseStep::<E, BT, BF, N, F>::new(
                name,
                true,
                Arc::new(selector),
                on_true,
                on_false,
            );
            self.extend(Upstream::entry(), step)
        })
    }

    /// Starts the pipeline with a Switch step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn start_with_switch<B, D, N, S, PC, PD>(
        self,
        name: &str,
        selector: S,
        cases: PC,
        default: PD,
    ) -> Result<Chain<'s, E, N, F>, PipespaceError>
    where
        B: Send + 'static,
        D: Send + 'static,
        N: Send + 'static,
        S: Fn(E, F::Ctx, Cases<B, D, F>) -> Outcome<F> + Send + Sync + 'static,
        PC: FnOnce(&'s Space) -> Result<HashMap<String, OpenPipeline<B, N, F>>, PipespaceError>,
        PD: FnOnce(&'s Space) -> Result<OpenPipeline<D, N, F>, PipespaceError>,
    {
        let name = self.qualify(name)?;
        let space = self.space;
        space.atomically(move || {
            let cases = cases(space)?;
            let default = default(space)?;
            let step = SwitchStep::<E, B, D, N, F>::new(
                name,
                true,
                Arc::new(selector),
                cases,
                default,
            );
            self.extend(Upstream::entry(), step)
        })
    }

    /// Starts the pipeline with a Fork step, which also ends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn start_with_fork<A, B, S, PL, PR>(
        self,
        name: &str,
        selector: S,
        left: PL,
        right: PR,
    ) -> Result<TerminalChain<'s, E, F>, PipespaceError>
    where
        A: Send + 'static,
        B: Send + 'static,
        S: Fn(E, F::Ctx, Handler<A, F>, Handler<B, F>) -> Outcome<F> + Send + Sync + 'static,
        PL: FnOnce(&'s Space) -> Result<Pipeline<A, F>, PipespaceError>,
        PR: FnOnce(&'s Space) -> Result<Pipeline<B, F>, PipespaceError>,
    {
        let name = self.qualify(name)?;
        let space = self.space;
        space.atomically(move || {
            let left = left(space)?;
            let right = right(space)?;
            let step = ForkStep::<E, A, B, F>::new(name, true, Arc::new(selector), left, right);
            self.finish(Upstream::entry(), step)
        })
    }

    /// Starts the pipeline with a MultiFork step, which also ends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, or if a branch
    /// builder fails.
    pub fn start_with_multi_fork<B, D, S, PC, PD>(
        self,
        name: &str,
        selector: S,
        cases: PC,
        default: PD,
    ) -> Result<TerminalChain<'s, E, F>, PipespaceError>
    where
        B: Send + 'static,
        D: Send + 'static,
        S: Fn(E, F::Ctx, Cases<B, D, F>) -> Outcome<F> + Send + Sync + 'static,
        PC: FnOnce(&'s Space) -> Result<HashMap<String, Pipeline<B, F>>, PipespaceError>,
        PD: FnOnce(&'s Space) -> Result<Pipeline<D, F>, PipespaceError>,
    {
        let name = self.qualify(name)?;
        let space = self.space;
        space.atomically(move || {
            let cases = cases(space)?;
            let default = default(space)?;
            let step = MultiForkStep::<E, B, D, F>::new(
                name,
                true,
                Arc::new(selector),
                cases,
                default,
            );
            self.finish(Upstream::entry(), step)
        })
    }

    /// Starts and ends the pipeline with a single handler step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already taken.
    pub fn start_with_handler<H>(
        self,
        name: &str,
        handler: H,
    ) -> Result<TerminalChain<'s, E, F>, PipespaceError>
    where
        H: Fn(E, F::Ctx) -> Outcome<F> + Send + Sync + 'static,
    {
        let name = self.qualify(name)?;
        let step = HandlerStep::<E, F>::new(name, true, Arc::new(handler));
        self.finish(Upstream::entry(), step)
    }
}

impl<E, F: Flow> fmt::Debug for PipelineBuilder<'_, E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("space", &self.space.label())
            .field("name", &self.name)
            .field("entry", &self.entry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Action, Func};
    use crate::errors::{PipespaceError, SpaceError};
    use crate::space::Space;
    use crate::steps::Step;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_builder_accessors() {
        let space = Space::new();
        let builder = space.create_pipeline::<i32, Func<i32>>("main").unwrap();

        assert_eq!(builder.name(), "main");
        assert!(builder.entry().is_none());
        assert!(std::ptr::eq(builder.space(), &space));
    }

    #[test]
    fn test_first_step_is_entry() {
        let space = Space::new();
        let pipeline = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_linear("first", |x: i32, ()| x)
            .unwrap()
            .then_linear("second", |x: i32, ()| x)
            .unwrap()
            .handle_with("last", |x: i32, ()| x)
            .unwrap()
            .build_pipeline()
            .unwrap();

        assert_eq!(pipeline.entry().name.step, "first");
        let linear = |step: &str| {
            space
                .get_linear_step::<i32, i32, Func<i32>>("main", step)
                .unwrap()
        };
        assert!(linear("first").is_entry());
        assert!(!linear("second").is_entry());
        assert!(!space
            .get_handler_step::<i32, Func<i32>>("main", "last")
            .unwrap()
            .is_entry());
    }

    #[test]
    fn test_single_handler_pipeline() {
        let space = Space::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let pipeline = space
            .create_pipeline::<&'static str, Action>("log")
            .unwrap()
            .start_with_handler("push", move |s: &'static str, ()| sink.lock().push(s))
            .unwrap()
            .build_pipeline()
            .unwrap();

        pipeline.compile().run("hello");
        assert_eq!(*seen.lock(), vec!["hello"]);
        assert!(pipeline.entry().is_entry);
    }

    #[test]
    fn test_failed_branch_rolls_back_earlier_branches() {
        let space = Space::new();
        let err = space
            .create_pipeline::<i32, Func<String>>("main")
            .unwrap()
            .start_with_if_else(
                "parity",
                |x: i32, (), even, odd| {
                    if x % 2 == 0 {
                        even.call(x, ())
                    } else {
                        odd.call(x, ())
                    }
                },
                |space| {
                    space
                        .create_pipeline::<i32, Func<String>>("even")?
                        .start_with_linear("label", |x: i32, ()| format!("even {x}"))?
                        .build_open_pipeline()
                },
                |space| {
                    space
                        .create_pipeline::<i32, Func<String>>("bad/odd")?
                        .start_with_linear("label", |x: i32, ()| format!("odd {x}"))?
                        .build_open_pipeline()
                },
            )
            .unwrap_err();

        assert_eq!(err.code(), "SPACE-008-INVALID_NAME");
        assert!(!space.contains_step("main", "parity"));
        assert!(!space.contains_pipeline("even"));
        assert_eq!(space.step_count(), 0);
        assert_eq!(space.pipeline_count(), 0);
        assert!(space.create_pipeline::<i32, Func<String>>("even").is_ok());
    }

    #[test]
    fn test_rollback_keeps_pipelines_registered_before_the_step() {
        let space = Space::new();
        space
            .create_pipeline::<i32, Func<i32>>("shared")
            .unwrap()
            .start_with_linear("inc", |x: i32, ()| x + 1)
            .unwrap()
            .build_open_pipeline()
            .unwrap();

        let err = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_linear("id", |x: i32, ()| x)
            .unwrap()
            .then_switch(
                "route",
                |x: i32, (), cases| cases.dispatch("any", x, ()),
                |space| {
                    let shared = space.get_open_pipeline::<i32, i32, Func<i32>>("shared")?;
                    let fresh = space
                        .create_pipeline::<i32, Func<i32>>("fresh")?
                        .start_with_linear("dec", |x: i32, ()| x - 1)?
                        .build_open_pipeline()?;
                    Ok(HashMap::from([
                        ("shared".to_string(), shared),
                        ("fresh".to_string(), fresh),
                    ]))
                },
                |space| {
                    space
                        .create_pipeline::<i32, Func<i32>>("shared")?
                        .start_with_linear("dup", |x: i32, ()| x)?
                        .build_open_pipeline()
                },
            )
            .unwrap_err();

        assert_eq!(err.code(), "SPACE-002-DUPLICATE_PIPELINE");
        assert!(space.contains_pipeline("shared"));
        assert!(space.contains_step("shared", "inc"));
        assert!(!space.contains_pipeline("fresh"));
        assert!(!space.contains_step("fresh", "dec"));
        assert!(!space.contains_step("main", "route"));
        assert!(space.contains_step("main", "id"));
    }

    #[test]
    fn test_invalid_step_name_rejected() {
        let space = Space::new();
        let err = space
            .create_pipeline::<i32, Func<i32>>("main")
            .unwrap()
            .start_with_linear("a/b", |x: i32, ()| x)
            .unwrap_err();

        assert!(matches!(err, PipespaceError::Space(SpaceError::InvalidName { .. })));
        assert_eq!(space.step_count(), 0);
    }
}
