//! Call recording for tests.

use crate::core::Immediate;
use crate::mutators::Mutator;
use crate::steps::{Consumer, Transform};
use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe, ordered log of events.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl CallRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    /// Returns a copy of the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Builds a mutator for a synchronous linear step that records
/// `"{name}-entry"` before and `"{name}-exit"` after the wrapped transform.
///
/// A synchronous transform does not depend on the pipeline's result type,
/// so the returned mutator fits any `Immediate<_, C>` flow.
pub fn recording_transform_mutator<I, O, C>(
    recorder: &CallRecorder,
    name: impl Into<String>,
    priority: i32,
) -> Mutator<Transform<I, O, Immediate<(), C>>>
where
    I: Send + 'static,
    O: Send + 'static,
    C: Clone + Send + Sync + 'static,
{
    let name = name.into();
    let label = name.clone();
    let recorder = recorder.clone();
    Mutator::new(name, priority, move |inner: Transform<I, O, Immediate<(), C>>| {
        let label = label.clone();
        let recorder = recorder.clone();
        let wrapped: Transform<I, O, Immediate<(), C>> = Arc::new(move |input: I, ctx: C| {
            recorder.record(format!("{label}-entry"));
            let output = inner(input, ctx);
            recorder.record(format!("{label}-exit"));
            output
        });
        wrapped
    })
}

/// Builds a mutator for a synchronous handler step that records
/// `"{name}-entry"` before and `"{name}-exit"` after the wrapped handler.
pub fn recording_handler_mutator<I, R, C>(
    recorder: &CallRecorder,
    name: impl Into<String>,
    priority: i32,
) -> Mutator<Consumer<I, Immediate<R, C>>>
where
    I: Send + 'static,
    R: Send + 'static,
    C: Clone + Send + Sync + 'static,
{
    let name = name.into();
    let label = name.clone();
    let recorder = recorder.clone();
    Mutator::new(name, priority, move |inner: Consumer<I, Immediate<R, C>>| {
        let label = label.clone();
        let recorder = recorder.clone();
        let wrapped: Consumer<I, Immediate<R, C>> = Arc::new(move |input: I, ctx: C| {
            recorder.record(format!("{label}-entry"));
            let output = inner(input, ctx);
            recorder.record(format!("{label}-exit"));
            output
        });
        wrapped
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Func;
    use crate::mutators::{AddingMode, StepMutators};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_recorder_shares_log_between_clones() {
        let recorder = CallRecorder::new();
        let other = recorder.clone();
        recorder.record("a");
        other.record("b");

        assert_eq!(recorder.events(), vec!["a", "b"]);
        assert_eq!(other.len(), 2);

        other.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_recording_transform_mutator() {
        let recorder = CallRecorder::new();
        let mut mutators = StepMutators::new();
        mutators
            .add_mutator(
                recording_transform_mutator(&recorder, "m", 1),
                AddingMode::ExactPlace,
            )
            .unwrap();

        let base_recorder = recorder.clone();
        let base: Transform<i32, i32, Func<i32>> = Arc::new(move |x: i32, ()| {
            base_recorder.record("base");
            x + 1
        });

        let transform = mutators.mutate_delegate(base);
        assert_eq!(transform(1, ()), 2);
        assert_eq!(recorder.events(), vec!["m-entry", "base", "m-exit"]);
    }
}
