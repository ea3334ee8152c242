//! `tracing` integration.
//!
//! The engine itself only emits `debug!`/`info!` events while registering and
//! compiling. This module adds the pieces an embedding application needs:
//! subscriber setup and mutators that log every delegate call of a step.

use crate::core::{Flow, Handler};
use crate::errors::PipespaceError;
use crate::mutators::Mutator;
use crate::steps::{CaseSelector, Cases, Consumer, Selector, Transform};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Subscriber settings for [`init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// An `EnvFilter` directive string such as `info,pipespace=debug`.
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// Creates a config with the default filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config whose filter comes from `RUST_LOG`, falling back to
    /// the default.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(filter) if !filter.trim().is_empty() => Self::default().with_filter(filter),
            _ => Self::default(),
        }
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Enables or disables JSON output.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Installs a global `fmt` subscriber.
///
/// # Errors
///
/// Returns [`PipespaceError::Observability`] if the filter does not parse or
/// a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), PipespaceError> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|e| {
        PipespaceError::Observability(format!("invalid filter '{}': {e}", config.filter))
    })?;

    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    result.map_err(|e| PipespaceError::Observability(e.to_string()))
}

/// Builds a mutator that logs each call of a linear step's transform.
pub fn traced_transform<I, O, F>(
    name: impl Into<String>,
    priority: i32,
) -> Mutator<Transform<I, O, F>>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Flow,
{
    let name = name.into();
    let label = name.clone();
    Mutator::new(name, priority, move |inner: Transform<I, O, F>| {
        let label = label.clone();
        let wrapped: Transform<I, O, F> = Arc::new(move |input: I, ctx: F::Ctx| {
            tracing::debug!(mutator = %label, "Invoking transform");
            inner(input, ctx)
        });
        wrapped
    })
}

/// Builds a mutator that logs each call of an If, IfElse or Fork selector.
pub fn traced_selector<I, L, R, F>(
    name: impl Into<String>,
    priority: i32,
) -> Mutator<Selector<I, L, R, F>>
where
    I: Send + 'static,
    L: Send + 'static,
    R: Send + 'static,
    F: Flow,
{
    let name = name.into();
    let label = name.clone();
    Mutator::new(name, priority, move |inner: Selector<I, L, R, F>| {
        let label = label.clone();
        let wrapped: Selector<I, L, R, F> =
            Arc::new(move |input: I, ctx: F::Ctx, left: Handler<L, F>, right: Handler<R, F>| {
                tracing::debug!(mutator = %label, "Invoking selector");
                inner(input, ctx, left, right)
            });
        wrapped
    })
}

/// Builds a mutator that logs each call of a Switch or MultiFork selector.
pub fn traced_case_selector<I, B, D, F>(
    name: impl Into<String>,
    priority: i32,
) -> Mutator<CaseSelector<I, B, D, F>>
where
    I: Send + 'static,
    B: Send + 'static,
    D: Send + 'static,
    F: Flow,
{
    let name = name.into();
    let label = name.clone();
    Mutator::new(name, priority, move |inner: CaseSelector<I, B, D, F>| {
        let label = label.clone();
        let wrapped: CaseSelector<I, B, D, F> =
            Arc::new(move |input: I, ctx: F::Ctx, cases: Cases<B, D, F>| {
                tracing::debug!(mutator = %label, cases = cases.len(), "Invoking case selector");
                inner(input, ctx, cases)
            });
        wrapped
    })
}

/// Builds a mutator that logs each call of a handler step.
pub fn traced_handler<I, F>(name: impl Into<String>, priority: i32) -> Mutator<Consumer<I, F>>
where
    I: Send + 'static,
    F: Flow,
{
    let name = name.into();
    let label = name.clone();
    Mutator::new(name, priority, move |inner: Consumer<I, F>| {
        let label = label.clone();
        let wrapped: Consumer<I, F> = Arc::new(move |input: I, ctx: F::Ctx| {
            tracing::debug!(mutator = %label, "Invoking handler");
            inner(input, ctx)
        });
        wrapped
    })
}
