//! Keyed branch sets handed to switch and multi-fork selectors.

use crate::core::{Flow, Handler, Outcome};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Compiled keyed branches plus an always-present default.
///
/// A [`SwitchStep`](super::SwitchStep) compiles every case against the
/// step's continuation; a [`MultiForkStep`](super::MultiForkStep) compiles
/// each branch as an independent terminal pipeline.
pub struct Cases<B, D, F: Flow> {
    cases: Arc<HashMap<String, Handler<B, F>>>,
    default: Handler<D, F>,
}

impl<B, D, F: Flow> Cases<B, D, F> {
    pub(crate) fn new(cases: HashMap<String, Handler<B, F>>, default: Handler<D, F>) -> Self {
        Self {
            cases: Arc::new(cases),
            default,
        }
    }

    /// Returns the branch registered under `key`.
    #[must_use]
    pub fn case(&self, key: &str) -> Option<&Handler<B, F>> {
        self.cases.get(key)
    }

    /// Returns the default branch.
    #[must_use]
    pub fn default_branch(&self) -> &Handler<D, F> {
        &self.default
    }

    /// Returns true if a branch is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.cases.contains_key(key)
    }

    /// Returns the registered keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.cases.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the number of keyed branches, excluding the default.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true if only the default branch exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl<T, F: Flow> Cases<T, T, F> {
    /// Calls the branch registered under `key`, or the default branch when
    /// no case matches.
    pub fn dispatch(&self, key: &str, input: T, ctx: F::Ctx) -> Outcome<F> {
        self.case(key).unwrap_or(&self.default).call(input, ctx)
    }
}

impl<B, D, F: Flow> Clone for Cases<B, D, F> {
    fn clone(&self) -> Self {
        Self {
            cases: Arc::clone(&self.cases),
            default: self.default.clone(),
        }
    }
}

impl<B, D, F: Flow> fmt::Debug for Cases<B, D, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cases")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}
