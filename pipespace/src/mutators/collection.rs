//! Priority-keyed mutator collections.

use super::{AddingMode, Mutator};
use crate::errors::MutatorError;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// The mutators attached to one step.
///
/// Entries are keyed by priority; no two entries share a priority or a name.
/// [`mutate_delegate`](Self::mutate_delegate) folds them in ascending
/// priority order, so the highest priority is the outermost wrapper: it sees
/// a call first and its result last.
pub struct StepMutators<D> {
    entries: BTreeMap<i32, Mutator<D>>,
}

impl<D> StepMutators<D> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds a mutator.
    ///
    /// Returns the priority the mutator was stored at, which differs from the
    /// requested one when `BeforeIfReserved` / `AfterIfReserved` had to move
    /// past occupied slots.
    ///
    /// # Errors
    ///
    /// - [`MutatorError::NameAlreadyUsed`] if any entry already has this name
    ///   (checked in every mode).
    /// - [`MutatorError::PriorityReserved`] if the slot is taken in
    ///   `ExactPlace` mode.
    /// - [`MutatorError::NoFreePriority`] if the scan runs off the `i32` range.
    pub fn add_mutator(
        &mut self,
        mutator: Mutator<D>,
        mode: AddingMode,
    ) -> Result<i32, MutatorError> {
        self.ensure_name_free(mutator.name(), None)?;

        let requested = mutator.priority();
        let slot = match mode {
            AddingMode::ExactPlace => {
                if let Some(occupant) = self.entries.get(&requested) {
                    return Err(MutatorError::PriorityReserved {
                        priority: requested,
                        occupant: occupant.name().to_string(),
                    });
                }
                requested
            }
            AddingMode::BeforeIfReserved => self.free_slot(requested, |p| p.checked_sub(1))?,
            AddingMode::AfterIfReserved => self.free_slot(requested, |p| p.checked_add(1))?,
        };

        if slot != requested {
            debug!(
                mutator = mutator.name(),
                requested,
                placed = slot,
                "Mutator relocated to free priority"
            );
        }

        let mutator = if slot == requested {
            mutator
        } else {
            mutator.with_priority(slot)
        };
        self.entries.insert(slot, mutator);
        Ok(slot)
    }

    /// Removes the mutator at `priority`.
    pub fn remove_mutator(&mut self, priority: i32) -> Option<Mutator<D>> {
        self.entries.remove(&priority)
    }

    /// Replaces the mutator at the new mutator's priority.
    ///
    /// Does nothing and returns `Ok(false)` when the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns [`MutatorError::NameAlreadyUsed`] if another slot holds a
    /// mutator with the new name.
    pub fn replace_mutator(&mut self, mutator: Mutator<D>) -> Result<bool, MutatorError> {
        let priority = mutator.priority();
        if !self.entries.contains_key(&priority) {
            return Ok(false);
        }

        self.ensure_name_free(mutator.name(), Some(priority))?;
        self.entries.insert(priority, mutator);
        Ok(true)
    }

    /// Stores the mutator at its priority, replacing any occupant.
    ///
    /// # Errors
    ///
    /// Returns [`MutatorError::NameAlreadyUsed`] if another slot holds a
    /// mutator with the same name.
    pub fn add_or_replace_mutator(&mut self, mutator: Mutator<D>) -> Result<(), MutatorError> {
        let priority = mutator.priority();
        self.ensure_name_free(mutator.name(), Some(priority))?;
        self.entries.insert(priority, mutator);
        Ok(())
    }

    /// Moves the mutator at `from` to `to`, placing it according to `mode`.
    ///
    /// On failure the mutator stays at `from`.
    ///
    /// # Errors
    ///
    /// Returns [`MutatorError::MutatorNotFound`] if `from` is empty, or the
    /// error [`add_mutator`](Self::add_mutator) raises for the target slot.
    pub fn move_mutator(
        &mut self,
        from: i32,
        to: i32,
        mode: AddingMode,
    ) -> Result<i32, MutatorError> {
        let mutator = self
            .entries
            .remove(&from)
            .ok_or(MutatorError::MutatorNotFound { priority: from })?;

        match self.add_mutator(mutator.with_priority(to), mode) {
            Ok(slot) => Ok(slot),
            Err(err) => {
                self.entries.insert(from, mutator);
                Err(err)
            }
        }
    }

    /// Wraps `original` with every mutator in ascending priority order.
    pub fn mutate_delegate(&self, original: D) -> D {
        self.entries
            .values()
            .fold(original, |delegate, mutator| mutator.apply(delegate))
    }

    /// Returns the mutator at `priority`.
    #[must_use]
    pub fn get(&self, priority: i32) -> Option<&Mutator<D>> {
        self.entries.get(&priority)
    }

    /// Returns the priority of the mutator named `name`.
    #[must_use]
    pub fn priority_of(&self, name: &str) -> Option<i32> {
        self.entries
            .values()
            .find(|m| m.name() == name)
            .map(Mutator::priority)
    }

    /// Returns mutator names in ascending priority order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.values().map(Mutator::name).collect()
    }

    /// Iterates over mutators in ascending priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Mutator<D>> {
        self.entries.values()
    }

    /// Returns the number of mutators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no mutators are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every mutator.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn ensure_name_free(&self, name: &str, except: Option<i32>) -> Result<(), MutatorError> {
        match self
            .entries
            .values()
            .find(|m| m.name() == name && Some(m.priority()) != except)
        {
            Some(existing) => Err(MutatorError::NameAlreadyUsed {
                name: name.to_string(),
                priority: existing.priority(),
            }),
            None => Ok(()),
        }
    }

    fn free_slot(
        &self,
        requested: i32,
        step: impl Fn(i32) -> Option<i32>,
    ) -> Result<i32, MutatorError> {
        let mut slot = requested;
        while self.entries.contains_key(&slot) {
            slot = step(slot).ok_or(MutatorError::NoFreePriority { requested })?;
        }
        Ok(slot)
    }
}

impl<D> Default for StepMutators<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for StepMutators<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(p, m)| (p, m.name())))
            .finish()
    }
}
