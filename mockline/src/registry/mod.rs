//! Behavior and spy registries.
//!
//! Both are instances of the same best-match [`Registry`]: entries keyed by
//! [`ComponentId`] plus an attribute predicate set, selected per call by
//! specificity.

mod behavior;
mod spy;

use std::{collections::BTreeMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{Attributes, ComponentId};

pub use behavior::{Behavior, Outcome};
pub use spy::{SpyAction, SpyHook, SpyPhase, SpyRegistry, spy_action};

/// An entry that can be selected for a call by id and attributes.
pub trait Registration {
    fn id(&self) -> &ComponentId;
    fn predicates(&self) -> &Attributes;

    /// Returns true if this entry applies to a call with the given identity.
    fn applies_to(&self, id: &ComponentId, attributes: &BTreeMap<String, String>) -> bool {
        self.id() == id && self.predicates().matches(attributes)
    }
}

/// Ordered collection of registrations with best-match selection.
///
/// Written during test setup and read concurrently while pipelines run.
/// Registration order is kept; it decides ties.
pub struct Registry<T> {
    entries: RwLock<Vec<Arc<T>>>,
}

impl<T: Registration> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, entry: T) -> Arc<T> {
        let entry = Arc::new(entry);
        self.entries.write().push(entry.clone());
        entry
    }

    /// Select the single entry that applies to a call.
    ///
    /// Among entries whose id equals `id` and whose predicates all hold
    /// against `attributes`, the one with the most predicates wins. Ties go
    /// to the most recently registered entry. `None` when nothing applies.
    pub fn best_match(
        &self,
        id: &ComponentId,
        attributes: &BTreeMap<String, String>,
    ) -> Option<Arc<T>> {
        let entries = self.entries.read();
        let mut best: Option<&Arc<T>> = None;
        for entry in entries.iter().filter(|e| e.applies_to(id, attributes)) {
            match best {
                Some(current) if current.predicates().len() > entry.predicates().len() => {}
                _ => best = Some(entry),
            }
        }
        best.cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T: Registration> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}
