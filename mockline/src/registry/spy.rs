use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    Attributes, ComponentId, Envelope, Event, Result,
    registry::{Registration, Registry},
};

/// A single spy callback. Returning an error aborts the invocation.
pub type SpyAction<E> = Arc<dyn Fn(&Envelope<E>) -> Result + Send + Sync>;

/// Wrap a closure as a [`SpyAction`].
///
/// ```rust
/// use mockline::{Envelope, Error, spy_action};
///
/// let not_empty = spy_action(|envelope: &Envelope<String>| {
///     if envelope.message().is_empty() {
///         return Err(Error::assertion("empty payload"));
///     }
///     Ok(())
/// });
/// assert!(not_empty(&Envelope::new("x".to_string())).is_ok());
/// ```
pub fn spy_action<E, F>(f: F) -> SpyAction<E>
where
    E: Event,
    F: Fn(&Envelope<E>) -> Result + Send + Sync + 'static,
{
    Arc::new(f)
}

/// When a spy runs relative to the intercepted component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpyPhase {
    /// Before the component, with the input envelope.
    Before,
    /// After the component, with the output (or the input, if it failed).
    After,
}

impl fmt::Display for SpyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpyPhase::Before => f.write_str("before"),
            SpyPhase::After => f.write_str("after"),
        }
    }
}

/// An ordered list of spy actions attached to a component and phase.
pub struct SpyHook<E> {
    id: ComponentId,
    predicates: Attributes,
    phase: SpyPhase,
    actions: Vec<SpyAction<E>>,
}

impl<E: Event> SpyHook<E> {
    pub fn new(
        id: ComponentId,
        predicates: Attributes,
        phase: SpyPhase,
        actions: Vec<SpyAction<E>>,
    ) -> Self {
        Self {
            id,
            predicates,
            phase,
            actions,
        }
    }

    #[inline]
    pub fn phase(&self) -> SpyPhase {
        self.phase
    }

    /// Run every action in order, stopping at the first failure.
    pub fn run(&self, envelope: &Envelope<E>) -> Result {
        self.actions.iter().try_for_each(|action| action(envelope))
    }
}

impl<E> Registration for SpyHook<E> {
    fn id(&self) -> &ComponentId {
        &self.id
    }

    fn predicates(&self) -> &Attributes {
        &self.predicates
    }
}

impl<E> fmt::Debug for SpyHook<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpyHook")
            .field("id", &self.id)
            .field("predicates", &self.predicates)
            .field("phase", &self.phase)
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// Spy hooks, selected per phase.
///
/// A before-hook never competes with an after-hook: each phase has its own
/// best match.
pub struct SpyRegistry<E> {
    before: Registry<SpyHook<E>>,
    after: Registry<SpyHook<E>>,
}

impl<E: Event> SpyRegistry<E> {
    pub fn new() -> Self {
        Self {
            before: Registry::new(),
            after: Registry::new(),
        }
    }

    fn phase(&self, phase: SpyPhase) -> &Registry<SpyHook<E>> {
        match phase {
            SpyPhase::Before => &self.before,
            SpyPhase::After => &self.after,
        }
    }

    pub fn register(&self, hook: SpyHook<E>) -> Arc<SpyHook<E>> {
        self.phase(hook.phase()).register(hook)
    }

    pub fn best_match(
        &self,
        id: &ComponentId,
        attributes: &BTreeMap<String, String>,
        phase: SpyPhase,
    ) -> Option<Arc<SpyHook<E>>> {
        self.phase(phase).best_match(id, attributes)
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.before.clear();
        self.after.clear();
    }
}

impl<E: Event> Default for SpyRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for SpyRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpyRegistry")
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}
