use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::RwLock;

use crate::{
    Event,
    monitoring::{Monitor, MonitorId},
};

struct MonitorEntry<E: Event> {
    id: MonitorId,
    monitor: Arc<dyn Monitor<E>>,
    paused: bool,
}

struct Entries<E: Event> {
    monitors: Vec<MonitorEntry<E>>,
    last_id: MonitorId,
}

/// Registry for managing monitors attached to a [`MockContext`](crate::MockContext).
///
/// Access via [`MockContext::monitors()`](crate::MockContext::monitors).
///
/// # Example
///
/// ```ignore
/// let registry = ctx.monitors();
///
/// // Add a monitor
/// let id = registry.add(MyMonitor);
///
/// // Pause all monitors
/// registry.pause();
///
/// // Resume all monitors
/// registry.resume();
/// ```
pub struct MonitorRegistry<E: Event> {
    entries: RwLock<Entries<E>>,
    is_active: AtomicBool,
}

impl<E: Event> MonitorRegistry<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                monitors: Vec::new(),
                last_id: 0,
            }),
            is_active: AtomicBool::new(false),
        }
    }

    fn update_is_active(&self, entries: &Entries<E>) {
        let active = entries.monitors.iter().any(|m| !m.paused);
        self.is_active.store(active, Ordering::Relaxed);
    }

    /// Register a new monitor and return its id.
    ///
    /// The monitor starts in the active (non-paused) state.
    pub fn add<M: Monitor<E> + 'static>(&self, monitor: M) -> MonitorId {
        let mut entries = self.entries.write();
        let id = entries.last_id;
        entries.last_id = entries.last_id.wrapping_add(1);
        entries.monitors.push(MonitorEntry {
            id,
            monitor: Arc::new(monitor),
            paused: false,
        });
        self.update_is_active(&entries);
        id
    }

    /// Remove a monitor by its id.
    pub fn remove(&self, id: MonitorId) {
        let mut entries = self.entries.write();
        entries.monitors.retain(|m| m.id != id);
        self.update_is_active(&entries);
    }

    /// Pause all registered monitors.
    ///
    /// Paused monitors do not receive callbacks. Interception continues
    /// normally.
    pub fn pause(&self) {
        self.set_paused(None, true);
    }

    /// Resume all registered monitors.
    pub fn resume(&self) {
        self.set_paused(None, false);
    }

    pub fn pause_one(&self, id: MonitorId) {
        self.set_paused(Some(id), true);
    }

    pub fn resume_one(&self, id: MonitorId) {
        self.set_paused(Some(id), false);
    }

    fn set_paused(&self, id: Option<MonitorId>, paused: bool) {
        let mut entries = self.entries.write();
        for entry in entries
            .monitors
            .iter_mut()
            .filter(|m| id.is_none_or(|id| m.id == id))
        {
            entry.paused = paused;
        }
        self.update_is_active(&entries);
    }

    pub fn len(&self) -> usize {
        self.entries.read().monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke `f` on every active monitor.
    ///
    /// Monitors run outside the registry lock, so a callback may add or
    /// remove monitors. A monitor that panics is removed.
    pub(crate) fn notify(&self, f: impl Fn(&dyn Monitor<E>)) {
        if !self.is_active.load(Ordering::Relaxed) {
            return;
        }

        let active: Vec<(MonitorId, Arc<dyn Monitor<E>>)> = self
            .entries
            .read()
            .monitors
            .iter()
            .filter(|m| !m.paused)
            .map(|m| (m.id, m.monitor.clone()))
            .collect();

        let mut ids_to_remove = Vec::new();
        for (id, monitor) in &active {
            let result = catch_unwind(AssertUnwindSafe(|| f(monitor.as_ref())));
            if result.is_err() {
                tracing::error!(monitor_id = %id, "Monitor panicked, removing");
                ids_to_remove.push(*id);
            }
        }

        for id in ids_to_remove {
            self.remove(id);
        }
    }
}

impl<E: Event> fmt::Debug for MonitorRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorRegistry")
            .field("monitors.len()", &self.len())
            .field("is_active", &self.is_active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::{Call, ComponentId, SourceLocation};

    #[derive(Clone, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl Monitor<String> for Counter {
        fn on_call_recorded(&self, _call: &Call) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicky;

    impl Monitor<String> for Panicky {
        fn on_reset(&self) {
            panic!("monitor failure");
        }
    }

    fn reset_all(registry: &MonitorRegistry<String>) {
        registry.notify(|m| m.on_reset());
    }

    #[test]
    fn empty_registry_is_inactive() {
        let registry = MonitorRegistry::<String>::new();
        assert!(registry.is_empty());
        assert!(!registry.is_active.load(Ordering::Relaxed));
    }

    #[test]
    fn paused_monitors_are_skipped() {
        let registry = MonitorRegistry::<String>::new();
        let counter = Counter::default();
        let id = registry.add(counter.clone());

        let call = Call::new(
            ComponentId::parse("jira:create-group").unwrap(),
            Default::default(),
            "main",
            SourceLocation::default(),
        );
        registry.notify(|m| m.on_call_recorded(&call));
        registry.pause_one(id);
        registry.notify(|m| m.on_call_recorded(&call));
        registry.resume();
        registry.notify(|m| m.on_call_recorded(&call));

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_monitor_is_removed() {
        let registry = MonitorRegistry::<String>::new();
        registry.add(Panicky);
        registry.add(Counter::default());
        assert_eq!(registry.len(), 2);

        reset_all(&registry);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_by_id() {
        let registry = MonitorRegistry::<String>::new();
        let id = registry.add(Counter::default());
        registry.remove(id);
        assert!(registry.is_empty());
        assert!(!registry.is_active.load(Ordering::Relaxed));
    }
}
