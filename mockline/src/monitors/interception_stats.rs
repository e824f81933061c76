use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::Mutex;

use crate::{ComponentId, Envelope, Error, Event, Outcome, monitoring::Monitor};

/// Monitor that counts how each component's invocations were handled.
///
/// Register with the context to passively observe mocked, real and failed
/// invocations, plus processor types that could not be intercepted. Query
/// at any time from any thread. Counts are cleared on context reset.
///
/// ```ignore
/// let stats = InterceptionStats::new();
/// ctx.monitors().add(stats.clone());
///
/// // Later, from any thread:
/// let mocked = stats.mocked_count(&create_group);
/// let real = stats.real_count(&logger);
/// ```
#[derive(Clone)]
pub struct InterceptionStats {
    inner: Arc<Mutex<StatsInner>>,
}

#[derive(Default)]
struct StatsInner {
    mocked: HashMap<ComponentId, usize>,
    real: HashMap<ComponentId, usize>,
    errors: HashMap<ComponentId, usize>,
    degraded: Vec<String>,
}

impl InterceptionStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsInner::default())),
        }
    }

    /// Invocations answered by a registered behavior.
    pub fn mocked_count(&self, id: &ComponentId) -> usize {
        self.inner.lock().mocked.get(id).copied().unwrap_or(0)
    }

    /// Invocations that ran the real processor successfully.
    pub fn real_count(&self, id: &ComponentId) -> usize {
        self.inner.lock().real.get(id).copied().unwrap_or(0)
    }

    /// Invocations that failed, whether thrown by a behavior or the real processor.
    pub fn error_count(&self, id: &ComponentId) -> usize {
        self.inner.lock().errors.get(id).copied().unwrap_or(0)
    }

    /// Processor types that degraded to a real instance, in the order seen.
    pub fn degraded_types(&self) -> Vec<String> {
        self.inner.lock().degraded.clone()
    }
}

impl<E: Event> Monitor<E> for InterceptionStats {
    fn on_mocked(&self, id: &ComponentId, outcome: &Outcome<E>) {
        if !outcome.is_throw() {
            *self.inner.lock().mocked.entry(id.clone()).or_insert(0) += 1;
        }
    }

    fn on_processed(&self, id: &ComponentId, _output: &Envelope<E>) {
        *self.inner.lock().real.entry(id.clone()).or_insert(0) += 1;
    }

    fn on_error(&self, id: &ComponentId, _error: &Error) {
        *self.inner.lock().errors.entry(id.clone()).or_insert(0) += 1;
    }

    fn on_proxy_degraded(&self, type_name: &str, _id: &ComponentId, _reason: &str) {
        self.inner.lock().degraded.push(type_name.to_string());
    }

    fn on_reset(&self) {
        *self.inner.lock() = StatsInner::default();
    }
}

impl Default for InterceptionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterceptionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lock = self.inner.lock();
        f.debug_struct("InterceptionStats")
            .field("mocked", &lock.mocked.len())
            .field("real", &lock.real.len())
            .field("errors", &lock.errors.len())
            .field("degraded", &lock.degraded.len())
            .finish()
    }
}
