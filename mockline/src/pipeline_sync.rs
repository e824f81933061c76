use std::{fmt, pin::pin, sync::Arc, time::Duration};

use parking_lot::{Condvar, Mutex};
use tokio::{sync::Notify, time::Instant};

/// Lifecycle notifications a host pipeline runtime emits.
///
/// Only [`ProcessStart`](Self::ProcessStart) and
/// [`ProcessEnd`](Self::ProcessEnd) move the counter; the rest are accepted
/// and ignored so a host can forward its whole notification stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum PipelineNotification {
    ProcessStart,
    ProcessEnd,
    ProcessComplete,
    ProcessorPre,
    ProcessorPost,
}

/// Counts in-flight asynchronous pipeline executions.
///
/// The host calls [`start`](Self::start) when an execution begins and
/// [`end`](Self::end) when it finishes. Verification waits until the count
/// drops to zero (or below; an unmatched `end` is tolerated) before counting
/// calls, so it never under-counts work that is still running.
///
/// Both blocking ([`wait_quiescent`](Self::wait_quiescent)) and async
/// ([`quiescent`](Self::quiescent)) waits are supported, and both are
/// bounded by a timeout.
pub struct PipelineSync {
    counter: Mutex<Counter>,
    settled: Condvar,
    notify: Notify,
}

#[derive(Debug, Default)]
struct Counter {
    in_flight: i64,
    // Executions started before the last reset whose `end` has not arrived.
    orphaned: i64,
}

impl PipelineSync {
    pub fn new() -> Self {
        Self {
            counter: Mutex::new(Counter::default()),
            settled: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Mark the beginning of a pipeline execution.
    pub fn start(&self) {
        let mut counter = self.counter.lock();
        counter.in_flight += 1;
        tracing::trace!(in_flight = counter.in_flight, "pipeline start");
    }

    /// Mark the end of a pipeline execution.
    ///
    /// Ends of executions that were in flight at the last
    /// [`reset`](Self::reset) are absorbed and do not move the counter.
    pub fn end(&self) {
        let mut counter = self.counter.lock();
        if counter.orphaned > 0 {
            counter.orphaned -= 1;
            tracing::trace!(orphaned = counter.orphaned, "late pipeline end absorbed");
            return;
        }
        counter.in_flight -= 1;
        tracing::trace!(in_flight = counter.in_flight, "pipeline end");
        if counter.in_flight <= 0 {
            self.wake_all();
        }
    }

    /// Apply a host notification.
    pub fn on_notification(&self, notification: PipelineNotification) {
        match notification {
            PipelineNotification::ProcessStart => self.start(),
            PipelineNotification::ProcessEnd => self.end(),
            _ => {}
        }
    }

    /// Start an execution that ends when the returned guard is dropped.
    pub fn guard(self: &Arc<Self>) -> PipelineGuard {
        self.start();
        PipelineGuard { sync: self.clone() }
    }

    /// Current number of executions in flight. May be negative after an
    /// unmatched `end`.
    pub fn in_flight(&self) -> i64 {
        self.counter.lock().in_flight
    }

    /// Returns true when no execution is in flight.
    pub fn ready_to_continue(&self) -> bool {
        self.in_flight() <= 0
    }

    /// Block the current thread until quiescent or until `timeout` elapses.
    ///
    /// Returns whether quiescence was reached.
    pub fn wait_quiescent(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let mut counter = self.counter.lock();
        while counter.in_flight > 0 {
            if self.settled.wait_until(&mut counter, deadline).timed_out() {
                return counter.in_flight <= 0;
            }
        }
        true
    }

    /// Wait asynchronously until quiescent or until `timeout` elapses.
    ///
    /// Returns whether quiescence was reached.
    pub async fn quiescent(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let mut notified = pin!(self.notify.notified());
            notified.as_mut().enable();
            if self.ready_to_continue() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.ready_to_continue();
            }
        }
    }

    /// Zero the counter and release every waiter.
    ///
    /// Executions still in flight are remembered, so their `end` arriving
    /// later does not leak into the next count.
    pub fn reset(&self) {
        let mut counter = self.counter.lock();
        counter.orphaned += counter.in_flight.max(0);
        counter.in_flight = 0;
        self.wake_all();
    }

    fn wake_all(&self) {
        self.settled.notify_all();
        self.notify.notify_waiters();
    }
}

impl Default for PipelineSync {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PipelineSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSync")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Ends one pipeline execution when dropped.
///
/// Created by [`PipelineSync::guard`]. Moving the guard into a spawned task
/// keeps the execution counted until the task finishes, even if it fails.
#[must_use = "dropping the guard immediately ends the execution"]
#[derive(Debug)]
pub struct PipelineGuard {
    sync: Arc<PipelineSync>,
}

impl Drop for PipelineGuard {
    fn drop(&mut self) {
        self.sync.end();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn counter_tracks_start_and_end() {
        let sync = PipelineSync::new();
        assert!(sync.ready_to_continue());
        sync.start();
        sync.start();
        assert_eq!(sync.in_flight(), 2);
        assert!(!sync.ready_to_continue());
        sync.end();
        sync.end();
        assert!(sync.ready_to_continue());
    }

    #[test]
    fn unmatched_end_is_tolerated() {
        let sync = PipelineSync::new();
        sync.end();
        assert_eq!(sync.in_flight(), -1);
        assert!(sync.ready_to_continue());
        assert!(sync.wait_quiescent(Duration::from_millis(1)));
    }

    #[test]
    fn other_notifications_are_ignored() {
        let sync = PipelineSync::new();
        sync.on_notification(PipelineNotification::ProcessStart);
        sync.on_notification(PipelineNotification::ProcessorPre);
        sync.on_notification(PipelineNotification::ProcessComplete);
        assert_eq!(sync.in_flight(), 1);
        sync.on_notification(PipelineNotification::ProcessEnd);
        assert_eq!(sync.in_flight(), 0);
    }

    #[test]
    fn wait_times_out_while_in_flight() {
        let sync = PipelineSync::new();
        sync.start();
        assert!(!sync.wait_quiescent(Duration::from_millis(20)));
    }

    #[test]
    fn wait_returns_when_another_thread_ends() {
        let sync = Arc::new(PipelineSync::new());
        sync.start();
        let worker = {
            let sync = sync.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                sync.end();
            })
        };
        assert!(sync.wait_quiescent(Duration::from_secs(5)));
        worker.join().unwrap();
    }

    #[test]
    fn guard_ends_on_drop() {
        let sync = Arc::new(PipelineSync::new());
        let guard = sync.guard();
        assert_eq!(sync.in_flight(), 1);
        drop(guard);
        assert_eq!(sync.in_flight(), 0);
    }

    #[test]
    fn reset_releases_waiters() {
        let sync = PipelineSync::new();
        sync.start();
        sync.start();
        sync.reset();
        assert_eq!(sync.in_flight(), 0);
        assert!(sync.wait_quiescent(Duration::from_millis(1)));
    }

    #[test]
    fn late_end_after_reset_does_not_leak_into_next_run() {
        let sync = PipelineSync::new();
        sync.start();
        sync.start();
        sync.reset();

        sync.start();
        sync.end();
        assert_eq!(sync.in_flight(), 1);
        assert!(!sync.ready_to_continue());
        assert!(!sync.wait_quiescent(Duration::from_millis(10)));

        sync.end();
        sync.end();
        assert_eq!(sync.in_flight(), 0);
        sync.end();
        assert_eq!(sync.in_flight(), -1);
    }

    #[test]
    fn guard_dropped_after_reset_is_absorbed() {
        let sync = Arc::new(PipelineSync::new());
        let stale = sync.guard();
        sync.reset();
        let current = sync.guard();
        drop(stale);
        assert_eq!(sync.in_flight(), 1);
        drop(current);
        assert!(sync.ready_to_continue());
    }

    #[tokio::test]
    async fn async_wait_completes_when_tasks_finish() {
        let sync = Arc::new(PipelineSync::new());
        for _ in 0..4 {
            let guard = sync.guard();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                drop(guard);
            });
        }
        assert!(sync.quiescent(Duration::from_secs(5)).await);
        assert_eq!(sync.in_flight(), 0);
    }

    #[tokio::test]
    async fn async_wait_times_out() {
        let sync = PipelineSync::new();
        sync.start();
        assert!(!sync.quiescent(Duration::from_millis(20)).await);
    }
}
