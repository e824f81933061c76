use crate::{Call, ComponentId, Envelope, Error, Event, Outcome, SpyPhase};

/// Trait for observing interception.
///
/// Implement this trait to receive callbacks as intercepted processors run.
/// All methods have default no-op implementations, so you only need to
/// override the ones you care about.
///
/// # Example
///
/// ```rust
/// use mockline::{Call, Event};
/// use mockline::monitoring::Monitor;
///
/// struct CallPrinter;
///
/// impl<E: Event> Monitor<E> for CallPrinter {
///     fn on_call_recorded(&self, call: &Call) {
///         println!("[call] #{} {} in {}", call.sequence(), call.id(), call.flow_name());
///     }
/// }
/// ```
///
/// # Interception Lifecycle
///
/// For one invocation, callbacks fire in this order:
/// 1. **Intercepted**  - the interceptor received the input
/// 2. **Mocked** or **Processed**/**Error**  - a behavior applied, or the
///    real processor ran
/// 3. **Recorded**  - the call was appended to the ledger
///
/// A spy failure fires [`on_spy_failed`](Self::on_spy_failed) in place of
/// the later stages it prevented.
pub trait Monitor<E: Event>: Send + Sync {
    /// Called when an invocation enters the interceptor.
    fn on_intercepted(&self, id: &ComponentId, envelope: &Envelope<E>) {
        let _i = id;
        let _e = envelope;
    }

    /// Called when a registered behavior replaces the real processor.
    fn on_mocked(&self, id: &ComponentId, outcome: &Outcome<E>) {
        let _i = id;
        let _o = outcome;
    }

    /// Called when the real processor returns successfully.
    fn on_processed(&self, id: &ComponentId, output: &Envelope<E>) {
        let _i = id;
        let _o = output;
    }

    /// Called when the real processor, or a `Throw` outcome, fails.
    fn on_error(&self, id: &ComponentId, error: &Error) {
        let _i = id;
        let _e = error;
    }

    /// Called when a spy action fails.
    fn on_spy_failed(&self, id: &ComponentId, phase: SpyPhase, error: &Error) {
        let _i = id;
        let _p = phase;
        let _e = error;
    }

    /// Called after a call is appended to the ledger.
    fn on_call_recorded(&self, call: &Call) {
        let _c = call;
    }

    /// Called when a processor type could not be made interceptable and a
    /// real instance is used instead.
    fn on_proxy_degraded(&self, type_name: &str, id: &ComponentId, reason: &str) {
        let _t = type_name;
        let _i = id;
        let _r = reason;
    }

    /// Called when the owning context clears its registries and ledger.
    fn on_reset(&self) {}
}
