use crate::{Call, ComponentId, Envelope, Error, Event, Outcome, SpyPhase, monitoring::Monitor};

/// A monitor that logs the interception lifecycle to the `tracing` crate.
///
/// Provides visibility into what the engine decided for each invocation
/// without custom code. Log levels:
/// - `trace` - invocation intercepted, call recorded (high volume)
/// - `debug` - behavior applied, real processor returned
/// - `warn` - processor errors, spy failures, proxy degradation
/// - `info` - context reset
///
/// # Example
///
/// ```ignore
/// use mockline::monitors::Tracer;
///
/// ctx.monitors().add(Tracer);
/// ```
#[derive(Debug)]
pub struct Tracer;

impl<E> Monitor<E> for Tracer
where
    E: Event + std::fmt::Debug,
{
    fn on_intercepted(&self, id: &ComponentId, envelope: &Envelope<E>) {
        tracing::trace!(
            component = %id,
            event_id = %envelope.id(),
            flow = %envelope.flow_name(),
            "invocation intercepted"
        );
    }

    fn on_mocked(&self, id: &ComponentId, outcome: &Outcome<E>) {
        tracing::debug!(
            component = %id,
            outcome = ?outcome,
            "behavior applied"
        );
    }

    fn on_processed(&self, id: &ComponentId, output: &Envelope<E>) {
        tracing::debug!(
            component = %id,
            event_id = %output.id(),
            message = ?output.message(),
            "real processor returned"
        );
    }

    fn on_error(&self, id: &ComponentId, error: &Error) {
        tracing::warn!(
            component = %id,
            error = %error,
            "processor error"
        );
    }

    fn on_spy_failed(&self, id: &ComponentId, phase: SpyPhase, error: &Error) {
        tracing::warn!(
            component = %id,
            phase = %phase,
            error = %error,
            "spy failed"
        );
    }

    fn on_call_recorded(&self, call: &Call) {
        tracing::trace!(
            component = %call.id(),
            sequence = call.sequence(),
            event = ?call.event_id().map(|e| e.short()),
            flow = %call.flow_name(),
            source = %call.source(),
            "call recorded"
        );
    }

    fn on_proxy_degraded(&self, type_name: &str, id: &ComponentId, reason: &str) {
        tracing::warn!(
            processor_type = %type_name,
            component = %id,
            reason = %reason,
            "proxy degraded to real instance"
        );
    }

    fn on_reset(&self) {
        tracing::info!("mock context reset");
    }
}
