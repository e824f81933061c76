use std::{collections::BTreeMap, fmt, sync::Weak};

use crate::{
    Behavior, Call, CallLedger, ComponentId, Envelope, Error, Event, MockContext, Processor,
    Registry, Result, SourceLocation, SpyPhase, SpyRegistry, monitoring::MonitorRegistry,
};

/// Decides, for one invocation, whether to run the real processor or a
/// registered outcome, and records the call.
///
/// For each invocation:
/// 1. The best before-spy runs with the input; a failure aborts the
///    invocation without recording it.
/// 2. The best behavior, if any, produces the output: a thrown outcome fails
///    the call, otherwise the outcome envelope is passed to the real
///    processor's [`process_next`](Processor::process_next). The real
///    [`process`](Processor::process) is skipped.
/// 3. Without a behavior the real processor runs and its result is kept.
/// 4. The best after-spy runs with the output, or with the input when the
///    call failed.
/// 5. The call is appended to the ledger, then the result (or the after-spy
///    failure) is returned.
pub(crate) struct Interceptor<'a, E: Event> {
    pub(crate) behaviors: &'a Registry<Behavior<E>>,
    pub(crate) spies: &'a SpyRegistry<E>,
    pub(crate) ledger: &'a CallLedger,
    pub(crate) monitors: &'a MonitorRegistry<E>,
}

impl<E: Event> Interceptor<'_, E> {
    pub(crate) fn intercept(
        &self,
        target: &Interceptable<E>,
        envelope: Envelope<E>,
    ) -> Result<Envelope<E>> {
        let id = &target.id;
        let attributes = &target.attributes;
        self.monitors.notify(|m| m.on_intercepted(id, &envelope));

        let call = Call::new(
            id.clone(),
            attributes.clone(),
            envelope.flow_name(),
            target.source.clone(),
        )
        .with_event(envelope.id());

        if let Some(hook) = self.spies.best_match(id, attributes, SpyPhase::Before)
            && let Err(e) = hook.run(&envelope)
        {
            tracing::trace!(component = %id, error = %e, "before-spy aborted invocation");
            self.monitors
                .notify(|m| m.on_spy_failed(id, SpyPhase::Before, &e));
            return Err(e);
        }

        let after = self.spies.best_match(id, attributes, SpyPhase::After);
        let input = after.as_ref().map(|_| envelope.clone());

        let result = match self.behaviors.best_match(id, attributes) {
            Some(behavior) => {
                let outcome = behavior.outcome();
                tracing::trace!(component = %id, outcome = outcome.kind(), "behavior applied");
                self.monitors.notify(|m| m.on_mocked(id, outcome));
                outcome
                    .apply(envelope)
                    .and_then(|out| target.real.process_next(out))
            }
            None => {
                tracing::trace!(component = %id, "invoking real processor");
                let result = target.real.process(envelope);
                if let Ok(out) = &result {
                    self.monitors.notify(|m| m.on_processed(id, out));
                }
                result
            }
        };

        if let Err(e) = &result {
            self.monitors.notify(|m| m.on_error(id, e));
        }

        let spied = match (&after, &result, &input) {
            (Some(hook), Ok(out), _) => hook.run(out),
            (Some(hook), Err(_), Some(input)) => hook.run(input),
            _ => Ok(()),
        };

        let call = self.ledger.record(call);
        self.monitors.notify(|m| m.on_call_recorded(&call));

        if let Err(e) = spied {
            tracing::trace!(component = %id, error = %e, "after-spy failed");
            self.monitors.notify(|m| m.on_spy_failed(id, SpyPhase::After, &e));
            return Err(e);
        }

        result
    }
}

/// A processor wrapped so that every `process` call goes through the
/// interceptor of the context that created it.
///
/// Created by [`MockContext::create_interceptable`]. Lifecycle methods and
/// [`process_next`](Processor::process_next) go straight to the wrapped
/// instance. The wrapper only holds a weak reference to its context; once
/// the context is dropped, `process` fails with [`Error::NotInitialized`].
pub struct Interceptable<E: Event> {
    pub(crate) real: Box<dyn Processor<E>>,
    pub(crate) id: ComponentId,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) source: SourceLocation,
    pub(crate) context: Weak<MockContext<E>>,
}

impl<E: Event> Interceptable<E> {
    pub(crate) fn new(
        real: Box<dyn Processor<E>>,
        id: ComponentId,
        attributes: BTreeMap<String, String>,
        source: SourceLocation,
        context: Weak<MockContext<E>>,
    ) -> Self {
        Self {
            real,
            id,
            attributes,
            source,
            context,
        }
    }

    #[inline]
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    #[inline]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    #[inline]
    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    /// The wrapped instance.
    pub fn real(&self) -> &dyn Processor<E> {
        self.real.as_ref()
    }
}

impl<E: Event> Processor<E> for Interceptable<E> {
    fn process(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        let context = self
            .context
            .upgrade()
            .ok_or(Error::NotInitialized("mock context"))?;
        context.interceptor().intercept(self, envelope)
    }

    fn process_next(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        self.real.process_next(envelope)
    }

    fn initialise(&self) -> Result {
        self.real.initialise()
    }

    fn dispose(&self) {
        self.real.dispose()
    }
}

impl<E: Event> fmt::Debug for Interceptable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptable")
            .field("id", &self.id)
            .field("attributes", &self.attributes)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use parking_lot::Mutex;

    use super::*;
    use crate::{Attributes, Behavior, Outcome, SpyHook};

    struct Upper {
        calls: Arc<AtomicUsize>,
    }

    impl Processor<String> for Upper {
        fn process(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(envelope.map(|m| m.to_uppercase()))
        }
    }

    struct Failing;

    impl Processor<String> for Failing {
        fn process(&self, _envelope: Envelope<String>) -> Result<Envelope<String>> {
            Err(Error::external(std::io::Error::other("connection refused")))
        }
    }

    struct Suffix;

    impl Processor<String> for Suffix {
        fn process(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
            Ok(envelope)
        }

        fn process_next(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
            Ok(envelope.map(|m| format!("{m}+next")))
        }
    }

    struct Parts {
        behaviors: Registry<Behavior<String>>,
        spies: SpyRegistry<String>,
        ledger: CallLedger,
        monitors: MonitorRegistry<String>,
    }

    impl Parts {
        fn new() -> Self {
            Self {
                behaviors: Registry::new(),
                spies: SpyRegistry::new(),
                ledger: CallLedger::new(),
                monitors: MonitorRegistry::new(),
            }
        }

        fn interceptor(&self) -> Interceptor<'_, String> {
            Interceptor {
                behaviors: &self.behaviors,
                spies: &self.spies,
                ledger: &self.ledger,
                monitors: &self.monitors,
            }
        }
    }

    fn id() -> ComponentId {
        ComponentId::parse("jira:create-group").unwrap()
    }

    fn target(real: impl Processor<String>) -> Interceptable<String> {
        let mut attributes = BTreeMap::new();
        attributes.insert("groupName".to_string(), "admins".to_string());
        Interceptable::new(
            Box::new(real),
            id(),
            attributes,
            SourceLocation::new("jira.xml", 7),
            Weak::new(),
        )
    }

    fn input() -> Envelope<String> {
        Envelope::new("hello".to_string()).with_flow("callingJira")
    }

    fn recording_spy(seen: &Arc<Mutex<Vec<String>>>) -> crate::SpyAction<String> {
        let seen = seen.clone();
        Arc::new(move |envelope: &Envelope<String>| -> Result {
            seen.lock().push(envelope.message().clone());
            Ok(())
        })
    }

    fn failing_spy(message: &'static str) -> crate::SpyAction<String> {
        Arc::new(move |_: &Envelope<String>| -> Result { Err(Error::assertion(message)) })
    }

    #[test]
    fn passthrough_runs_real_and_records() {
        let parts = Parts::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let target = target(Upper {
            calls: calls.clone(),
        });

        let envelope = input();
        let event = envelope.id();
        let out = parts.interceptor().intercept(&target, envelope).unwrap();

        assert_eq!(out.message(), "HELLO");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let recorded = parts.ledger.snapshot().first().unwrap();
        assert_eq!(recorded.flow_name(), "callingJira");
        assert_eq!(recorded.attribute("groupName"), Some("admins"));
        assert_eq!(recorded.event_id(), Some(event));
        assert_eq!(parts.ledger.snapshot().for_event(event).count(), 1);
    }

    #[test]
    fn return_outcome_skips_real_process_but_runs_next() {
        let parts = Parts::new();
        parts.behaviors.register(Behavior::new(
            id(),
            Attributes::new(),
            Outcome::Return("mocked".to_string()),
        ));

        let out = parts.interceptor().intercept(&target(Suffix), input()).unwrap();
        assert_eq!(out.message(), "mocked+next");
        assert_eq!(parts.ledger.len(), 1);
    }

    #[test]
    fn throw_outcome_is_returned_verbatim_and_recorded() {
        let parts = Parts::new();
        let error = Error::external(std::io::Error::other("jira down"));
        parts.behaviors.register(Behavior::new(
            id(),
            Attributes::new(),
            Outcome::Throw(error.clone()),
        ));
        let calls = Arc::new(AtomicUsize::new(0));

        let result = parts.interceptor().intercept(
            &target(Upper {
                calls: calls.clone(),
            }),
            input(),
        );

        assert_eq!(result.unwrap_err(), error);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(parts.ledger.len(), 1);
    }

    #[test]
    fn real_failure_propagates_and_is_recorded() {
        let parts = Parts::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        parts.spies.register(SpyHook::new(
            id(),
            Attributes::new(),
            SpyPhase::After,
            vec![recording_spy(&seen)],
        ));

        let result = parts.interceptor().intercept(&target(Failing), input());

        assert!(result.is_err());
        assert_eq!(parts.ledger.len(), 1);
        assert_eq!(*seen.lock(), vec!["hello".to_string()]);
    }

    #[test]
    fn failing_before_spy_aborts_without_recording() {
        let parts = Parts::new();
        parts.spies.register(SpyHook::new(
            id(),
            Attributes::new(),
            SpyPhase::Before,
            vec![failing_spy("wrong payload")],
        ));
        let calls = Arc::new(AtomicUsize::new(0));

        let result = parts.interceptor().intercept(
            &target(Upper {
                calls: calls.clone(),
            }),
            input(),
        );

        assert_eq!(result.unwrap_err(), Error::assertion("wrong payload"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(parts.ledger.is_empty());
    }

    #[test]
    fn failing_after_spy_still_records() {
        let parts = Parts::new();
        parts.spies.register(SpyHook::new(
            id(),
            Attributes::new(),
            SpyPhase::After,
            vec![failing_spy("late")],
        ));
        let calls = Arc::new(AtomicUsize::new(0));

        let result = parts.interceptor().intercept(
            &target(Upper {
                calls: calls.clone(),
            }),
            input(),
        );

        assert_eq!(result.unwrap_err(), Error::assertion("late"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(parts.ledger.len(), 1);
    }

    #[test]
    fn spies_see_input_then_output() {
        let parts = Parts::new();
        let before = Arc::new(Mutex::new(Vec::new()));
        let after = Arc::new(Mutex::new(Vec::new()));
        parts.spies.register(SpyHook::new(
            id(),
            Attributes::new(),
            SpyPhase::Before,
            vec![recording_spy(&before)],
        ));
        parts.spies.register(SpyHook::new(
            id(),
            Attributes::new(),
            SpyPhase::After,
            vec![recording_spy(&after)],
        ));
        parts.behaviors.register(Behavior::new(
            id(),
            Attributes::new(),
            Outcome::Return("mocked".to_string()),
        ));

        parts
            .interceptor()
            .intercept(&target(Suffix), input())
            .unwrap();

        assert_eq!(*before.lock(), vec!["hello".to_string()]);
        assert_eq!(*after.lock(), vec!["mocked+next".to_string()]);
    }

    #[test]
    fn process_without_context_is_not_initialized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let target = target(Upper { calls });
        assert_eq!(
            target.process(input()).unwrap_err(),
            Error::NotInitialized("mock context")
        );
    }

    #[test]
    fn lifecycle_goes_to_real_instance() {
        let target = target(Suffix);
        assert!(target.initialise().is_ok());
        let out = target.process_next(input()).unwrap();
        assert_eq!(out.message(), "hello+next");
    }
}
