use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    ArgValue, Behavior, CallLedger, CallQuery, ComponentId, Event, Instance, MockConfig, OnCall,
    PipelineSync, ProcessorClass, ProxyFactory, Registry, Result, SourceLocation, SpyHook,
    SpyRegistry, TraceFrame, VerifyCall, call_trace, interceptor::Interceptor,
    monitoring::MonitorRegistry,
};

/// Owns everything one test run needs to mock and verify processors.
///
/// A `MockContext` holds the behavior and spy registries, the call ledger,
/// the pipeline counter, registered processor types and monitors. Tests
/// create one, register processor types and behaviors during setup, let the
/// pipeline run, then verify. It is shared as `Arc` and is safe to use from
/// any number of pipeline threads.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use mockline::*;
///
/// struct CreateGroup;
///
/// impl Processor<String> for CreateGroup {
///     fn process(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
///         Ok(envelope.map(|m| format!("created {m}")))
///     }
/// }
///
/// # fn main() -> Result {
/// let ctx = MockContext::<String>::new();
/// ctx.register_class(ProcessorClass::new("CreateGroup").nullary(|| CreateGroup));
///
/// let mut attributes = BTreeMap::new();
/// attributes.insert("groupName".to_string(), "admins".to_string());
/// let processor = ctx.create_interceptable(
///     "CreateGroup",
///     ComponentId::parse("jira:create-group")?,
///     attributes,
///     SourceLocation::new("jira.xml", 12),
///     &[],
/// )?;
///
/// ctx.on_call("jira:create-group")
///     .with_attribute("groupName", "admins")
///     .then_return("mocked".to_string())?;
///
/// let out = processor.process(Envelope::new("admins".to_string()))?;
/// assert_eq!(out.message(), "mocked");
///
/// ctx.verify_call("create-group").of_namespace("jira").times(1)?;
/// # Ok(())
/// # }
/// ```
pub struct MockContext<E: Event> {
    config: MockConfig,
    behaviors: Registry<Behavior<E>>,
    spies: SpyRegistry<E>,
    ledger: CallLedger,
    pipeline: Arc<PipelineSync>,
    monitors: MonitorRegistry<E>,
    factory: ProxyFactory<E>,
}

impl<E: Event> MockContext<E> {
    pub fn new() -> Arc<Self> {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Arc<Self> {
        Arc::new(Self {
            behaviors: Registry::new(),
            spies: SpyRegistry::new(),
            ledger: CallLedger::with_capacity(config.ledger_capacity()),
            pipeline: Arc::new(PipelineSync::new()),
            monitors: MonitorRegistry::new(),
            factory: ProxyFactory::new(),
            config,
        })
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    // ==================== Setup ====================

    /// Start registering a behavior for the component `name`
    /// (`namespace:name`, or a bare name in the default namespace).
    pub fn on_call(&self, name: &str) -> OnCall<'_, E> {
        OnCall::new(self, name)
    }

    /// Start registering spies for the component `name`.
    pub fn spy(&self, name: &str) -> OnCall<'_, E> {
        OnCall::new(self, name)
    }

    pub fn register_behavior(&self, behavior: Behavior<E>) {
        self.behaviors.register(behavior);
    }

    pub fn register_spy(&self, hook: SpyHook<E>) {
        self.spies.register(hook);
    }

    /// Make a processor type available to [`create_interceptable`](Self::create_interceptable).
    pub fn register_class(&self, class: ProcessorClass<E>) {
        self.factory.register(class);
    }

    /// Build a processor of `type_name` whose `process` calls go through this
    /// context.
    ///
    /// `id`, `attributes` and `source` describe the component as declared in
    /// the pipeline and end up in every recorded call. `args` select the
    /// constructor. Types that cannot be intercepted come back as
    /// [`Instance::Real`] with a warning, unless
    /// [`MockConfig::fallback_to_real`] is off.
    pub fn create_interceptable(
        self: &Arc<Self>,
        type_name: &str,
        id: ComponentId,
        attributes: BTreeMap<String, String>,
        source: SourceLocation,
        args: &[ArgValue],
    ) -> Result<Instance<E>> {
        self.factory
            .create(self, type_name, id, attributes, source, args)
    }

    // ==================== Pipeline ====================

    pub fn notify_pipeline_start(&self) {
        self.pipeline.start();
    }

    pub fn notify_pipeline_end(&self) {
        self.pipeline.end();
    }

    pub fn pipeline(&self) -> &Arc<PipelineSync> {
        &self.pipeline
    }

    // ==================== Verification ====================

    /// Start a cardinality check on calls of the component `name`.
    pub fn verify_call(&self, name: &str) -> VerifyCall<'_, E> {
        VerifyCall::new(self, name)
    }

    /// A query over every recorded call, in sequence order.
    pub fn calls(&self) -> CallQuery {
        self.ledger.snapshot()
    }

    pub fn ledger(&self) -> &CallLedger {
        &self.ledger
    }

    /// Executed components, most recent first.
    pub fn call_trace(&self) -> Vec<TraceFrame> {
        let calls = self.ledger.snapshot();
        call_trace::build(calls.iter())
    }

    pub fn monitors(&self) -> &MonitorRegistry<E> {
        &self.monitors
    }

    /// Clear behaviors, spies, recorded calls and the pipeline counter.
    ///
    /// Registered processor types and monitors are kept.
    pub fn reset_all(&self) {
        tracing::debug!(
            behaviors = self.behaviors.len(),
            spies = self.spies.len(),
            calls = self.ledger.len(),
            "resetting mock context"
        );
        self.behaviors.clear();
        self.spies.clear();
        self.ledger.reset();
        self.pipeline.reset();
        self.monitors.notify(|m| m.on_reset());
    }

    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    pub fn spy_count(&self) -> usize {
        self.spies.len()
    }

    pub(crate) fn interceptor(&self) -> Interceptor<'_, E> {
        Interceptor {
            behaviors: &self.behaviors,
            spies: &self.spies,
            ledger: &self.ledger,
            monitors: &self.monitors,
        }
    }
}

impl<E: Event> fmt::Debug for MockContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockContext")
            .field("config", &self.config)
            .field("behaviors", &self.behaviors)
            .field("spies", &self.spies)
            .field("ledger", &self.ledger)
            .field("pipeline", &self.pipeline)
            .field("monitors", &self.monitors)
            .field("factory", &self.factory)
            .finish()
    }
}
