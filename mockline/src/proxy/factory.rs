use std::{collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{
    ComponentId, Envelope, Error, Event, Interceptable, MockContext, Processor, Result,
    SourceLocation,
};

use super::{ArgValue, ProcessorClass};

/// A processor built by the factory.
///
/// Normally [`Intercepted`](Self::Intercepted). A type that cannot be
/// intercepted comes back as [`Real`](Self::Real): it behaves like the plain
/// component, and its calls are neither mocked nor recorded.
pub enum Instance<E: Event> {
    Intercepted(Interceptable<E>),
    Real(Box<dyn Processor<E>>),
}

impl<E: Event> Instance<E> {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Instance::Intercepted(_))
    }

    pub fn as_interceptable(&self) -> Option<&Interceptable<E>> {
        match self {
            Instance::Intercepted(i) => Some(i),
            Instance::Real(_) => None,
        }
    }

    fn inner(&self) -> &dyn Processor<E> {
        match self {
            Instance::Intercepted(i) => i,
            Instance::Real(p) => p.as_ref(),
        }
    }
}

impl<E: Event> Processor<E> for Instance<E> {
    fn process(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        self.inner().process(envelope)
    }

    fn process_next(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        self.inner().process_next(envelope)
    }

    fn initialise(&self) -> Result {
        self.inner().initialise()
    }

    fn dispose(&self) {
        self.inner().dispose()
    }
}

impl<E: Event> fmt::Debug for Instance<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Intercepted(i) => f.debug_tuple("Intercepted").field(i).finish(),
            Instance::Real(_) => f.write_str("Real(..)"),
        }
    }
}

/// Table of processor types, keyed by type name.
pub struct ProxyFactory<E> {
    classes: RwLock<HashMap<Arc<str>, Arc<ProcessorClass<E>>>>,
}

impl<E: Event> ProxyFactory<E> {
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a processor type, replacing any previous one of the same name.
    pub fn register(&self, class: ProcessorClass<E>) {
        let name: Arc<str> = Arc::from(class.name());
        tracing::debug!(
            processor_type = %name,
            constructors = class.constructors().len(),
            "processor type registered"
        );
        self.classes.write().insert(name, Arc::new(class));
    }

    pub fn class(&self, type_name: &str) -> Option<Arc<ProcessorClass<E>>> {
        self.classes.read().get(type_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Build an instance of `type_name` wired to `context`.
    ///
    /// Constructor resolution failures are fatal whether or not the type can
    /// be intercepted. Errors raised by the constructor itself propagate.
    pub(crate) fn create(
        &self,
        context: &Arc<MockContext<E>>,
        type_name: &str,
        id: ComponentId,
        attributes: BTreeMap<String, String>,
        source: SourceLocation,
        args: &[ArgValue],
    ) -> Result<Instance<E>> {
        let class = self
            .class(type_name)
            .ok_or_else(|| Error::UnknownProcessorType(type_name.to_string()))?;

        let constructor = class
            .resolve(args)
            .ok_or_else(|| Error::ConstructorResolution {
                type_name: type_name.to_string(),
                arg_types: args.iter().map(|a| a.type_name().to_string()).collect(),
            })?;

        if let Some(reason) = class.interception_blocked(args) {
            if !context.config().fallback_to_real() {
                return Err(Error::ProxyUnavailable {
                    type_name: type_name.to_string(),
                    reason,
                });
            }
            tracing::warn!(
                processor_type = %type_name,
                component = %id,
                reason = %reason,
                "Processor cannot be intercepted, using real instance"
            );
            context
                .monitors()
                .notify(|m| m.on_proxy_degraded(type_name, &id, &reason));
            return Ok(Instance::Real(constructor.build(args)?));
        }

        let real = constructor.build(args)?;
        tracing::trace!(processor_type = %type_name, component = %id, %source, "interceptable created");
        Ok(Instance::Intercepted(Interceptable::new(
            real,
            id,
            attributes,
            source,
            Arc::downgrade(context),
        )))
    }
}

impl<E: Event> Default for ProxyFactory<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ProxyFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("classes", &self.classes.read().len())
            .finish()
    }
}
