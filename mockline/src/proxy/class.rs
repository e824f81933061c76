use std::{fmt, sync::Arc};

use crate::{Event, Processor, Result};

use super::{ArgValue, ParamType};

type BuildFn<E> = Arc<dyn Fn(&[ArgValue]) -> Result<Box<dyn Processor<E>>> + Send + Sync>;
type GuardFn = Arc<dyn Fn(&[ArgValue]) -> std::result::Result<(), String> + Send + Sync>;

/// One declared way of building a processor.
pub struct Constructor<E> {
    params: Vec<ParamType>,
    build: BuildFn<E>,
}

impl<E: Event> Constructor<E> {
    pub fn new<F>(params: Vec<ParamType>, build: F) -> Self
    where
        F: Fn(&[ArgValue]) -> Result<Box<dyn Processor<E>>> + Send + Sync + 'static,
    {
        Self {
            params,
            build: Arc::new(build),
        }
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Returns true if the arity matches and every parameter accepts its argument.
    pub fn accepts(&self, args: &[ArgValue]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }

    pub(crate) fn build(&self, args: &[ArgValue]) -> Result<Box<dyn Processor<E>>> {
        (self.build)(args)
    }
}

impl<E> fmt::Debug for Constructor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

enum Interception {
    Allowed,
    Sealed(String),
    Guarded(GuardFn),
}

/// A processor type the factory knows how to build.
///
/// Constructors are tried in declaration order; the first whose parameters
/// accept the supplied arguments wins.
///
/// # Example
///
/// ```rust
/// use mockline::{Envelope, ParamType, Processor, ProcessorClass, Result};
///
/// struct Logger { level: i32 }
///
/// impl Processor<String> for Logger {
///     fn process(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
///         Ok(envelope)
///     }
/// }
///
/// let class = ProcessorClass::<String>::new("Logger")
///     .nullary(|| Logger { level: 0 })
///     .constructor(vec![ParamType::Int], |args| {
///         let level = args[0].as_int().unwrap_or_default();
///         Ok(Box::new(Logger { level }))
///     });
/// assert_eq!(class.name(), "Logger");
/// ```
pub struct ProcessorClass<E> {
    name: Arc<str>,
    constructors: Vec<Constructor<E>>,
    interception: Interception,
}

impl<E: Event> ProcessorClass<E> {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            constructors: Vec::new(),
            interception: Interception::Allowed,
        }
    }

    /// Declare a constructor with the given parameter types.
    pub fn constructor<F>(mut self, params: Vec<ParamType>, build: F) -> Self
    where
        F: Fn(&[ArgValue]) -> Result<Box<dyn Processor<E>>> + Send + Sync + 'static,
    {
        self.constructors.push(Constructor::new(params, build));
        self
    }

    /// Declare an infallible no-argument constructor.
    pub fn nullary<P, F>(self, build: F) -> Self
    where
        P: Processor<E>,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.constructor(Vec::new(), move |_| Ok(Box::new(build())))
    }

    /// Mark the type as impossible to intercept.
    pub fn sealed(mut self, reason: impl Into<String>) -> Self {
        self.interception = Interception::Sealed(reason.into());
        self
    }

    /// Decide per argument list whether the type can be intercepted.
    ///
    /// Returning `Err(reason)` degrades that instance to a real one.
    pub fn intercept_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&[ArgValue]) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.interception = Interception::Guarded(Arc::new(guard));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constructors(&self) -> &[Constructor<E>] {
        &self.constructors
    }

    /// The first declared constructor accepting `args`.
    pub fn resolve(&self, args: &[ArgValue]) -> Option<&Constructor<E>> {
        self.constructors.iter().find(|c| c.accepts(args))
    }

    /// Why this type cannot be intercepted with these arguments, if it can't.
    pub(crate) fn interception_blocked(&self, args: &[ArgValue]) -> Option<String> {
        match &self.interception {
            Interception::Allowed => None,
            Interception::Sealed(reason) => Some(reason.clone()),
            Interception::Guarded(guard) => guard(args).err(),
        }
    }
}

impl<E> fmt::Debug for ProcessorClass<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interception = match &self.interception {
            Interception::Allowed => "allowed",
            Interception::Sealed(_) => "sealed",
            Interception::Guarded(_) => "guarded",
        };
        f.debug_struct("ProcessorClass")
            .field("name", &self.name)
            .field("constructors", &self.constructors)
            .field("interception", &interception)
            .finish()
    }
}
