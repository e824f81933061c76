use crate::{Envelope, Event, Result};

/// Core trait implemented by pipeline components that can be intercepted.
///
/// A processor takes one input envelope and produces one output envelope,
/// or fails. That is the only invocation shape the interceptor understands.
///
/// # Core Methods
///
/// - [`process`](Self::process)  - Handle an incoming envelope (intercepted)
/// - [`process_next`](Self::process_next)  - Continue the chain after this
///   component; called by the interceptor on a mocked outcome
///
/// # Lifecycle Hooks
///
/// - [`initialise`](Self::initialise)  - Called once by the host before use
/// - [`dispose`](Self::dispose)  - Called once by the host on shutdown
///
/// Lifecycle hooks are never intercepted: an
/// [`Interceptable`](crate::Interceptable) forwards them straight to the
/// wrapped instance.
///
/// # Example
///
/// ```rust
/// use mockline::{Envelope, Processor, Result};
///
/// struct Upper;
///
/// impl Processor<String> for Upper {
///     fn process(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
///         Ok(envelope.map(|m| m.to_uppercase()))
///     }
/// }
/// ```
pub trait Processor<E: Event>: Send + Sync + 'static {
    /// Handle a single envelope and return the result.
    ///
    /// Errors propagate to the caller unchanged, whether or not the
    /// processor is intercepted.
    fn process(&self, envelope: Envelope<E>) -> Result<Envelope<E>>;

    /// Run whatever this component chains to after producing `envelope`.
    ///
    /// Components that wrap a nested chain (routers, scopes) override this
    /// so a mocked outcome still flows through the nested part. The default
    /// is the identity.
    fn process_next(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        Ok(envelope)
    }

    /// Lifecycle hook called before the first invocation.
    fn initialise(&self) -> Result {
        Ok(())
    }

    /// Lifecycle hook called when the host shuts the component down.
    fn dispose(&self) {}
}

impl<E: Event, P: Processor<E> + ?Sized> Processor<E> for Box<P> {
    fn process(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        (**self).process(envelope)
    }

    fn process_next(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        (**self).process_next(envelope)
    }

    fn initialise(&self) -> Result {
        (**self).initialise()
    }

    fn dispose(&self) {
        (**self).dispose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Processor<String> for Echo {
        fn process(&self, envelope: Envelope<String>) -> Result<Envelope<String>> {
            Ok(envelope)
        }
    }

    #[test]
    fn default_hooks_are_no_ops() {
        let p = Echo;
        assert!(p.initialise().is_ok());
        p.dispose();
        let out = p.process_next(Envelope::new("x".to_string())).unwrap();
        assert_eq!(out.message(), "x");
    }

    #[test]
    fn boxed_processor_delegates() {
        let p: Box<dyn Processor<String>> = Box::new(Echo);
        let out = p.process(Envelope::new("hello".to_string())).unwrap();
        assert_eq!(out.message(), "hello");
    }
}
