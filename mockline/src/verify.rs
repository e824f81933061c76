use std::{fmt, time::Duration};

use crate::{
    AttributeMatcher, Attributes, Cardinality, ComponentId, Error, Event, MockContext, Result,
    VerificationFailure, on_call::resolve_id,
};

/// A cardinality check on recorded calls of one component.
///
/// Created by [`MockContext::verify_call`]. Every terminal method first
/// waits for in-flight pipeline executions to finish, then counts matching
/// calls in the ledger. If pipelines are still running when the timeout
/// expires, it returns [`Error::PipelineInFlight`] rather than counting a
/// partial ledger. If the count does not satisfy the constraint, it returns
/// [`Error::Verification`].
///
/// The timeout defaults to [`MockConfig::settle_timeout`](crate::MockConfig::settle_timeout).
///
/// # Example
///
/// ```ignore
/// ctx.verify_call("create-group")
///     .of_namespace("jira")
///     .with_attributes(Attributes::new().with("groupName", "someGroupName"))
///     .times(1)?;
///
/// // From async test code, without blocking the runtime thread
/// ctx.verify_call("jira:create-group")
///     .within(Duration::from_secs(1))
///     .eventually(Cardinality::AtLeast(3))
///     .await?;
/// ```
pub struct VerifyCall<'a, E: Event> {
    context: &'a MockContext<E>,
    name: String,
    namespace: Option<String>,
    predicates: Attributes,
    timeout: Duration,
}

impl<'a, E: Event> VerifyCall<'a, E> {
    pub(crate) fn new(context: &'a MockContext<E>, name: &str) -> Self {
        Self {
            context,
            name: name.to_string(),
            namespace: None,
            predicates: Attributes::new(),
            timeout: context.config().settle_timeout(),
        }
    }

    pub fn of_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Only count calls whose attributes satisfy `predicates`.
    pub fn with_attributes(mut self, predicates: Attributes) -> Self {
        for (name, matcher) in predicates.iter() {
            self.predicates.insert(name.clone(), matcher.clone());
        }
        self
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        matcher: impl Into<AttributeMatcher>,
    ) -> Self {
        self.predicates.insert(name, matcher);
        self
    }

    /// Override how long to wait for in-flight pipelines.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Called exactly `n` times.
    pub fn times(self, n: usize) -> Result {
        self.expect(Cardinality::Exactly(n))
    }

    /// Called at least `n` times.
    pub fn at_least(self, n: usize) -> Result {
        self.expect(Cardinality::AtLeast(n))
    }

    /// Called at most `n` times.
    pub fn at_most(self, n: usize) -> Result {
        self.expect(Cardinality::AtMost(n))
    }

    pub fn at_least_once(self) -> Result {
        self.at_least(1)
    }

    pub fn never(self) -> Result {
        self.times(0)
    }

    /// Block until quiescent, then check `cardinality`.
    pub fn expect(self, cardinality: Cardinality) -> Result {
        let id = resolve_id(&self.name, self.namespace.as_deref())?;
        let pipeline = self.context.pipeline();
        if !pipeline.wait_quiescent(self.timeout) {
            return Err(self.in_flight());
        }
        self.check(id, cardinality)
    }

    /// Wait asynchronously until quiescent, then check `cardinality`.
    ///
    /// Use this from async tests whose pipelines run on the same runtime.
    pub async fn eventually(self, cardinality: Cardinality) -> Result {
        let id = resolve_id(&self.name, self.namespace.as_deref())?;
        let pipeline = self.context.pipeline();
        if !pipeline.quiescent(self.timeout).await {
            return Err(self.in_flight());
        }
        self.check(id, cardinality)
    }

    fn in_flight(&self) -> Error {
        Error::PipelineInFlight {
            waited: self.timeout,
            in_flight: self.context.pipeline().in_flight(),
        }
    }

    fn check(self, id: ComponentId, cardinality: Cardinality) -> Result {
        let actual = self.context.ledger().count(&id, &self.predicates);
        if cardinality.is_satisfied_by(actual) {
            tracing::debug!(component = %id, expected = %cardinality, actual, "verification passed");
            return Ok(());
        }
        tracing::debug!(component = %id, expected = %cardinality, actual, "verification failed");
        Err(VerificationFailure {
            id,
            predicates: self.predicates.describe(),
            expected: cardinality,
            actual,
        }
        .into())
    }
}

impl<E: Event> fmt::Debug for VerifyCall<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyCall")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("predicates", &self.predicates)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
