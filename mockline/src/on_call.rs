use std::{fmt, sync::Arc};

use crate::{
    AttributeMatcher, Attributes, Behavior, ComponentId, Error, Event, MockContext, Outcome,
    Result, SpyAction, SpyHook, SpyPhase,
};

/// Builder for registering a behavior or spies on a component.
///
/// Returned by [`MockContext::on_call`] and [`MockContext::spy`]. Narrow the
/// target with [`of_namespace`](Self::of_namespace) and
/// [`with_attributes`](Self::with_attributes), then finish with one of the
/// `then_*` methods to register a behavior, or attach spies with
/// [`before`](Self::before) / [`after`](Self::after).
///
/// The component name is validated when something is registered; an empty
/// name or namespace fails with [`Error::InvalidComponentId`].
///
/// # Examples
///
/// ```rust,ignore
/// // Mock a connector call
/// ctx.on_call("create-group")
///     .of_namespace("jira")
///     .with_attributes(Attributes::new().with("groupName", "someGroupName"))
///     .then_return(Message::text("created"))?;
///
/// // Spy on it
/// ctx.spy("jira:create-group")
///     .before([spy_action(|e| check_request(e))])?
///     .after([spy_action(|e| check_response(e))])?;
/// ```
pub struct OnCall<'a, E: Event> {
    context: &'a MockContext<E>,
    name: String,
    namespace: Option<String>,
    predicates: Attributes,
}

impl<'a, E: Event> OnCall<'a, E> {
    pub(crate) fn new(context: &'a MockContext<E>, name: &str) -> Self {
        Self {
            context,
            name: name.to_string(),
            namespace: None,
            predicates: Attributes::new(),
        }
    }

    /// Target the component in `namespace` instead of the one in the name.
    pub fn of_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Only apply to calls whose attributes satisfy `predicates`.
    ///
    /// Predicates accumulate across calls; a later predicate on the same
    /// attribute replaces the earlier one.
    pub fn with_attributes(mut self, predicates: Attributes) -> Self {
        for (name, matcher) in predicates.iter() {
            self.predicates.insert(name.clone(), matcher.clone());
        }
        self
    }

    /// Only apply to calls whose attribute `name` satisfies `matcher`.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        matcher: impl Into<AttributeMatcher>,
    ) -> Self {
        self.predicates.insert(name, matcher);
        self
    }

    fn component_id(&self) -> Result<ComponentId> {
        resolve_id(&self.name, self.namespace.as_deref())
    }

    fn register(self, outcome: Outcome<E>) -> Result {
        let id = self.component_id()?;
        tracing::debug!(
            component = %id,
            predicates = %self.predicates,
            outcome = outcome.kind(),
            "behavior registered"
        );
        self.context
            .register_behavior(Behavior::new(id, self.predicates, outcome));
        Ok(())
    }

    /// Replace the message produced by matching calls with `message`.
    pub fn then_return(self, message: E) -> Result {
        self.register(Outcome::Return(message))
    }

    /// Pass the incoming message through unchanged, without running the
    /// real processor.
    pub fn then_return_same_input(self) -> Result {
        self.register(Outcome::same_input())
    }

    /// Compute the produced message from the incoming one.
    pub fn then_apply<F>(self, f: F) -> Result
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        self.register(Outcome::Transform(Arc::new(f)))
    }

    /// Fail matching calls with `error`.
    pub fn then_throw(self, error: Error) -> Result {
        self.register(Outcome::Throw(error))
    }

    fn spy(self, phase: SpyPhase, actions: Vec<SpyAction<E>>) -> Result<Self> {
        let id = self.component_id()?;
        tracing::debug!(
            component = %id,
            predicates = %self.predicates,
            phase = %phase,
            actions = actions.len(),
            "spy registered"
        );
        self.context.register_spy(SpyHook::new(
            id,
            self.predicates.clone(),
            phase,
            actions,
        ));
        Ok(self)
    }

    /// Run `actions`, in order, with the input of every matching call.
    pub fn before(self, actions: impl IntoIterator<Item = SpyAction<E>>) -> Result<Self> {
        self.spy(SpyPhase::Before, actions.into_iter().collect())
    }

    /// Run `actions`, in order, with the output of every matching call.
    pub fn after(self, actions: impl IntoIterator<Item = SpyAction<E>>) -> Result<Self> {
        self.spy(SpyPhase::After, actions.into_iter().collect())
    }
}

impl<E: Event> fmt::Debug for OnCall<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnCall")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("predicates", &self.predicates)
            .finish_non_exhaustive()
    }
}

pub(crate) fn resolve_id(name: &str, namespace: Option<&str>) -> Result<ComponentId> {
    match namespace {
        Some(namespace) => ComponentId::new(namespace, name),
        None => ComponentId::parse(name),
    }
}
