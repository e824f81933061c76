use std::{fmt, sync::Arc};

use crate::{Attributes, ComponentId, Envelope, Error, Event, Result, registry::Registration};

type TransformFn<E> = Arc<dyn Fn(E) -> E + Send + Sync>;

/// What a mocked call produces instead of running the real processor.
#[derive(Clone)]
pub enum Outcome<E> {
    /// Replace the message with a fixed value.
    Return(E),
    /// Compute the message from the incoming one.
    Transform(TransformFn<E>),
    /// Fail the call with this error, returned verbatim.
    Throw(Error),
}

impl<E: Event> Outcome<E> {
    /// Outcome that returns the incoming message unchanged.
    pub fn same_input() -> Self {
        Outcome::Transform(Arc::new(|message| message))
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        Outcome::Transform(Arc::new(f))
    }

    /// Build the outcome envelope. Metadata of the input is kept.
    pub(crate) fn apply(&self, envelope: Envelope<E>) -> Result<Envelope<E>> {
        match self {
            Outcome::Return(message) => Ok(envelope.with_message(message.clone())),
            Outcome::Transform(f) => Ok(envelope.map(|message| f(message))),
            Outcome::Throw(error) => Err(error.clone()),
        }
    }

    pub fn is_throw(&self) -> bool {
        matches!(self, Outcome::Throw(_))
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Outcome::Return(_) => "return",
            Outcome::Transform(_) => "transform",
            Outcome::Throw(_) => "throw",
        }
    }
}

impl<E> fmt::Debug for Outcome<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Return(_) => f.write_str("Return(..)"),
            Outcome::Transform(_) => f.write_str("Transform(..)"),
            Outcome::Throw(e) => f.debug_tuple("Throw").field(e).finish(),
        }
    }
}

/// A registered mock: when a call of `id` matches `predicates`, produce
/// `outcome` instead of running the real processor.
#[derive(Debug, Clone)]
pub struct Behavior<E> {
    id: ComponentId,
    predicates: Attributes,
    outcome: Outcome<E>,
}

impl<E: Event> Behavior<E> {
    pub fn new(id: ComponentId, predicates: Attributes, outcome: Outcome<E>) -> Self {
        Self {
            id,
            predicates,
            outcome,
        }
    }

    #[inline]
    pub fn outcome(&self) -> &Outcome<E> {
        &self.outcome
    }
}

impl<E> Registration for Behavior<E> {
    fn id(&self) -> &ComponentId {
        &self.id
    }

    fn predicates(&self) -> &Attributes {
        &self.predicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> Envelope<String> {
        Envelope::new("in".to_string()).with_flow("main")
    }

    #[test]
    fn return_replaces_message_and_keeps_meta() {
        let envelope = input();
        let id = envelope.id();
        let out = Outcome::Return("mocked".to_string()).apply(envelope).unwrap();
        assert_eq!(out.message(), "mocked");
        assert_eq!(out.id(), id);
        assert_eq!(out.flow_name(), "main");
    }

    #[test]
    fn transform_sees_the_input() {
        let out = Outcome::transform(|m: String| format!("{m}!"))
            .apply(input())
            .unwrap();
        assert_eq!(out.message(), "in!");
    }

    #[test]
    fn same_input_is_identity() {
        let out = Outcome::same_input().apply(input()).unwrap();
        assert_eq!(out.message(), "in");
    }

    #[test]
    fn throw_returns_the_configured_error() {
        let error = Error::external(std::io::Error::other("jira down"));
        let outcome: Outcome<String> = Outcome::Throw(error.clone());
        assert!(outcome.is_throw());
        assert_eq!(outcome.apply(input()).unwrap_err(), error);
    }
}
