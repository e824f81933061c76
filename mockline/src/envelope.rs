use std::{fmt, hash, sync::Arc};

use crate::{EventId, Meta};

/// The unit passed into and out of every intercepted processor.
///
/// Pairs the user-defined message with [`Meta`] (id, timestamp, flow name).
/// Mocked outcomes keep the incoming metadata and only replace the message,
/// so downstream processors still see the same flow and id.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "E: serde::Serialize",
        deserialize = "E: serde::de::DeserializeOwned"
    ))
)]
pub struct Envelope<E> {
    meta: Meta,
    message: E,
}

impl<E> Envelope<E> {
    /// Create a new envelope outside of any named flow.
    pub fn new(message: E) -> Self {
        Self {
            meta: Meta::new(None),
            message,
        }
    }

    /// Tag the envelope with the flow it travels through.
    pub fn with_flow(mut self, flow: impl Into<Arc<str>>) -> Self {
        self.meta.set_flow(flow.into());
        self
    }

    /// Returns a reference to the message.
    #[inline]
    pub fn message(&self) -> &E {
        &self.message
    }

    /// Returns a mutable reference to the message.
    #[inline]
    pub fn message_mut(&mut self) -> &mut E {
        &mut self.message
    }

    /// Consume the envelope, returning the message.
    #[inline]
    pub fn into_message(self) -> E {
        self.message
    }

    /// Returns the envelope metadata.
    #[inline]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Shorthand for `self.meta().id()`.
    #[inline]
    pub fn id(&self) -> EventId {
        self.meta.id()
    }

    /// Shorthand for `self.meta().flow_name()`.
    #[inline]
    pub fn flow_name(&self) -> &str {
        self.meta.flow_name()
    }

    /// Replace the message, keeping the metadata.
    pub fn with_message(self, message: E) -> Self {
        Self {
            meta: self.meta,
            message,
        }
    }

    /// Transform the message, keeping the metadata.
    pub fn map(self, f: impl FnOnce(E) -> E) -> Self {
        Self {
            meta: self.meta,
            message: f(self.message),
        }
    }
}

impl<E: PartialEq> PartialEq for Envelope<E> {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id() == other.meta.id() && self.message == other.message
    }
}

impl<E: Eq> Eq for Envelope<E> {}

impl<E: hash::Hash> hash::Hash for Envelope<E> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.meta.id().hash(state);
        self.message.hash(state);
    }
}

impl<E: fmt::Debug> fmt::Debug for Envelope<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.meta.id())
            .field("flow", &self.meta.flow_name())
            .field("message", &self.message)
            .field("timestamp", &self.meta.timestamp())
            .finish()
    }
}

impl<E: fmt::Display> fmt::Display for Envelope<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Envelope {{ id: {}, flow: {}, message: {} }}",
            self.meta.id(),
            self.meta.flow_name(),
            self.message
        )
    }
}
