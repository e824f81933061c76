use std::fmt;

use uuid::Uuid;

/// Identity of one message travelling through a pipeline.
///
/// Every [`Envelope`](crate::Envelope) gets a fresh id when created, and
/// mocked outcomes keep it. The interceptor stores it on each recorded
/// [`Call`](crate::Call), so calls made while handling the same message can
/// be found with [`CallQuery::for_event`](crate::CallQuery::for_event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct EventId(Uuid);

impl EventId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, enough to tell messages apart in logs.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn short_form_prefixes_display() {
        let id = EventId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.to_string().starts_with(&id.short()));
    }
}
