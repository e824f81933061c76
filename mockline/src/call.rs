use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{Attributes, ComponentId, EventId};

/// Where a component is declared in the pipeline definition.
///
/// Supplied by the host when it creates an interceptable processor and
/// copied into every [`Call`]; used to build [`call_trace`](crate::MockContext::call_trace).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    file: Arc<str>,
    line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    #[inline]
    pub fn file(&self) -> &str {
        &self.file
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One recorded invocation of an intercepted component.
///
/// Created by the interceptor, appended exactly once to the
/// [`CallLedger`](crate::CallLedger) and never mutated afterwards. The
/// `sequence` is assigned by the ledger on append, so it reflects ledger
/// order rather than the moment the invocation started.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Call {
    pub(crate) id: ComponentId,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) flow_name: Arc<str>,
    pub(crate) source: SourceLocation,
    pub(crate) event: Option<EventId>,
    pub(crate) sequence: u64,
}

impl Call {
    /// Describe an invocation of `id`.
    ///
    /// The sequence number is assigned when the call is appended to a
    /// [`CallLedger`](crate::CallLedger).
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use mockline::{Attributes, Call, CallLedger, ComponentId, SourceLocation};
    ///
    /// let ledger = CallLedger::new();
    /// let id = ComponentId::parse("jira:create-group")?;
    /// let call = Call::new(id.clone(), BTreeMap::new(), "main", SourceLocation::default());
    /// assert_eq!(ledger.append(call), 0);
    /// assert_eq!(ledger.count(&id, &Attributes::new()), 1);
    /// # Ok::<(), mockline::Error>(())
    /// ```
    pub fn new(
        id: ComponentId,
        attributes: BTreeMap<String, String>,
        flow_name: impl Into<Arc<str>>,
        source: SourceLocation,
    ) -> Self {
        Self {
            id,
            attributes,
            flow_name: flow_name.into(),
            source,
            event: None,
            sequence: 0,
        }
    }

    /// Link the call to the message that triggered it.
    pub fn with_event(mut self, event: EventId) -> Self {
        self.event = Some(event);
        self
    }

    /// Identity of the invoked component.
    #[inline]
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Attributes the component was declared with.
    #[inline]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Value of a single attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Flow that carried the invocation, or `""` when unknown.
    #[inline]
    pub fn flow_name(&self) -> &str {
        &self.flow_name
    }

    #[inline]
    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    /// Id of the envelope the component was invoked with, when known.
    #[inline]
    pub fn event_id(&self) -> Option<EventId> {
        self.event
    }

    /// Position in the ledger, starting at zero after each reset.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns true if this call is of `id` and satisfies `predicates`.
    #[inline]
    pub fn matches(&self, id: &ComponentId, predicates: &Attributes) -> bool {
        self.id == *id && predicates.matches(&self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeMatcher;

    fn make_call() -> Call {
        let mut attributes = BTreeMap::new();
        attributes.insert("groupName".to_string(), "admins".to_string());
        Call::new(
            ComponentId::parse("jira:create-group").unwrap(),
            attributes,
            "callingJira",
            SourceLocation::new("jira-flows.xml", 12),
        )
    }

    #[test]
    fn accessors_expose_recorded_fields() {
        let call = make_call();
        assert_eq!(call.id().to_string(), "jira:create-group");
        assert_eq!(call.attribute("groupName"), Some("admins"));
        assert_eq!(call.attribute("userName"), None);
        assert_eq!(call.flow_name(), "callingJira");
        assert_eq!(call.source().to_string(), "jira-flows.xml:12");
        assert_eq!(call.sequence(), 0);
    }

    #[test]
    fn with_event_links_the_message() {
        let event = EventId::new();
        assert_eq!(make_call().event_id(), None);
        assert_eq!(make_call().with_event(event).event_id(), Some(event));
    }

    #[test]
    fn matches_requires_same_id() {
        let call = make_call();
        let other = ComponentId::parse("jira:delete-group").unwrap();
        assert!(call.matches(call.id(), &Attributes::new()));
        assert!(!call.matches(&other, &Attributes::new()));
    }

    #[test]
    fn matches_applies_predicates() {
        let call = make_call();
        let id = call.id().clone();
        assert!(call.matches(&id, &Attributes::new().with("groupName", "admins")));
        assert!(!call.matches(&id, &Attributes::new().with("groupName", "users")));
        assert!(!call.matches(
            &id,
            &Attributes::new().with("userName", AttributeMatcher::any())
        ));
    }
}
