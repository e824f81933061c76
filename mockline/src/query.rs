use std::{collections::HashSet, fmt, rc::Rc, sync::Arc};

use crate::{Attributes, Call, ComponentId, EventId};

pub(crate) type CallRecords = Arc<Vec<Arc<Call>>>;

type Filter = Rc<dyn Fn(&Call) -> bool>;

/// A composable query over a snapshot of recorded calls.
///
/// Obtained from [`MockContext::calls`](crate::MockContext::calls) or
/// [`CallLedger::query`](crate::CallLedger::query). The snapshot is taken
/// when the query is created: it holds at least every call appended before
/// that moment, in sequence order, and never observes later appends or a
/// subsequent reset.
///
/// # Example
///
/// ```ignore
/// let jira_calls = ctx.calls()
///     .for_component(&create_group)
///     .in_flow("callingJira")
///     .count();
/// ```
///
/// Query types use `Rc` internally and are `!Send`; they belong to the
/// single control-flow context that runs test assertions.
#[derive(Clone)]
pub struct CallQuery {
    calls: CallRecords,
    filters: Vec<Filter>,
}

impl fmt::Debug for CallQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallQuery")
            .field("records", &self.calls.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl CallQuery {
    pub(crate) fn new(calls: CallRecords) -> Self {
        Self {
            calls,
            filters: Vec::new(),
        }
    }

    fn add_filter<F>(&mut self, filter: F)
    where
        F: Fn(&Call) -> bool + 'static,
    {
        self.filters.push(Rc::new(filter));
    }

    fn apply_filters(&self) -> impl Iterator<Item = &Arc<Call>> {
        self.calls
            .iter()
            .filter(|c| self.filters.iter().all(|f| f(c)))
    }

    // ==================== Terminal Operations ====================

    /// Returns the number of calls matching all filters.
    pub fn count(&self) -> usize {
        self.apply_filters().count()
    }

    /// Returns true if no calls match the filters.
    pub fn is_empty(&self) -> bool {
        self.apply_filters().next().is_none()
    }

    /// Returns true if any call matches the filters.
    pub fn exists(&self) -> bool {
        !self.is_empty()
    }

    /// Returns the earliest matching call, if any.
    pub fn first(&self) -> Option<Arc<Call>> {
        self.apply_filters().next().cloned()
    }

    /// Returns the latest matching call, if any.
    pub fn last(&self) -> Option<Arc<Call>> {
        self.apply_filters().last().cloned()
    }

    /// Returns the nth matching call (0-indexed), if any.
    pub fn nth(&self, index: usize) -> Option<Arc<Call>> {
        self.apply_filters().nth(index).cloned()
    }

    /// Collects matching calls in sequence order.
    pub fn collect(&self) -> Vec<Arc<Call>> {
        self.apply_filters().cloned().collect()
    }

    /// Iterates lazily over matching calls in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Call> {
        self.apply_filters().map(Arc::as_ref)
    }

    /// Returns the distinct flow names of matching calls, in first-seen order.
    pub fn flows(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.apply_filters()
            .filter(|c| seen.insert(c.flow_name()))
            .map(|c| c.flow_name().to_string())
            .collect()
    }

    /// Returns the distinct components of matching calls, in first-seen order.
    pub fn components(&self) -> Vec<ComponentId> {
        let mut seen = HashSet::new();
        self.apply_filters()
            .filter(|c| seen.insert(c.id()))
            .map(|c| c.id().clone())
            .collect()
    }

    /// Returns true if all matching calls satisfy the predicate.
    pub fn all(&self, predicate: impl Fn(&Call) -> bool) -> bool {
        self.apply_filters().all(|c| predicate(c))
    }

    /// Returns true if any matching call satisfies the predicate.
    pub fn any(&self, predicate: impl Fn(&Call) -> bool) -> bool {
        self.apply_filters().any(|c| predicate(c))
    }

    // ==================== Filter Operations ====================

    /// Filter to calls of the given component.
    pub fn for_component(mut self, id: &ComponentId) -> Self {
        let id = id.clone();
        self.add_filter(move |c| *c.id() == id);
        self
    }

    /// Filter to calls whose attributes satisfy the predicate set.
    pub fn with_attributes(mut self, predicates: Attributes) -> Self {
        self.add_filter(move |c| predicates.matches(c.attributes()));
        self
    }

    /// Filter to calls made while processing the given flow.
    pub fn in_flow(mut self, flow: &str) -> Self {
        let flow = flow.to_string();
        self.add_filter(move |c| c.flow_name() == flow);
        self
    }

    /// Filter to calls made while handling the given message.
    pub fn for_event(mut self, event: EventId) -> Self {
        self.add_filter(move |c| c.event_id() == Some(event));
        self
    }

    /// Filter to calls of components declared in the given file.
    pub fn from_file(mut self, file: &str) -> Self {
        let file = file.to_string();
        self.add_filter(move |c| c.source().file() == file);
        self
    }

    /// Filter to calls recorded after the given one.
    pub fn after(mut self, call: &Call) -> Self {
        let sequence = call.sequence();
        self.add_filter(move |c| c.sequence() > sequence);
        self
    }

    /// Filter to calls recorded before the given one.
    pub fn before(mut self, call: &Call) -> Self {
        let sequence = call.sequence();
        self.add_filter(move |c| c.sequence() < sequence);
        self
    }

    /// Filter using a custom predicate.
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Call) -> bool + 'static,
    {
        self.add_filter(predicate);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::SourceLocation;

    fn make_call(full_name: &str, flow: &str, sequence: u64, attrs: &[(&str, &str)]) -> Arc<Call> {
        let attributes: BTreeMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut call = Call::new(
            ComponentId::parse(full_name).unwrap(),
            attributes,
            flow,
            SourceLocation::new("flows.xml", sequence as u32 + 1),
        );
        call.sequence = sequence;
        Arc::new(call)
    }

    fn sample_records() -> CallRecords {
        Arc::new(vec![
            make_call("jira:create-group", "callingJira", 0, &[("groupName", "a")]),
            make_call("logger", "callingJira", 1, &[]),
            make_call("jira:create-group", "main", 2, &[("groupName", "b")]),
            make_call("jira:create-group", "main", 3, &[("groupName", "a")]),
        ])
    }

    fn create_group() -> ComponentId {
        ComponentId::parse("jira:create-group").unwrap()
    }

    #[test]
    fn count_returns_total_calls() {
        let query = CallQuery::new(sample_records());
        assert_eq!(query.count(), 4);
    }

    #[test]
    fn is_empty_for_empty_records() {
        let query = CallQuery::new(Arc::new(vec![]));
        assert!(query.is_empty());
        assert!(!query.exists());
    }

    #[test]
    fn for_component_filters_by_identity() {
        let query = CallQuery::new(sample_records()).for_component(&create_group());
        assert_eq!(query.count(), 3);
    }

    #[test]
    fn with_attributes_uses_subset_match() {
        let query = CallQuery::new(sample_records())
            .for_component(&create_group())
            .with_attributes(Attributes::new().with("groupName", "a"));
        assert_eq!(query.count(), 2);
    }

    #[test]
    fn first_and_last_follow_sequence_order() {
        let query = CallQuery::new(sample_records()).for_component(&create_group());
        assert_eq!(query.first().unwrap().sequence(), 0);
        assert_eq!(query.last().unwrap().sequence(), 3);
        assert_eq!(query.nth(1).unwrap().sequence(), 2);
        assert!(query.nth(3).is_none());
    }

    #[test]
    fn in_flow_filters_by_flow_name() {
        let query = CallQuery::new(sample_records()).in_flow("callingJira");
        assert_eq!(query.count(), 2);
    }

    #[test]
    fn flows_are_distinct_in_first_seen_order() {
        let query = CallQuery::new(sample_records());
        assert_eq!(query.flows(), vec!["callingJira", "main"]);
    }

    #[test]
    fn components_are_distinct() {
        let query = CallQuery::new(sample_records());
        let components = query.components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], create_group());
    }

    #[test]
    fn after_and_before_use_sequence() {
        let records = sample_records();
        let pivot = records[1].clone();
        assert_eq!(CallQuery::new(records.clone()).after(&pivot).count(), 2);
        assert_eq!(CallQuery::new(records).before(&pivot).count(), 1);
    }

    #[test]
    fn for_event_keeps_calls_of_one_message() {
        let event = crate::EventId::new();
        let tagged = |call: Arc<Call>| Arc::new(Call::clone(&call).with_event(event));
        let records = Arc::new(vec![
            tagged(make_call("logger", "main", 0, &[])),
            make_call("logger", "main", 1, &[]),
            tagged(make_call("jira:create-group", "main", 2, &[("groupName", "a")])),
        ]);
        let query = CallQuery::new(records).for_event(event);
        assert_eq!(query.count(), 2);
        assert!(query.all(|c| c.event_id() == Some(event)));
    }

    #[test]
    fn from_file_and_matching_compose() {
        let query = CallQuery::new(sample_records())
            .from_file("flows.xml")
            .matching(|c| c.source().line() > 2);
        assert_eq!(query.count(), 2);
        assert!(query.all(|c| c.flow_name() == "main"));
        assert!(query.any(|c| c.attribute("groupName") == Some("b")));
    }
}
