use std::{fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{Attributes, Call, CallQuery, ComponentId};

/// Append-only, insertion-ordered record of every intercepted invocation.
///
/// The ledger is the only structure besides the
/// [`PipelineSync`](crate::PipelineSync) counter that pipeline threads
/// mutate. Appends take a short write lock and assign the call's
/// `sequence` while holding it, so sequence order and ledger order are the
/// same. Queries copy matching `Arc<Call>` handles out under a read lock
/// and never block each other.
///
/// Entries are never removed except by [`reset`](Self::reset) between tests.
pub struct CallLedger {
    calls: RwLock<Vec<Arc<Call>>>,
}

impl CallLedger {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            calls: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    /// Record a call, returning the sequence number it was assigned.
    pub fn append(&self, call: Call) -> u64 {
        self.record(call).sequence()
    }

    pub(crate) fn record(&self, mut call: Call) -> Arc<Call> {
        let mut calls = self.calls.write();
        call.sequence = calls.len() as u64;
        let call = Arc::new(call);
        calls.push(call.clone());
        call
    }

    /// Calls of `id` whose attributes satisfy `predicates`, in sequence order.
    ///
    /// The result includes at least every append completed before this call.
    pub fn query(&self, id: &ComponentId, predicates: &Attributes) -> CallQuery {
        let matching: Vec<Arc<Call>> = self
            .calls
            .read()
            .iter()
            .filter(|c| c.matches(id, predicates))
            .cloned()
            .collect();
        CallQuery::new(Arc::new(matching))
    }

    /// Number of calls matching `id` and `predicates`.
    pub fn count(&self, id: &ComponentId, predicates: &Attributes) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| c.matches(id, predicates))
            .count()
    }

    /// A query over every recorded call.
    pub fn snapshot(&self) -> CallQuery {
        CallQuery::new(Arc::new(self.calls.read().clone()))
    }

    pub fn len(&self) -> usize {
        self.calls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.read().is_empty()
    }

    /// Remove every call. Sequence numbering restarts at zero.
    pub fn reset(&self) {
        self.calls.write().clear();
    }

    /// Serialize the recorded calls as a JSON array, in sequence order.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> crate::Result<String> {
        let calls = self.calls.read();
        let calls: Vec<&Call> = calls.iter().map(Arc::as_ref).collect();
        serde_json::to_string(&calls).map_err(crate::Error::internal)
    }
}

impl Default for CallLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallLedger")
            .field("calls", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, thread};

    use super::*;
    use crate::SourceLocation;

    fn call(full_name: &str, attrs: &[(&str, &str)]) -> Call {
        let attributes: BTreeMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Call::new(
            ComponentId::parse(full_name).unwrap(),
            attributes,
            "flow",
            SourceLocation::default(),
        )
    }

    #[test]
    fn append_assigns_increasing_sequence() {
        let ledger = CallLedger::new();
        assert_eq!(ledger.append(call("a", &[])), 0);
        assert_eq!(ledger.append(call("b", &[])), 1);
        assert_eq!(ledger.append(call("a", &[])), 2);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn query_filters_by_id_and_predicates() {
        let ledger = CallLedger::new();
        ledger.append(call("jira:create-group", &[("groupName", "x")]));
        ledger.append(call("jira:create-group", &[("groupName", "y")]));
        ledger.append(call("logger", &[]));

        let id = ComponentId::parse("jira:create-group").unwrap();
        assert_eq!(ledger.query(&id, &Attributes::new()).count(), 2);
        assert_eq!(
            ledger
                .query(&id, &Attributes::new().with("groupName", "y"))
                .first()
                .unwrap()
                .sequence(),
            1
        );
        assert_eq!(ledger.count(&id, &Attributes::new().with("groupName", "z")), 0);
    }

    #[test]
    fn query_is_a_snapshot() {
        let ledger = CallLedger::new();
        ledger.append(call("a", &[]));
        let id = ComponentId::parse("a").unwrap();
        let query = ledger.query(&id, &Attributes::new());

        ledger.append(call("a", &[]));
        ledger.reset();

        assert_eq!(query.count(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn reset_restarts_sequence() {
        let ledger = CallLedger::new();
        ledger.append(call("a", &[]));
        ledger.append(call("a", &[]));
        ledger.reset();
        assert_eq!(ledger.append(call("a", &[])), 0);
    }

    #[test]
    fn concurrent_appends_are_all_recorded_in_order() {
        let ledger = Arc::new(CallLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        ledger.append(call("worker", &[]));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.count(), 800);
        let sequences: Vec<u64> = snapshot.iter().map(Call::sequence).collect();
        assert!(sequences.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn to_json_lists_calls() {
        let ledger = CallLedger::new();
        ledger.append(call("jira:create-group", &[("groupName", "x")]));
        let json = ledger.to_json().unwrap();
        assert!(json.contains("create-group"));
        assert!(json.contains("groupName"));
    }
}
