//! Attribute predicates used to tell apart calls of the same component.

use std::{
    borrow::Cow,
    collections::{BTreeMap, btree_map},
    fmt,
    sync::Arc,
};

type MatchFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Matches the value of a single call attribute.
///
/// A matcher can check:
/// - Equality with an expected value
/// - Membership in a set of values
/// - Any value at all (the attribute only has to be present)
/// - A custom predicate
///
/// # Example
///
/// ```rust
/// use mockline::AttributeMatcher;
///
/// let exact = AttributeMatcher::equals("someGroupName");
/// let any = AttributeMatcher::any();
/// let prefixed = AttributeMatcher::by_predicate(|v| v.starts_with("group-"));
///
/// assert!(exact.matches("someGroupName"));
/// assert!(any.matches("whatever"));
/// assert!(!prefixed.matches("user-1"));
/// ```
#[derive(Clone)]
pub struct AttributeMatcher {
    matcher: MatchFn,
    description: Cow<'static, str>,
}

impl fmt::Debug for AttributeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMatcher")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl AttributeMatcher {
    /// Match an attribute whose value equals `expected`.
    pub fn equals(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let description = Cow::Owned(format!("== {expected:?}"));
        Self {
            matcher: Arc::new(move |value| value == expected),
            description,
        }
    }

    /// Match any value, as long as the attribute is present on the call.
    pub fn any() -> Self {
        Self {
            matcher: Arc::new(|_| true),
            description: Cow::Borrowed("any"),
        }
    }

    /// Match a value equal to one of `values`.
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let description = Cow::Owned(format!("in {values:?}"));
        Self {
            matcher: Arc::new(move |value| values.iter().any(|v| v == value)),
            description,
        }
    }

    /// Match using a custom predicate on the attribute value.
    pub fn by_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            matcher: Arc::new(predicate),
            description: Cow::Borrowed("predicate"),
        }
    }

    /// Returns true if `value` satisfies this matcher.
    pub fn matches(&self, value: &str) -> bool {
        (self.matcher)(value)
    }

    /// Short human-readable form used in failure messages.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl From<&str> for AttributeMatcher {
    fn from(value: &str) -> Self {
        AttributeMatcher::equals(value)
    }
}

impl From<String> for AttributeMatcher {
    fn from(value: String) -> Self {
        AttributeMatcher::equals(value)
    }
}

/// A predicate set: attribute name to expected-value matcher.
///
/// Order is irrelevant. Adding a second matcher under the same name replaces
/// the first. An empty set matches every call of the component.
///
/// Matching is a subset match: every predicate must hold against the call's
/// attributes, and attributes the set does not mention are ignored. A
/// predicate on an attribute the call does not carry never holds.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use mockline::{AttributeMatcher, Attributes};
///
/// let predicates = Attributes::new()
///     .with("groupName", "someGroupName")
///     .with("userName", AttributeMatcher::any());
///
/// let mut call = BTreeMap::new();
/// call.insert("groupName".to_string(), "someGroupName".to_string());
/// call.insert("userName".to_string(), "alice".to_string());
/// call.insert("description".to_string(), "ignored".to_string());
/// assert!(predicates.matches(&call));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    predicates: BTreeMap<String, AttributeMatcher>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate on the attribute `name`.
    pub fn with(mut self, name: impl Into<String>, matcher: impl Into<AttributeMatcher>) -> Self {
        self.insert(name, matcher);
        self
    }

    /// Add a predicate on the attribute `name` in place.
    pub fn insert(&mut self, name: impl Into<String>, matcher: impl Into<AttributeMatcher>) {
        self.predicates.insert(name.into(), matcher.into());
    }

    /// Number of predicates; used to rank how specific a registration is.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Attribute names constrained by this set, in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.predicates.keys().cloned().collect()
    }

    /// Each predicate as `name description`, e.g. `groupName == "a"`.
    pub fn describe(&self) -> Vec<String> {
        self.predicates
            .iter()
            .map(|(name, matcher)| format!("{name} {}", matcher.description()))
            .collect()
    }

    /// Returns true if every predicate holds against `attributes`.
    pub fn matches(&self, attributes: &BTreeMap<String, String>) -> bool {
        self.predicates.iter().all(|(name, matcher)| {
            attributes
                .get(name)
                .is_some_and(|value| matcher.matches(value))
        })
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, AttributeMatcher> {
        self.predicates.iter()
    }
}

impl<K, M> FromIterator<(K, M)> for Attributes
where
    K: Into<String>,
    M: Into<AttributeMatcher>,
{
    fn from_iter<I: IntoIterator<Item = (K, M)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, matcher) in iter {
            attributes.insert(name, matcher);
        }
        attributes
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, matcher)) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} {}", matcher.description())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_attributes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn equals_matcher_matches_by_value() {
        let matcher = AttributeMatcher::equals("a");
        assert!(matcher.matches("a"));
        assert!(!matcher.matches("b"));
    }

    #[test]
    fn one_of_matches_any_listed_value() {
        let matcher = AttributeMatcher::one_of(["a", "b"]);
        assert!(matcher.matches("b"));
        assert!(!matcher.matches("c"));
    }

    #[test]
    fn from_str_creates_equals_matcher() {
        let matcher: AttributeMatcher = "someGroupName".into();
        assert!(matcher.matches("someGroupName"));
        assert!(!matcher.matches("otherGroup"));
    }

    #[test]
    fn empty_set_matches_everything() {
        let predicates = Attributes::new();
        assert!(predicates.matches(&BTreeMap::new()));
        assert!(predicates.matches(&call_attributes(&[("a", "1")])));
    }

    #[test]
    fn subset_match_ignores_extra_attributes() {
        let predicates = Attributes::new().with("groupName", "g");
        assert!(predicates.matches(&call_attributes(&[("groupName", "g"), ("userName", "u")])));
    }

    #[test]
    fn missing_attribute_never_matches() {
        let predicates = Attributes::new().with("userName", AttributeMatcher::any());
        assert!(!predicates.matches(&call_attributes(&[("groupName", "g")])));
    }

    #[test]
    fn every_predicate_must_hold() {
        let predicates = Attributes::new().with("a", "1").with("b", "2");
        assert!(predicates.matches(&call_attributes(&[("a", "1"), ("b", "2")])));
        assert!(!predicates.matches(&call_attributes(&[("a", "1"), ("b", "3")])));
    }

    #[test]
    fn same_name_replaces_previous_predicate() {
        let predicates = Attributes::new().with("a", "1").with("a", "2");
        assert_eq!(predicates.len(), 1);
        assert!(predicates.matches(&call_attributes(&[("a", "2")])));
    }

    #[test]
    fn collects_from_pairs() {
        let predicates: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(predicates.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn describe_keeps_matcher_values() {
        let predicates = Attributes::new()
            .with("groupName", "admins")
            .with("owner", AttributeMatcher::one_of(["x", "y"]));
        assert_eq!(
            predicates.describe(),
            vec![
                r#"groupName == "admins""#.to_string(),
                r#"owner in ["x", "y"]"#.to_string(),
            ]
        );
    }

    #[test]
    fn display_lists_predicates() {
        let predicates = Attributes::new()
            .with("a", "1")
            .with("b", AttributeMatcher::any());
        assert_eq!(predicates.to_string(), "{a == \"1\", b any}");
    }
}
