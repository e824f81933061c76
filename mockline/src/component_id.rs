use std::{fmt, hash::Hash, sync::Arc};

use crate::{Error, Result};

/// Namespace used when a component is named without one.
pub const DEFAULT_NAMESPACE: &str = "core";

/// Identifies a kind of pipeline component, independent of any instance.
///
/// A `ComponentId` is a `(namespace, name)` pair such as `jira:create-group`.
/// Behaviors, spies, recorded calls and verifications are all keyed by it.
///
/// `ComponentId` is cheap to clone. Equality is by value, with a fast path
/// for pointer equality when two ids share the same allocation.
///
/// # Example
///
/// ```rust
/// use mockline::ComponentId;
///
/// let id = ComponentId::parse("jira:create-group").unwrap();
/// assert_eq!(id.namespace(), "jira");
/// assert_eq!(id.name(), "create-group");
/// assert_eq!(id.to_string(), "jira:create-group");
///
/// let bare = ComponentId::parse("logger").unwrap();
/// assert_eq!(bare.namespace(), mockline::DEFAULT_NAMESPACE);
/// ```
#[derive(Debug, Clone, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentId {
    namespace: Arc<str>,
    name: Arc<str>,
}

impl ComponentId {
    /// Create an id from a namespace and a name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidComponentId`] if either part is empty.
    pub fn new(namespace: &str, name: &str) -> Result<Self> {
        if namespace.is_empty() || name.is_empty() {
            return Err(Error::InvalidComponentId(format!("{namespace}:{name}")));
        }
        Ok(Self {
            namespace: Arc::from(namespace),
            name: Arc::from(name),
        })
    }

    /// Create an id in the [`DEFAULT_NAMESPACE`].
    pub fn named(name: &str) -> Result<Self> {
        Self::new(DEFAULT_NAMESPACE, name)
    }

    /// Parse `namespace:name`, or a bare `name` in the default namespace.
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.split_once(':') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Self::named(full_name),
        }
    }

    /// Returns the same name under another namespace.
    pub fn with_namespace(&self, namespace: &str) -> Result<Self> {
        if namespace.is_empty() {
            return Err(Error::InvalidComponentId(format!(":{}", self.name)));
        }
        Ok(Self {
            namespace: Arc::from(namespace),
            name: self.name.clone(),
        })
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ComponentId {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.name, &other.name) || self.name == other.name)
            && (Arc::ptr_eq(&self.namespace, &other.namespace) || self.namespace == other.namespace)
    }
}

impl Eq for ComponentId {}

impl Hash for ComponentId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

impl TryFrom<&str> for ComponentId {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_namespace() {
        let id = ComponentId::parse("jira:create-group").unwrap();
        assert_eq!(id.namespace(), "jira");
        assert_eq!(id.name(), "create-group");
    }

    #[test]
    fn parse_without_namespace_uses_default() {
        let id = ComponentId::parse("echo-component").unwrap();
        assert_eq!(id.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(id.name(), "echo-component");
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!(matches!(
            ComponentId::parse(""),
            Err(Error::InvalidComponentId(_))
        ));
        assert!(ComponentId::new("jira", "").is_err());
        assert!(ComponentId::parse("jira:").is_err());
    }

    #[test]
    fn equality_is_by_value() {
        let a = ComponentId::new("jira", "create-group").unwrap();
        let b = ComponentId::parse("jira:create-group").unwrap();
        let c = ComponentId::new("salesforce", "create-group").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn with_namespace_keeps_name() {
        let id = ComponentId::named("create-group")
            .unwrap()
            .with_namespace("jira")
            .unwrap();
        assert_eq!(id.to_string(), "jira:create-group");
    }
}
