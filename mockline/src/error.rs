use std::{fmt, sync::Arc, time::Duration};

use crate::{Cardinality, ComponentId};

/// The single error type for all mockline operations.
///
/// Every fallible API returns `mockline::Result<T>` (alias for
/// `Result<T, mockline::Error>`). Processors return it too, so a failure
/// raised by a real component, a configured `Throw` outcome and a failed
/// verification all travel through the same type. Sources are kept behind
/// `Arc` so the error stays `Clone` and a configured failure can be
/// returned verbatim on every matching call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Verification(Box<VerificationFailure>),

    #[error("Spy assertion failed: {0}")]
    SpyAssertion(Arc<str>),

    #[error("Pipeline still in flight after {waited:?}: {in_flight} execution(s) pending")]
    PipelineInFlight { waited: Duration, in_flight: i64 },

    #[error(
        "No constructor of '{type_name}' accepts ({})",
        .arg_types.join(", ")
    )]
    ConstructorResolution {
        type_name: String,
        arg_types: Vec<String>,
    },

    #[error("Processor '{type_name}' could not be made interceptable: {reason}")]
    ProxyUnavailable { type_name: String, reason: String },

    #[error("Unknown processor type '{0}'")]
    UnknownProcessorType(String),

    #[error("Invalid component id '{0}'")]
    InvalidComponentId(String),

    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),

    #[error("Internal mockline error {0}")]
    Internal(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    /// Failure raised from a spy hook or any other test assertion.
    pub fn assertion(message: impl Into<Arc<str>>) -> Self {
        Error::SpyAssertion(message.into())
    }

    #[cfg(feature = "serde")]
    pub(crate) fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Internal(Arc::new(e))
    }

    /// Returns `true` for verification and spy assertion failures.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::Verification(_) | Error::SpyAssertion(_))
    }

    /// Returns the verification details if this is a failed verification.
    pub fn verification(&self) -> Option<&VerificationFailure> {
        match self {
            Error::Verification(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Details of an unmet cardinality constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub id: ComponentId,
    /// Attribute predicates of the check, as `name description`.
    pub predicates: Vec<String>,
    pub expected: Cardinality,
    pub actual: usize,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected '{}'", self.id)?;
        if !self.predicates.is_empty() {
            write!(f, " with attributes [{}]", self.predicates.join(", "))?;
        }
        write!(
            f,
            " to be called {} time(s) but it was called {} time(s)",
            self.expected, self.actual
        )
    }
}

impl From<VerificationFailure> for Error {
    fn from(failure: VerificationFailure) -> Self {
        Error::Verification(Box::new(failure))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Verification(a), Self::Verification(b)) => a == b,
            (Self::SpyAssertion(a), Self::SpyAssertion(b)) => a == b,
            (
                Self::PipelineInFlight {
                    waited: w1,
                    in_flight: n1,
                },
                Self::PipelineInFlight {
                    waited: w2,
                    in_flight: n2,
                },
            ) => w1 == w2 && n1 == n2,
            (
                Self::ConstructorResolution {
                    type_name: t1,
                    arg_types: a1,
                },
                Self::ConstructorResolution {
                    type_name: t2,
                    arg_types: a2,
                },
            ) => t1 == t2 && a1 == a2,
            (
                Self::ProxyUnavailable {
                    type_name: t1,
                    reason: r1,
                },
                Self::ProxyUnavailable {
                    type_name: t2,
                    reason: r2,
                },
            ) => t1 == t2 && r1 == r2,
            (Self::UnknownProcessorType(a), Self::UnknownProcessorType(b)) => a == b,
            (Self::InvalidComponentId(a), Self::InvalidComponentId(b)) => a == b,
            (Self::NotInitialized(a), Self::NotInitialized(b)) => a == b,
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            (Self::Internal(a), Self::Internal(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::External(Arc::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_message_names_expected_and_actual() {
        let failure = VerificationFailure {
            id: ComponentId::parse("jira:create-group").unwrap(),
            predicates: vec![r#"groupName == "a""#.into()],
            expected: Cardinality::Exactly(1),
            actual: 2,
        };
        let message = Error::from(failure).to_string();
        assert_eq!(
            message,
            r#"Expected 'jira:create-group' with attributes [groupName == "a"] to be called exactly 1 time(s) but it was called 2 time(s)"#
        );
    }

    #[test]
    fn constructor_resolution_lists_argument_types() {
        let err = Error::ConstructorResolution {
            type_name: "Logger".into(),
            arg_types: vec!["Integer".into(), "String".into()],
        };
        assert_eq!(
            err.to_string(),
            "No constructor of 'Logger' accepts (Integer, String)"
        );
    }

    #[test]
    fn external_errors_compare_by_identity() {
        let err = Error::external(std::io::Error::other("boom"));
        let same = err.clone();
        let other = Error::external(std::io::Error::other("boom"));
        assert_eq!(err, same);
        assert_ne!(err, other);
    }

    #[test]
    fn assertion_classification() {
        assert!(Error::assertion("payload mismatch").is_assertion());
        assert!(!Error::NotInitialized("call ledger").is_assertion());
    }
}
