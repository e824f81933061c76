use std::fmt;

/// Expected count relationship enforced by a verification.
///
/// | Constraint | Holds when |
/// |------------|------------|
/// | [`Exactly(n)`](Self::Exactly) | count == n |
/// | [`AtLeast(n)`](Self::AtLeast) | count >= n |
/// | [`AtMost(n)`](Self::AtMost) | count <= n |
///
/// `at_least_once()` on [`VerifyCall`](crate::VerifyCall) is `AtLeast(1)`,
/// and `never()` is `Exactly(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cardinality {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl Cardinality {
    /// Returns `true` if `count` satisfies this constraint.
    pub fn is_satisfied_by(&self, count: usize) -> bool {
        match *self {
            Cardinality::Exactly(n) => count == n,
            Cardinality::AtLeast(n) => count >= n,
            Cardinality::AtMost(n) => count <= n,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Exactly(n) => write!(f, "exactly {n}"),
            Cardinality::AtLeast(n) => write!(f, "at least {n}"),
            Cardinality::AtMost(n) => write!(f, "at most {n}"),
        }
    }
}
