//! Single-term version range specifications such as `>=1.1.0`
//!
//! Supported operators: `<`, `<=`, `==` (or `=`), `!=`, `>=`, `>`. A bare
//! version without an operator means `==`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::version::error::{SpecError, VersionError};
use crate::version::value::{AsdfVersion, VersionLike};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

/// Operator tokens; `=` is accepted as an alias of `==`
const OPERATORS: &[(&str, Comparator)] = &[
    ("<", Comparator::Lt),
    ("<=", Comparator::Le),
    ("==", Comparator::Eq),
    ("=", Comparator::Eq),
    ("!=", Comparator::Ne),
    (">=", Comparator::Ge),
    (">", Comparator::Gt),
];

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Ge => ">=",
            Comparator::Gt => ">",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        OPERATORS
            .iter()
            .find(|(candidate, _)| *candidate == token)
            .map(|(_, comparator)| *comparator)
    }

    /// Whether `ordering`, the result of `value.cmp(threshold)`, satisfies this operator
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Lt => ordering.is_lt(),
            Comparator::Le => ordering.is_le(),
            Comparator::Eq => ordering.is_eq(),
            Comparator::Ne => ordering.is_ne(),
            Comparator::Ge => ordering.is_ge(),
            Comparator::Gt => ordering.is_gt(),
        }
    }
}

/// A comparator and threshold, e.g. `>=1.1.0`
///
/// Comparing a spec with `==` against a version (in any accepted
/// representation) is the same as calling [`AsdfSpec::matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AsdfSpec {
    comparator: Comparator,
    threshold: AsdfVersion,
}

impl AsdfSpec {
    pub fn new(comparator: Comparator, threshold: AsdfVersion) -> Self {
        Self {
            comparator,
            threshold,
        }
    }

    pub fn parse(expr: &str) -> Result<Self, SpecError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(SpecError::Empty);
        }

        // The operator is everything before the version's first digit
        let split = expr
            .find(|c: char| c.is_ascii_digit() || c.is_whitespace())
            .unwrap_or(expr.len());
        let (token, rest) = expr.split_at(split);

        let comparator = if token.is_empty() {
            Comparator::Eq
        } else {
            Comparator::from_token(token).ok_or_else(|| SpecError::UnknownOperator {
                input: expr.to_string(),
                operator: token.to_string(),
            })?
        };

        let threshold = AsdfVersion::parse(rest.trim())?;
        Ok(Self::new(comparator, threshold))
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn threshold(&self) -> AsdfVersion {
        self.threshold
    }

    /// Check whether `value` satisfies this spec
    ///
    /// Values that cannot be normalized into a version never match.
    pub fn matches<V: VersionLike + ?Sized>(&self, value: &V) -> bool {
        self.try_matches(value).unwrap_or(false)
    }

    /// Like [`AsdfSpec::matches`], but reports values that are not versions
    pub fn try_matches<V: VersionLike + ?Sized>(&self, value: &V) -> Result<bool, VersionError> {
        let version = value.to_version()?;
        Ok(self.comparator.holds(version.cmp(&self.threshold)))
    }

    /// Return the greatest matching candidate, or `None` if nothing matches
    ///
    /// The candidate is returned in its original representation.
    pub fn select<I>(&self, candidates: I) -> Option<I::Item>
    where
        I: IntoIterator,
        I::Item: VersionLike,
    {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let version = candidate.to_version().ok()?;
                self.comparator
                    .holds(version.cmp(&self.threshold))
                    .then_some((version, candidate))
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, candidate)| candidate)
    }

    /// Lazily yield the matching candidates in input order
    ///
    /// The returned iterator is `Clone` whenever the input iterator is, so a
    /// filter over a slice or a `Vec` reference can be replayed.
    pub fn filter<I>(&self, candidates: I) -> SpecFilter<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: VersionLike,
    {
        SpecFilter {
            spec: self,
            inner: candidates.into_iter(),
        }
    }
}

impl fmt::Display for AsdfSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparator.as_str(), self.threshold)
    }
}

impl FromStr for AsdfSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Iterator returned by [`AsdfSpec::filter`]
#[derive(Debug, Clone)]
pub struct SpecFilter<'a, I> {
    spec: &'a AsdfSpec,
    inner: I,
}

impl<I> Iterator for SpecFilter<'_, I>
where
    I: Iterator,
    I::Item: VersionLike,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let spec = self.spec;
        self.inner.find(|candidate| spec.matches(candidate))
    }
}

/// Spec-to-version equality in both operand orders, defined as a match
macro_rules! compare_with_spec {
    ($($other:ty),+ $(,)?) => {$(
        impl PartialEq<$other> for AsdfSpec {
            fn eq(&self, other: &$other) -> bool {
                self.matches(other)
            }
        }

        impl PartialEq<AsdfSpec> for $other {
            fn eq(&self, other: &AsdfSpec) -> bool {
                other.matches(self)
            }
        }
    )+};
}

compare_with_spec!(AsdfVersion, str, &str, String, (u64, u64, u64), [u64; 3]);
