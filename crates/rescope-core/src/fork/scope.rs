//! Target scope and patched name derivation.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Separator joining an original scope to the package name under the new scope.
pub const SCOPE_SEPARATOR: &str = "__";

/// A validated npm scope such as `@fork`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope(String);

impl Scope {
    /// Validate a scope string.
    ///
    /// The scope must start with `@`, have a non-empty name and contain no
    /// `/` or whitespace.
    pub fn parse(scope: &str) -> Result<Self, Error> {
        let valid = scope
            .strip_prefix('@')
            .is_some_and(|name| {
                !name.is_empty() && !name.contains('/') && !name.chars().any(char::is_whitespace)
            });

        if valid {
            Ok(Self(scope.to_string()))
        } else {
            Err(Error::InvalidScope {
                scope: scope.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name a package is forked as under this scope.
    ///
    /// `@origin/core` becomes `@fork/origin__core` and `left-pad` becomes
    /// `@fork/left-pad`. An unscoped name that already contains `__` can
    /// still meet a scoped one (`a__b` and `@a/b`); the entry map reports
    /// that as a collision.
    #[must_use]
    pub fn patched_name(&self, original: &str) -> String {
        match original
            .strip_prefix('@')
            .and_then(|rest| rest.split_once('/'))
        {
            Some((origin_scope, name)) => {
                format!("{}/{origin_scope}{SCOPE_SEPARATOR}{name}", self.0)
            }
            None => format!("{}/{original}", self.0),
        }
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
