use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Fully qualified remote method name such as `pem.packaging.installModule`.
///
/// ```
/// use oa_api::MethodName;
///
/// let built = MethodName::root("pem").child("packaging").child("installModule");
/// let parsed: MethodName = "pem.packaging.installModule".parse().unwrap();
/// assert_eq!(built, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodName(String);

/// A dotted method name contained an empty segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid method name '{name}': segments must be non-empty")]
pub struct MethodNameError {
    /// The rejected name.
    pub name: String,
}

impl MethodName {
    /// Parses a dotted name, rejecting empty segments.
    ///
    /// # Errors
    ///
    /// Returns [`MethodNameError`] for `""`, `"pem."`, `"a..b"` and similar.
    pub fn parse(name: &str) -> Result<Self, MethodNameError> {
        if name.split('.').any(str::is_empty) {
            return Err(MethodNameError {
                name: name.to_owned(),
            });
        }
        Ok(Self(name.to_owned()))
    }

    /// Starts a name at its first segment.
    #[must_use]
    pub fn root(segment: &str) -> Self {
        Self(segment.to_owned())
    }

    /// Appends a segment.
    #[must_use]
    pub fn child(mut self, segment: &str) -> Self {
        self.0.push('.');
        self.0.push_str(segment);
        self
    }

    /// The dotted form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MethodName {
    type Err = MethodNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
