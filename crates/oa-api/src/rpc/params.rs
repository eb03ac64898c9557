use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::value::Value;

/// Keyword arguments for a platform call.
///
/// Arguments added with [`Params::secret`] travel normally but are masked
/// when the parameters are displayed, so error messages and logs never carry
/// passwords.
///
/// ```
/// use oa_api::Params;
///
/// let params = Params::new().arg("login", "root").secret("password", "hunter2");
/// assert_eq!(params.to_string(), "{login=\"root\", password=***}");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    args: BTreeMap<String, Value>,
    secrets: BTreeSet<String>,
}

impl Params {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument.
    #[must_use]
    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds an argument that is masked when displayed.
    #[must_use]
    pub fn secret(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.secrets.insert(key.to_owned());
        self.insert(key, value);
        self
    }

    /// Sets an argument in place, replacing any previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.args.insert(key.to_owned(), value.into());
    }

    /// Looks up an argument.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` when no arguments are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The arguments as the single struct parameter the platform expects.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Struct(self.args.clone())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if self.secrets.contains(key) {
                write!(f, "{key}=***")?;
            } else {
                write!(f, "{key}={}", value.to_json())?;
            }
        }
        f.write_str("}")
    }
}
