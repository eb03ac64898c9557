//! JSON result of a provisioning step.

use std::process::ExitCode;

use serde::Serialize;
use serde_json::{Map, Value};

/// Result payload printed on standard output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Outcome {
    changed: bool,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Outcome {
    pub(crate) fn changed() -> Self {
        Self {
            changed: true,
            payload: Map::new(),
        }
    }

    pub(crate) fn unchanged() -> Self {
        Self {
            changed: false,
            payload: Map::new(),
        }
    }

    /// Adds `key` to the payload.
    pub(crate) fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_owned(), value.into());
        self
    }

    pub(crate) const fn is_changed(&self) -> bool {
        self.changed
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// `2` for a change when detailed exit codes were requested, else `0`.
    pub(crate) fn exit_code(&self, detailed: bool) -> ExitCode {
        if detailed && self.changed {
            ExitCode::from(2)
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Result payload of a failed step.
#[derive(Debug, Serialize)]
pub(crate) struct Failure {
    failed: bool,
    msg: String,
}

impl Failure {
    pub(crate) fn new(error: &impl std::fmt::Display) -> Self {
        Self {
            failed: true,
            msg: format!("Failed with {error}"),
        }
    }
}
