//! Platform license files.
//!
//! A license is an XML document whose root carries a `key-number` element
//! in the core keys namespace. The raw bytes are uploaded as-is; the key
//! number identifies the license for later removal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use roxmltree::Document;
use thiserror::Error;

/// Namespace of the `key-number` element.
pub const KEYS_NAMESPACE: &str = "http://parallels.com/schemas/keys/core/3";

/// License file failures.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The file does not exist.
    #[error("license file {} not found", path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but cannot be read.
    #[error("license file {} not readable: {source}", path.display())]
    Unreadable {
        /// Requested path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The file is not well-formed XML.
    #[error("failed to parse XML in {}: {message}", path.display())]
    Parse {
        /// Requested path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The document has no `key-number` element.
    #[error("failed to read key number from {}", path.display())]
    MissingKeyNumber {
        /// Requested path.
        path: PathBuf,
    },
}

/// A license read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseFile {
    content: Vec<u8>,
    key_number: String,
}

impl LicenseFile {
    /// Reads and validates a license file.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError`] when the file is missing, unreadable, not XML
    /// or lacks a key number.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LicenseError> {
        let file = path.as_ref();
        let content = fs::read(file).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => LicenseError::NotFound {
                path: file.to_path_buf(),
            },
            _ => LicenseError::Unreadable {
                path: file.to_path_buf(),
                source: Arc::new(error),
            },
        })?;
        let key_number = parse_key_number(file, &content)?;
        Ok(Self {
            content,
            key_number,
        })
    }

    /// Raw file contents.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The license key number.
    #[must_use]
    pub fn key_number(&self) -> &str {
        &self.key_number
    }
}

fn parse_key_number(path: &Path, content: &[u8]) -> Result<String, LicenseError> {
    let parse_error = |message: String| LicenseError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let text = std::str::from_utf8(content).map_err(|error| parse_error(error.to_string()))?;
    let document = Document::parse(text).map_err(|error| parse_error(error.to_string()))?;

    document
        .root_element()
        .children()
        .find(|node| node.has_tag_name((KEYS_NAMESPACE, "key-number")))
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|number| !number.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| LicenseError::MissingKeyNumber {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests;
