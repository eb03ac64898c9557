use serde_json::Value;

use super::error::SchemaError;

/// Supplies schema documents by type identifier.
///
/// Identifiers are either opaque type ids (usually URLs) or compound
/// `parentId#structureName` ids naming a structure nested in its parent.
/// `Ok(None)` means the source has no such type.
///
/// Plain closures returning `Option<Value>` implement the trait:
///
/// ```
/// use oa_api::schema::{SchemaSource, TypeGenerator};
/// use serde_json::json;
///
/// let source = |type_id: &str| (type_id == "urn:demo").then(|| json!({"type": "string"}));
/// let generator = TypeGenerator::new();
/// let descriptor = generator.resolve_type("urn:demo", &source).unwrap();
/// assert_eq!(descriptor.name(), "string");
/// ```
pub trait SchemaSource {
    /// Fetches the document for `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Fetch`] when the source itself fails.
    fn fetch_schema(&self, type_id: &str) -> Result<Option<Value>, SchemaError>;
}

impl<F> SchemaSource for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn fetch_schema(&self, type_id: &str) -> Result<Option<Value>, SchemaError> {
        Ok(self(type_id))
    }
}
