use thiserror::Error;

/// Errors raised while turning schema documents into descriptors.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// A document cannot be resolved in its context, for example a bare
    /// structure reference with no enclosing type.
    #[error("cannot resolve schema type '{type_name}': {message}")]
    Resolution {
        /// The `type` value that could not be resolved.
        type_name: String,
        /// Why resolution failed.
        message: String,
    },

    /// The schema source has no document for the identifier.
    #[error("type '{type_id}' not found")]
    TypeNotFound {
        /// Requested type identifier.
        type_id: String,
    },

    /// The document is not shaped like a schema.
    #[error("malformed schema: {message}")]
    Malformed {
        /// Description of the defect.
        message: String,
    },

    /// The schema source failed for a reason other than a missing type.
    #[error("failed to fetch schema for '{type_id}': {message}")]
    Fetch {
        /// Requested type identifier.
        type_id: String,
        /// Rendered underlying failure.
        message: String,
    },
}
