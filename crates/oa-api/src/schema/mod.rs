//! Runtime model of the APS controller's type system.
//!
//! The controller describes every resource type with a JSON document in a
//! JSON-Schema-like dialect: a `type` field (`object` by default), an `id`,
//! `implements` (a list of type identifiers), `properties`, and `structures`
//! (named nested schemas addressed as `parentId#structureName`). This module
//! converts those documents into immutable [`TypeDescriptor`] values.
//!
//! Descriptors are memoised in a [`TypeRegistry`] under the
//! [`SchemaFingerprint`] of their document, so structurally identical
//! schemas share one descriptor regardless of key order or of which caller
//! asked first.

mod descriptor;
mod error;
mod fingerprint;
pub mod generator;
pub mod registry;
mod source;

pub use self::descriptor::{ObjectType, PrimitiveKind, TypeDescriptor, TypeKind};
pub use self::error::SchemaError;
pub use self::fingerprint::SchemaFingerprint;
pub use self::generator::{SchemaInput, TypeGenerator};
pub use self::registry::TypeRegistry;
pub use self::source::SchemaSource;

/// Tracing target for schema resolution.
pub(crate) const SCHEMA_TARGET: &str = "oa_api::schema";
