//! Schema-to-descriptor generation.
//!
//! [`TypeGenerator::generate`] resolves a type identifier or an inline
//! document into a [`TypeDescriptor`]:
//!
//! * `boolean`, `integer`, `number` and `string` become primitive leaves;
//! * `array` wraps the descriptor generated for `items`;
//! * `object` (the default) composes `implements`, `properties` and the
//!   names of its `structures`;
//! * a `type` that is itself a type identifier (a URL or a compound
//!   `parent#name`) resolves to that type;
//! * any other bare name refers to a structure of the enclosing type and is
//!   resolved as `parentId#name`.
//!
//! Every built descriptor is registered under the fingerprint of its
//! document, scoped by the enclosing type when the document names a local
//! structure. A bare structure reference itself is never memoised; the
//! structure it resolves to is cached under its compound identifier. A type
//! identifier met again while its own descriptor is still under construction
//! yields a [`TypeKind::Reference`] placeholder instead of recursing forever.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use super::SCHEMA_TARGET;
use super::descriptor::{ObjectType, PrimitiveKind, TypeDescriptor, TypeKind};
use super::error::SchemaError;
use super::fingerprint::SchemaFingerprint;
use super::registry::TypeRegistry;
use super::source::SchemaSource;

/// What to generate a descriptor from.
#[derive(Debug, Clone, Copy)]
pub enum SchemaInput<'a> {
    /// A type identifier to fetch through the [`SchemaSource`].
    TypeId(&'a str),
    /// An inline schema document.
    Document(&'a Value),
}

/// Builds descriptors from schema documents, memoising them in a registry.
#[derive(Debug, Clone)]
pub struct TypeGenerator {
    registry: Arc<TypeRegistry>,
}

impl Default for TypeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGenerator {
    /// Creates a generator with a private registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Arc::new(TypeRegistry::new()))
    }

    /// Creates a generator backed by the process-wide registry.
    #[must_use]
    pub fn shared() -> Self {
        Self::with_registry(TypeRegistry::global())
    }

    /// Creates a generator backed by `registry`.
    #[must_use]
    pub const fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// The registry holding generated descriptors.
    #[must_use]
    pub const fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Generates the descriptor for `input`.
    ///
    /// `name` overrides the document's display name. `parent_id` is the
    /// enclosing type used to resolve bare structure references.
    ///
    /// # Errors
    ///
    /// * [`SchemaError::TypeNotFound`] when the source has no document for a
    ///   requested identifier.
    /// * [`SchemaError::Resolution`] when a bare structure reference has no
    ///   enclosing type.
    /// * [`SchemaError::Malformed`] when a document is not shaped like a
    ///   schema.
    /// * [`SchemaError::Fetch`] when the source fails.
    pub fn generate<S>(
        &self,
        input: SchemaInput<'_>,
        source: &S,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Arc<TypeDescriptor>, SchemaError>
    where
        S: SchemaSource + ?Sized,
    {
        let mut resolution = Resolution {
            registry: &self.registry,
            source,
            pending: Vec::new(),
        };
        resolution.generate(input, name, parent_id)
    }

    /// Generates the descriptor for a type identifier.
    ///
    /// # Errors
    ///
    /// See [`TypeGenerator::generate`].
    pub fn resolve_type<S>(
        &self,
        type_id: &str,
        source: &S,
    ) -> Result<Arc<TypeDescriptor>, SchemaError>
    where
        S: SchemaSource + ?Sized,
    {
        self.generate(SchemaInput::TypeId(type_id), source, None, None)
    }

    /// Resolves a [`TypeKind::Reference`] placeholder to the descriptor it
    /// names; other descriptors are returned unchanged.
    ///
    /// # Errors
    ///
    /// See [`TypeGenerator::generate`].
    pub fn resolve_reference<S>(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        source: &S,
    ) -> Result<Arc<TypeDescriptor>, SchemaError>
    where
        S: SchemaSource + ?Sized,
    {
        descriptor.reference_target().map_or_else(
            || Ok(Arc::clone(descriptor)),
            |target| self.resolve_type(target, source),
        )
    }
}

/// State for one top-level generation request.
struct Resolution<'a, S: ?Sized> {
    registry: &'a TypeRegistry,
    source: &'a S,
    /// Type identifiers whose descriptors are under construction.
    pending: Vec<String>,
}

impl<S> Resolution<'_, S>
where
    S: SchemaSource + ?Sized,
{
    fn generate(
        &mut self,
        input: SchemaInput<'_>,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Arc<TypeDescriptor>, SchemaError> {
        match input {
            SchemaInput::TypeId(type_id) => self.generate_type_id(type_id, name, parent_id),
            SchemaInput::Document(document) => {
                self.generate_document(document, None, name, parent_id)
            }
        }
    }

    fn generate_type_id(
        &mut self,
        type_id: &str,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Arc<TypeDescriptor>, SchemaError> {
        if self.is_pending(type_id) {
            debug!(
                target: SCHEMA_TARGET,
                type_id,
                "type is under construction, emitting reference"
            );
            return Ok(Arc::new(reference_to(type_id)));
        }
        if let Some(existing) = self.registry.get_by_type_id(type_id) {
            return Ok(existing);
        }

        debug!(target: SCHEMA_TARGET, type_id, "fetching schema");
        let document =
            self.source
                .fetch_schema(type_id)?
                .ok_or_else(|| SchemaError::TypeNotFound {
                    type_id: type_id.to_owned(),
                })?;

        self.pending.push(type_id.to_owned());
        let result = self.generate_document(&document, Some(type_id), name, parent_id);
        self.pending.pop();
        result
    }

    fn generate_document(
        &mut self,
        document: &Value,
        requested_id: Option<&str>,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Arc<TypeDescriptor>, SchemaError> {
        let fields = document.as_object().ok_or_else(|| SchemaError::Malformed {
            message: format!("schema document must be an object, got {document}"),
        })?;
        let declared_id = string_field(fields, "id");
        let scope = parent_id
            .or(declared_id.as_deref())
            .or(requested_id)
            .map(base_type_id);
        let fingerprint = scoped_fingerprint(document, scope.as_deref());
        if let Some(existing) = self.registry.get(&fingerprint) {
            return Ok(existing);
        }

        let declared_type = match fields.get("type") {
            None => "object",
            Some(Value::String(declared)) => declared.as_str(),
            Some(other) => {
                return Err(SchemaError::Malformed {
                    message: format!("`type` must be a string, got {other}"),
                });
            }
        };
        let display_name = name
            .map(str::to_owned)
            .or_else(|| string_field(fields, "name"));
        let registry = self.registry;

        if let Some(kind) = PrimitiveKind::from_type_name(declared_type) {
            return registry.get_or_create(&fingerprint, || {
                Ok(TypeDescriptor::new(
                    display_name.unwrap_or_else(|| declared_type.to_owned()),
                    None,
                    fingerprint,
                    TypeKind::Primitive(kind),
                    document.clone(),
                ))
            });
        }

        match declared_type {
            "array" => {
                let context = Context {
                    document,
                    fields,
                    fingerprint,
                    display_name,
                    parent_id: scope,
                };
                registry.get_or_create(&fingerprint, || self.build_array(context))
            }
            "object" => {
                let context = Context {
                    document,
                    fields,
                    fingerprint,
                    display_name,
                    parent_id: scope,
                };
                registry.get_or_create(&fingerprint, || self.build_object(context, declared_id))
            }
            target if is_type_identifier(target) => {
                let resolved = self.generate_type_id(target, None, None)?;
                Ok(self.alias(fingerprint, resolved))
            }
            structure => {
                let parent = parent_id.ok_or_else(|| SchemaError::Resolution {
                    type_name: structure.to_owned(),
                    message: String::from("structure reference without an enclosing type"),
                })?;
                let compound = format!("{parent}#{structure}");
                self.generate_type_id(&compound, name, Some(parent))
            }
        }
    }

    fn build_array(&mut self, context: Context<'_>) -> Result<TypeDescriptor, SchemaError> {
        let items = context
            .fields
            .get("items")
            .ok_or_else(|| SchemaError::Malformed {
                message: String::from("array schema has no `items`"),
            })?;
        let element = self.generate(
            SchemaInput::Document(items),
            None,
            context.parent_id.as_deref(),
        )?;
        let name = context
            .display_name
            .unwrap_or_else(|| format!("array of {}", element.name()));
        Ok(TypeDescriptor::new(
            name,
            None,
            context.fingerprint,
            TypeKind::Array { items: element },
            context.document.clone(),
        ))
    }

    fn build_object(
        &mut self,
        context: Context<'_>,
        declared_id: Option<String>,
    ) -> Result<TypeDescriptor, SchemaError> {
        let tracked = match declared_id.as_deref() {
            Some(type_id) if !self.is_pending(type_id) => {
                self.pending.push(type_id.to_owned());
                true
            }
            _ => false,
        };
        let result = self.compose_object(&context);
        if tracked {
            self.pending.pop();
        }
        let object = result?;

        Ok(TypeDescriptor::new(
            context.display_name.unwrap_or_else(|| String::from("object")),
            declared_id,
            context.fingerprint,
            TypeKind::Object(object),
            context.document.clone(),
        ))
    }

    fn compose_object(&mut self, context: &Context<'_>) -> Result<ObjectType, SchemaError> {
        let mut supertypes = Vec::new();
        for type_id in string_list(context.fields, "implements")? {
            supertypes.push(self.generate_type_id(type_id, None, None)?);
        }

        let mut properties = BTreeMap::new();
        if let Some(declared) = object_field(context.fields, "properties")? {
            for (property, schema) in declared {
                let descriptor = self.generate(
                    SchemaInput::Document(schema),
                    None,
                    context.parent_id.as_deref(),
                )?;
                properties.insert(property.clone(), descriptor);
            }
        }

        let structures = object_field(context.fields, "structures")?
            .map(|declared| declared.keys().cloned().collect())
            .unwrap_or_default();

        Ok(ObjectType::new(properties, supertypes, structures))
    }

    /// Registers a resolved descriptor under the fingerprint of the document
    /// that referred to it. Placeholders are not memoised.
    fn alias(
        &self,
        fingerprint: SchemaFingerprint,
        resolved: Arc<TypeDescriptor>,
    ) -> Arc<TypeDescriptor> {
        if resolved.reference_target().is_some() {
            return resolved;
        }
        self.registry.insert(fingerprint, resolved)
    }

    fn is_pending(&self, type_id: &str) -> bool {
        self.pending.iter().any(|pending| pending == type_id)
    }
}

/// Per-document inputs shared by the array and object builders.
struct Context<'a> {
    document: &'a Value,
    fields: &'a Map<String, Value>,
    fingerprint: SchemaFingerprint,
    display_name: Option<String>,
    parent_id: Option<String>,
}

fn reference_to(type_id: &str) -> TypeDescriptor {
    let schema = json!({ "type": type_id });
    TypeDescriptor::new(
        type_id.to_owned(),
        Some(type_id.to_owned()),
        SchemaFingerprint::of(&schema),
        TypeKind::Reference {
            target: type_id.to_owned(),
        },
        schema,
    )
}

/// Registry key of `document` when resolved inside `scope`.
///
/// A document that names a local structure, directly or through `items` or
/// `properties`, denotes a different type under each enclosing type, so its
/// key covers the scope as well as the content.
fn scoped_fingerprint(document: &Value, scope: Option<&str>) -> SchemaFingerprint {
    scope
        .filter(|_| mentions_structure(document))
        .map_or_else(
            || SchemaFingerprint::of(document),
            |enclosing| SchemaFingerprint::of(&json!({ "scope": enclosing, "schema": document })),
        )
}

fn mentions_structure(document: &Value) -> bool {
    let Some(fields) = document.as_object() else {
        return false;
    };
    let names_structure = fields
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(is_structure_name);
    names_structure
        || fields.get("items").is_some_and(mentions_structure)
        || fields
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|properties| properties.values().any(mentions_structure))
}

fn is_structure_name(declared: &str) -> bool {
    PrimitiveKind::from_type_name(declared).is_none()
        && !matches!(declared, "array" | "object")
        && !is_type_identifier(declared)
}

/// Strips a `#structure` suffix, yielding the enclosing type's identifier.
fn base_type_id(type_id: &str) -> String {
    type_id
        .split_once('#')
        .map_or(type_id, |(base, _)| base)
        .to_owned()
}

/// A `type` value naming another type rather than a local structure.
fn is_type_identifier(declared: &str) -> bool {
    declared.contains('#') || Url::parse(declared).is_ok()
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn string_list<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
) -> Result<Vec<&'a str>, SchemaError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                entry.as_str().ok_or_else(|| SchemaError::Malformed {
                    message: format!("`{key}` entries must be strings, got {entry}"),
                })
            })
            .collect(),
        Some(other) => Err(SchemaError::Malformed {
            message: format!("`{key}` must be a list, got {other}"),
        }),
    }
}

fn object_field<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, SchemaError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(SchemaError::Malformed {
            message: format!("`{key}` must be an object, got {other}"),
        }),
    }
}
