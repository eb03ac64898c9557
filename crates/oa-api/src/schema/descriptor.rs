use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::fingerprint::SchemaFingerprint;

/// Scalar kinds understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
}

impl PrimitiveKind {
    /// Maps a schema `type` value onto a primitive kind.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// Schema spelling of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an object descriptor.
#[derive(Debug, Clone, Default)]
pub struct ObjectType {
    properties: BTreeMap<String, Arc<TypeDescriptor>>,
    supertypes: Vec<Arc<TypeDescriptor>>,
    structures: Vec<String>,
}

impl ObjectType {
    pub(crate) const fn new(
        properties: BTreeMap<String, Arc<TypeDescriptor>>,
        supertypes: Vec<Arc<TypeDescriptor>>,
        structures: Vec<String>,
    ) -> Self {
        Self {
            properties,
            supertypes,
            structures,
        }
    }

    /// Declared properties keyed by name.
    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, Arc<TypeDescriptor>> {
        &self.properties
    }

    /// Types listed under `implements`, in declaration order.
    #[must_use]
    pub fn supertypes(&self) -> &[Arc<TypeDescriptor>] {
        &self.supertypes
    }

    /// Names of nested structures declared by the type. They are not expanded
    /// until requested through their compound identifier.
    #[must_use]
    pub fn structures(&self) -> &[String] {
        &self.structures
    }
}

/// Shape of a descriptor.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Scalar value.
    Primitive(PrimitiveKind),
    /// Homogeneous list.
    Array {
        /// Element type.
        items: Arc<TypeDescriptor>,
    },
    /// Structured resource or structure.
    Object(ObjectType),
    /// Type identifier whose descriptor is still being built further up the
    /// resolution stack. Resolve it with
    /// [`TypeGenerator::resolve_reference`](super::TypeGenerator::resolve_reference).
    Reference {
        /// Identifier of the referenced type.
        target: String,
    },
}

/// Immutable description of one remote type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    type_id: Option<String>,
    fingerprint: SchemaFingerprint,
    kind: TypeKind,
    schema: Value,
}

impl TypeDescriptor {
    pub(crate) const fn new(
        name: String,
        type_id: Option<String>,
        fingerprint: SchemaFingerprint,
        kind: TypeKind,
        schema: Value,
    ) -> Self {
        Self {
            name,
            type_id,
            fingerprint,
            kind,
            schema,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type identifier; primitives and arrays are identified by their name.
    #[must_use]
    pub fn type_id(&self) -> &str {
        self.type_id.as_deref().unwrap_or(&self.name)
    }

    /// Identifier declared by the document itself (`id`), if any.
    pub(crate) fn declared_type_id(&self) -> Option<&str> {
        self.type_id.as_deref()
    }

    /// Fingerprint of the document the descriptor was built from.
    #[must_use]
    pub const fn fingerprint(&self) -> &SchemaFingerprint {
        &self.fingerprint
    }

    /// Kind-specific payload.
    #[must_use]
    pub const fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The source document.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Primitive kind, when the descriptor is a scalar.
    #[must_use]
    pub const fn primitive(&self) -> Option<PrimitiveKind> {
        match &self.kind {
            TypeKind::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Element descriptor, when the descriptor is an array.
    #[must_use]
    pub const fn items(&self) -> Option<&Arc<Self>> {
        match &self.kind {
            TypeKind::Array { items } => Some(items),
            _ => None,
        }
    }

    /// Object payload, when the descriptor is an object.
    #[must_use]
    pub const fn object(&self) -> Option<&ObjectType> {
        match &self.kind {
            TypeKind::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Looks up a property descriptor by name. Inherited properties are not
    /// consulted; see [`TypeDescriptor::implements`].
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Arc<Self>> {
        self.object()
            .and_then(|object| object.properties().get(name))
    }

    /// Target identifier, when the descriptor is an unresolved reference.
    #[must_use]
    pub fn reference_target(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Reference { target } => Some(target),
            _ => None,
        }
    }

    /// Returns `true` when the descriptor is `type_id` or implements it,
    /// directly or through its supertypes.
    #[must_use]
    pub fn implements(&self, type_id: &str) -> bool {
        if self.type_id() == type_id {
            return true;
        }
        match &self.kind {
            TypeKind::Object(object) => object
                .supertypes()
                .iter()
                .any(|parent| parent.implements(type_id)),
            TypeKind::Reference { target } => target == type_id,
            _ => false,
        }
    }

    /// Compound identifier of a nested structure declared by this type.
    #[must_use]
    pub fn structure_id(&self, structure: &str) -> Option<String> {
        let object = self.object()?;
        if !object.structures().iter().any(|name| name == structure) {
            return None;
        }
        Some(format!("{}#{structure}", self.type_id()))
    }
}
