//! Memoised store of generated type descriptors.
//!
//! The [`TypeRegistry`] maps a [`SchemaFingerprint`] to the descriptor built
//! from that document. Entries are write-once: when two callers race to
//! build the same schema, the first insert wins and every caller receives
//! the retained descriptor. Factories run without the lock held, because
//! building an object type recursively builds its properties and supertypes
//! through the same registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use super::descriptor::{TypeDescriptor, TypeKind};
use super::fingerprint::SchemaFingerprint;

static GLOBAL_REGISTRY: Lazy<Arc<TypeRegistry>> = Lazy::new(|| Arc::new(TypeRegistry::new()));

/// Registry of generated descriptors.
///
/// # Example
///
/// ```
/// use oa_api::schema::{SchemaFingerprint, TypeRegistry};
/// use serde_json::json;
///
/// let registry = TypeRegistry::new();
/// let fingerprint = SchemaFingerprint::of(&json!({"type": "string"}));
/// assert!(registry.get(&fingerprint).is_none());
/// ```
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: RwLock<HashMap<SchemaFingerprint, Arc<TypeDescriptor>>>,
    by_type_id: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry. Remote schemas do not change during a run,
    /// so descriptors are kept for the lifetime of the process.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Looks up a descriptor by fingerprint.
    #[must_use]
    pub fn get(&self, fingerprint: &SchemaFingerprint) -> Option<Arc<TypeDescriptor>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(fingerprint)
            .cloned()
    }

    /// Looks up an object descriptor by its declared type identifier.
    #[must_use]
    pub fn get_by_type_id(&self, type_id: &str) -> Option<Arc<TypeDescriptor>> {
        self.by_type_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_id)
            .cloned()
    }

    /// Returns the descriptor registered under `fingerprint`, building and
    /// registering it with `factory` on a miss.
    ///
    /// The factory is not invoked when an entry already exists. If another
    /// caller registers the same fingerprint while the factory runs, the
    /// earlier entry is kept and returned.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error; nothing is registered in that case.
    pub fn get_or_create<F, E>(
        &self,
        fingerprint: &SchemaFingerprint,
        factory: F,
    ) -> Result<Arc<TypeDescriptor>, E>
    where
        F: FnOnce() -> Result<TypeDescriptor, E>,
    {
        if let Some(existing) = self.get(fingerprint) {
            return Ok(existing);
        }
        let built = Arc::new(factory()?);
        Ok(self.insert(*fingerprint, built))
    }

    /// Registers an already shared descriptor under an additional
    /// fingerprint, returning whichever entry is retained.
    pub(crate) fn insert(
        &self,
        fingerprint: SchemaFingerprint,
        descriptor: Arc<TypeDescriptor>,
    ) -> Arc<TypeDescriptor> {
        let retained = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(fingerprint).or_insert(descriptor))
        };
        if let (TypeKind::Object(_), Some(type_id)) = (retained.kind(), retained.declared_type_id())
        {
            self.by_type_id
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(type_id.to_owned())
                .or_insert_with(|| Arc::clone(&retained));
        }
        retained
    }

    /// Number of registered fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests;
