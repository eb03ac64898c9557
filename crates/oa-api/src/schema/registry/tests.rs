//! Unit tests for the type registry.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::schema::descriptor::{ObjectType, PrimitiveKind};

fn primitive(name: &str) -> TypeDescriptor {
    let schema = json!({"type": name});
    TypeDescriptor::new(
        name.to_owned(),
        None,
        SchemaFingerprint::of(&schema),
        TypeKind::Primitive(PrimitiveKind::String),
        schema,
    )
}

fn object(type_id: &str) -> TypeDescriptor {
    let schema = json!({"id": type_id});
    TypeDescriptor::new(
        "object".to_owned(),
        Some(type_id.to_owned()),
        SchemaFingerprint::of(&schema),
        TypeKind::Object(ObjectType::default()),
        schema,
    )
}

#[fixture]
fn registry() -> TypeRegistry {
    TypeRegistry::new()
}

#[rstest]
fn new_registry_is_empty(registry: TypeRegistry) {
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[rstest]
fn factory_runs_once_per_fingerprint(registry: TypeRegistry) {
    let calls = AtomicUsize::new(0);
    let fingerprint = SchemaFingerprint::of(&json!({"type": "string"}));
    let build = || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Infallible>(primitive("string"))
    };

    let first = registry
        .get_or_create(&fingerprint, build)
        .expect("first build");
    let second = registry
        .get_or_create(&fingerprint, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(primitive("string"))
        })
        .expect("second lookup");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 1);
}

#[rstest]
fn failed_factory_registers_nothing(registry: TypeRegistry) {
    let fingerprint = SchemaFingerprint::of(&json!({"type": "broken"}));
    let result = registry.get_or_create(&fingerprint, || Err::<TypeDescriptor, _>("boom"));
    assert_eq!(result.err(), Some("boom"));
    assert!(registry.get(&fingerprint).is_none());
}

#[rstest]
fn first_insert_wins(registry: TypeRegistry) {
    let fingerprint = SchemaFingerprint::of(&json!({"type": "string"}));
    let winner = registry.insert(fingerprint, Arc::new(primitive("first")));
    let loser = registry.insert(fingerprint, Arc::new(primitive("second")));
    assert!(Arc::ptr_eq(&winner, &loser));
    assert_eq!(loser.name(), "first");
}

#[rstest]
fn objects_are_indexed_by_declared_id(registry: TypeRegistry) {
    let descriptor = object("http://example.com/types/a/1.0");
    let fingerprint = *descriptor.fingerprint();
    let stored = registry
        .get_or_create(&fingerprint, || Ok::<_, Infallible>(descriptor))
        .expect("build");
    let found = registry
        .get_by_type_id("http://example.com/types/a/1.0")
        .expect("indexed by id");
    assert!(Arc::ptr_eq(&stored, &found));
}

#[rstest]
fn primitives_are_not_indexed_by_name(registry: TypeRegistry) {
    let descriptor = primitive("string");
    let fingerprint = *descriptor.fingerprint();
    registry
        .get_or_create(&fingerprint, || Ok::<_, Infallible>(descriptor))
        .expect("build");
    assert!(registry.get_by_type_id("string").is_none());
}

#[test]
fn concurrent_builders_observe_one_descriptor() {
    let registry = Arc::new(TypeRegistry::new());
    let fingerprint = SchemaFingerprint::of(&json!({"type": "string"}));

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let shared = Arc::clone(&registry);
            thread::spawn(move || {
                shared
                    .get_or_create(&fingerprint, || {
                        Ok::<_, Infallible>(primitive(&format!("builder-{index}")))
                    })
                    .expect("build")
            })
        })
        .collect();

    let results: Vec<Arc<TypeDescriptor>> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread join"))
        .collect();
    let first = results.first().expect("at least one result");
    assert!(results.iter().all(|other| Arc::ptr_eq(first, other)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn global_registry_is_shared() {
    assert!(Arc::ptr_eq(&TypeRegistry::global(), &TypeRegistry::global()));
}
