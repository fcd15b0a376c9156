//! Tests for schema staging and registration: subject creation, version
//! assignment, dedup, local validation, and compatibility previews.

use std::sync::Arc;

use schema_registry_console::{
    CandidateSchema, InMemoryRegistry, RegistryApi, RegistryError, SchemaEditor, SchemaType,
    SubjectCatalog, VersionSpec,
};

const ORDER_V1: &str = r#"{"type":"record","name":"Order","fields":[{"name":"id","type":"long"}]}"#;
const ORDER_V2: &str = r#"{"type":"record","name":"Order","fields":[{"name":"id","type":"long"},{"name":"note","type":"string"}]}"#;

fn setup() -> (Arc<InMemoryRegistry>, SchemaEditor) {
    let registry = Arc::new(InMemoryRegistry::new());
    let editor = SchemaEditor::new(registry.clone());
    (registry, editor)
}

#[tokio::test]
async fn registering_a_new_subject_creates_version_one() {
    let (registry, editor) = setup();

    let outcome = editor
        .register(&CandidateSchema::new("orders-value", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();

    assert!(outcome.created_subject);
    assert_eq!(outcome.version, 1);
    assert_eq!(registry.subjects().await.unwrap(), vec!["orders-value"]);
}

#[tokio::test]
async fn registering_against_an_existing_subject_increments_the_version() {
    let (_registry, editor) = setup();

    editor
        .register(&CandidateSchema::new("orders-value", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();
    let outcome = editor
        .register(&CandidateSchema::new("orders-value", ORDER_V2, SchemaType::Avro))
        .await
        .unwrap();

    assert!(!outcome.created_subject);
    assert_eq!(outcome.version, 2);
}

#[tokio::test]
async fn identical_content_reuses_the_existing_version_and_id() {
    let (registry, editor) = setup();

    let first = editor
        .register(&CandidateSchema::new("orders-value", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();
    let second = editor
        .register(&CandidateSchema::new("orders-value", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.version, first.version);
    assert_eq!(
        registry.subject_versions("orders-value").await.unwrap(),
        vec![1]
    );
}

#[tokio::test]
async fn identical_content_across_subjects_shares_the_schema_id() {
    let (registry, editor) = setup();

    let orders = editor
        .register(&CandidateSchema::new("orders-value", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();
    let audit = editor
        .register(&CandidateSchema::new("audit-value", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();

    assert_eq!(audit.id, orders.id);
    assert_eq!(audit.version, 1);

    let usages = registry.schema_usages(orders.id).await.unwrap();
    let subjects: Vec<&str> = usages.iter().map(|u| u.subject.as_str()).collect();
    assert_eq!(subjects, vec!["audit-value", "orders-value"]);
}

#[tokio::test]
async fn malformed_candidate_fails_locally_without_any_request() {
    let (registry, editor) = setup();

    let result = editor
        .register(&CandidateSchema::new(
            "orders-value",
            "{definitely not json",
            SchemaType::Avro,
        ))
        .await;

    assert!(matches!(result, Err(RegistryError::InvalidSchema { .. })));
    assert!(registry.subjects().await.unwrap().is_empty());
}

#[tokio::test]
async fn incompatibility_diagnostics_are_surfaced_verbatim() {
    let (registry, editor) = setup();

    editor
        .register(&CandidateSchema::new("x", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();
    registry
        .force_incompatible("x", vec!["reader field missing".to_string()])
        .unwrap();

    let report = editor
        .check_compatibility(
            &CandidateSchema::new("x", ORDER_V2, SchemaType::Avro),
            VersionSpec::Latest,
        )
        .await
        .unwrap();

    assert!(!report.is_compatible);
    assert_eq!(report.messages, vec!["reader field missing".to_string()]);
    // A failed preview must never register anything on its own.
    assert_eq!(registry.subject_versions("x").await.unwrap(), vec![1]);
}

#[tokio::test]
async fn compatibility_preview_works_with_candidate_metadata() {
    let (_registry, editor) = setup();

    editor
        .register(&CandidateSchema::new("x", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();

    let candidate = CandidateSchema::new("x", ORDER_V2, SchemaType::Avro)
        .with_metadata(serde_json::json!({"tags": {"pii": ["note"]}}));
    let report = editor
        .check_compatibility(&candidate, VersionSpec::from(1))
        .await
        .unwrap();
    assert!(report.is_compatible);
}

#[tokio::test]
async fn failed_registration_leaves_the_catalog_untouched() {
    let (registry, editor) = setup();

    editor
        .register(&CandidateSchema::new("orders-value", ORDER_V1, SchemaType::Avro))
        .await
        .unwrap();

    let catalog = SubjectCatalog::new(registry.clone());
    let before = catalog.rows().await.unwrap();

    registry
        .put_subject_mode("orders-value", schema_registry_console::Mode::ReadOnly)
        .await
        .unwrap();

    let result = editor
        .register(&CandidateSchema::new("orders-value", ORDER_V2, SchemaType::Avro))
        .await;
    assert!(matches!(result, Err(RegistryError::Api { .. })));

    assert_eq!(catalog.rows().await.unwrap(), before);
    assert_eq!(
        registry.subject_versions("orders-value").await.unwrap(),
        vec![1]
    );
}
