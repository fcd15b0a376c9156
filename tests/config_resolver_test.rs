//! Tests for scoped config resolution: tri-state fields, global fallback,
//! reset semantics, and the alias-write coupling.

use std::sync::Arc;

use schema_registry_console::{
    CompatibilityLevel, ConfigResolver, ConfigScope, InMemoryRegistry, Mode, RegistryApi,
    ScopedValue,
};

fn setup() -> (Arc<InMemoryRegistry>, ConfigResolver) {
    let registry = Arc::new(InMemoryRegistry::new());
    let resolver = ConfigResolver::new(registry.clone());
    (registry, resolver)
}

#[tokio::test]
async fn untouched_subject_resolves_to_system_defaults() {
    let (_registry, resolver) = setup();
    let scope = ConfigScope::subject("orders");

    let effective = resolver.resolve(&scope).await.unwrap();

    assert_eq!(
        effective.compatibility,
        ScopedValue::Inherited(CompatibilityLevel::None)
    );
    assert_eq!(effective.alias, ScopedValue::Unset);
    assert_eq!(effective.normalize, ScopedValue::Inherited(false));
    assert_eq!(effective.mode, ScopedValue::Inherited(Mode::ReadWrite));
}

#[tokio::test]
async fn subject_without_override_inherits_global_value() {
    let (_registry, resolver) = setup();

    resolver
        .set_compatibility(&ConfigScope::Global, CompatibilityLevel::Backward)
        .await
        .unwrap();

    let subject = resolver
        .resolve(&ConfigScope::subject("orders"))
        .await
        .unwrap();
    let global = resolver.resolve(&ConfigScope::Global).await.unwrap();

    assert_eq!(
        subject.compatibility,
        ScopedValue::Inherited(CompatibilityLevel::Backward)
    );
    assert_eq!(
        subject.compatibility_level(),
        global.compatibility_level()
    );
}

#[tokio::test]
async fn fields_fall_back_independently() {
    // Global config unset; subject has only a normalize override. The
    // normalize override must not drag compatibility along with it.
    let (_registry, resolver) = setup();
    let scope = ConfigScope::subject("orders");

    resolver.set_normalize(&scope, true).await.unwrap();

    let subject = resolver.resolve(&scope).await.unwrap();
    let global = resolver.resolve(&ConfigScope::Global).await.unwrap();

    assert_eq!(subject.normalize, ScopedValue::Overridden(true));
    assert_eq!(
        subject.compatibility_level(),
        global.compatibility_level()
    );
    assert_eq!(subject.compatibility_level(), CompatibilityLevel::None);
}

#[tokio::test]
async fn override_shadows_global_until_cleared() {
    let (_registry, resolver) = setup();
    let scope = ConfigScope::subject("orders");

    resolver
        .set_compatibility(&ConfigScope::Global, CompatibilityLevel::Full)
        .await
        .unwrap();
    resolver
        .set_compatibility(&scope, CompatibilityLevel::Backward)
        .await
        .unwrap();

    let effective = resolver.resolve(&scope).await.unwrap();
    assert_eq!(
        effective.compatibility,
        ScopedValue::Overridden(CompatibilityLevel::Backward)
    );

    resolver.clear_subject_config("orders").await.unwrap();

    let effective = resolver.resolve(&scope).await.unwrap();
    assert_eq!(
        effective.compatibility,
        ScopedValue::Inherited(CompatibilityLevel::Full)
    );
}

#[tokio::test]
async fn clearing_config_override_leaves_mode_override_alone() {
    let (_registry, resolver) = setup();
    let scope = ConfigScope::subject("orders");

    resolver
        .set_compatibility(&scope, CompatibilityLevel::Forward)
        .await
        .unwrap();
    resolver.set_mode(&scope, Mode::Import).await.unwrap();

    resolver.clear_subject_config("orders").await.unwrap();

    let effective = resolver.resolve(&scope).await.unwrap();
    assert_eq!(
        effective.compatibility,
        ScopedValue::Inherited(CompatibilityLevel::None)
    );
    assert_eq!(effective.mode, ScopedValue::Overridden(Mode::Import));

    resolver.clear_subject_mode("orders").await.unwrap();
    let effective = resolver.resolve(&scope).await.unwrap();
    assert_eq!(effective.mode, ScopedValue::Inherited(Mode::ReadWrite));
}

#[tokio::test]
async fn clearing_an_untouched_subject_is_not_an_error() {
    let (_registry, resolver) = setup();
    resolver.clear_subject("never-configured").await.unwrap();
}

#[tokio::test]
async fn reset_global_restores_mode_to_readwrite() {
    let (registry, resolver) = setup();

    resolver
        .set_compatibility(&ConfigScope::Global, CompatibilityLevel::FullTransitive)
        .await
        .unwrap();
    resolver
        .set_mode(&ConfigScope::Global, Mode::ReadOnly)
        .await
        .unwrap();

    // Deleting global config alone would leave the mode READONLY; the
    // resolver's reset issues the mode delete as well.
    resolver.reset_global().await.unwrap();

    let effective = resolver.resolve(&ConfigScope::Global).await.unwrap();
    assert_eq!(effective.compatibility_level(), CompatibilityLevel::None);
    assert_eq!(effective.mode(), Mode::ReadWrite);
    assert_eq!(registry.global_mode().await.unwrap(), Mode::ReadWrite);
}

#[tokio::test]
async fn alias_write_is_refetched_and_exposes_compatibility_reset() {
    let (_registry, resolver) = setup();
    let scope = ConfigScope::subject("orders");

    resolver
        .set_compatibility(&ConfigScope::Global, CompatibilityLevel::Backward)
        .await
        .unwrap();
    resolver
        .set_compatibility(&scope, CompatibilityLevel::Full)
        .await
        .unwrap();

    // The registry clears the stored subject compatibility on an alias-only
    // write; the returned state must reflect that, not the stale override.
    let after_alias = resolver.set_alias(&scope, "orders-v2").await.unwrap();

    assert_eq!(
        after_alias.alias,
        ScopedValue::Overridden("orders-v2".to_string())
    );
    assert_eq!(
        after_alias.compatibility,
        ScopedValue::Inherited(CompatibilityLevel::Backward)
    );
}

#[tokio::test]
async fn global_alias_is_inherited_by_subjects() {
    let (_registry, resolver) = setup();

    resolver
        .set_alias(&ConfigScope::Global, "cluster-alias")
        .await
        .unwrap();

    let subject = resolver
        .resolve(&ConfigScope::subject("orders"))
        .await
        .unwrap();
    assert_eq!(
        subject.alias,
        ScopedValue::Inherited("cluster-alias".to_string())
    );
}
