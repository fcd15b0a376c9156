//! Scoped configuration and mode resolution.
//!
//! The registry keeps config and mode per scope: `global` plus one optional
//! override per subject. Each field is tri-state at subject scope — set
//! explicitly, inheriting the global value, or unset everywhere — and the
//! registry signals "no override" through the 40408/40409 error codes rather
//! than an empty body. The resolver absorbs those codes and produces one
//! [`EffectiveConfig`] per scope with the fallback already applied, field by
//! field.

use std::sync::Arc;

use crate::client::registry_api::RegistryApi;
use crate::error::{RegistryError, RegistryResult};
use crate::types::{CompatibilityLevel, ConfigPayload, ConfigUpdateRequest, Mode};

/// System defaults used when neither scope has a value
pub const DEFAULT_COMPATIBILITY: CompatibilityLevel = CompatibilityLevel::None;
pub const DEFAULT_NORMALIZE: bool = false;
pub const DEFAULT_MODE: Mode = Mode::ReadWrite;

/// A configuration scope: registry-wide or one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Subject(String),
}

impl ConfigScope {
    pub fn subject(name: impl Into<String>) -> Self {
        ConfigScope::Subject(name.into())
    }
}

impl std::fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigScope::Global => write!(f, "global"),
            ConfigScope::Subject(name) => write!(f, "{}", name),
        }
    }
}

/// A field value after scope resolution.
///
/// `Overridden` means the requested scope set the value itself, `Inherited`
/// means it came from the fallback chain (global scope or system default),
/// and `Unset` means no scope has a value and the field has no system
/// default (only the alias behaves this way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopedValue<T> {
    Unset,
    Inherited(T),
    Overridden(T),
}

impl<T> ScopedValue<T> {
    /// The value a caller should treat as authoritative, if any
    pub fn effective(&self) -> Option<&T> {
        match self {
            ScopedValue::Unset => None,
            ScopedValue::Inherited(v) | ScopedValue::Overridden(v) => Some(v),
        }
    }

    pub fn into_effective(self) -> Option<T> {
        match self {
            ScopedValue::Unset => None,
            ScopedValue::Inherited(v) | ScopedValue::Overridden(v) => Some(v),
        }
    }

    pub fn is_overridden(&self) -> bool {
        matches!(self, ScopedValue::Overridden(_))
    }
}

/// Fully resolved configuration for one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub compatibility: ScopedValue<CompatibilityLevel>,
    pub alias: ScopedValue<String>,
    pub normalize: ScopedValue<bool>,
    pub mode: ScopedValue<Mode>,
}

impl EffectiveConfig {
    /// Effective compatibility level; never absent because the system
    /// default backstops the chain
    pub fn compatibility_level(&self) -> CompatibilityLevel {
        *self.compatibility.effective().unwrap_or(&DEFAULT_COMPATIBILITY)
    }

    pub fn normalize(&self) -> bool {
        *self.normalize.effective().unwrap_or(&DEFAULT_NORMALIZE)
    }

    pub fn mode(&self) -> Mode {
        *self.mode.effective().unwrap_or(&DEFAULT_MODE)
    }
}

/// Per-field fallback: subject override, then global, then system default.
/// Fields never share fallback state with each other.
fn resolve_field<T>(subject: Option<T>, global: Option<T>, default: Option<T>) -> ScopedValue<T> {
    match subject {
        Some(v) => ScopedValue::Overridden(v),
        None => match global.or(default) {
            Some(v) => ScopedValue::Inherited(v),
            None => ScopedValue::Unset,
        },
    }
}

/// Resolves effective config/mode per scope and applies scoped updates
pub struct ConfigResolver {
    api: Arc<dyn RegistryApi>,
}

impl ConfigResolver {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        Self { api }
    }

    /// Produce the effective configuration for a scope, with every tri-state
    /// field resolved independently.
    pub async fn resolve(&self, scope: &ConfigScope) -> RegistryResult<EffectiveConfig> {
        match scope {
            ConfigScope::Global => self.resolve_global().await,
            ConfigScope::Subject(subject) => self.resolve_subject(subject).await,
        }
    }

    async fn resolve_global(&self) -> RegistryResult<EffectiveConfig> {
        let (config, mode) = tokio::join!(self.api.global_config(), self.api.global_mode());
        let config = config?;
        let mode = absorb_not_configured(mode)?;

        Ok(EffectiveConfig {
            compatibility: resolve_field(
                config.compatibility_level,
                None,
                Some(DEFAULT_COMPATIBILITY),
            ),
            alias: resolve_field(config.alias, None, None),
            normalize: resolve_field(config.normalize, None, Some(DEFAULT_NORMALIZE)),
            // The mode endpoint fills the default at global scope, so
            // explicitness is not observable there.
            mode: ScopedValue::Inherited(mode.unwrap_or(DEFAULT_MODE)),
        })
    }

    async fn resolve_subject(&self, subject: &str) -> RegistryResult<EffectiveConfig> {
        let (subject_config, global_config, subject_mode, global_mode) = tokio::join!(
            self.api.subject_config(subject),
            self.api.global_config(),
            self.api.subject_mode(subject),
            self.api.global_mode(),
        );

        let subject_config = absorb_not_configured(subject_config)?.unwrap_or_default();
        let global_config = global_config?;
        let subject_mode = absorb_not_configured(subject_mode)?;
        let global_mode = absorb_not_configured(global_mode)?;

        Ok(EffectiveConfig {
            compatibility: resolve_field(
                subject_config.compatibility_level,
                global_config.compatibility_level,
                Some(DEFAULT_COMPATIBILITY),
            ),
            alias: resolve_field(subject_config.alias, global_config.alias, None),
            normalize: resolve_field(
                subject_config.normalize,
                global_config.normalize,
                Some(DEFAULT_NORMALIZE),
            ),
            mode: resolve_field(subject_mode, global_mode, Some(DEFAULT_MODE)),
        })
    }

    async fn put_config(
        &self,
        scope: &ConfigScope,
        update: &ConfigUpdateRequest,
    ) -> RegistryResult<ConfigPayload> {
        match scope {
            ConfigScope::Global => self.api.put_global_config(update).await,
            ConfigScope::Subject(subject) => self.api.put_subject_config(subject, update).await,
        }
    }

    /// Set the compatibility level at a scope. A subject-scope write becomes
    /// an override; a global write changes the fallback for every subject
    /// without one.
    pub async fn set_compatibility(
        &self,
        scope: &ConfigScope,
        level: CompatibilityLevel,
    ) -> RegistryResult<()> {
        self.put_config(
            scope,
            &ConfigUpdateRequest {
                compatibility: Some(level),
                ..Default::default()
            },
        )
        .await?;
        log::info!("Set compatibility level {} for scope '{}'", level, scope);
        Ok(())
    }

    pub async fn set_normalize(&self, scope: &ConfigScope, normalize: bool) -> RegistryResult<()> {
        self.put_config(
            scope,
            &ConfigUpdateRequest {
                normalize: Some(normalize),
                ..Default::default()
            },
        )
        .await?;
        log::info!("Set normalize={} for scope '{}'", normalize, scope);
        Ok(())
    }

    /// Set the alias at a scope. An alias write is known to clear the stored
    /// compatibility level on the server side, so the scope is re-read after
    /// the write and the post-write state returned instead of trusting any
    /// locally held value.
    pub async fn set_alias(
        &self,
        scope: &ConfigScope,
        alias: impl Into<String>,
    ) -> RegistryResult<EffectiveConfig> {
        let alias = alias.into();
        self.put_config(
            scope,
            &ConfigUpdateRequest {
                alias: Some(alias.clone()),
                ..Default::default()
            },
        )
        .await?;
        log::info!("Set alias '{}' for scope '{}'", alias, scope);
        self.resolve(scope).await
    }

    pub async fn set_mode(&self, scope: &ConfigScope, mode: Mode) -> RegistryResult<Mode> {
        let applied = match scope {
            ConfigScope::Global => self.api.put_global_mode(mode).await?,
            ConfigScope::Subject(subject) => self.api.put_subject_mode(subject, mode).await?,
        };
        log::info!("Set mode {} for scope '{}'", applied, scope);
        Ok(applied)
    }

    /// Remove a subject's config override (compatibility, alias, normalize),
    /// returning those fields to inherit-from-global. The mode override is
    /// untouched.
    pub async fn clear_subject_config(&self, subject: &str) -> RegistryResult<()> {
        if let Err(e) = self.api.delete_subject_config(subject).await {
            if !e.is_not_configured() {
                return Err(e);
            }
        }
        log::info!("Cleared config override for subject '{}'", subject);
        Ok(())
    }

    /// Remove a subject's mode override, returning the mode to
    /// inherit-from-global. Config fields are untouched.
    pub async fn clear_subject_mode(&self, subject: &str) -> RegistryResult<()> {
        if let Err(e) = self.api.delete_subject_mode(subject).await {
            if !e.is_not_configured() {
                return Err(e);
            }
        }
        log::info!("Cleared mode override for subject '{}'", subject);
        Ok(())
    }

    /// Remove both the config and mode overrides for a subject
    pub async fn clear_subject(&self, subject: &str) -> RegistryResult<()> {
        self.clear_subject_config(subject).await?;
        self.clear_subject_mode(subject).await
    }

    /// Reset the global scope to system defaults. Deleting the global config
    /// does not reset the global mode on the server side, so both deletes
    /// are issued.
    pub async fn reset_global(&self) -> RegistryResult<()> {
        self.api.delete_global_config().await?;
        if let Err(e) = self.api.delete_global_mode().await {
            if !e.is_not_configured() {
                return Err(e);
            }
        }
        log::info!("Reset global config and mode to system defaults");
        Ok(())
    }
}

fn absorb_not_configured<T>(result: RegistryResult<T>) -> RegistryResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RegistryError::NotConfigured { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_shadows_global_and_default() {
        let resolved = resolve_field(
            Some(CompatibilityLevel::Full),
            Some(CompatibilityLevel::Backward),
            Some(DEFAULT_COMPATIBILITY),
        );
        assert_eq!(resolved, ScopedValue::Overridden(CompatibilityLevel::Full));
    }

    #[test]
    fn global_value_inherited_when_no_override() {
        let resolved = resolve_field(
            None,
            Some(CompatibilityLevel::Backward),
            Some(DEFAULT_COMPATIBILITY),
        );
        assert_eq!(
            resolved,
            ScopedValue::Inherited(CompatibilityLevel::Backward)
        );
    }

    #[test]
    fn system_default_backstops_the_chain() {
        let resolved = resolve_field(None, None, Some(DEFAULT_COMPATIBILITY));
        assert_eq!(resolved, ScopedValue::Inherited(CompatibilityLevel::None));
    }

    #[test]
    fn alias_has_no_system_default() {
        let resolved: ScopedValue<String> = resolve_field(None, None, None);
        assert_eq!(resolved, ScopedValue::Unset);
        assert!(resolved.effective().is_none());
    }
}
