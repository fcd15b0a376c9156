//! In-memory registry implementation.
//!
//! Models the remote registry's semantics in-process for tests and local
//! development, including the behaviors the resolver has to defend against:
//! an alias-only config write clears the stored compatibility level, and
//! deleting the global config does not reset the global mode.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::client::registry_api::RegistryApi;
use crate::error::{RegistryError, RegistryResult};
use crate::types::{
    CompatibilityReport, ConfigPayload, ConfigUpdateRequest, Mode, RegisterSchemaRequest,
    RegisterSchemaResponse, RegisteredSchema, SchemaContent, SchemaReference, SchemaType,
    ServerVersion, SubjectVersion, VersionSpec,
};

/// Registry error code for write attempts against a read-only scope
const ERROR_CODE_OPERATION_NOT_PERMITTED: i32 = 42205;

#[derive(Debug, Clone)]
struct StoredVersion {
    version: u32,
    id: u32,
    schema: String,
    schema_type: SchemaType,
    references: Vec<SchemaReference>,
    metadata: Option<Value>,
    rule_set: Option<Value>,
}

/// Per-subject storage. `last_version` survives soft deletion so that
/// version numbers keep increasing, matching registry behavior.
#[derive(Debug, Default)]
struct SubjectState {
    last_version: u32,
    versions: Vec<StoredVersion>,
}

#[derive(Default)]
struct RegistryState {
    subjects: HashMap<String, SubjectState>,
    /// Content dedup: identical schema text (per type) shares one global id
    ids_by_content: HashMap<(SchemaType, String), u32>,
    next_id: u32,
    global_config: ConfigPayload,
    subject_configs: HashMap<String, ConfigPayload>,
    global_mode: Option<Mode>,
    subject_modes: HashMap<String, Mode>,
    failing_latest: HashSet<String>,
    forced_incompatible: HashMap<String, Vec<String>>,
}

/// In-memory schema registry for testing and development
#[derive(Clone)]
pub struct InMemoryRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState {
                next_id: 1,
                ..Default::default()
            })),
        }
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|_| RegistryError::protocol("in-memory registry", "state lock poisoned"))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|_| RegistryError::protocol("in-memory registry", "state lock poisoned"))
    }

    /// Make the `latest` lookup for one subject fail with not-found. Used to
    /// exercise per-row degradation in catalog builds.
    pub fn fail_latest_for(&self, subject: &str) -> RegistryResult<()> {
        self.write()?.failing_latest.insert(subject.to_string());
        Ok(())
    }

    /// Force compatibility checks against a subject to report the given
    /// diagnostics.
    pub fn force_incompatible(&self, subject: &str, messages: Vec<String>) -> RegistryResult<()> {
        self.write()?
            .forced_incompatible
            .insert(subject.to_string(), messages);
        Ok(())
    }

    fn effective_mode(state: &RegistryState, subject: &str) -> Mode {
        state
            .subject_modes
            .get(subject)
            .copied()
            .or(state.global_mode)
            .unwrap_or(Mode::ReadWrite)
    }

    fn stored_to_schema(subject: &str, stored: &StoredVersion) -> RegisteredSchema {
        RegisteredSchema {
            subject: subject.to_string(),
            version: stored.version,
            id: stored.id,
            schema_type: stored.schema_type,
            schema: stored.schema.clone(),
            references: stored.references.clone(),
            metadata: stored.metadata.clone(),
            rule_set: stored.rule_set.clone(),
        }
    }
}

fn subject_not_found(subject: &str) -> RegistryError {
    RegistryError::not_found(format!("subject '{}'", subject))
}

/// Apply a config update the way the registry does: provided fields are
/// stored, and an alias write without an accompanying compatibility value
/// clears the stored compatibility level.
fn apply_config_update(stored: &mut ConfigPayload, update: &ConfigUpdateRequest) {
    if let Some(level) = update.compatibility {
        stored.compatibility_level = Some(level);
    }
    if let Some(normalize) = update.normalize {
        stored.normalize = Some(normalize);
    }
    if let Some(alias) = &update.alias {
        stored.alias = Some(alias.clone());
        if update.compatibility.is_none() {
            stored.compatibility_level = None;
        }
    }
}

#[async_trait]
impl RegistryApi for InMemoryRegistry {
    async fn subjects(&self) -> RegistryResult<Vec<String>> {
        let state = self.read()?;
        let mut names: Vec<String> = state
            .subjects
            .iter()
            .filter(|(_, s)| !s.versions.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>> {
        let state = self.read()?;
        let entry = state
            .subjects
            .get(subject)
            .filter(|s| !s.versions.is_empty())
            .ok_or_else(|| subject_not_found(subject))?;
        let mut versions: Vec<u32> = entry.versions.iter().map(|v| v.version).collect();
        versions.sort_unstable();
        Ok(versions)
    }

    async fn schema_version(
        &self,
        subject: &str,
        version: VersionSpec,
    ) -> RegistryResult<RegisteredSchema> {
        let state = self.read()?;
        if version == VersionSpec::Latest && state.failing_latest.contains(subject) {
            return Err(subject_not_found(subject));
        }
        let entry = state
            .subjects
            .get(subject)
            .filter(|s| !s.versions.is_empty())
            .ok_or_else(|| subject_not_found(subject))?;
        let stored = match version {
            VersionSpec::Latest => entry.versions.iter().max_by_key(|v| v.version),
            VersionSpec::Number(n) => entry.versions.iter().find(|v| v.version == n),
        }
        .ok_or_else(|| {
            RegistryError::not_found(format!("version {} of subject '{}'", version, subject))
        })?;
        Ok(Self::stored_to_schema(subject, stored))
    }

    async fn schema_by_id(&self, id: u32) -> RegistryResult<SchemaContent> {
        let state = self.read()?;
        for entry in state.subjects.values() {
            if let Some(stored) = entry.versions.iter().find(|v| v.id == id) {
                return Ok(SchemaContent {
                    schema: stored.schema.clone(),
                    schema_type: stored.schema_type,
                    references: stored.references.clone(),
                });
            }
        }
        Err(RegistryError::not_found(format!("schema id {}", id)))
    }

    async fn schema_types(&self) -> RegistryResult<Vec<String>> {
        Ok(vec![
            "JSON".to_string(),
            "PROTOBUF".to_string(),
            "AVRO".to_string(),
        ])
    }

    async fn schema_usages(&self, id: u32) -> RegistryResult<Vec<SubjectVersion>> {
        let state = self.read()?;
        let mut usages: Vec<SubjectVersion> = state
            .subjects
            .iter()
            .flat_map(|(name, entry)| {
                entry
                    .versions
                    .iter()
                    .filter(move |v| v.id == id)
                    .map(move |v| SubjectVersion {
                        subject: name.clone(),
                        version: v.version,
                    })
            })
            .collect();
        if usages.is_empty() {
            return Err(RegistryError::not_found(format!("schema id {}", id)));
        }
        usages.sort_by(|a, b| a.subject.cmp(&b.subject).then(a.version.cmp(&b.version)));
        Ok(usages)
    }

    async fn register_schema(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> RegistryResult<RegisterSchemaResponse> {
        let mut state = self.write()?;

        match Self::effective_mode(&state, subject) {
            Mode::ReadOnly | Mode::ReadOnlyOverride => {
                return Err(RegistryError::Api {
                    error_code: ERROR_CODE_OPERATION_NOT_PERMITTED,
                    message: format!("subject '{}' is in read-only mode", subject),
                });
            }
            Mode::ReadWrite | Mode::Import => {}
        }

        let schema_type = request.schema_type.unwrap_or_default();

        // Identical content under the same subject re-yields the existing
        // version instead of creating a new one.
        if let Some(entry) = state.subjects.get(subject) {
            if let Some(existing) = entry
                .versions
                .iter()
                .find(|v| v.schema == request.schema && v.schema_type == schema_type)
            {
                return Ok(RegisterSchemaResponse {
                    id: existing.id,
                    version: Some(existing.version),
                });
            }
        }

        let content_key = (schema_type, request.schema.clone());
        let id = match state.ids_by_content.get(&content_key) {
            Some(id) => *id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                state.ids_by_content.insert(content_key, id);
                id
            }
        };

        let entry = state.subjects.entry(subject.to_string()).or_default();
        entry.last_version += 1;
        let version = entry.last_version;
        entry.versions.push(StoredVersion {
            version,
            id,
            schema: request.schema.clone(),
            schema_type,
            references: request.references.clone(),
            metadata: request.metadata.clone(),
            rule_set: request.rule_set.clone(),
        });

        Ok(RegisterSchemaResponse {
            id,
            version: Some(version),
        })
    }

    async fn check_compatibility(
        &self,
        subject: &str,
        _version: VersionSpec,
        _request: &RegisterSchemaRequest,
    ) -> RegistryResult<CompatibilityReport> {
        let state = self.read()?;
        if let Some(messages) = state.forced_incompatible.get(subject) {
            return Ok(CompatibilityReport {
                is_compatible: false,
                messages: messages.clone(),
            });
        }
        if !state
            .subjects
            .get(subject)
            .map(|s| !s.versions.is_empty())
            .unwrap_or(false)
        {
            return Err(subject_not_found(subject));
        }
        Ok(CompatibilityReport {
            is_compatible: true,
            messages: Vec::new(),
        })
    }

    async fn delete_subject(&self, subject: &str, permanent: bool) -> RegistryResult<Vec<u32>> {
        let mut state = self.write()?;
        let entry = state
            .subjects
            .get_mut(subject)
            .ok_or_else(|| subject_not_found(subject))?;
        let mut deleted: Vec<u32> = entry.versions.iter().map(|v| v.version).collect();
        deleted.sort_unstable();
        entry.versions.clear();
        if permanent {
            // Permanent deletion frees the name: numbering restarts at 1.
            state.subjects.remove(subject);
        }
        Ok(deleted)
    }

    async fn delete_version(&self, subject: &str, version: u32) -> RegistryResult<u32> {
        let mut state = self.write()?;
        let entry = state
            .subjects
            .get_mut(subject)
            .filter(|s| !s.versions.is_empty())
            .ok_or_else(|| subject_not_found(subject))?;
        let index = entry
            .versions
            .iter()
            .position(|v| v.version == version)
            .ok_or_else(|| {
                RegistryError::not_found(format!("version {} of subject '{}'", version, subject))
            })?;
        entry.versions.remove(index);
        Ok(version)
    }

    async fn global_config(&self) -> RegistryResult<ConfigPayload> {
        Ok(self.read()?.global_config.clone())
    }

    async fn subject_config(&self, subject: &str) -> RegistryResult<ConfigPayload> {
        let state = self.read()?;
        state
            .subject_configs
            .get(subject)
            .cloned()
            .ok_or_else(|| RegistryError::NotConfigured {
                scope: subject.to_string(),
            })
    }

    async fn put_global_config(
        &self,
        update: &ConfigUpdateRequest,
    ) -> RegistryResult<ConfigPayload> {
        let mut state = self.write()?;
        apply_config_update(&mut state.global_config, update);
        Ok(state.global_config.clone())
    }

    async fn put_subject_config(
        &self,
        subject: &str,
        update: &ConfigUpdateRequest,
    ) -> RegistryResult<ConfigPayload> {
        let mut state = self.write()?;
        let stored = state
            .subject_configs
            .entry(subject.to_string())
            .or_default();
        apply_config_update(stored, update);
        Ok(stored.clone())
    }

    async fn delete_global_config(&self) -> RegistryResult<()> {
        // Clears config only. Global mode is left untouched; callers that
        // want a full reset must delete the mode as well.
        self.write()?.global_config = ConfigPayload::default();
        Ok(())
    }

    async fn delete_subject_config(&self, subject: &str) -> RegistryResult<()> {
        let mut state = self.write()?;
        state
            .subject_configs
            .remove(subject)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotConfigured {
                scope: subject.to_string(),
            })
    }

    async fn global_mode(&self) -> RegistryResult<Mode> {
        Ok(self.read()?.global_mode.unwrap_or(Mode::ReadWrite))
    }

    async fn subject_mode(&self, subject: &str) -> RegistryResult<Mode> {
        let state = self.read()?;
        state
            .subject_modes
            .get(subject)
            .copied()
            .ok_or_else(|| RegistryError::NotConfigured {
                scope: subject.to_string(),
            })
    }

    async fn put_global_mode(&self, mode: Mode) -> RegistryResult<Mode> {
        self.write()?.global_mode = Some(mode);
        Ok(mode)
    }

    async fn put_subject_mode(&self, subject: &str, mode: Mode) -> RegistryResult<Mode> {
        self.write()?.subject_modes.insert(subject.to_string(), mode);
        Ok(mode)
    }

    async fn delete_global_mode(&self) -> RegistryResult<()> {
        self.write()?.global_mode = None;
        Ok(())
    }

    async fn delete_subject_mode(&self, subject: &str) -> RegistryResult<()> {
        let mut state = self.write()?;
        state
            .subject_modes
            .remove(subject)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotConfigured {
                scope: subject.to_string(),
            })
    }

    async fn server_version(&self) -> RegistryResult<ServerVersion> {
        Ok(ServerVersion {
            version: format!("{}-in-memory", env!("CARGO_PKG_VERSION")),
            commit_id: String::new(),
        })
    }
}
