//! Schema staging and registration.
//!
//! A candidate schema is raw text plus its declared type and optional
//! references/metadata/rule set. The editor checks the text is well-formed
//! for its type before anything goes over the wire (deep semantic validation
//! is the registry's job), offers a pure pretty-print transform, previews
//! compatibility without registering, and submits the candidate — the same
//! wire operation whether the subject already exists or not.

use std::sync::Arc;

use serde_json::Value;

use crate::client::registry_api::RegistryApi;
use crate::error::{RegistryError, RegistryResult};
use crate::types::{
    CompatibilityReport, RegisterSchemaRequest, SchemaReference, SchemaType, VersionSpec,
};

/// A schema staged for registration
#[derive(Debug, Clone)]
pub struct CandidateSchema {
    pub subject: String,
    pub schema: String,
    pub schema_type: SchemaType,
    pub references: Vec<SchemaReference>,
    pub metadata: Option<Value>,
    pub rule_set: Option<Value>,
}

impl CandidateSchema {
    pub fn new(
        subject: impl Into<String>,
        schema: impl Into<String>,
        schema_type: SchemaType,
    ) -> Self {
        Self {
            subject: subject.into(),
            schema: schema.into(),
            schema_type,
            references: Vec::new(),
            metadata: None,
            rule_set: None,
        }
    }

    pub fn with_references(mut self, references: Vec<SchemaReference>) -> Self {
        self.references = references;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_rule_set(mut self, rule_set: Value) -> Self {
        self.rule_set = Some(rule_set);
        self
    }

    fn to_request(&self) -> RegisterSchemaRequest {
        RegisterSchemaRequest {
            schema: self.schema.clone(),
            schema_type: Some(self.schema_type),
            references: self.references.clone(),
            metadata: self.metadata.clone(),
            rule_set: self.rule_set.clone(),
        }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Globally unique schema id assigned by the registry
    pub id: u32,
    /// Version number assigned under the subject
    pub version: u32,
    /// True when the registration created the subject
    pub created_subject: bool,
}

/// Validates, formats, and submits candidate schemas
pub struct SchemaEditor {
    api: Arc<dyn RegistryApi>,
}

impl SchemaEditor {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        Self { api }
    }

    /// Check the candidate text is syntactically plausible for its declared
    /// type. AVRO and JSON schemas must parse as JSON; PROTOBUF is IDL text
    /// and only checked for non-emptiness. Fails locally, before any
    /// request.
    pub fn validate(candidate: &CandidateSchema) -> RegistryResult<()> {
        if candidate.schema.trim().is_empty() {
            return Err(RegistryError::invalid_schema("schema text is empty"));
        }
        match candidate.schema_type {
            SchemaType::Avro | SchemaType::Json => {
                serde_json::from_str::<Value>(&candidate.schema).map_err(|e| {
                    RegistryError::invalid_schema(format!(
                        "{} schema is not valid JSON: {}",
                        candidate.schema_type, e
                    ))
                })?;
            }
            SchemaType::Protobuf => {}
        }
        Ok(())
    }

    /// Re-serialize a JSON schema with stable 2-space indentation. Pure and
    /// idempotent; parsed content is unchanged. Only ever applied on
    /// explicit request.
    pub fn pretty_print(schema: &str) -> RegistryResult<String> {
        let value: Value = serde_json::from_str(schema)
            .map_err(|e| RegistryError::invalid_schema(format!("not valid JSON: {}", e)))?;
        serde_json::to_string_pretty(&value).map_err(|e| {
            RegistryError::protocol("pretty-print", format!("failed to serialize: {}", e))
        })
    }

    /// Preview whether the candidate would be accepted against an existing
    /// subject version. Non-mutating; diagnostics are passed through
    /// verbatim and never cached.
    pub async fn check_compatibility(
        &self,
        candidate: &CandidateSchema,
        against: VersionSpec,
    ) -> RegistryResult<CompatibilityReport> {
        Self::validate(candidate)?;
        self.api
            .check_compatibility(&candidate.subject, against, &candidate.to_request())
            .await
    }

    /// Register the candidate as the first version of a new subject or the
    /// next version of an existing one. On failure nothing is changed
    /// locally; on success the outcome carries the registry-assigned id and
    /// version, and the caller should invalidate its catalog.
    pub async fn register(&self, candidate: &CandidateSchema) -> RegistryResult<RegistrationOutcome> {
        Self::validate(candidate)?;

        let existed = match self.api.subject_versions(&candidate.subject).await {
            Ok(versions) => !versions.is_empty(),
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };

        let response = self
            .api
            .register_schema(&candidate.subject, &candidate.to_request())
            .await?;

        let version = match response.version {
            Some(version) => version,
            None => self.assigned_version(&candidate.subject, response.id).await?,
        };

        log::info!(
            "Registered schema id {} as version {} of {} subject '{}'",
            response.id,
            version,
            if existed { "existing" } else { "new" },
            candidate.subject
        );

        Ok(RegistrationOutcome {
            id: response.id,
            version,
            created_subject: !existed,
        })
    }

    /// Discover which version the registry assigned when the registration
    /// response carries only an id (older registries).
    async fn assigned_version(&self, subject: &str, id: u32) -> RegistryResult<u32> {
        if let Ok(usages) = self.api.schema_usages(id).await {
            if let Some(usage) = usages.iter().find(|u| u.subject == subject) {
                return Ok(usage.version);
            }
        }
        let latest = self.api.schema_version(subject, VersionSpec::Latest).await?;
        Ok(latest.version)
    }
}
