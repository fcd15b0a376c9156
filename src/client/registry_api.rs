//! Typed registry API surface.
//!
//! One method per registry endpoint. Implementations return structured
//! [`RegistryError`](crate::error::RegistryError) values; classification of
//! HTTP statuses and error codes happens inside the implementation so that
//! callers only ever match on error variants.

use async_trait::async_trait;

use crate::error::RegistryResult;
use crate::types::{
    CompatibilityReport, ConfigPayload, ConfigUpdateRequest, Mode, RegisterSchemaRequest,
    RegisterSchemaResponse, RegisteredSchema, SchemaContent, ServerVersion, SubjectVersion,
    VersionSpec,
};

/// Operations exposed by a Confluent-compatible schema registry.
///
/// All operations are safe to retry except [`register_schema`], which may
/// create a new version on every call and must only be retried after a
/// transport failure.
///
/// [`register_schema`]: RegistryApi::register_schema
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// GET /subjects
    async fn subjects(&self) -> RegistryResult<Vec<String>>;

    /// GET /subjects/{subject}/versions
    async fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>>;

    /// GET /subjects/{subject}/versions/{version|latest}
    async fn schema_version(
        &self,
        subject: &str,
        version: VersionSpec,
    ) -> RegistryResult<RegisteredSchema>;

    /// GET /schemas/ids/{id}
    async fn schema_by_id(&self, id: u32) -> RegistryResult<SchemaContent>;

    /// GET /schemas/types
    async fn schema_types(&self) -> RegistryResult<Vec<String>>;

    /// GET /schemas/ids/{id}/versions — every subject/version pair that uses
    /// the given schema id
    async fn schema_usages(&self, id: u32) -> RegistryResult<Vec<SubjectVersion>>;

    /// POST /subjects/{subject}/versions
    async fn register_schema(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> RegistryResult<RegisterSchemaResponse>;

    /// POST /compatibility/subjects/{subject}/versions/{version|latest} —
    /// non-mutating preview of whether the candidate would be accepted
    async fn check_compatibility(
        &self,
        subject: &str,
        version: VersionSpec,
        request: &RegisterSchemaRequest,
    ) -> RegistryResult<CompatibilityReport>;

    /// DELETE /subjects/{subject}[?permanent=true] — returns the deleted
    /// version numbers
    async fn delete_subject(&self, subject: &str, permanent: bool) -> RegistryResult<Vec<u32>>;

    /// DELETE /subjects/{subject}/versions/{version}
    async fn delete_version(&self, subject: &str, version: u32) -> RegistryResult<u32>;

    /// GET /config
    async fn global_config(&self) -> RegistryResult<ConfigPayload>;

    /// GET /config/{subject} — `NotConfigured` when the subject has no
    /// override (error code 40408)
    async fn subject_config(&self, subject: &str) -> RegistryResult<ConfigPayload>;

    /// PUT /config
    async fn put_global_config(
        &self,
        update: &ConfigUpdateRequest,
    ) -> RegistryResult<ConfigPayload>;

    /// PUT /config/{subject}
    async fn put_subject_config(
        &self,
        subject: &str,
        update: &ConfigUpdateRequest,
    ) -> RegistryResult<ConfigPayload>;

    /// DELETE /config
    async fn delete_global_config(&self) -> RegistryResult<()>;

    /// DELETE /config/{subject}
    async fn delete_subject_config(&self, subject: &str) -> RegistryResult<()>;

    /// GET /mode
    async fn global_mode(&self) -> RegistryResult<Mode>;

    /// GET /mode/{subject} — `NotConfigured` when the subject has no
    /// override (error code 40409)
    async fn subject_mode(&self, subject: &str) -> RegistryResult<Mode>;

    /// PUT /mode
    async fn put_global_mode(&self, mode: Mode) -> RegistryResult<Mode>;

    /// PUT /mode/{subject}
    async fn put_subject_mode(&self, subject: &str, mode: Mode) -> RegistryResult<Mode>;

    /// DELETE /mode
    async fn delete_global_mode(&self) -> RegistryResult<()>;

    /// DELETE /mode/{subject}
    async fn delete_subject_mode(&self, subject: &str) -> RegistryResult<()>;

    /// GET /v1/metadata/version
    async fn server_version(&self) -> RegistryResult<ServerVersion>;
}
