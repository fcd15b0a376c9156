//! HTTP implementation of the registry API.
//!
//! Thin typed wrapper over the registry's REST surface with authentication
//! and retry support. Retries use exponential backoff and never touch 4xx
//! responses; schema registration additionally restricts retries to
//! transport failures, because a second POST may register a second version.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::client::registry_api::RegistryApi;
use crate::error::{
    RegistryError, RegistryResult, ERROR_CODE_CONFIG_NOT_CONFIGURED, ERROR_CODE_MODE_NOT_CONFIGURED,
};
use crate::types::{
    CompatibilityReport, ConfigPayload, ConfigUpdateRequest, ErrorBody, Mode, ModePayload,
    RegisterSchemaRequest, RegisterSchemaResponse, RegisteredSchema, SchemaContent, ServerVersion,
    SubjectVersion, VersionSpec,
};

const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Authentication configuration for the registry connection
#[derive(Debug, Clone)]
pub enum AuthConfig {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
}

/// Configuration for the HTTP registry client
#[derive(Debug, Clone)]
pub struct RegistryClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum retry attempts for retryable failures
    pub max_retries: u32,
    /// Base retry delay in milliseconds, doubled per attempt
    pub retry_delay_ms: u64,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

/// Whether a request may be replayed after a non-transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPolicy {
    /// Safe to retry on transient server errors
    Idempotent,
    /// Only transport failures may be retried (registration)
    TransportOnly,
}

/// HTTP client for a Confluent-compatible schema registry
pub struct RegistryClient {
    base_url: String,
    auth: AuthConfig,
    http_client: Client,
    config: RegistryClientConfig,
}

impl RegistryClient {
    /// Create a client against the given base URL with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(base_url, RegistryClientConfig::default())
    }

    /// Create a client with explicit timeout/retry configuration
    pub fn with_config(base_url: impl Into<String>, config: RegistryClientConfig) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: AuthConfig::None,
            http_client: Client::new(),
            config,
        }
    }

    /// Set authentication for all subsequent requests
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        policy: RetryPolicy,
    ) -> RegistryResult<Response> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            let mut request = self
                .http_client
                .request(method.clone(), url)
                .header("Content-Type", CONTENT_TYPE)
                .timeout(Duration::from_secs(self.config.timeout_seconds));

            request = match &self.auth {
                AuthConfig::Basic { username, password } => {
                    request.basic_auth(username, Some(password))
                }
                AuthConfig::Bearer { token } => request.bearer_auth(token),
                AuthConfig::None => request,
            };

            if let Some(body_content) = &body {
                request = request.body(body_content.clone());
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    let error = classify_failure(status, &text, url);

                    let retryable =
                        status.is_server_error() && policy == RetryPolicy::Idempotent;
                    if !retryable {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(e) => {
                    // Transport failures are retryable under both policies:
                    // the request never reached the registry or the response
                    // never arrived intact.
                    last_error = Some(RegistryError::transport(url, e.to_string()));
                }
            }

            if attempt < self.config.max_retries {
                let delay = self.config.retry_delay_ms * 2_u64.pow(attempt);
                log::warn!(
                    "Registry request {} {} failed (attempt {}/{}), retrying in {}ms",
                    method,
                    url,
                    attempt + 1,
                    self.config.max_retries + 1,
                    delay
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| RegistryError::transport(url, "all retry attempts failed")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, operation: &str) -> RegistryResult<T> {
        let response = self
            .execute(Method::GET, url, None, RetryPolicy::Idempotent)
            .await?;
        decode(response, operation).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        policy: RetryPolicy,
        operation: &str,
    ) -> RegistryResult<T> {
        let response = self.execute(method, url, body, policy).await?;
        decode(response, operation).await
    }

    fn encode<B: serde::Serialize>(body: &B, operation: &str) -> RegistryResult<String> {
        serde_json::to_string(body)
            .map_err(|e| RegistryError::protocol(operation, format!("failed to encode body: {}", e)))
    }
}

async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> RegistryResult<T> {
    response
        .json()
        .await
        .map_err(|e| RegistryError::protocol(operation, format!("failed to parse body: {}", e)))
}

/// Map a non-success response onto the error taxonomy. The not-configured
/// codes take priority over the HTTP status: the registry reports them with
/// a 404 status even though no resource is actually missing.
fn classify_failure(status: StatusCode, body: &str, url: &str) -> RegistryError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();

    if let Some(error_body) = &parsed {
        if error_body.error_code == ERROR_CODE_CONFIG_NOT_CONFIGURED
            || error_body.error_code == ERROR_CODE_MODE_NOT_CONFIGURED
        {
            return RegistryError::NotConfigured {
                scope: scope_from_url(url),
            };
        }
    }

    let (error_code, message) = match parsed {
        Some(body) => (body.error_code, body.message),
        None => (
            status.as_u16() as i32,
            if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            },
        ),
    };

    match status {
        StatusCode::NOT_FOUND => RegistryError::NotFound { resource: message },
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => RegistryError::Conflict {
            error_code,
            message,
        },
        _ => RegistryError::Api {
            error_code,
            message,
        },
    }
}

fn scope_from_url(url: &str) -> String {
    let path = url.trim_end_matches('/');
    match path.rsplit_once('/') {
        Some((prefix, last)) if prefix.ends_with("/config") || prefix.ends_with("/mode") => {
            last.to_string()
        }
        _ => "global".to_string(),
    }
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn subjects(&self) -> RegistryResult<Vec<String>> {
        let url = format!("{}/subjects", self.base_url);
        self.get_json(&url, "list subjects").await
    }

    async fn subject_versions(&self, subject: &str) -> RegistryResult<Vec<u32>> {
        let url = format!("{}/subjects/{}/versions", self.base_url, subject);
        self.get_json(&url, "list subject versions").await
    }

    async fn schema_version(
        &self,
        subject: &str,
        version: VersionSpec,
    ) -> RegistryResult<RegisteredSchema> {
        let url = format!(
            "{}/subjects/{}/versions/{}",
            self.base_url, subject, version
        );
        self.get_json(&url, "get subject version").await
    }

    async fn schema_by_id(&self, id: u32) -> RegistryResult<SchemaContent> {
        let url = format!("{}/schemas/ids/{}", self.base_url, id);
        self.get_json(&url, "get schema by id").await
    }

    async fn schema_types(&self) -> RegistryResult<Vec<String>> {
        let url = format!("{}/schemas/types", self.base_url);
        self.get_json(&url, "list schema types").await
    }

    async fn schema_usages(&self, id: u32) -> RegistryResult<Vec<SubjectVersion>> {
        let url = format!("{}/schemas/ids/{}/versions", self.base_url, id);
        self.get_json(&url, "list schema usages").await
    }

    async fn register_schema(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> RegistryResult<RegisterSchemaResponse> {
        let url = format!("{}/subjects/{}/versions", self.base_url, subject);
        let body = Self::encode(request, "register schema")?;
        self.send_json(
            Method::POST,
            &url,
            Some(body),
            RetryPolicy::TransportOnly,
            "register schema",
        )
        .await
    }

    async fn check_compatibility(
        &self,
        subject: &str,
        version: VersionSpec,
        request: &RegisterSchemaRequest,
    ) -> RegistryResult<CompatibilityReport> {
        let url = format!(
            "{}/compatibility/subjects/{}/versions/{}?verbose=true",
            self.base_url, subject, version
        );
        let body = Self::encode(request, "check compatibility")?;
        self.send_json(
            Method::POST,
            &url,
            Some(body),
            RetryPolicy::Idempotent,
            "check compatibility",
        )
        .await
    }

    async fn delete_subject(&self, subject: &str, permanent: bool) -> RegistryResult<Vec<u32>> {
        let url = if permanent {
            format!("{}/subjects/{}?permanent=true", self.base_url, subject)
        } else {
            format!("{}/subjects/{}", self.base_url, subject)
        };
        self.send_json(
            Method::DELETE,
            &url,
            None,
            RetryPolicy::Idempotent,
            "delete subject",
        )
        .await
    }

    async fn delete_version(&self, subject: &str, version: u32) -> RegistryResult<u32> {
        let url = format!(
            "{}/subjects/{}/versions/{}",
            self.base_url, subject, version
        );
        self.send_json(
            Method::DELETE,
            &url,
            None,
            RetryPolicy::Idempotent,
            "delete subject version",
        )
        .await
    }

    async fn global_config(&self) -> RegistryResult<ConfigPayload> {
        let url = format!("{}/config", self.base_url);
        self.get_json(&url, "get global config").await
    }

    async fn subject_config(&self, subject: &str) -> RegistryResult<ConfigPayload> {
        let url = format!("{}/config/{}", self.base_url, subject);
        self.get_json(&url, "get subject config").await
    }

    async fn put_global_config(
        &self,
        update: &ConfigUpdateRequest,
    ) -> RegistryResult<ConfigPayload> {
        let url = format!("{}/config", self.base_url);
        let body = Self::encode(update, "update global config")?;
        self.send_json(
            Method::PUT,
            &url,
            Some(body),
            RetryPolicy::Idempotent,
            "update global config",
        )
        .await
    }

    async fn put_subject_config(
        &self,
        subject: &str,
        update: &ConfigUpdateRequest,
    ) -> RegistryResult<ConfigPayload> {
        let url = format!("{}/config/{}", self.base_url, subject);
        let body = Self::encode(update, "update subject config")?;
        self.send_json(
            Method::PUT,
            &url,
            Some(body),
            RetryPolicy::Idempotent,
            "update subject config",
        )
        .await
    }

    async fn delete_global_config(&self) -> RegistryResult<()> {
        let url = format!("{}/config", self.base_url);
        self.execute(Method::DELETE, &url, None, RetryPolicy::Idempotent)
            .await?;
        Ok(())
    }

    async fn delete_subject_config(&self, subject: &str) -> RegistryResult<()> {
        let url = format!("{}/config/{}", self.base_url, subject);
        self.execute(Method::DELETE, &url, None, RetryPolicy::Idempotent)
            .await?;
        Ok(())
    }

    async fn global_mode(&self) -> RegistryResult<Mode> {
        let url = format!("{}/mode", self.base_url);
        let payload: ModePayload = self.get_json(&url, "get global mode").await?;
        Ok(payload.mode)
    }

    async fn subject_mode(&self, subject: &str) -> RegistryResult<Mode> {
        let url = format!("{}/mode/{}", self.base_url, subject);
        let payload: ModePayload = self.get_json(&url, "get subject mode").await?;
        Ok(payload.mode)
    }

    async fn put_global_mode(&self, mode: Mode) -> RegistryResult<Mode> {
        let url = format!("{}/mode", self.base_url);
        let body = Self::encode(&ModePayload { mode }, "update global mode")?;
        let payload: ModePayload = self
            .send_json(
                Method::PUT,
                &url,
                Some(body),
                RetryPolicy::Idempotent,
                "update global mode",
            )
            .await?;
        Ok(payload.mode)
    }

    async fn put_subject_mode(&self, subject: &str, mode: Mode) -> RegistryResult<Mode> {
        let url = format!("{}/mode/{}", self.base_url, subject);
        let body = Self::encode(&ModePayload { mode }, "update subject mode")?;
        let payload: ModePayload = self
            .send_json(
                Method::PUT,
                &url,
                Some(body),
                RetryPolicy::Idempotent,
                "update subject mode",
            )
            .await?;
        Ok(payload.mode)
    }

    async fn delete_global_mode(&self) -> RegistryResult<()> {
        let url = format!("{}/mode", self.base_url);
        self.execute(Method::DELETE, &url, None, RetryPolicy::Idempotent)
            .await?;
        Ok(())
    }

    async fn delete_subject_mode(&self, subject: &str) -> RegistryResult<()> {
        let url = format!("{}/mode/{}", self.base_url, subject);
        self.execute(Method::DELETE, &url, None, RetryPolicy::Idempotent)
            .await?;
        Ok(())
    }

    async fn server_version(&self) -> RegistryResult<ServerVersion> {
        let url = format!("{}/v1/metadata/version", self.base_url);
        self.get_json(&url, "get server version").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_codes_win_over_404_status() {
        let body = r#"{"error_code":40408,"message":"Subject 'orders' does not have subject-level compatibility configured"}"#;
        let error = classify_failure(
            StatusCode::NOT_FOUND,
            body,
            "http://localhost:8081/config/orders",
        );
        assert!(error.is_not_configured());

        let body = r#"{"error_code":40409,"message":"Subject 'orders' does not have subject-level mode configured"}"#;
        let error = classify_failure(
            StatusCode::NOT_FOUND,
            body,
            "http://localhost:8081/mode/orders",
        );
        match error {
            RegistryError::NotConfigured { scope } => assert_eq!(scope, "orders"),
            other => panic!("expected NotConfigured, got {:?}", other),
        }
    }

    #[test]
    fn subject_not_found_stays_not_found() {
        let body = r#"{"error_code":40401,"message":"Subject 'missing' not found."}"#;
        let error = classify_failure(
            StatusCode::NOT_FOUND,
            body,
            "http://localhost:8081/subjects/missing/versions",
        );
        assert!(error.is_not_found());
    }

    #[test]
    fn conflict_statuses_map_to_conflict() {
        let body = r#"{"error_code":409,"message":"Schema being registered is incompatible with an earlier schema"}"#;
        let error = classify_failure(
            StatusCode::CONFLICT,
            body,
            "http://localhost:8081/subjects/orders/versions",
        );
        match error {
            RegistryError::Conflict { error_code, .. } => assert_eq!(error_code, 409),
            other => panic!("expected Conflict, got {:?}", other),
        }

        let error = classify_failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error_code":42201,"message":"Invalid schema"}"#,
            "http://localhost:8081/subjects/orders/versions",
        );
        assert!(matches!(error, RegistryError::Conflict { .. }));
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        let error = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>gateway error</html>",
            "http://localhost:8081/subjects",
        );
        match error {
            RegistryError::Api { error_code, .. } => assert_eq!(error_code, 500),
            other => panic!("expected Api, got {:?}", other),
        }
    }
}
