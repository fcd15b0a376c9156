//! Error types for schema registry management operations.
//!
//! All remote failures are classified exactly once, in the HTTP client, from
//! the response status plus the registry's `{error_code, message}` error body.
//! Components downstream match on the variant, never on raw status codes.

use thiserror::Error;

/// Registry error code for "subject-level config not configured".
pub const ERROR_CODE_CONFIG_NOT_CONFIGURED: i32 = 40408;
/// Registry error code for "subject-level mode not configured".
pub const ERROR_CODE_MODE_NOT_CONFIGURED: i32 = 40409;

/// Failure taxonomy for all registry client operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No config/mode override exists at the requested scope (codes
    /// 40408/40409). Absorbed by the resolver, never surfaced to callers.
    #[error("no configuration set for scope '{scope}'")]
    NotConfigured { scope: String },

    /// Unknown subject, version, or schema id
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Incompatible schema or duplicate-registration conflict (HTTP 409/422)
    #[error("registry rejected the request (code {error_code}): {message}")]
    Conflict { error_code: i32, message: String },

    /// Any other error the registry reported with a structured body
    #[error("registry error (code {error_code}): {message}")]
    Api { error_code: i32, message: String },

    /// Network-level failure: connect, timeout, interrupted body
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Successful status but a body we could not decode
    #[error("unexpected response from {operation}: {message}")]
    Protocol { operation: String, message: String },

    /// Local validation failure; no request was sent
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
}

impl RegistryError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn protocol(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// True for the not-configured codes the resolver treats as "inherit"
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when retrying the same request cannot cause a duplicate effect
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Result type for registry management operations
pub type RegistryResult<T> = Result<T, RegistryError>;
