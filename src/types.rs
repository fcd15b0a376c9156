//! Wire and domain types for the schema registry management surface.
//!
//! Field names follow the registry's JSON conventions (camelCase keys,
//! SCREAMING_SNAKE_CASE enum values). One asymmetry is preserved on purpose:
//! config reads report `compatibilityLevel` while config writes send
//! `compatibility` — the registry API itself is shaped that way.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Serialization format of a registered schema. AVRO is the registry's
/// implicit default when the field is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    Avro,
    Protobuf,
    Json,
}

impl Default for SchemaType {
    fn default() -> Self {
        SchemaType::Avro
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Avro => write!(f, "AVRO"),
            SchemaType::Protobuf => write!(f, "PROTOBUF"),
            SchemaType::Json => write!(f, "JSON"),
        }
    }
}

/// Compatibility rule governing acceptance of new schema versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityLevel {
    None,
    Backward,
    BackwardTransitive,
    Forward,
    ForwardTransitive,
    Full,
    FullTransitive,
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityLevel::None => write!(f, "NONE"),
            CompatibilityLevel::Backward => write!(f, "BACKWARD"),
            CompatibilityLevel::BackwardTransitive => write!(f, "BACKWARD_TRANSITIVE"),
            CompatibilityLevel::Forward => write!(f, "FORWARD"),
            CompatibilityLevel::ForwardTransitive => write!(f, "FORWARD_TRANSITIVE"),
            CompatibilityLevel::Full => write!(f, "FULL"),
            CompatibilityLevel::FullTransitive => write!(f, "FULL_TRANSITIVE"),
        }
    }
}

/// Read/write gate for a scope. READONLY blocks new version registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "READWRITE")]
    ReadWrite,
    #[serde(rename = "READONLY")]
    ReadOnly,
    #[serde(rename = "READONLY_OVERRIDE")]
    ReadOnlyOverride,
    #[serde(rename = "IMPORT")]
    Import,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::ReadWrite => write!(f, "READWRITE"),
            Mode::ReadOnly => write!(f, "READONLY"),
            Mode::ReadOnlyOverride => write!(f, "READONLY_OVERRIDE"),
            Mode::Import => write!(f, "IMPORT"),
        }
    }
}

/// Reference from one registered schema to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReference {
    pub name: String,
    pub subject: String,
    pub version: u32,
}

/// A schema as stored under a subject/version pair. Immutable once created;
/// "editing" always registers a new version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredSchema {
    pub subject: String,
    pub version: u32,
    pub id: u32,
    #[serde(rename = "schemaType", default)]
    pub schema_type: SchemaType,
    pub schema: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(rename = "ruleSet", default, skip_serializing_if = "Option::is_none")]
    pub rule_set: Option<Value>,
}

/// Schema content as returned by the by-id lookup, which carries no
/// subject/version context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaContent {
    pub schema: String,
    #[serde(rename = "schemaType", default)]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

/// One subject/version pair using a given schema id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectVersion {
    pub subject: String,
    pub version: u32,
}

/// Body for POST /subjects/{subject}/versions and the compatibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSchemaRequest {
    pub schema: String,
    #[serde(rename = "schemaType", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(rename = "ruleSet", default, skip_serializing_if = "Option::is_none")]
    pub rule_set: Option<Value>,
}

/// Registration response. Older registries return only the id; the assigned
/// version must then be discovered separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSchemaResponse {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// Result of a compatibility check. Messages are only populated when the
/// registry runs in verbose mode; they are surfaced verbatim either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub is_compatible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// Scoped config as reported by GET /config and GET /config/{subject}.
/// Every field is optional: a subject scope stores only its overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPayload {
    #[serde(
        rename = "compatibilityLevel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub compatibility_level: Option<CompatibilityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}

/// Body for PUT /config and PUT /config/{subject}. The compatibility key is
/// spelled differently from the read side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdateRequest {
    #[serde(rename = "compatibility", skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<CompatibilityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}

/// Body for GET/PUT /mode and /mode/{subject}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModePayload {
    pub mode: Mode,
}

/// Registry server build information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerVersion {
    pub version: String,
    #[serde(rename = "commitId", default)]
    pub commit_id: String,
}

/// Structured error body the registry attaches to failed responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: i32,
    pub message: String,
}

/// Version selector for the lookup endpoints that accept a number or the
/// literal token `latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSpec {
    Latest,
    Number(u32),
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Latest => write!(f, "latest"),
            VersionSpec::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<u32> for VersionSpec {
    fn from(version: u32) -> Self {
        VersionSpec::Number(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_type_defaults_to_avro_when_absent() {
        let schema: RegisteredSchema = serde_json::from_str(
            r#"{"subject":"orders-value","version":3,"id":7,"schema":"{}"}"#,
        )
        .unwrap();
        assert_eq!(schema.schema_type, SchemaType::Avro);
        assert!(schema.references.is_empty());
    }

    #[test]
    fn mode_wire_names_have_no_underscore_in_readwrite() {
        assert_eq!(serde_json::to_string(&Mode::ReadWrite).unwrap(), "\"READWRITE\"");
        assert_eq!(
            serde_json::to_string(&Mode::ReadOnlyOverride).unwrap(),
            "\"READONLY_OVERRIDE\""
        );
        let parsed: Mode = serde_json::from_str("\"READONLY\"").unwrap();
        assert_eq!(parsed, Mode::ReadOnly);
    }

    #[test]
    fn config_update_uses_short_compatibility_key() {
        let update = ConfigUpdateRequest {
            compatibility: Some(CompatibilityLevel::FullTransitive),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"compatibility":"FULL_TRANSITIVE"}"#
        );

        let payload: ConfigPayload =
            serde_json::from_str(r#"{"compatibilityLevel":"BACKWARD"}"#).unwrap();
        assert_eq!(
            payload.compatibility_level,
            Some(CompatibilityLevel::Backward)
        );
    }

    #[test]
    fn version_spec_renders_latest_token() {
        assert_eq!(VersionSpec::Latest.to_string(), "latest");
        assert_eq!(VersionSpec::from(12).to_string(), "12");
    }
}
