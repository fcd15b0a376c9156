//! # schema-registry-console
//!
//! Management client core for Confluent-compatible schema registries:
//! subjects, versions, schemas, and scoped config/mode settings.
//!
//! ## Architecture
//!
//! - **Registry client** (`client`): typed request/response wrapper over the
//!   registry's REST surface, with an object-safe [`RegistryApi`] trait, an
//!   HTTP implementation ([`RegistryClient`]), and a full-semantics
//!   in-memory implementation ([`InMemoryRegistry`]) for tests and local
//!   development.
//! - **Config resolver** (`resolver`): tri-state scope model for
//!   compatibility level, alias, normalization, and mode, with
//!   subject-to-global fallback and reset-to-default semantics.
//! - **Subject catalog** (`catalog`): concurrent aggregation of subject
//!   names, version lists, and latest schemas into one consistent listing,
//!   with per-row error capture and a snapshot cache invalidated on every
//!   mutation.
//! - **Schema editor** (`editor`): candidate validation, pretty-printing,
//!   compatibility preview, and registration of new subjects or versions.
//!
//! The remote registry owns all entities; this crate holds only a transient
//! projection that is re-fetched after every successful mutation.

pub mod catalog;
pub mod client;
pub mod editor;
pub mod error;
pub mod resolver;
pub mod types;

pub use catalog::{CatalogConfig, SubjectCatalog, SubjectDetail, SubjectRow};
pub use client::{AuthConfig, InMemoryRegistry, RegistryApi, RegistryClient, RegistryClientConfig};
pub use editor::{CandidateSchema, RegistrationOutcome, SchemaEditor};
pub use error::{RegistryError, RegistryResult};
pub use resolver::{ConfigResolver, ConfigScope, EffectiveConfig, ScopedValue};
pub use types::{
    CompatibilityLevel, CompatibilityReport, ConfigPayload, ConfigUpdateRequest, Mode,
    RegisterSchemaRequest, RegisterSchemaResponse, RegisteredSchema, SchemaContent,
    SchemaReference, SchemaType, ServerVersion, SubjectVersion, VersionSpec,
};
