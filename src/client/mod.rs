//! Registry client components.
//!
//! The [`RegistryApi`] trait is the seam between the management components
//! and the wire: [`RegistryClient`] speaks HTTP to a real registry, while
//! [`InMemoryRegistry`] models the same semantics in-process for tests and
//! local development.

pub mod memory;
pub mod registry_api;
pub mod registry_client;

pub use memory::InMemoryRegistry;
pub use registry_api::RegistryApi;
pub use registry_client::{AuthConfig, RegistryClient, RegistryClientConfig};
