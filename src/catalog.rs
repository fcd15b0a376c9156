//! Subject catalog aggregation.
//!
//! The registry has no batch endpoint for "subjects with details", so a
//! listing view needs one name-list call plus two calls per subject (version
//! list and latest schema). The catalog runs the per-subject enrichment as a
//! bounded-concurrency fan-out with per-row error capture: one failing
//! subject degrades to an errored row instead of aborting the build, and
//! only a failing name-list fetch fails the whole operation.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;

use crate::client::registry_api::RegistryApi;
use crate::error::RegistryResult;
use crate::types::{RegisteredSchema, SchemaType, VersionSpec};

/// Configuration for catalog builds
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Maximum number of subjects enriched concurrently
    pub max_parallel: usize,
    /// Timeout for one subject's enrichment (both calls together)
    pub item_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            item_timeout: Duration::from_secs(30),
        }
    }
}

/// Enrichment outcome for one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectDetail {
    Loaded {
        /// Registry-assigned version numbers, not necessarily contiguous
        /// after deletions
        versions: Vec<u32>,
        /// The `version` field of the `latest` lookup — never computed
        /// locally from the version list
        latest_version: u32,
        schema_type: SchemaType,
    },
    Failed {
        error: String,
    },
}

/// One row of the subject listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRow {
    pub name: String,
    pub detail: SubjectDetail,
}

impl SubjectRow {
    pub fn is_failed(&self) -> bool {
        matches!(self.detail, SubjectDetail::Failed { .. })
    }
}

/// Consistent view of all subjects with their versions and latest schema.
///
/// The last completed build is kept as a read-through snapshot; every
/// mutation routed through the catalog invalidates it after the remote call
/// succeeds.
pub struct SubjectCatalog {
    api: Arc<dyn RegistryApi>,
    config: CatalogConfig,
    snapshot: RwLock<Option<Vec<SubjectRow>>>,
}

impl SubjectCatalog {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        Self::with_config(api, CatalogConfig::default())
    }

    pub fn with_config(api: Arc<dyn RegistryApi>, config: CatalogConfig) -> Self {
        Self {
            api,
            config,
            snapshot: RwLock::new(None),
        }
    }

    /// Current rows, from the snapshot if one exists, otherwise freshly
    /// built. Rows are sorted by subject name.
    pub async fn rows(&self) -> RegistryResult<Vec<SubjectRow>> {
        if let Some(rows) = self.snapshot.read().await.as_ref() {
            return Ok(rows.clone());
        }
        self.refresh().await
    }

    /// Rebuild the catalog and replace the snapshot. Last completed fetch
    /// wins.
    pub async fn refresh(&self) -> RegistryResult<Vec<SubjectRow>> {
        let rows = self.build().await?;
        *self.snapshot.write().await = Some(rows.clone());
        Ok(rows)
    }

    /// Drop the snapshot so the next read rebuilds
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    /// Delete a subject (soft by default, permanent frees the name) and
    /// invalidate the snapshot. Returns the deleted version numbers.
    pub async fn delete_subject(
        &self,
        subject: &str,
        permanent: bool,
    ) -> RegistryResult<Vec<u32>> {
        let deleted = self.api.delete_subject(subject, permanent).await?;
        log::info!(
            "Deleted subject '{}' ({}), versions {:?}",
            subject,
            if permanent { "permanent" } else { "soft" },
            deleted
        );
        self.invalidate().await;
        Ok(deleted)
    }

    /// Delete one version of a subject and invalidate the snapshot
    pub async fn delete_version(&self, subject: &str, version: u32) -> RegistryResult<u32> {
        let deleted = self.api.delete_version(subject, version).await?;
        log::info!("Deleted version {} of subject '{}'", deleted, subject);
        self.invalidate().await;
        Ok(deleted)
    }

    async fn build(&self) -> RegistryResult<Vec<SubjectRow>> {
        // Only this fetch may fail the whole build.
        let names = self.api.subjects().await?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel));
        let mut join_set = JoinSet::new();

        for name in names {
            let api = Arc::clone(&self.api);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.config.item_timeout;

            join_set.spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return SubjectRow {
                            name,
                            detail: SubjectDetail::Failed {
                                error: "catalog build cancelled".to_string(),
                            },
                        }
                    }
                };

                let detail = match tokio::time::timeout(timeout, enrich(&*api, &name)).await {
                    Ok(Ok((versions, latest))) => SubjectDetail::Loaded {
                        versions,
                        latest_version: latest.version,
                        schema_type: latest.schema_type,
                    },
                    Ok(Err(e)) => {
                        log::warn!("Failed to enrich subject '{}': {}", name, e);
                        SubjectDetail::Failed {
                            error: e.to_string(),
                        }
                    }
                    Err(_) => {
                        log::warn!("Enrichment of subject '{}' timed out", name);
                        SubjectDetail::Failed {
                            error: format!("timed out after {:?}", timeout),
                        }
                    }
                };

                SubjectRow { name, detail }
            });
        }

        let mut rows = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(row) => rows.push(row),
                Err(join_error) => {
                    log::error!("Catalog enrichment task failed to join: {}", join_error);
                }
            }
        }

        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

/// The two per-subject lookups are independent and order-agnostic
async fn enrich(
    api: &dyn RegistryApi,
    subject: &str,
) -> RegistryResult<(Vec<u32>, RegisteredSchema)> {
    let (versions, latest) = tokio::join!(
        api.subject_versions(subject),
        api.schema_version(subject, VersionSpec::Latest),
    );
    Ok((versions?, latest?))
}
