use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::records::SyncRecord;

/// Storage failures the sync engine needs to tell apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// A unique index (external id, natural key) rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The stored version no longer matches the version the write was based on.
    #[error("record {id} was modified concurrently")]
    StaleVersion { id: Uuid },

    #[error("record {id} not found")]
    NotFound { id: Uuid },

    #[error("{0}")]
    Database(String),
}

impl RepoError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::UniqueViolation(_) | Self::StaleVersion { .. })
    }
}

/// Repository for one synchronized record kind.
///
/// Only live (not soft-deleted) records are visible through the finders.
/// The reconciler and the batch persister depend on this trait alone, never
/// on a query-builder vocabulary.
#[async_trait]
pub trait SyncRepository<R: SyncRecord>: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<R>, RepoError>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<R>, RepoError>;

    async fn find_by_natural_key(&self, key: &str) -> Result<Option<R>, RepoError>;

    /// Records sharing a non-unique secondary key (email for employees).
    async fn find_by_secondary_key(&self, key: &str) -> Result<Vec<R>, RepoError>;

    async fn list_live(&self) -> Result<Vec<R>, RepoError>;

    /// Newest `last_synced_at` across live records.
    async fn newest_synced_at(&self) -> Result<Option<OffsetDateTime>, RepoError>;

    /// Insert and update a whole batch atomically: either every write lands
    /// or none does.
    async fn bulk_upsert(&self, inserts: &[R], updates: &[R]) -> Result<(), RepoError>;

    async fn insert(&self, record: &R) -> Result<(), RepoError>;

    /// Write `record` if the stored version still equals `record.version()`.
    /// Returns the stored record with its bumped version.
    async fn update(&self, record: &R) -> Result<R, RepoError>;

    /// Advance `last_synced_at` without touching `updated_at` or `version`.
    async fn mark_synced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<(), RepoError>;

    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;

    /// Soft-delete `retired` and write `survivor` (version-checked) as one
    /// unit: when the survivor write fails nothing is retired. Ids that are
    /// already gone are ignored.
    async fn merge_duplicates(
        &self,
        survivor: &R,
        retired: &[Uuid],
        at: OffsetDateTime,
    ) -> Result<R, RepoError>;
}
