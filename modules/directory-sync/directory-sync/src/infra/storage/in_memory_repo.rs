//! Process-local repository with the same uniqueness and versioning rules as
//! the database schema. Used by unit tests and for ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::records::SyncRecord;
use crate::domain::repo::{RepoError, SyncRepository};

#[derive(Clone)]
struct Row<R> {
    record: R,
    deleted_at: Option<OffsetDateTime>,
}

pub struct InMemoryRepository<R: SyncRecord> {
    rows: RwLock<HashMap<Uuid, Row<R>>>,
}

impl<R: SyncRecord> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<R: SyncRecord> InMemoryRepository<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows including soft-deleted ones.
    pub fn total_rows(&self) -> usize {
        self.rows.read().len()
    }
}

fn check_unique<R: SyncRecord>(
    rows: &HashMap<Uuid, Row<R>>,
    record: &R,
) -> Result<(), RepoError> {
    for row in rows.values() {
        if row.deleted_at.is_some() || row.record.id() == record.id() {
            continue;
        }
        if row.record.external_id() == record.external_id() {
            return Err(RepoError::UniqueViolation(format!(
                "external_id {}",
                record.external_id()
            )));
        }
        if row.record.natural_key() == record.natural_key() {
            return Err(RepoError::UniqueViolation(format!(
                "natural key {}",
                record.natural_key()
            )));
        }
    }
    Ok(())
}

fn insert_row<R: SyncRecord>(
    rows: &mut HashMap<Uuid, Row<R>>,
    record: &R,
) -> Result<(), RepoError> {
    if rows.contains_key(&record.id()) {
        return Err(RepoError::UniqueViolation(format!("id {}", record.id())));
    }
    check_unique(rows, record)?;
    rows.insert(
        record.id(),
        Row {
            record: record.clone(),
            deleted_at: None,
        },
    );
    Ok(())
}

fn update_row<R: SyncRecord>(
    rows: &mut HashMap<Uuid, Row<R>>,
    record: &R,
) -> Result<R, RepoError> {
    let stored_version = match rows.get(&record.id()) {
        Some(row) if row.deleted_at.is_none() => row.record.version(),
        _ => return Err(RepoError::NotFound { id: record.id() }),
    };
    if stored_version != record.version() {
        return Err(RepoError::StaleVersion { id: record.id() });
    }
    check_unique(rows, record)?;

    let mut next = record.clone();
    next.set_version(stored_version + 1);
    if let Some(row) = rows.get_mut(&record.id()) {
        row.record = next.clone();
    }
    Ok(next)
}

#[async_trait]
impl<R: SyncRecord> SyncRepository<R> for InMemoryRepository<R> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<R>, RepoError> {
        Ok(self
            .rows
            .read()
            .get(&id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.record.clone()))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<R>, RepoError> {
        Ok(self
            .rows
            .read()
            .values()
            .find(|row| row.deleted_at.is_none() && row.record.external_id() == external_id)
            .map(|row| row.record.clone()))
    }

    async fn find_by_natural_key(&self, key: &str) -> Result<Option<R>, RepoError> {
        Ok(self
            .rows
            .read()
            .values()
            .find(|row| row.deleted_at.is_none() && row.record.natural_key() == key)
            .map(|row| row.record.clone()))
    }

    async fn find_by_secondary_key(&self, key: &str) -> Result<Vec<R>, RepoError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|row| row.deleted_at.is_none() && row.record.secondary_key() == Some(key))
            .map(|row| row.record.clone())
            .collect())
    }

    async fn list_live(&self) -> Result<Vec<R>, RepoError> {
        let mut live: Vec<R> = self
            .rows
            .read()
            .values()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.record.clone())
            .collect();
        live.sort_by(|a, b| a.natural_key().cmp(b.natural_key()));
        Ok(live)
    }

    async fn newest_synced_at(&self) -> Result<Option<OffsetDateTime>, RepoError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|row| row.deleted_at.is_none())
            .filter_map(|row| row.record.last_synced_at())
            .max())
    }

    async fn bulk_upsert(&self, inserts: &[R], updates: &[R]) -> Result<(), RepoError> {
        let mut rows = self.rows.write();
        // Apply to a scratch copy so a failure leaves nothing behind.
        let mut scratch = rows.clone();
        for record in updates {
            update_row(&mut scratch, record)?;
        }
        for record in inserts {
            insert_row(&mut scratch, record)?;
        }
        *rows = scratch;
        Ok(())
    }

    async fn insert(&self, record: &R) -> Result<(), RepoError> {
        insert_row(&mut self.rows.write(), record)
    }

    async fn update(&self, record: &R) -> Result<R, RepoError> {
        update_row(&mut self.rows.write(), record)
    }

    async fn mark_synced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<(), RepoError> {
        let mut rows = self.rows.write();
        for id in ids {
            if let Some(row) = rows.get_mut(id).filter(|row| row.deleted_at.is_none()) {
                row.record.set_last_synced_at(at);
            }
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        match self.rows.write().get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(at);
                Ok(())
            }
            _ => Err(RepoError::NotFound { id }),
        }
    }

    async fn merge_duplicates(
        &self,
        survivor: &R,
        retired: &[Uuid],
        at: OffsetDateTime,
    ) -> Result<R, RepoError> {
        let mut rows = self.rows.write();
        let mut scratch = rows.clone();
        for id in retired {
            if let Some(row) = scratch.get_mut(id).filter(|row| row.deleted_at.is_none()) {
                row.deleted_at = Some(at);
            }
        }
        let stored = update_row(&mut scratch, survivor)?;
        *rows = scratch;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use directory_sync_sdk::Department;
    use time::macros::datetime;

    use super::*;
    use crate::domain::fixtures::department;

    #[tokio::test]
    async fn test_update_requires_current_version() {
        let repo = InMemoryRepository::<Department>::new();
        let d = department("D1", "RND", "R&D");
        repo.insert(&d).await.unwrap();

        let stored = repo.update(&d).await.unwrap();
        assert_eq!(stored.version, 2);

        let err = repo.update(&d).await.unwrap_err();
        assert_eq!(err, RepoError::StaleVersion { id: d.id });
    }

    #[tokio::test]
    async fn test_failed_bulk_write_leaves_store_untouched() {
        let repo = InMemoryRepository::<Department>::new();
        repo.insert(&department("D1", "RND", "R&D")).await.unwrap();

        let res = repo
            .bulk_upsert(
                &[department("D2", "OPS", "Ops"), department("D3", "RND", "Clash")],
                &[],
            )
            .await;

        assert!(matches!(res, Err(RepoError::UniqueViolation(_))));
        assert_eq!(repo.total_rows(), 1);
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_free_their_keys() {
        let repo = InMemoryRepository::<Department>::new();
        let d = department("D1", "RND", "R&D");
        repo.insert(&d).await.unwrap();
        repo.soft_delete(d.id, datetime!(2026-03-01 0:00 UTC))
            .await
            .unwrap();

        repo.insert(&department("D1", "RND", "R&D again")).await.unwrap();
        assert_eq!(repo.list_live().await.unwrap().len(), 1);
        assert_eq!(repo.total_rows(), 2);
    }
}
