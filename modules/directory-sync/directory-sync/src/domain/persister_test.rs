#[cfg(test)]
mod tests {
    use super::super::fixtures::department;
    use super::super::persister::BatchPersister;
    use super::super::reconcile::ReconcilePlan;
    use super::super::repo::{RepoError, SyncRepository};
    use crate::infra::storage::in_memory_repo::InMemoryRepository;
    use async_trait::async_trait;
    use directory_sync_sdk::Department;
    use std::sync::Arc;
    use time::OffsetDateTime;
    use time::macros::datetime;
    use tracing_test::traced_test;
    use uuid::Uuid;

    const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

    fn plan(inserts: Vec<Department>, updates: Vec<Department>) -> ReconcilePlan<Department> {
        ReconcilePlan {
            to_insert: inserts,
            to_update: updates,
            ..ReconcilePlan::default()
        }
    }

    // Rejects every write as a uniqueness violation and never finds a holder.
    struct AlwaysConflicting;

    #[async_trait]
    impl SyncRepository<Department> for AlwaysConflicting {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Department>, RepoError> {
            Ok(None)
        }
        async fn find_by_external_id(&self, _: &str) -> Result<Option<Department>, RepoError> {
            Ok(None)
        }
        async fn find_by_natural_key(&self, _: &str) -> Result<Option<Department>, RepoError> {
            Ok(None)
        }
        async fn find_by_secondary_key(&self, _: &str) -> Result<Vec<Department>, RepoError> {
            Ok(Vec::new())
        }
        async fn list_live(&self) -> Result<Vec<Department>, RepoError> {
            Ok(Vec::new())
        }
        async fn newest_synced_at(&self) -> Result<Option<OffsetDateTime>, RepoError> {
            Ok(None)
        }
        async fn bulk_upsert(&self, _: &[Department], _: &[Department]) -> Result<(), RepoError> {
            Err(RepoError::UniqueViolation("departments_code".to_owned()))
        }
        async fn insert(&self, _: &Department) -> Result<(), RepoError> {
            Err(RepoError::UniqueViolation("departments_code".to_owned()))
        }
        async fn update(&self, record: &Department) -> Result<Department, RepoError> {
            Err(RepoError::StaleVersion { id: record.id })
        }
        async fn mark_synced(&self, _: &[Uuid], _: OffsetDateTime) -> Result<(), RepoError> {
            Ok(())
        }
        async fn soft_delete(&self, id: Uuid, _: OffsetDateTime) -> Result<(), RepoError> {
            Err(RepoError::NotFound { id })
        }
        async fn merge_duplicates(
            &self,
            survivor: &Department,
            _: &[Uuid],
            _: OffsetDateTime,
        ) -> Result<Department, RepoError> {
            Err(RepoError::StaleVersion { id: survivor.id })
        }
    }

    // In-memory store whose merge write fails with a storage error.
    struct BrokenMerge(Arc<InMemoryRepository<Department>>);

    #[async_trait]
    impl SyncRepository<Department> for BrokenMerge {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>, RepoError> {
            self.0.find_by_id(id).await
        }
        async fn find_by_external_id(&self, id: &str) -> Result<Option<Department>, RepoError> {
            self.0.find_by_external_id(id).await
        }
        async fn find_by_natural_key(&self, key: &str) -> Result<Option<Department>, RepoError> {
            self.0.find_by_natural_key(key).await
        }
        async fn find_by_secondary_key(&self, key: &str) -> Result<Vec<Department>, RepoError> {
            self.0.find_by_secondary_key(key).await
        }
        async fn list_live(&self) -> Result<Vec<Department>, RepoError> {
            self.0.list_live().await
        }
        async fn newest_synced_at(&self) -> Result<Option<OffsetDateTime>, RepoError> {
            self.0.newest_synced_at().await
        }
        async fn bulk_upsert(&self, i: &[Department], u: &[Department]) -> Result<(), RepoError> {
            self.0.bulk_upsert(i, u).await
        }
        async fn insert(&self, record: &Department) -> Result<(), RepoError> {
            self.0.insert(record).await
        }
        async fn update(&self, record: &Department) -> Result<Department, RepoError> {
            self.0.update(record).await
        }
        async fn mark_synced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<(), RepoError> {
            self.0.mark_synced(ids, at).await
        }
        async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
            self.0.soft_delete(id, at).await
        }
        async fn merge_duplicates(
            &self,
            _: &Department,
            _: &[Uuid],
            _: OffsetDateTime,
        ) -> Result<Department, RepoError> {
            Err(RepoError::Database("disk full".to_owned()))
        }
    }

    #[tokio::test]
    async fn test_clean_batch_is_written_in_bulk() {
        let repo = Arc::new(InMemoryRepository::<Department>::new());
        let persister = BatchPersister::<Department>::new(repo.clone());

        let outcome = persister
            .persist(
                &plan(
                    vec![department("D1", "RND", "R&D"), department("D2", "OPS", "Ops")],
                    vec![],
                ),
                NOW,
            )
            .await;

        assert_eq!(outcome.created, 2);
        assert!(outcome.errors.is_empty());
        assert_eq!(repo.list_live().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_racing_insert_is_merged_onto_existing_record() {
        let repo = Arc::new(InMemoryRepository::<Department>::new());
        let existing = department("OLD", "RND", "R&D");
        repo.insert(&existing).await.unwrap();
        let persister = BatchPersister::<Department>::new(repo.clone());

        // Another writer created RND between snapshot and write.
        let outcome = persister
            .persist(
                &plan(
                    vec![department("NEW", "RND", "R&D HQ"), department("D2", "OPS", "Ops")],
                    vec![],
                ),
                NOW,
            )
            .await;

        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.updated, 1);
        assert!(outcome.errors.is_empty());

        let merged = repo.find_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(merged.external_id, "NEW");
        assert_eq!(merged.name, "R&D HQ");
        assert_eq!(merged.version, existing.version + 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_colliding_duplicates_converge_to_one_live_record() {
        let repo = Arc::new(InMemoryRepository::<Department>::new());
        let by_external = department("D1", "OLD-CODE", "R&D");
        let by_code = department("D7", "RND", "Research");
        repo.insert(&by_external).await.unwrap();
        repo.insert(&by_code).await.unwrap();
        let persister = BatchPersister::<Department>::new(repo.clone());

        let mut incoming = by_external.clone();
        incoming.code = "RND".to_owned();
        incoming.name = "R&D HQ".to_owned();

        let outcome = persister.persist(&plan(vec![], vec![incoming]), NOW).await;

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.retired, 1);
        assert!(outcome.errors.is_empty());

        let live = repo.list_live().await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, by_external.id);
        assert_eq!(live[0].code, "RND");
        assert_eq!(live[0].name, "R&D HQ");
        assert_eq!(repo.total_rows(), 2);
        assert!(logs_contain("retired duplicate local record"));
    }

    #[tokio::test]
    async fn test_failed_merge_keeps_the_duplicate_live() {
        let store = Arc::new(InMemoryRepository::<Department>::new());
        let by_external = department("D1", "OLD-CODE", "R&D");
        let by_code = department("D7", "RND", "Research");
        store.insert(&by_external).await.unwrap();
        store.insert(&by_code).await.unwrap();
        let persister = BatchPersister::<Department>::new(Arc::new(BrokenMerge(store.clone())));

        let mut incoming = by_external.clone();
        incoming.code = "RND".to_owned();

        let outcome = persister.persist(&plan(vec![], vec![incoming]), NOW).await;

        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.retired, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(store.find_by_id(by_code.id).await.unwrap().is_some());
        let untouched = store.find_by_id(by_external.id).await.unwrap().unwrap();
        assert_eq!(untouched.code, "OLD-CODE");
    }

    #[tokio::test]
    async fn test_in_memory_merge_is_all_or_nothing() {
        let store = InMemoryRepository::<Department>::new();
        let keep = department("D1", "OLD-CODE", "R&D");
        let dup = department("D7", "RND", "Research");
        store.insert(&keep).await.unwrap();
        store.insert(&dup).await.unwrap();

        let mut stale = keep.clone();
        stale.version += 5;
        stale.code = "RND".to_owned();
        let err = store
            .merge_duplicates(&stale, &[dup.id], NOW)
            .await
            .unwrap_err();
        assert_eq!(err, RepoError::StaleVersion { id: keep.id });
        assert_eq!(store.list_live().await.unwrap().len(), 2);

        let mut merged = keep.clone();
        merged.code = "RND".to_owned();
        let stored = store.merge_duplicates(&merged, &[dup.id], NOW).await.unwrap();
        assert_eq!(stored.version, keep.version + 1);
        assert_eq!(store.list_live().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_conflict_is_reported_not_thrown() {
        let persister = BatchPersister::<Department>::new(Arc::new(AlwaysConflicting));

        let outcome = persister
            .persist(&plan(vec![department("D1", "RND", "R&D")], vec![]), NOW)
            .await;

        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("D1:RND"), "{:?}", outcome.errors);
    }

    #[tokio::test]
    async fn test_unchanged_records_are_marked_synced() {
        let repo = Arc::new(InMemoryRepository::<Department>::new());
        let d = department("D1", "RND", "R&D");
        repo.insert(&d).await.unwrap();
        let persister = BatchPersister::<Department>::new(repo.clone());

        let p = ReconcilePlan {
            unchanged: vec![d.id],
            ..ReconcilePlan::default()
        };
        let outcome = persister.persist(&p, NOW).await;

        assert_eq!(outcome, Default::default());
        let stored = repo.find_by_id(d.id).await.unwrap().unwrap();
        assert_eq!(stored.last_synced_at, Some(NOW));
        assert_eq!(stored.updated_at, d.updated_at);
        assert_eq!(stored.version, d.version);
    }
}
