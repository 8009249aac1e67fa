#![allow(clippy::unwrap_used, clippy::expect_used)]

//! `SeaORM` repositories against an in-memory `SQLite` schema.

mod common;

use directory_sync::domain::repo::{RepoError, SyncRepository};
use directory_sync::infra::storage::{SeaOrmDepartmentRepository, SeaOrmEmployeeRepository};
use directory_sync::{Department, Employee, EmploymentStatus, ListExclusion};
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

const CREATED: OffsetDateTime = datetime!(2026-01-01 00:00 UTC);

fn department(external_id: &str, code: &str, order: i32) -> Department {
    Department {
        id: Uuid::now_v7(),
        external_id: external_id.to_owned(),
        name: format!("Unit {external_id}"),
        code: code.to_owned(),
        display_order: order,
        manager_id: None,
        parent_id: None,
        external_created_at: None,
        external_updated_at: None,
        last_synced_at: Some(CREATED),
        created_at: CREATED,
        updated_at: CREATED,
        version: 1,
    }
}

fn employee(external_id: &str, number: &str, email: &str) -> Employee {
    Employee {
        id: Uuid::now_v7(),
        external_id: external_id.to_owned(),
        employee_number: number.to_owned(),
        name: format!("Person {external_id}"),
        email: Some(email.to_owned()),
        phone_number: None,
        date_of_birth: None,
        gender: None,
        hire_date: Some(time::macros::date!(2020 - 03 - 01)),
        status: EmploymentStatus::Active,
        department_id: Some("D1".to_owned()),
        department_name: None,
        department_code: None,
        position_id: None,
        position_name: None,
        rank_id: None,
        rank_name: None,
        rank_level: None,
        manager_id: None,
        roles: vec!["staff".to_owned()],
        exclusion: None,
        is_accessible: true,
        last_synced_at: Some(CREATED),
        created_at: CREATED,
        updated_at: CREATED,
        version: 1,
    }
}

async fn department_repo() -> SeaOrmDepartmentRepository {
    SeaOrmDepartmentRepository::new(common::migrated_db().await)
}

#[tokio::test]
async fn live_duplicate_external_id_is_a_unique_violation() {
    let repo = department_repo().await;
    repo.insert(&department("D1", "RND", 0)).await.unwrap();

    let err = repo.insert(&department("D1", "OPS", 0)).await.unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(_)), "{err:?}");
}

#[tokio::test]
async fn retired_row_releases_its_keys() {
    let repo = department_repo().await;
    let first = department("D1", "RND", 0);
    repo.insert(&first).await.unwrap();
    repo.soft_delete(first.id, CREATED).await.unwrap();

    assert!(repo.find_by_id(first.id).await.unwrap().is_none());
    repo.insert(&department("D1", "RND", 0)).await.unwrap();
    assert_eq!(repo.list_live().await.unwrap().len(), 1);

    let err = repo.soft_delete(first.id, CREATED).await.unwrap_err();
    assert_eq!(err, RepoError::NotFound { id: first.id });
}

#[tokio::test]
async fn update_is_conditional_on_version() {
    let repo = department_repo().await;
    let original = department("D1", "RND", 0);
    repo.insert(&original).await.unwrap();

    let mut renamed = original.clone();
    renamed.name = "R&D HQ".to_owned();
    let stored = repo.update(&renamed).await.unwrap();
    assert_eq!(stored.version, 2);

    // Written against version 1 again.
    let err = repo.update(&renamed).await.unwrap_err();
    assert_eq!(err, RepoError::StaleVersion { id: original.id });

    let current = repo.find_by_id(original.id).await.unwrap().unwrap();
    assert_eq!(current.name, "R&D HQ");
    assert_eq!(current.version, 2);
}

#[tokio::test]
async fn update_of_retired_row_is_not_found() {
    let repo = department_repo().await;
    let original = department("D1", "RND", 0);
    repo.insert(&original).await.unwrap();
    repo.soft_delete(original.id, CREATED).await.unwrap();

    let err = repo.update(&original).await.unwrap_err();
    assert_eq!(err, RepoError::NotFound { id: original.id });
}

#[tokio::test]
async fn merge_retires_duplicates_only_when_the_survivor_is_written() {
    let repo = department_repo().await;
    let survivor = department("D1", "OLD", 0);
    let duplicate = department("D7", "RND", 1);
    repo.insert(&survivor).await.unwrap();
    repo.insert(&duplicate).await.unwrap();

    let mut merged = survivor.clone();
    merged.code = "RND".to_owned();

    // Based on a version that is no longer stored: nothing may change.
    let mut stale = merged.clone();
    stale.version = 7;
    let err = repo
        .merge_duplicates(&stale, &[duplicate.id], CREATED)
        .await
        .unwrap_err();
    assert_eq!(err, RepoError::StaleVersion { id: survivor.id });
    assert!(repo.find_by_id(duplicate.id).await.unwrap().is_some());

    let stored = repo
        .merge_duplicates(&merged, &[duplicate.id], CREATED)
        .await
        .unwrap();
    assert_eq!(stored.version, 2);
    assert!(repo.find_by_id(duplicate.id).await.unwrap().is_none());
    let live = repo.list_live().await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].code, "RND");
}

#[tokio::test]
async fn bulk_upsert_is_all_or_nothing() {
    let repo = department_repo().await;
    let existing = department("D1", "RND", 0);
    repo.insert(&existing).await.unwrap();

    let mut renamed = existing.clone();
    renamed.name = "Renamed".to_owned();
    let clashing = department("D9", "RND", 1);

    let err = repo
        .bulk_upsert(&[clashing], std::slice::from_ref(&renamed))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let current = repo.find_by_id(existing.id).await.unwrap().unwrap();
    assert_eq!(current.name, existing.name);
    assert_eq!(current.version, 1);
    assert_eq!(repo.list_live().await.unwrap().len(), 1);
}

#[tokio::test]
async fn mark_synced_leaves_content_untouched() {
    let repo = department_repo().await;
    let original = department("D1", "RND", 0);
    repo.insert(&original).await.unwrap();

    let later = datetime!(2026-02-01 12:00 UTC);
    repo.mark_synced(&[original.id], later).await.unwrap();

    let current = repo.find_by_id(original.id).await.unwrap().unwrap();
    assert_eq!(current.last_synced_at, Some(later));
    assert_eq!(current.updated_at, original.updated_at);
    assert_eq!(current.version, 1);
    assert_eq!(repo.newest_synced_at().await.unwrap(), Some(later));
}

#[tokio::test]
async fn empty_table_has_no_sync_time() {
    let repo = department_repo().await;
    assert_eq!(repo.newest_synced_at().await.unwrap(), None);
}

#[tokio::test]
async fn departments_are_listed_by_display_order_then_code() {
    let repo = department_repo().await;
    repo.bulk_upsert(
        &[
            department("D3", "ZZZ", 0),
            department("D1", "BBB", 1),
            department("D2", "AAA", 1),
        ],
        &[],
    )
    .await
    .unwrap();

    let codes: Vec<_> = repo
        .list_live()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.code)
        .collect();
    assert_eq!(codes, ["ZZZ", "AAA", "BBB"]);
}

#[tokio::test]
async fn employee_round_trips_with_exclusion_and_roles() {
    let repo = SeaOrmEmployeeRepository::new(common::migrated_db().await);
    let mut kim = employee("E1", "1001", "kim@example.com");
    kim.exclusion = Some(ListExclusion {
        reason: "contractor".to_owned(),
        excluded_by: "hr-admin".to_owned(),
        excluded_at: datetime!(2026-01-02 08:30 UTC),
    });
    repo.insert(&kim).await.unwrap();

    let stored = repo.find_by_natural_key("1001").await.unwrap().unwrap();
    assert_eq!(stored, kim);

    let by_email = repo.find_by_secondary_key("kim@example.com").await.unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].id, kim.id);
    assert_eq!(
        repo.find_by_external_id("E1").await.unwrap().map(|e| e.id),
        Some(kim.id)
    );
}

#[tokio::test]
async fn shared_email_is_allowed() {
    let repo = SeaOrmEmployeeRepository::new(common::migrated_db().await);
    repo.bulk_upsert(
        &[
            employee("E1", "1001", "team@example.com"),
            employee("E2", "1002", "team@example.com"),
        ],
        &[],
    )
    .await
    .unwrap();

    assert_eq!(
        repo.find_by_secondary_key("team@example.com")
            .await
            .unwrap()
            .len(),
        2
    );
}
