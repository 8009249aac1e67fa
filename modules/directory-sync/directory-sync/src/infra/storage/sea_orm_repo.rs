//! `SeaORM` implementations of `SyncRepository`.
//!
//! Soft-deleted rows stay in the tables but are invisible to every finder.
//! Conditional updates match on `(id, version)`; zero affected rows means the
//! row was either retired or bumped by a concurrent writer.

use async_trait::async_trait;
use directory_sync_sdk::{Department, Employee};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, SqlErr, TransactionTrait,
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::entity::{department, employee};
use super::mapper::{department_to_active_model, employee_to_active_model};
use crate::domain::repo::{RepoError, SyncRepository};

/// Rows per multi-row INSERT, well under `SQLite`'s bound-parameter limit.
const INSERT_CHUNK: usize = 500;

fn repo_err(e: DbErr) -> RepoError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => RepoError::UniqueViolation(msg),
        _ => RepoError::Database(e.to_string()),
    }
}

pub struct SeaOrmDepartmentRepository {
    db: DatabaseConnection,
}

impl SeaOrmDepartmentRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn insert_departments(
    conn: &impl ConnectionTrait,
    records: &[Department],
) -> Result<(), RepoError> {
    for chunk in records.chunks(INSERT_CHUNK) {
        department::Entity::insert_many(chunk.iter().map(department_to_active_model))
            .exec_without_returning(conn)
            .await
            .map_err(repo_err)?;
    }
    Ok(())
}

async fn update_department(
    conn: &impl ConnectionTrait,
    record: &Department,
) -> Result<Department, RepoError> {
    let mut model = department_to_active_model(record);
    model.id = NotSet;
    model.version = Set(record.version + 1);

    let res = department::Entity::update_many()
        .set(model)
        .filter(department::Column::Id.eq(record.id))
        .filter(department::Column::Version.eq(record.version))
        .filter(department::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .map_err(repo_err)?;

    if res.rows_affected == 0 {
        let live = department::Entity::find_by_id(record.id)
            .filter(department::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(repo_err)?;
        return Err(match live {
            Some(_) => RepoError::StaleVersion { id: record.id },
            None => RepoError::NotFound { id: record.id },
        });
    }

    let mut stored = record.clone();
    stored.version = record.version + 1;
    Ok(stored)
}

/// Soft-delete a live row. Returns whether a row was affected.
async fn retire_department(
    conn: &impl ConnectionTrait,
    id: Uuid,
    at: OffsetDateTime,
) -> Result<bool, RepoError> {
    let res = department::Entity::update_many()
        .col_expr(department::Column::DeletedAt, Expr::value(at))
        .col_expr(department::Column::UpdatedAt, Expr::value(at))
        .filter(department::Column::Id.eq(id))
        .filter(department::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .map_err(repo_err)?;
    Ok(res.rows_affected > 0)
}

#[async_trait]
impl SyncRepository<Department> for SeaOrmDepartmentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>, RepoError> {
        let found = department::Entity::find_by_id(id)
            .filter(department::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(found.map(Into::into))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Department>, RepoError> {
        let found = department::Entity::find()
            .filter(department::Column::ExternalId.eq(external_id))
            .filter(department::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(found.map(Into::into))
    }

    async fn find_by_natural_key(&self, key: &str) -> Result<Option<Department>, RepoError> {
        let found = department::Entity::find()
            .filter(department::Column::Code.eq(key))
            .filter(department::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(found.map(Into::into))
    }

    async fn find_by_secondary_key(&self, _key: &str) -> Result<Vec<Department>, RepoError> {
        Ok(Vec::new())
    }

    async fn list_live(&self) -> Result<Vec<Department>, RepoError> {
        let rows = department::Entity::find()
            .filter(department::Column::DeletedAt.is_null())
            .order_by_asc(department::Column::DisplayOrder)
            .order_by_asc(department::Column::Code)
            .all(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn newest_synced_at(&self) -> Result<Option<OffsetDateTime>, RepoError> {
        let newest = department::Entity::find()
            .filter(department::Column::DeletedAt.is_null())
            .filter(department::Column::LastSyncedAt.is_not_null())
            .order_by_desc(department::Column::LastSyncedAt)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(newest.and_then(|m| m.last_synced_at))
    }

    async fn bulk_upsert(
        &self,
        inserts: &[Department],
        updates: &[Department],
    ) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        for record in updates {
            update_department(&txn, record).await?;
        }
        insert_departments(&txn, inserts).await?;
        txn.commit().await.map_err(repo_err)
    }

    async fn insert(&self, record: &Department) -> Result<(), RepoError> {
        insert_departments(&self.db, std::slice::from_ref(record)).await
    }

    async fn update(&self, record: &Department) -> Result<Department, RepoError> {
        update_department(&self.db, record).await
    }

    async fn mark_synced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<(), RepoError> {
        if ids.is_empty() {
            return Ok(());
        }
        department::Entity::update_many()
            .col_expr(department::Column::LastSyncedAt, Expr::value(at))
            .filter(department::Column::Id.is_in(ids.iter().copied()))
            .filter(department::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        if retire_department(&self.db, id, at).await? {
            Ok(())
        } else {
            Err(RepoError::NotFound { id })
        }
    }

    async fn merge_duplicates(
        &self,
        survivor: &Department,
        retired: &[Uuid],
        at: OffsetDateTime,
    ) -> Result<Department, RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        for id in retired {
            retire_department(&txn, *id, at).await?;
        }
        let stored = update_department(&txn, survivor).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(stored)
    }
}

pub struct SeaOrmEmployeeRepository {
    db: DatabaseConnection,
}

impl SeaOrmEmployeeRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn insert_employees(
    conn: &impl ConnectionTrait,
    records: &[Employee],
) -> Result<(), RepoError> {
    for chunk in records.chunks(INSERT_CHUNK) {
        employee::Entity::insert_many(chunk.iter().map(employee_to_active_model))
            .exec_without_returning(conn)
            .await
            .map_err(repo_err)?;
    }
    Ok(())
}

async fn update_employee(
    conn: &impl ConnectionTrait,
    record: &Employee,
) -> Result<Employee, RepoError> {
    let mut model = employee_to_active_model(record);
    model.id = NotSet;
    model.version = Set(record.version + 1);

    let res = employee::Entity::update_many()
        .set(model)
        .filter(employee::Column::Id.eq(record.id))
        .filter(employee::Column::Version.eq(record.version))
        .filter(employee::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .map_err(repo_err)?;

    if res.rows_affected == 0 {
        let live = employee::Entity::find_by_id(record.id)
            .filter(employee::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(repo_err)?;
        return Err(match live {
            Some(_) => RepoError::StaleVersion { id: record.id },
            None => RepoError::NotFound { id: record.id },
        });
    }

    let mut stored = record.clone();
    stored.version = record.version + 1;
    Ok(stored)
}

/// Soft-delete a live row. Returns whether a row was affected.
async fn retire_employee(
    conn: &impl ConnectionTrait,
    id: Uuid,
    at: OffsetDateTime,
) -> Result<bool, RepoError> {
    let res = employee::Entity::update_many()
        .col_expr(employee::Column::DeletedAt, Expr::value(at))
        .col_expr(employee::Column::UpdatedAt, Expr::value(at))
        .filter(employee::Column::Id.eq(id))
        .filter(employee::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .map_err(repo_err)?;
    Ok(res.rows_affected > 0)
}

#[async_trait]
impl SyncRepository<Employee> for SeaOrmEmployeeRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, RepoError> {
        let found = employee::Entity::find_by_id(id)
            .filter(employee::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(found.map(Into::into))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Employee>, RepoError> {
        let found = employee::Entity::find()
            .filter(employee::Column::ExternalId.eq(external_id))
            .filter(employee::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(found.map(Into::into))
    }

    async fn find_by_natural_key(&self, key: &str) -> Result<Option<Employee>, RepoError> {
        let found = employee::Entity::find()
            .filter(employee::Column::EmployeeNumber.eq(key))
            .filter(employee::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(found.map(Into::into))
    }

    async fn find_by_secondary_key(&self, key: &str) -> Result<Vec<Employee>, RepoError> {
        let rows = employee::Entity::find()
            .filter(employee::Column::Email.eq(key))
            .filter(employee::Column::DeletedAt.is_null())
            .order_by_asc(employee::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_live(&self) -> Result<Vec<Employee>, RepoError> {
        let rows = employee::Entity::find()
            .filter(employee::Column::DeletedAt.is_null())
            .order_by_asc(employee::Column::EmployeeNumber)
            .all(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn newest_synced_at(&self) -> Result<Option<OffsetDateTime>, RepoError> {
        let newest = employee::Entity::find()
            .filter(employee::Column::DeletedAt.is_null())
            .filter(employee::Column::LastSyncedAt.is_not_null())
            .order_by_desc(employee::Column::LastSyncedAt)
            .one(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(newest.and_then(|m| m.last_synced_at))
    }

    async fn bulk_upsert(&self, inserts: &[Employee], updates: &[Employee]) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        for record in updates {
            update_employee(&txn, record).await?;
        }
        insert_employees(&txn, inserts).await?;
        txn.commit().await.map_err(repo_err)
    }

    async fn insert(&self, record: &Employee) -> Result<(), RepoError> {
        insert_employees(&self.db, std::slice::from_ref(record)).await
    }

    async fn update(&self, record: &Employee) -> Result<Employee, RepoError> {
        update_employee(&self.db, record).await
    }

    async fn mark_synced(&self, ids: &[Uuid], at: OffsetDateTime) -> Result<(), RepoError> {
        if ids.is_empty() {
            return Ok(());
        }
        employee::Entity::update_many()
            .col_expr(employee::Column::LastSyncedAt, Expr::value(at))
            .filter(employee::Column::Id.is_in(ids.iter().copied()))
            .filter(employee::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(repo_err)?;
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        if retire_employee(&self.db, id, at).await? {
            Ok(())
        } else {
            Err(RepoError::NotFound { id })
        }
    }

    async fn merge_duplicates(
        &self,
        survivor: &Employee,
        retired: &[Uuid],
        at: OffsetDateTime,
    ) -> Result<Employee, RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        for id in retired {
            retire_employee(&txn, *id, at).await?;
        }
        let stored = update_employee(&txn, survivor).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(stored)
    }
}
