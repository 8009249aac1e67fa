//! Local client adapter implementing the SDK API trait.
//!
//! Bridges the domain service to `DirectorySyncApi` so that other in-process
//! consumers never see domain or storage types.

use std::sync::Arc;

use async_trait::async_trait;
use directory_sync_sdk::{
    Department, DirectorySyncApi, DirectorySyncError, Employee, EmployeeQuery, SyncKind,
    SyncRun,
};
use uuid::Uuid;

use crate::domain::service::DirectorySyncService;

pub struct DirectorySyncLocalClient {
    service: Arc<DirectorySyncService>,
}

impl DirectorySyncLocalClient {
    #[must_use]
    pub fn new(service: Arc<DirectorySyncService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DirectorySyncApi for DirectorySyncLocalClient {
    // === Sync ===

    async fn sync_departments(&self, force: bool) -> Result<SyncRun, DirectorySyncError> {
        self.service
            .sync_departments(force)
            .await
            .map_err(Into::into)
    }

    async fn sync_employees(
        &self,
        force: bool,
        use_hierarchy_feed: bool,
    ) -> Result<SyncRun, DirectorySyncError> {
        self.service
            .sync_employees(force, use_hierarchy_feed)
            .await
            .map_err(Into::into)
    }

    async fn last_sync_run(&self, kind: SyncKind) -> Result<Option<SyncRun>, DirectorySyncError> {
        Ok(self.service.last_run(kind))
    }

    // === Departments ===

    async fn get_departments(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<Department>, DirectorySyncError> {
        self.service
            .get_departments(force_refresh)
            .await
            .map_err(Into::into)
    }

    async fn get_department(
        &self,
        id: Uuid,
        force_refresh: bool,
    ) -> Result<Department, DirectorySyncError> {
        self.service
            .get_department(id, force_refresh)
            .await
            .map_err(Into::into)
    }

    async fn get_department_by_code(
        &self,
        code: &str,
        force_refresh: bool,
    ) -> Result<Department, DirectorySyncError> {
        self.service
            .get_department_by_code(code, force_refresh)
            .await
            .map_err(Into::into)
    }

    // === Employees ===

    async fn get_employees(
        &self,
        query: EmployeeQuery,
    ) -> Result<Vec<Employee>, DirectorySyncError> {
        self.service.get_employees(query).await.map_err(Into::into)
    }

    async fn get_employee(
        &self,
        id: Uuid,
        force_refresh: bool,
    ) -> Result<Employee, DirectorySyncError> {
        self.service
            .get_employee(id, force_refresh)
            .await
            .map_err(Into::into)
    }

    async fn get_employee_by_number(
        &self,
        employee_number: &str,
        force_refresh: bool,
    ) -> Result<Employee, DirectorySyncError> {
        self.service
            .get_employee_by_number(employee_number, force_refresh)
            .await
            .map_err(Into::into)
    }

    async fn resolve_manager(
        &self,
        employee_id: Uuid,
    ) -> Result<Option<Employee>, DirectorySyncError> {
        self.service
            .resolve_manager(employee_id)
            .await
            .map_err(Into::into)
    }

    // === Exclusion ===

    async fn exclude_employee(
        &self,
        id: Uuid,
        reason: String,
        actor: String,
    ) -> Result<Employee, DirectorySyncError> {
        self.service
            .exclude_employee(id, &reason, &actor)
            .await
            .map_err(Into::into)
    }

    async fn include_employee(&self, id: Uuid) -> Result<Employee, DirectorySyncError> {
        self.service
            .include_employee(id)
            .await
            .map_err(Into::into)
    }
}
