//! `DirectorySyncApi` trait definition.
//!
//! Read accessors go through the staleness gate: when the local copy is older
//! than the configured threshold they fire a background sync and return the
//! local data immediately. `force_refresh` awaits a forced sync instead.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::DirectorySyncError;
use crate::models::{Department, Employee, EmployeeQuery, SyncKind, SyncRun};

/// Public API trait for the `directory_sync` module.
#[async_trait]
pub trait DirectorySyncApi: Send + Sync {
    /// Synchronize departments. `force` bypasses the enabled flag and
    /// rewrites every matched record.
    async fn sync_departments(&self, force: bool) -> Result<SyncRun, DirectorySyncError>;

    /// Synchronize employees, optionally reading the hierarchy-shaped feed.
    async fn sync_employees(
        &self,
        force: bool,
        use_hierarchy_feed: bool,
    ) -> Result<SyncRun, DirectorySyncError>;

    /// Summary of the most recent run of `kind` since startup, if any.
    /// Aborted runs are reported with `success == false`.
    async fn last_sync_run(&self, kind: SyncKind) -> Result<Option<SyncRun>, DirectorySyncError>;

    /// List live departments.
    async fn get_departments(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<Department>, DirectorySyncError>;

    /// Get a department by its local id.
    async fn get_department(
        &self,
        id: Uuid,
        force_refresh: bool,
    ) -> Result<Department, DirectorySyncError>;

    /// Get a department by its short code.
    async fn get_department_by_code(
        &self,
        code: &str,
        force_refresh: bool,
    ) -> Result<Department, DirectorySyncError>;

    /// List live employees.
    async fn get_employees(
        &self,
        query: EmployeeQuery,
    ) -> Result<Vec<Employee>, DirectorySyncError>;

    /// Get an employee by its local id.
    async fn get_employee(
        &self,
        id: Uuid,
        force_refresh: bool,
    ) -> Result<Employee, DirectorySyncError>;

    /// Get an employee by employee number.
    async fn get_employee_by_number(
        &self,
        employee_number: &str,
        force_refresh: bool,
    ) -> Result<Employee, DirectorySyncError>;

    /// Find the first real superior above an employee, if any.
    async fn resolve_manager(&self, employee_id: Uuid)
    -> Result<Option<Employee>, DirectorySyncError>;

    /// Hide an employee from default listings.
    async fn exclude_employee(
        &self,
        id: Uuid,
        reason: String,
        actor: String,
    ) -> Result<Employee, DirectorySyncError>;

    /// Clear a list exclusion.
    async fn include_employee(&self, id: Uuid) -> Result<Employee, DirectorySyncError>;
}
