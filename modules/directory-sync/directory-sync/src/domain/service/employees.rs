use std::collections::HashMap;
use std::sync::Arc;

use directory_sync_sdk::{Department, Employee, EmployeeQuery, ListExclusion, SyncKind, SyncRun};
use time::OffsetDateTime;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::DirectorySyncService;
use crate::domain::error::DomainError;
use crate::domain::hierarchy::{self, RepoLookup, SnapshotLookup};
use crate::domain::mapper::{manager_map, map_employee};
use crate::domain::ports::{ExternalDepartmentNode, ExternalEmployee};
use crate::domain::repo::RepoError;

/// Attempts at an administrative write racing a sync.
const ADMIN_WRITE_ATTEMPTS: usize = 2;

impl DirectorySyncService {
    /// Pull every person from the directory service and reconcile them
    /// locally, filling in managers on the way.
    ///
    /// A non-forced call is a no-op while employee sync is disabled.
    ///
    /// # Errors
    /// `UpstreamTimeout`/`UpstreamUnavailable` when the employee feed cannot
    /// be fetched; storage failures while reading the local snapshot.
    pub async fn sync_employees(
        &self,
        force: bool,
        use_hierarchy_feed: bool,
    ) -> Result<SyncRun, DomainError> {
        let now = OffsetDateTime::now_utc();
        let run = SyncRun::started(SyncKind::Employees, now);
        if !force && !self.config.employee_sync_enabled {
            debug!("employee sync disabled, skipping");
            return Ok(run);
        }

        let _slot = self.gate.try_acquire(SyncKind::Employees);
        let span = info_span!(
            "directory_sync",
            kind = "employees",
            force,
            hierarchy_feed = use_hierarchy_feed
        );
        let result = self
            .run_employee_sync(run, force, use_hierarchy_feed, now)
            .instrument(span)
            .await;
        self.record_run(SyncKind::Employees, now, result)
    }

    async fn fetch_employees(
        &self,
        use_hierarchy_feed: bool,
    ) -> Result<Vec<ExternalEmployee>, DomainError> {
        let include_terminated = self.config.include_terminated;
        let fetched = if use_hierarchy_feed {
            self.client
                .list_employees_by_hierarchy(include_terminated)
                .await
                .map(ExternalDepartmentNode::flatten)
        } else {
            self.client.list_employees(true, include_terminated).await
        };
        fetched.map_err(DomainError::from)
    }

    async fn run_employee_sync(
        &self,
        mut run: SyncRun,
        force: bool,
        use_hierarchy_feed: bool,
        now: OffsetDateTime,
    ) -> Result<SyncRun, DomainError> {
        let external = self.fetch_employees(use_hierarchy_feed).await?;
        run.processed = external.len();

        let manager_lines = match self.client.list_manager_lines().await {
            Ok(lines) => manager_map(&lines),
            Err(e) => {
                warn!(error = %e, "manager-line feed unavailable, resolving managers locally");
                HashMap::new()
            }
        };

        let mut mapped = Vec::with_capacity(external.len());
        for ext in &external {
            match map_employee(ext, now) {
                Ok(employee) => mapped.push(employee),
                Err(e) => {
                    warn!(error = %e, "employee skipped");
                    run.errors.push(e.to_string());
                }
            }
        }

        let snapshot = self.employees.list_live().await?;
        let departments = self.departments.list_live().await?;
        self.assign_managers(&mut mapped, &manager_lines, &snapshot, &departments)
            .await;

        Self::apply(&self.employees, mapped, &snapshot, force, now, &mut run).await;
        Ok(run)
    }

    /// Manager precedence: manager-line feed, then the record's own
    /// `managerId`, then a hierarchy walk over the units and the people
    /// known so far.
    async fn assign_managers(
        &self,
        batch: &mut [Employee],
        manager_lines: &HashMap<String, String>,
        local: &[Employee],
        departments: &[Department],
    ) {
        let lookup = SnapshotLookup::new(departments, local.iter().chain(batch.iter()));
        let mut resolved = 0_usize;

        for employee in batch.iter_mut() {
            if let Some(manager) = manager_lines.get(&employee.external_id) {
                employee.manager_id = Some(manager.clone());
                continue;
            }
            if employee.manager_id.is_some() {
                continue;
            }
            let depth = self.config.max_hierarchy_depth;
            match hierarchy::resolve_manager(&lookup, employee, depth).await {
                Ok(Some(manager)) => {
                    employee.manager_id = Some(manager.external_id);
                    resolved += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(
                    external_id = %employee.external_id,
                    error = %e,
                    "manager resolution failed"
                ),
            }
        }
        debug!(resolved, "managers resolved from the department tree");
    }

    /// # Errors
    /// Forced-refresh failures and storage failures.
    pub async fn get_employees(
        self: &Arc<Self>,
        query: EmployeeQuery,
    ) -> Result<Vec<Employee>, DomainError> {
        self.before_read(SyncKind::Employees, query.force_refresh)
            .await?;
        let mut employees = self.employees.list_live().await?;
        if !query.include_excluded {
            employees.retain(|e| !e.is_excluded_from_list());
        }
        Ok(employees)
    }

    /// # Errors
    /// `EmployeeNotFound` when no live person has this id.
    pub async fn get_employee(
        self: &Arc<Self>,
        id: Uuid,
        force_refresh: bool,
    ) -> Result<Employee, DomainError> {
        self.before_read(SyncKind::Employees, force_refresh)
            .await?;
        self.find_employee(id).await
    }

    /// # Errors
    /// `EmployeeNotFound` when no live person has this number.
    pub async fn get_employee_by_number(
        self: &Arc<Self>,
        employee_number: &str,
        force_refresh: bool,
    ) -> Result<Employee, DomainError> {
        self.before_read(SyncKind::Employees, force_refresh)
            .await?;
        self.employees
            .find_by_natural_key(employee_number)
            .await?
            .ok_or_else(|| DomainError::employee_not_found(employee_number))
    }

    /// First real superior above the person, walking the stored department tree.
    ///
    /// # Errors
    /// `EmployeeNotFound` when the person does not exist.
    pub async fn resolve_manager(
        self: &Arc<Self>,
        employee_id: Uuid,
    ) -> Result<Option<Employee>, DomainError> {
        self.before_read(SyncKind::Employees, false).await?;
        let person = self.find_employee(employee_id).await?;
        let lookup = RepoLookup::new(Arc::clone(&self.departments), Arc::clone(&self.employees));
        hierarchy::resolve_manager(&lookup, &person, self.config.max_hierarchy_depth).await
    }

    /// Hide a person from default listings. Synced fields keep updating.
    ///
    /// # Errors
    /// `Validation` for a blank reason or actor, `EmployeeNotFound` for an
    /// unknown id.
    pub async fn exclude_employee(
        &self,
        id: Uuid,
        reason: &str,
        actor: &str,
    ) -> Result<Employee, DomainError> {
        let reason = reason.trim();
        let actor = actor.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("reason", "must not be blank"));
        }
        if actor.is_empty() {
            return Err(DomainError::validation("actor", "must not be blank"));
        }

        let exclusion = ListExclusion {
            reason: reason.to_owned(),
            excluded_by: actor.to_owned(),
            excluded_at: OffsetDateTime::now_utc(),
        };
        let stored = self.write_exclusion(id, Some(exclusion)).await?;
        info!(employee_id = %id, actor, "employee excluded from listings");
        Ok(stored)
    }

    /// Clear a list exclusion. Clearing an absent exclusion is a no-op.
    ///
    /// # Errors
    /// `EmployeeNotFound` for an unknown id.
    pub async fn include_employee(&self, id: Uuid) -> Result<Employee, DomainError> {
        let current = self.find_employee(id).await?;
        if current.exclusion.is_none() {
            return Ok(current);
        }
        let stored = self.write_exclusion(id, None).await?;
        info!(employee_id = %id, "employee exclusion cleared");
        Ok(stored)
    }

    async fn find_employee(&self, id: Uuid) -> Result<Employee, DomainError> {
        self.employees
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::employee_not_found(id))
    }

    /// Re-read and retry when a concurrent sync bumped the version.
    async fn write_exclusion(
        &self,
        id: Uuid,
        exclusion: Option<ListExclusion>,
    ) -> Result<Employee, DomainError> {
        let mut attempt = 1;
        loop {
            let mut employee = self.find_employee(id).await?;
            employee.exclusion.clone_from(&exclusion);
            employee.updated_at = OffsetDateTime::now_utc();

            match self.employees.update(&employee).await {
                Ok(stored) => return Ok(stored),
                Err(RepoError::StaleVersion { .. }) if attempt < ADMIN_WRITE_ATTEMPTS => {
                    attempt += 1;
                }
                Err(RepoError::NotFound { .. }) => {
                    return Err(DomainError::employee_not_found(id));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
