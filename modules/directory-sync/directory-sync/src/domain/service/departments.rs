use std::sync::Arc;

use directory_sync_sdk::{Department, SyncKind, SyncRun};
use time::OffsetDateTime;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use super::DirectorySyncService;
use crate::domain::error::DomainError;
use crate::domain::mapper::map_department;

impl DirectorySyncService {
    /// Pull every unit from the directory service and reconcile it locally.
    ///
    /// A non-forced call is a no-op while department sync is disabled.
    ///
    /// # Errors
    /// `UpstreamTimeout`/`UpstreamUnavailable` when the feed cannot be
    /// fetched; storage failures while reading the local snapshot.
    pub async fn sync_departments(&self, force: bool) -> Result<SyncRun, DomainError> {
        let now = OffsetDateTime::now_utc();
        let run = SyncRun::started(SyncKind::Departments, now);
        if !force && !self.config.department_sync_enabled {
            debug!("department sync disabled, skipping");
            return Ok(run);
        }

        let _slot = self.gate.try_acquire(SyncKind::Departments);
        let span = info_span!("directory_sync", kind = "departments", force);
        let result = self
            .run_department_sync(run, force, now)
            .instrument(span)
            .await;
        self.record_run(SyncKind::Departments, now, result)
    }

    async fn run_department_sync(
        &self,
        mut run: SyncRun,
        force: bool,
        now: OffsetDateTime,
    ) -> Result<SyncRun, DomainError> {
        let external = self
            .client
            .list_departments(self.config.include_empty_departments)
            .await
            .map_err(DomainError::from)?;
        run.processed = external.len();

        let mut mapped = Vec::with_capacity(external.len());
        for ext in &external {
            match map_department(ext, now) {
                Ok(department) => mapped.push(department),
                Err(e) => {
                    warn!(error = %e, "department skipped");
                    run.errors.push(e.to_string());
                }
            }
        }

        let snapshot = self.departments.list_live().await?;
        Self::apply(&self.departments, mapped, &snapshot, force, now, &mut run).await;
        Ok(run)
    }

    /// # Errors
    /// Forced-refresh failures and storage failures.
    pub async fn get_departments(
        self: &Arc<Self>,
        force_refresh: bool,
    ) -> Result<Vec<Department>, DomainError> {
        self.before_read(SyncKind::Departments, force_refresh)
            .await?;
        Ok(self.departments.list_live().await?)
    }

    /// # Errors
    /// `DepartmentNotFound` when no live unit has this id.
    pub async fn get_department(
        self: &Arc<Self>,
        id: Uuid,
        force_refresh: bool,
    ) -> Result<Department, DomainError> {
        self.before_read(SyncKind::Departments, force_refresh)
            .await?;
        self.departments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::department_not_found(id))
    }

    /// # Errors
    /// `DepartmentNotFound` when no live unit has this code.
    pub async fn get_department_by_code(
        self: &Arc<Self>,
        code: &str,
        force_refresh: bool,
    ) -> Result<Department, DomainError> {
        self.before_read(SyncKind::Departments, force_refresh)
            .await?;
        self.departments
            .find_by_natural_key(code)
            .await?
            .ok_or_else(|| DomainError::department_not_found(code))
    }
}
