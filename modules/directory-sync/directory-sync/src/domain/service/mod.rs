//! Domain service for the directory sync module.
//!
//! Owns the two sync entry points, the read accessors behind the staleness
//! gate, and the list-exclusion administration. Record-kind specifics live
//! in `departments` and `employees`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use directory_sync_sdk::{Department, Employee, SyncKind, SyncRun};
use parking_lot::Mutex;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::domain::error::DomainError;
use crate::domain::gate::{Freshness, SyncGate};
use crate::domain::persister::BatchPersister;
use crate::domain::ports::DirectoryClient;
use crate::domain::reconcile::reconcile;
use crate::domain::records::SyncRecord;
use crate::domain::repo::SyncRepository;

mod departments;
mod employees;

/// Runtime knobs of the service.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ServiceConfig {
    pub department_sync_enabled: bool,
    pub employee_sync_enabled: bool,
    pub stale_after: Duration,
    pub max_hierarchy_depth: usize,
    pub use_hierarchy_feed: bool,
    pub include_terminated: bool,
    pub include_empty_departments: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            department_sync_enabled: false,
            employee_sync_enabled: false,
            stale_after: Duration::from_secs(24 * 60 * 60),
            max_hierarchy_depth: 3,
            use_hierarchy_feed: false,
            include_terminated: true,
            include_empty_departments: true,
        }
    }
}

pub struct DirectorySyncService {
    client: Arc<dyn DirectoryClient>,
    departments: Arc<dyn SyncRepository<Department>>,
    employees: Arc<dyn SyncRepository<Employee>>,
    config: ServiceConfig,
    gate: SyncGate,
    last_runs: Mutex<HashMap<SyncKind, SyncRun>>,
}

impl DirectorySyncService {
    #[must_use]
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        departments: Arc<dyn SyncRepository<Department>>,
        employees: Arc<dyn SyncRepository<Employee>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            client,
            departments,
            employees,
            config,
            gate: SyncGate::default(),
            last_runs: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[must_use]
    pub fn gate(&self) -> &SyncGate {
        &self.gate
    }

    /// Summary of the most recent run of `kind` that reached the feed,
    /// failed ones included.
    #[must_use]
    pub fn last_run(&self, kind: SyncKind) -> Option<SyncRun> {
        self.last_runs.lock().get(&kind).cloned()
    }

    /// Remember the outcome of a run. An aborted run is logged and kept as
    /// `success == false` before its error is handed back.
    fn record_run(
        &self,
        kind: SyncKind,
        started_at: OffsetDateTime,
        result: Result<SyncRun, DomainError>,
    ) -> Result<SyncRun, DomainError> {
        let (run, outcome) = match result {
            Ok(run) => (run.clone(), Ok(run)),
            Err(e) => {
                let run = SyncRun::started(kind, started_at).failed(e.to_string());
                error!(
                    kind = kind.as_str(),
                    success = run.success,
                    error = %e,
                    "sync failed"
                );
                (run, Err(e))
            }
        };
        self.last_runs.lock().insert(kind, run);
        outcome
    }

    /// Whether unattended work (startup, scheduled, read-triggered) runs for `kind`.
    #[must_use]
    pub fn is_enabled(&self, kind: SyncKind) -> bool {
        match kind {
            SyncKind::Departments => self.config.department_sync_enabled,
            SyncKind::Employees => self.config.employee_sync_enabled,
        }
    }

    /// # Errors
    /// Storage failures.
    pub async fn freshness(&self, kind: SyncKind) -> Result<Freshness, DomainError> {
        let newest = match kind {
            SyncKind::Departments => self.departments.newest_synced_at().await?,
            SyncKind::Employees => self.employees.newest_synced_at().await?,
        };
        Ok(Freshness::of(
            newest,
            OffsetDateTime::now_utc(),
            self.config.stale_after,
        ))
    }

    /// Run one sync of `kind` with the configured feed options.
    ///
    /// # Errors
    /// Upstream fetch and storage failures.
    pub async fn sync_kind(&self, kind: SyncKind, force: bool) -> Result<SyncRun, DomainError> {
        match kind {
            SyncKind::Departments => self.sync_departments(force).await,
            SyncKind::Employees => {
                self.sync_employees(force, self.config.use_hierarchy_feed)
                    .await
            }
        }
    }

    /// Fire a non-forced sync of `kind` on a background task unless one is
    /// already in flight. Failures are logged and go nowhere else.
    ///
    /// Returns whether a task was spawned.
    pub fn spawn_refresh(self: &Arc<Self>, kind: SyncKind) -> bool {
        let Some(slot) = self.gate.try_acquire(kind) else {
            debug!(kind = kind.as_str(), "refresh already in flight");
            return false;
        };
        let svc = Arc::clone(self);
        tokio::spawn(async move {
            let _slot = slot;
            match svc.sync_kind(kind, false).await {
                Ok(run) => debug!(
                    kind = kind.as_str(),
                    created = run.created,
                    updated = run.updated,
                    "background refresh finished"
                ),
                Err(e) => warn!(kind = kind.as_str(), error = %e, "background refresh failed"),
            }
        });
        true
    }

    /// Staleness gate in front of every read.
    ///
    /// `force_refresh` awaits a forced sync and surfaces its failure. Otherwise
    /// a stale or empty local copy schedules a background refresh and the read
    /// proceeds on the data already stored.
    async fn before_read(
        self: &Arc<Self>,
        kind: SyncKind,
        force_refresh: bool,
    ) -> Result<(), DomainError> {
        if force_refresh {
            self.sync_kind(kind, true).await?;
            return Ok(());
        }
        if !self.is_enabled(kind) {
            return Ok(());
        }
        match self.freshness(kind).await {
            Ok(freshness) if freshness.wants_refresh() => {
                info!(kind = kind.as_str(), ?freshness, "local copy needs refresh");
                self.spawn_refresh(kind);
            }
            Ok(_) => {}
            Err(e) => warn!(kind = kind.as_str(), error = %e, "staleness check failed"),
        }
        Ok(())
    }

    /// Reconcile a mapped batch against `snapshot` and persist the result
    /// into `run`.
    async fn apply<R: SyncRecord>(
        repo: &Arc<dyn SyncRepository<R>>,
        incoming: Vec<R>,
        snapshot: &[R],
        force: bool,
        now: OffsetDateTime,
        run: &mut SyncRun,
    ) {
        let plan = reconcile(incoming, snapshot, force, now);
        if plan.superseded > 0 {
            warn!(
                superseded = plan.superseded,
                "upstream batch repeated records, kept the last occurrence"
            );
        }

        run.errors.extend(plan.rejected.iter().cloned());

        let outcome = BatchPersister::new(Arc::clone(repo))
            .persist(&plan, now)
            .await;
        if outcome.retired > 0 {
            warn!(retired = outcome.retired, "duplicate local records retired");
        }

        run.created = outcome.created;
        run.updated = outcome.updated;
        run.unchanged = plan.unchanged.len();
        run.errors.extend(outcome.errors);

        info!(
            processed = run.processed,
            created = run.created,
            updated = run.updated,
            unchanged = run.unchanged,
            errors = run.errors.len(),
            "sync finished"
        );
    }
}
