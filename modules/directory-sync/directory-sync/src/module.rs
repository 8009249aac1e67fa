//! Directory sync module definition.

use std::sync::Arc;

use anyhow::Context;
use directory_sync_sdk::{Department, DirectorySyncApi, Employee};
use parking_lot::Mutex;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::rest::routes;
use crate::config::{DirectoryClientConfig, DirectorySyncConfig};
use crate::domain::ports::DirectoryClient;
use crate::domain::repo::SyncRepository;
use crate::domain::scheduler::SyncScheduler;
use crate::domain::service::{DirectorySyncService, ServiceConfig};
use crate::infra::directory::{HttpDirectoryClient, StaticDirectoryClient};
use crate::infra::storage::{Migrator, SeaOrmDepartmentRepository, SeaOrmEmployeeRepository};
use crate::local_client::DirectorySyncLocalClient;

/// Directory sync module.
///
/// This module provides:
/// - Scheduled and read-triggered synchronization from the directory service
/// - The in-process `DirectorySyncApi` client
/// - REST routes under `/directory-sync/v1`
pub struct DirectorySyncModule {
    config: DirectorySyncConfig,
    service: Arc<DirectorySyncService>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl DirectorySyncModule {
    /// Run migrations and wire the module against `db`.
    ///
    /// # Errors
    /// Migration failures, an unreadable snapshot file, or an HTTP client
    /// that cannot be built.
    pub async fn init(config: DirectorySyncConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        info!("Initializing directory sync module");

        info!("Running directory sync database migrations");
        Migrator::up(&db, None)
            .await
            .context("running directory sync migrations")?;

        let departments: Arc<dyn SyncRepository<Department>> =
            Arc::new(SeaOrmDepartmentRepository::new(db.clone()));
        let employees: Arc<dyn SyncRepository<Employee>> =
            Arc::new(SeaOrmEmployeeRepository::new(db));
        let client = build_client(&config.directory)?;

        Ok(Self::from_parts(config, client, departments, employees))
    }

    /// Wire the module from already-built adapters.
    #[must_use]
    pub fn from_parts(
        config: DirectorySyncConfig,
        client: Arc<dyn DirectoryClient>,
        departments: Arc<dyn SyncRepository<Department>>,
        employees: Arc<dyn SyncRepository<Employee>>,
    ) -> Self {
        let service = Arc::new(DirectorySyncService::new(
            client,
            departments,
            employees,
            ServiceConfig::from(&config),
        ));
        Self {
            config,
            service,
            scheduler: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn service(&self) -> Arc<DirectorySyncService> {
        Arc::clone(&self.service)
    }

    /// The in-process client other modules consume.
    #[must_use]
    pub fn api(&self) -> Arc<dyn DirectorySyncApi> {
        Arc::new(DirectorySyncLocalClient::new(self.service()))
    }

    #[must_use]
    pub fn router(&self) -> axum::Router {
        info!("Registering directory sync REST routes");
        routes::router(self.service())
    }

    /// Start the startup sync and the scheduler on a background task.
    /// Calling it twice keeps the first scheduler.
    pub fn start(&self, cancel: CancellationToken) {
        let mut slot = self.scheduler.lock();
        if slot.is_some() {
            warn!("directory sync scheduler already running");
            return;
        }
        let scheduler = SyncScheduler::new(self.service(), self.config.sync_interval);
        *slot = Some(tokio::spawn(scheduler.run_until_cancelled(cancel)));
    }

    /// Wait for the scheduler to finish after its token was cancelled.
    pub async fn stop(&self) {
        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "directory sync scheduler task failed");
        }
    }
}

fn build_client(config: &DirectoryClientConfig) -> anyhow::Result<Arc<dyn DirectoryClient>> {
    if let Some(path) = &config.snapshot_path {
        info!(path = %path.display(), "serving the directory from a snapshot file");
        return Ok(Arc::new(StaticDirectoryClient::from_file(path)?));
    }
    info!(base_url = %config.base_url, "using the directory service over HTTP");
    Ok(Arc::new(HttpDirectoryClient::new(config)?))
}
