//! Startup and fixed-cadence sync loop.

use std::sync::Arc;
use std::time::Duration;

use directory_sync_sdk::SyncKind;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::gate::Freshness;
use crate::domain::service::DirectorySyncService;

/// Departments first so that employee manager resolution sees the current tree.
const ORDER: [SyncKind; 2] = [SyncKind::Departments, SyncKind::Employees];

pub struct SyncScheduler {
    service: Arc<DirectorySyncService>,
    interval: Duration,
}

impl SyncScheduler {
    #[must_use]
    pub fn new(service: Arc<DirectorySyncService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Force a sync of every enabled kind that has no local data yet.
    pub async fn startup(&self) {
        for kind in ORDER {
            if !self.service.is_enabled(kind) {
                continue;
            }
            match self.service.freshness(kind).await {
                Ok(Freshness::Empty) => {
                    info!(kind = kind.as_str(), "no local data, running startup sync");
                    self.run(kind, true).await;
                }
                Ok(_) => debug!(kind = kind.as_str(), "local data present, startup sync skipped"),
                Err(e) => warn!(kind = kind.as_str(), error = %e, "startup freshness check failed"),
            }
        }
    }

    /// One scheduled pass over every enabled kind, regardless of staleness.
    pub async fn tick(&self) {
        for kind in ORDER {
            if self.service.is_enabled(kind) {
                self.run(kind, false).await;
            }
        }
    }

    async fn run(&self, kind: SyncKind, force: bool) {
        let Some(_slot) = self.service.gate().try_acquire(kind) else {
            debug!(kind = kind.as_str(), "sync already in flight, skipping");
            return;
        };
        if let Err(e) = self.service.sync_kind(kind, force).await {
            error!(kind = kind.as_str(), error = %e, "scheduled sync failed");
        }
    }

    /// Run until `cancel` fires. A tick that has started runs to completion.
    pub async fn run_until_cancelled(self, cancel: CancellationToken) {
        self.startup().await;

        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval = ?self.interval, "directory sync scheduler started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
        info!("directory sync scheduler stopped");
    }
}
