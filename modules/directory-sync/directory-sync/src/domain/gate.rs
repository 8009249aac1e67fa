//! Staleness policy and the per-kind single-flight guard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use directory_sync_sdk::SyncKind;
use time::OffsetDateTime;

/// Age of the local copy of one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing has been synced yet.
    Empty,
    Stale,
    Fresh,
}

impl Freshness {
    /// Classify by the newest `last_synced_at` across live records.
    #[must_use]
    pub fn of(
        newest_sync: Option<OffsetDateTime>,
        now: OffsetDateTime,
        stale_after: Duration,
    ) -> Self {
        let Some(newest) = newest_sync else {
            return Self::Empty;
        };
        let age = now - newest;
        if age.is_positive() && age.unsigned_abs() > stale_after {
            Self::Stale
        } else {
            Self::Fresh
        }
    }

    #[must_use]
    pub fn wants_refresh(self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

/// At most one unattended sync per kind at a time.
#[derive(Debug, Clone, Default)]
pub struct SyncGate {
    departments: Arc<AtomicBool>,
    employees: Arc<AtomicBool>,
}

impl SyncGate {
    fn flag(&self, kind: SyncKind) -> &Arc<AtomicBool> {
        match kind {
            SyncKind::Departments => &self.departments,
            SyncKind::Employees => &self.employees,
        }
    }

    /// Claim the slot for `kind`, or `None` if a sync is already running.
    #[must_use]
    pub fn try_acquire(&self, kind: SyncKind) -> Option<InFlight> {
        let flag = self.flag(kind);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                flag: Arc::clone(flag),
            })
    }

    #[must_use]
    pub fn is_in_flight(&self, kind: SyncKind) -> bool {
        self.flag(kind).load(Ordering::Acquire)
    }
}

/// Releases the slot on drop, including when the sync task panics.
#[derive(Debug)]
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn test_freshness_thresholds() {
        let now = datetime!(2026-03-02 12:00 UTC);
        assert_eq!(Freshness::of(None, now, DAY), Freshness::Empty);
        assert_eq!(
            Freshness::of(Some(datetime!(2026-03-01 11:00 UTC)), now, DAY),
            Freshness::Stale
        );
        assert_eq!(
            Freshness::of(Some(datetime!(2026-03-01 13:00 UTC)), now, DAY),
            Freshness::Fresh
        );
        // Clock skew: a sync stamped in the future is fresh.
        assert_eq!(
            Freshness::of(Some(datetime!(2026-03-03 0:00 UTC)), now, DAY),
            Freshness::Fresh
        );
    }

    #[test]
    fn test_gate_is_single_flight_per_kind() {
        let gate = SyncGate::default();
        let guard = gate.try_acquire(SyncKind::Employees).unwrap();

        assert!(gate.try_acquire(SyncKind::Employees).is_none());
        assert!(gate.try_acquire(SyncKind::Departments).is_some());
        assert!(gate.is_in_flight(SyncKind::Employees));

        drop(guard);
        assert!(!gate.is_in_flight(SyncKind::Employees));
        assert!(gate.try_acquire(SyncKind::Employees).is_some());
    }
}
