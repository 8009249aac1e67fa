//! Diff an upstream batch against the local snapshot.

use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::records::SyncRecord;

/// Writes needed to bring the local store in line with one upstream batch.
#[derive(Debug, Clone)]
pub struct ReconcilePlan<R> {
    pub to_insert: Vec<R>,
    /// Local records with the incoming fields merged in. Each keeps the
    /// version it was read at.
    pub to_update: Vec<R>,
    /// Matched local records that need no write.
    pub unchanged: Vec<Uuid>,
    /// Upstream records dropped because a later record in the batch had the
    /// same external id.
    pub superseded: usize,
    /// Upstream records rejected because a later record with a different
    /// external id carries the same natural key. One message per record.
    pub rejected: Vec<String>,
}

impl<R> Default for ReconcilePlan<R> {
    fn default() -> Self {
        Self {
            to_insert: Vec::new(),
            to_update: Vec::new(),
            unchanged: Vec::new(),
            superseded: 0,
            rejected: Vec::new(),
        }
    }
}

impl<R> ReconcilePlan<R> {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty()
    }
}

struct Deduped<R> {
    kept: Vec<R>,
    superseded: usize,
    rejected: Vec<String>,
}

/// Keep the last occurrence of every external id. Of two distinct external
/// ids sharing a natural key the later one is kept and the earlier rejected.
fn dedupe_last_wins<R: SyncRecord>(incoming: Vec<R>) -> Deduped<R> {
    let mut seen_ext = HashSet::new();
    let mut key_owner: HashMap<String, String> = HashMap::new();
    let mut out = Deduped {
        kept: Vec::with_capacity(incoming.len()),
        superseded: 0,
        rejected: Vec::new(),
    };

    for record in incoming.into_iter().rev() {
        if !seen_ext.insert(record.external_id().to_owned()) {
            out.superseded += 1;
            continue;
        }
        if let Some(owner) = key_owner.get(record.natural_key()) {
            warn!(
                kind = R::KIND.as_str(),
                key = record.natural_key(),
                rejected = record.external_id(),
                kept = owner.as_str(),
                "natural key shared by two upstream records"
            );
            let reason = format!(
                "natural key {} is also used by upstream record {owner}",
                record.natural_key()
            );
            out.rejected
                .push(DomainError::record_skipped(record.external_id(), reason).to_string());
            continue;
        }
        key_owner.insert(
            record.natural_key().to_owned(),
            record.external_id().to_owned(),
        );
        out.kept.push(record);
    }
    out.kept.reverse();
    out.rejected.reverse();
    out
}

/// Match every upstream record to a local one (external id first, natural
/// key second) and stage the resulting writes.
///
/// Without `force`, a matched record is only staged when a tracked field
/// differs or upstream fills a gap in the local copy.
pub fn reconcile<R: SyncRecord>(
    incoming: Vec<R>,
    snapshot: &[R],
    force: bool,
    now: OffsetDateTime,
) -> ReconcilePlan<R> {
    let Deduped {
        kept: incoming,
        superseded,
        rejected,
    } = dedupe_last_wins(incoming);

    let by_external: HashMap<&str, &R> = snapshot.iter().map(|r| (r.external_id(), r)).collect();
    let by_key: HashMap<&str, &R> = snapshot.iter().map(|r| (r.natural_key(), r)).collect();
    let mut claimed: HashSet<Uuid> = HashSet::new();

    let mut plan = ReconcilePlan {
        superseded,
        rejected,
        ..ReconcilePlan::default()
    };

    for record in incoming {
        let local = by_external
            .get(record.external_id())
            .or_else(|| by_key.get(record.natural_key()))
            .copied()
            .filter(|local| !claimed.contains(&local.id()));

        let Some(local) = local else {
            plan.to_insert.push(record);
            continue;
        };
        claimed.insert(local.id());

        if force || local.needs_update(&record) {
            if local.external_id() != record.external_id() {
                tracing::info!(
                    kind = R::KIND.as_str(),
                    key = record.natural_key(),
                    old_external_id = local.external_id(),
                    new_external_id = record.external_id(),
                    "adopting re-issued external id"
                );
            }
            plan.to_update.push(local.merged_with(&record, now));
        } else {
            plan.unchanged.push(local.id());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use directory_sync_sdk::Department;
    use time::macros::datetime;

    use super::*;
    use crate::domain::fixtures::department;

    const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

    #[test]
    fn test_new_records_are_staged_as_inserts() {
        let plan = reconcile(vec![department("D1", "RND", "R&D")], &[], false, NOW);
        assert_eq!(plan.to_insert.len(), 1);
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn test_identical_record_is_unchanged() {
        let local = department("D1", "RND", "R&D");
        let plan = reconcile(vec![department("D1", "RND", "R&D")], &[local.clone()], false, NOW);
        assert!(plan.is_noop());
        assert_eq!(plan.unchanged, vec![local.id]);
    }

    #[test]
    fn test_force_updates_identical_record() {
        let local = department("D1", "RND", "R&D");
        let plan = reconcile(vec![department("D1", "RND", "R&D")], &[local.clone()], true, NOW);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].id, local.id);
        assert_eq!(plan.to_update[0].updated_at, NOW);
    }

    #[test]
    fn test_tracked_field_change_keeps_local_identity() {
        let local = department("D1", "RND", "R&D");
        let plan = reconcile(vec![department("D1", "RND", "R&D HQ")], &[local.clone()], false, NOW);

        let updated = &plan.to_update[0];
        assert_eq!(updated.id, local.id);
        assert_eq!(updated.created_at, local.created_at);
        assert_eq!(updated.version, local.version);
        assert_eq!(updated.name, "R&D HQ");
    }

    #[test]
    fn test_falls_back_to_natural_key_and_adopts_new_external_id() {
        let local = department("OLD-ID", "RND", "R&D");
        let plan = reconcile(vec![department("NEW-ID", "RND", "R&D")], &[local.clone()], false, NOW);

        assert!(plan.to_insert.is_empty());
        assert_eq!(plan.to_update[0].id, local.id);
        assert_eq!(plan.to_update[0].external_id, "NEW-ID");
    }

    #[test]
    fn test_last_duplicate_in_batch_wins() {
        let batch: Vec<Department> = vec![
            department("D1", "RND", "first"),
            department("D2", "OPS", "ops"),
            department("D1", "RND", "second"),
        ];
        let plan = reconcile(batch, &[], false, NOW);

        assert_eq!(plan.superseded, 1);
        assert!(plan.rejected.is_empty());
        let names: Vec<_> = plan.to_insert.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["ops", "second"]);
    }

    #[test]
    fn test_distinct_ids_sharing_a_code_report_the_dropped_one() {
        let batch = vec![
            department("D1", "SHARED", "Sales"),
            department("D2", "SHARED", "Support"),
        ];
        let plan = reconcile(batch, &[], false, NOW);

        assert_eq!(plan.superseded, 0);
        let ids: Vec<_> = plan.to_insert.iter().map(|d| d.external_id.as_str()).collect();
        assert_eq!(ids, ["D2"]);
        assert_eq!(plan.rejected.len(), 1);
        assert!(plan.rejected[0].contains("D1"), "{}", plan.rejected[0]);
        assert!(plan.rejected[0].contains("D2"), "{}", plan.rejected[0]);
        assert!(plan.rejected[0].contains("SHARED"), "{}", plan.rejected[0]);
    }

    #[test]
    fn test_repeated_id_does_not_count_as_a_key_collision() {
        let batch = vec![
            department("D1", "RND", "first"),
            department("D1", "RND-2", "second"),
            department("D2", "RND", "other"),
        ];
        let plan = reconcile(batch, &[], false, NOW);

        // The last D1 moved off RND, so D2 owns it alone.
        assert_eq!(plan.superseded, 1);
        assert!(plan.rejected.is_empty());
        assert_eq!(plan.to_insert.len(), 2);
    }

    #[test]
    fn test_local_record_is_claimed_once() {
        // D1 matches by external id, D9 by code; both point at the same row.
        let local = department("D1", "OPS", "Ops");
        let batch = vec![department("D1", "RND", "R&D"), department("D9", "OPS", "Ops 2")];
        let plan = reconcile(batch, &[local.clone()], false, NOW);

        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].external_id, "D1");
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!(plan.to_insert[0].external_id, "D9");
    }
}
