//! Batch writes with a per-record conflict fallback.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::reconcile::ReconcilePlan;
use crate::domain::records::SyncRecord;
use crate::domain::repo::{RepoError, SyncRepository};

/// Attempts at merging onto a conflicting record before giving up.
const MERGE_ATTEMPTS: usize = 2;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub created: usize,
    pub updated: usize,
    /// Duplicate live records soft-deleted while resolving conflicts.
    pub retired: usize,
    pub errors: Vec<String>,
}

fn push_distinct<R: SyncRecord>(holders: &mut Vec<R>, candidate: Option<R>) {
    if let Some(c) = candidate
        && !holders.iter().any(|h| h.id() == c.id())
    {
        holders.push(c);
    }
}

enum Fallback {
    Created,
    Updated,
}

pub struct BatchPersister<R: SyncRecord> {
    repo: Arc<dyn SyncRepository<R>>,
}

impl<R: SyncRecord> BatchPersister<R> {
    pub fn new(repo: Arc<dyn SyncRepository<R>>) -> Self {
        Self { repo }
    }

    /// Write a reconciled plan. Never fails as a whole: per-record problems
    /// end up in [`PersistOutcome::errors`].
    pub async fn persist(&self, plan: &ReconcilePlan<R>, now: OffsetDateTime) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        if !plan.is_noop() {
            match self.repo.bulk_upsert(&plan.to_insert, &plan.to_update).await {
                Ok(()) => {
                    outcome.created = plan.to_insert.len();
                    outcome.updated = plan.to_update.len();
                }
                Err(e) if e.is_conflict() => {
                    warn!(
                        kind = R::KIND.as_str(),
                        error = %e,
                        inserts = plan.to_insert.len(),
                        updates = plan.to_update.len(),
                        "bulk write hit a conflict, retrying record by record"
                    );
                    self.persist_one_by_one(plan, now, &mut outcome).await;
                }
                Err(e) => {
                    outcome.errors.push(DomainError::from(e).to_string());
                }
            }
        }

        if !plan.unchanged.is_empty()
            && let Err(e) = self.repo.mark_synced(&plan.unchanged, now).await
        {
            outcome.errors.push(DomainError::from(e).to_string());
        }

        outcome
    }

    async fn persist_one_by_one(
        &self,
        plan: &ReconcilePlan<R>,
        now: OffsetDateTime,
        outcome: &mut PersistOutcome,
    ) {
        let updates = plan.to_update.iter().map(|r| (r, false));
        let inserts = plan.to_insert.iter().map(|r| (r, true));

        for (record, is_insert) in updates.chain(inserts) {
            let first_try = if is_insert {
                self.repo.insert(record).await.map(|()| Fallback::Created)
            } else {
                self.repo.update(record).await.map(|_| Fallback::Updated)
            };

            let result = match first_try {
                Err(e) if e.is_conflict() => self.merge_onto_holder(record, now, outcome).await,
                other => other.map_err(DomainError::from),
            };

            match result {
                Ok(Fallback::Created) => outcome.created += 1,
                Ok(Fallback::Updated) => outcome.updated += 1,
                Err(e) => {
                    warn!(
                        kind = R::KIND.as_str(),
                        external_id = record.external_id(),
                        error = %e,
                        "record could not be persisted"
                    );
                    outcome.errors.push(e.to_string());
                }
            }
        }
    }

    /// Live records holding any of `incoming`'s unique keys, or failing
    /// that, sharing its secondary key.
    async fn find_holders(&self, incoming: &R) -> Result<Vec<R>, RepoError> {
        let mut holders: Vec<R> = Vec::new();
        push_distinct(
            &mut holders,
            self.repo.find_by_external_id(incoming.external_id()).await?,
        );
        push_distinct(
            &mut holders,
            self.repo.find_by_natural_key(incoming.natural_key()).await?,
        );

        if holders.is_empty()
            && let Some(secondary) = incoming.secondary_key()
        {
            let by_secondary = self.repo.find_by_secondary_key(secondary).await?;
            push_distinct(&mut holders, by_secondary.into_iter().next());
        }
        Ok(holders)
    }

    /// Re-resolve the local record a conflicting write collided with and
    /// merge `incoming` onto it. Other live holders of the same keys are
    /// retired in the same write, so exactly one record carries the merged
    /// values and a failed merge retires nothing.
    async fn merge_onto_holder(
        &self,
        incoming: &R,
        now: OffsetDateTime,
        outcome: &mut PersistOutcome,
    ) -> Result<Fallback, DomainError> {
        let key = format!("{}:{}", incoming.external_id(), incoming.natural_key());
        let mut last_error = String::new();

        for attempt in 1..=MERGE_ATTEMPTS {
            let holders = self.find_holders(incoming).await?;
            if holders.is_empty() {
                return Err(DomainError::conflict_unresolvable(
                    key,
                    "no conflicting local record found",
                ));
            }

            let survivor_idx = holders
                .iter()
                .position(|h| h.id() == incoming.id())
                .unwrap_or(0);
            let survivor = &holders[survivor_idx];
            let duplicates: Vec<&R> = holders
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != survivor_idx)
                .map(|(_, h)| h)
                .collect();
            let retired: Vec<Uuid> = duplicates.iter().map(|d| d.id()).collect();

            match self
                .repo
                .merge_duplicates(&survivor.merged_with(incoming, now), &retired, now)
                .await
            {
                Ok(_) => {
                    for duplicate in &duplicates {
                        warn!(
                            kind = R::KIND.as_str(),
                            retired_id = %duplicate.id(),
                            retired_external_id = duplicate.external_id(),
                            survivor_id = %survivor.id(),
                            "retired duplicate local record"
                        );
                    }
                    outcome.retired += retired.len();
                    debug!(
                        kind = R::KIND.as_str(),
                        external_id = incoming.external_id(),
                        attempt,
                        "conflict resolved by merge"
                    );
                    return Ok(Fallback::Updated);
                }
                Err(e) if e.is_conflict() => last_error = e.to_string(),
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict_unresolvable(key, last_error))
    }
}
