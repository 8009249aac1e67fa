//! Effective-superior resolution over the department tree.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use directory_sync_sdk::{Department, Employee};

use crate::domain::error::DomainError;
use crate::domain::repo::SyncRepository;

/// Lookups the resolver needs, keyed by external id.
#[async_trait]
pub trait OrgLookup: Send + Sync {
    async fn department(&self, external_id: &str) -> Result<Option<Department>, DomainError>;

    async fn employee(&self, external_id: &str) -> Result<Option<Employee>, DomainError>;
}

/// Walk upward from the person's unit and return the first manager who is
/// a real, different person.
///
/// The person's own unit is level 0; at most `max_depth` parent hops are
/// taken after it. A self-managed or dangling-manager unit counts as
/// unmanaged. A missing unit or parent ends the walk.
///
/// # Errors
/// Propagates lookup failures.
pub async fn resolve_manager(
    lookup: &dyn OrgLookup,
    person: &Employee,
    max_depth: usize,
) -> Result<Option<Employee>, DomainError> {
    let Some(mut unit_id) = person.department_id.clone() else {
        return Ok(None);
    };
    let mut visited = HashSet::new();

    for _ in 0..=max_depth {
        if !visited.insert(unit_id.clone()) {
            break;
        }
        let Some(unit) = lookup.department(&unit_id).await? else {
            break;
        };

        if let Some(manager_id) = unit
            .manager_id
            .as_deref()
            .filter(|m| *m != person.external_id)
            && let Some(manager) = lookup.employee(manager_id).await?
        {
            return Ok(Some(manager));
        }

        match unit.parent_id {
            Some(parent) => unit_id = parent,
            None => break,
        }
    }

    Ok(None)
}

/// Lookups against the live store.
pub struct RepoLookup {
    departments: Arc<dyn SyncRepository<Department>>,
    employees: Arc<dyn SyncRepository<Employee>>,
}

impl RepoLookup {
    pub fn new(
        departments: Arc<dyn SyncRepository<Department>>,
        employees: Arc<dyn SyncRepository<Employee>>,
    ) -> Self {
        Self {
            departments,
            employees,
        }
    }
}

#[async_trait]
impl OrgLookup for RepoLookup {
    async fn department(&self, external_id: &str) -> Result<Option<Department>, DomainError> {
        Ok(self.departments.find_by_external_id(external_id).await?)
    }

    async fn employee(&self, external_id: &str) -> Result<Option<Employee>, DomainError> {
        Ok(self.employees.find_by_external_id(external_id).await?)
    }
}

/// Lookups against an in-memory snapshot, used while an employee batch is
/// being reconciled and the store does not yet hold the incoming people.
#[derive(Default)]
pub struct SnapshotLookup {
    departments: HashMap<String, Department>,
    employees: HashMap<String, Employee>,
}

impl SnapshotLookup {
    /// Later employees shadow earlier ones with the same external id.
    pub fn new<'a>(
        departments: impl IntoIterator<Item = &'a Department>,
        employees: impl IntoIterator<Item = &'a Employee>,
    ) -> Self {
        Self {
            departments: departments
                .into_iter()
                .map(|d| (d.external_id.clone(), d.clone()))
                .collect(),
            employees: employees
                .into_iter()
                .map(|e| (e.external_id.clone(), e.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl OrgLookup for SnapshotLookup {
    async fn department(&self, external_id: &str) -> Result<Option<Department>, DomainError> {
        Ok(self.departments.get(external_id).cloned())
    }

    async fn employee(&self, external_id: &str) -> Result<Option<Employee>, DomainError> {
        Ok(self.employees.get(external_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{department, employee, in_department};

    /// Chain `U0 <- U1 <- ... <- U{n-1}`, U0 being the leaf.
    fn chain(n: usize) -> Vec<Department> {
        (0..n)
            .map(|i| {
                let mut d = department(&format!("U{i}"), &format!("C{i}"), &format!("Unit {i}"));
                if i + 1 < n {
                    d.parent_id = Some(format!("U{}", i + 1));
                }
                d
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unit_manager_is_returned() {
        let mut units = chain(1);
        units[0].manager_id = Some("BOSS".to_owned());
        let boss = employee("BOSS", "1", "Boss");
        let me = in_department(employee("ME", "2", "Me"), &units[0]);

        let lookup = SnapshotLookup::new(&units, [&boss, &me]);
        let found = resolve_manager(&lookup, &me, 3).await.unwrap();
        assert_eq!(found.map(|e| e.external_id), Some("BOSS".to_owned()));
    }

    #[tokio::test]
    async fn test_self_managed_unit_walks_upward() {
        let mut units = chain(2);
        units[0].manager_id = Some("ME".to_owned());
        units[1].manager_id = Some("BOSS".to_owned());
        let boss = employee("BOSS", "1", "Boss");
        let me = in_department(employee("ME", "2", "Me"), &units[0]);

        let lookup = SnapshotLookup::new(&units, [&boss, &me]);
        let found = resolve_manager(&lookup, &me, 3).await.unwrap();
        assert_eq!(found.map(|e| e.external_id), Some("BOSS".to_owned()));
    }

    #[tokio::test]
    async fn test_dangling_manager_walks_upward() {
        let mut units = chain(2);
        units[0].manager_id = Some("GHOST".to_owned());
        units[1].manager_id = Some("BOSS".to_owned());
        let boss = employee("BOSS", "1", "Boss");
        let me = in_department(employee("ME", "2", "Me"), &units[0]);

        let lookup = SnapshotLookup::new(&units, [&boss, &me]);
        let found = resolve_manager(&lookup, &me, 3).await.unwrap();
        assert_eq!(found.map(|e| e.external_id), Some("BOSS".to_owned()));
    }

    #[tokio::test]
    async fn test_walk_is_bounded() {
        // Manager only at U4, four hops above the leaf.
        let mut units = chain(5);
        units[4].manager_id = Some("BOSS".to_owned());
        let boss = employee("BOSS", "1", "Boss");
        let me = in_department(employee("ME", "2", "Me"), &units[0]);

        let lookup = SnapshotLookup::new(&units, [&boss, &me]);
        assert!(resolve_manager(&lookup, &me, 3).await.unwrap().is_none());

        // Three hops is still within reach.
        units[3].manager_id = Some("BOSS".to_owned());
        let lookup = SnapshotLookup::new(&units, [&boss, &me]);
        assert!(resolve_manager(&lookup, &me, 3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_parent_cycle_terminates() {
        let mut a = department("A", "A", "A");
        let mut b = department("B", "B", "B");
        a.parent_id = Some("B".to_owned());
        b.parent_id = Some("A".to_owned());
        let me = in_department(employee("ME", "2", "Me"), &a);

        let lookup = SnapshotLookup::new([&a, &b], [&me]);
        assert!(resolve_manager(&lookup, &me, 50).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_person_without_unit_has_no_manager() {
        let me = employee("ME", "2", "Me");
        let lookup = SnapshotLookup::default();
        assert!(resolve_manager(&lookup, &me, 3).await.unwrap().is_none());
    }
}
