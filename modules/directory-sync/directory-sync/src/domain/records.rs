//! Identity keys, tracked-field comparison and merge rules for the two
//! synchronized record kinds.

use directory_sync_sdk::{Department, Employee, SyncKind};
use time::OffsetDateTime;
use uuid::Uuid;

/// A record mirrored from the directory service.
///
/// `merged_with` is called on the local record with the incoming one and
/// yields what should be stored: directory-owned fields come from upstream,
/// locally-owned fields (identity, creation time, version, administrative
/// state) stay put.
pub trait SyncRecord: Clone + Send + Sync + 'static {
    const KIND: SyncKind;

    fn id(&self) -> Uuid;

    fn external_id(&self) -> &str;

    /// Upstream-independent unique key: short code for units, employee number for people.
    fn natural_key(&self) -> &str;

    /// Non-unique fallback key used only while resolving write conflicts.
    fn secondary_key(&self) -> Option<&str> {
        None
    }

    fn version(&self) -> i32;

    fn set_version(&mut self, version: i32);

    fn last_synced_at(&self) -> Option<OffsetDateTime>;

    fn set_last_synced_at(&mut self, at: OffsetDateTime);

    /// Whether `incoming` differs from `self` on a tracked field, or
    /// supplies data `self` is missing.
    fn needs_update(&self, incoming: &Self) -> bool;

    fn merged_with(&self, incoming: &Self, now: OffsetDateTime) -> Self;
}

/// `local` lacks a value `incoming` has.
fn fills_gap<T>(local: Option<&T>, incoming: Option<&T>) -> bool {
    local.is_none() && incoming.is_some()
}

impl SyncRecord for Department {
    const KIND: SyncKind = SyncKind::Departments;

    fn id(&self) -> Uuid {
        self.id
    }

    fn external_id(&self) -> &str {
        &self.external_id
    }

    fn natural_key(&self) -> &str {
        &self.code
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn last_synced_at(&self) -> Option<OffsetDateTime> {
        self.last_synced_at
    }

    fn set_last_synced_at(&mut self, at: OffsetDateTime) {
        self.last_synced_at = Some(at);
    }

    fn needs_update(&self, incoming: &Self) -> bool {
        self.external_id != incoming.external_id
            || self.name != incoming.name
            || self.code != incoming.code
            || self.parent_id != incoming.parent_id
            || self.manager_id != incoming.manager_id
            || fills_gap(
                self.external_created_at.as_ref(),
                incoming.external_created_at.as_ref(),
            )
            || fills_gap(
                self.external_updated_at.as_ref(),
                incoming.external_updated_at.as_ref(),
            )
    }

    fn merged_with(&self, incoming: &Self, now: OffsetDateTime) -> Self {
        Self {
            id: self.id,
            external_id: incoming.external_id.clone(),
            name: incoming.name.clone(),
            code: incoming.code.clone(),
            display_order: incoming.display_order,
            manager_id: incoming.manager_id.clone(),
            parent_id: incoming.parent_id.clone(),
            external_created_at: incoming.external_created_at.or(self.external_created_at),
            external_updated_at: incoming.external_updated_at.or(self.external_updated_at),
            last_synced_at: incoming.last_synced_at.or(self.last_synced_at),
            created_at: self.created_at,
            updated_at: now,
            version: self.version,
        }
    }
}

impl SyncRecord for Employee {
    const KIND: SyncKind = SyncKind::Employees;

    fn id(&self) -> Uuid {
        self.id
    }

    fn external_id(&self) -> &str {
        &self.external_id
    }

    fn natural_key(&self) -> &str {
        &self.employee_number
    }

    fn secondary_key(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn last_synced_at(&self) -> Option<OffsetDateTime> {
        self.last_synced_at
    }

    fn set_last_synced_at(&mut self, at: OffsetDateTime) {
        self.last_synced_at = Some(at);
    }

    fn needs_update(&self, incoming: &Self) -> bool {
        let identity_drift = self.external_id != incoming.external_id
            || self.employee_number != incoming.employee_number;

        let tracked = self.name != incoming.name
            || self.status != incoming.status
            || self.rank_id != incoming.rank_id
            || self.rank_name != incoming.rank_name
            || self.rank_level != incoming.rank_level
            || self.department_id != incoming.department_id
            || self.department_name != incoming.department_name
            || self.department_code != incoming.department_code;

        let missing = fills_gap(self.email.as_ref(), incoming.email.as_ref())
            || fills_gap(self.phone_number.as_ref(), incoming.phone_number.as_ref())
            || fills_gap(self.date_of_birth.as_ref(), incoming.date_of_birth.as_ref())
            || fills_gap(self.gender.as_ref(), incoming.gender.as_ref())
            || fills_gap(self.hire_date.as_ref(), incoming.hire_date.as_ref())
            || fills_gap(self.position_id.as_ref(), incoming.position_id.as_ref())
            || fills_gap(self.position_name.as_ref(), incoming.position_name.as_ref())
            || fills_gap(self.manager_id.as_ref(), incoming.manager_id.as_ref());

        identity_drift || tracked || missing
    }

    fn merged_with(&self, incoming: &Self, now: OffsetDateTime) -> Self {
        Self {
            id: self.id,
            external_id: incoming.external_id.clone(),
            employee_number: incoming.employee_number.clone(),
            name: incoming.name.clone(),
            email: incoming.email.clone().or_else(|| self.email.clone()),
            phone_number: incoming
                .phone_number
                .clone()
                .or_else(|| self.phone_number.clone()),
            date_of_birth: incoming.date_of_birth.or(self.date_of_birth),
            gender: incoming.gender.or(self.gender),
            hire_date: incoming.hire_date.or(self.hire_date),
            status: incoming.status,
            department_id: incoming.department_id.clone(),
            department_name: incoming.department_name.clone(),
            department_code: incoming.department_code.clone(),
            position_id: incoming
                .position_id
                .clone()
                .or_else(|| self.position_id.clone()),
            position_name: incoming
                .position_name
                .clone()
                .or_else(|| self.position_name.clone()),
            rank_id: incoming.rank_id.clone(),
            rank_name: incoming.rank_name.clone(),
            rank_level: incoming.rank_level,
            manager_id: incoming.manager_id.clone().or_else(|| self.manager_id.clone()),
            roles: self.roles.clone(),
            exclusion: self.exclusion.clone(),
            is_accessible: self.is_accessible,
            last_synced_at: incoming.last_synced_at.or(self.last_synced_at),
            created_at: self.created_at,
            updated_at: now,
            version: self.version,
        }
    }
}
