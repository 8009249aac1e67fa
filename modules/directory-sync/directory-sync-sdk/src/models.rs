//! Public models for the `directory_sync` module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the `directory_sync` module and its consumers. Identity is split
//! between the local `id` (owned by this store) and `external_id` (owned by
//! the directory service and stable across syncs).

use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// An organizational unit mirrored from the directory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub code: String,
    pub display_order: i32,
    /// External id of the employee managing this unit.
    pub manager_id: Option<String>,
    /// External id of the parent unit. May dangle during a partial sync.
    pub parent_id: Option<String>,
    pub external_created_at: Option<OffsetDateTime>,
    pub external_updated_at: Option<OffsetDateTime>,
    pub last_synced_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub version: i32,
}

/// Employment status as normalized from the directory feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmploymentStatus {
    #[default]
    Active,
    OnLeave,
    Resigned,
}

impl EmploymentStatus {
    /// Stable storage/wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnLeave => "on_leave",
            Self::Resigned => "resigned",
        }
    }

    /// Parse a stable name produced by [`EmploymentStatus::as_str`].
    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "on_leave" => Some(Self::OnLeave),
            "resigned" => Some(Self::Resigned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Local administrative decision to hide an employee from default listings.
///
/// Exclusion is layered on top of synced data: directory syncs keep the
/// employee's directory fields current and never touch this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListExclusion {
    pub reason: String,
    pub excluded_by: String,
    pub excluded_at: OffsetDateTime,
}

/// A person mirrored from the directory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: Uuid,
    pub external_id: String,
    pub employee_number: String,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<Gender>,
    pub hire_date: Option<Date>,
    pub status: EmploymentStatus,
    /// External id of the employee's department.
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub department_code: Option<String>,
    pub position_id: Option<String>,
    pub position_name: Option<String>,
    pub rank_id: Option<String>,
    pub rank_name: Option<String>,
    pub rank_level: Option<i32>,
    /// External id of the effective superior, not necessarily the unit manager.
    pub manager_id: Option<String>,
    pub roles: Vec<String>,
    pub exclusion: Option<ListExclusion>,
    pub is_accessible: bool,
    pub last_synced_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub version: i32,
}

impl Employee {
    #[must_use]
    pub fn is_excluded_from_list(&self) -> bool {
        self.exclusion.is_some()
    }
}

/// Filters for employee listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmployeeQuery {
    /// Include employees hidden by a list exclusion.
    pub include_excluded: bool,
    /// Await a forced sync before reading.
    pub force_refresh: bool,
}

/// The two record kinds synchronized from the directory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncKind {
    Departments,
    Employees,
}

impl SyncKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Employees => "employees",
        }
    }
}

/// Outcome of a single synchronization run.
///
/// Per-record failures are collected in `errors` and do not flip `success`.
/// A run that aborts (feed fetch or snapshot read failed) is reported with
/// `success == false` and the cause as its only error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRun {
    pub kind: SyncKind,
    pub started_at: OffsetDateTime,
    pub success: bool,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: Vec<String>,
}

impl SyncRun {
    #[must_use]
    pub fn started(kind: SyncKind, started_at: OffsetDateTime) -> Self {
        Self {
            kind,
            started_at,
            success: true,
            processed: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            errors: Vec::new(),
        }
    }

    /// Mark the run as aborted by `reason`.
    #[must_use]
    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.success = false;
        self.errors.push(reason.into());
        self
    }
}
