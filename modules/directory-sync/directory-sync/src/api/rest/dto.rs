//! REST DTOs for the directory sync API.
//!
//! These DTOs have serde and utoipa derives for REST serialization.

use directory_sync_sdk::{Department, Employee, ListExclusion, SyncRun};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// === Department DTOs ===

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDto {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub code: String,
    pub display_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub external_created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub external_updated_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub last_synced_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub version: i32,
}

impl From<Department> for DepartmentDto {
    fn from(d: Department) -> Self {
        Self {
            id: d.id,
            external_id: d.external_id,
            name: d.name,
            code: d.code,
            display_order: d.display_order,
            manager_id: d.manager_id,
            parent_id: d.parent_id,
            external_created_at: d.external_created_at,
            external_updated_at: d.external_updated_at,
            last_synced_at: d.last_synced_at,
            created_at: d.created_at,
            updated_at: d.updated_at,
            version: d.version,
        }
    }
}

// === Employee DTOs ===

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionDto {
    pub reason: String,
    pub excluded_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub excluded_at: OffsetDateTime,
}

impl From<ListExclusion> for ExclusionDto {
    fn from(x: ListExclusion) -> Self {
        Self {
            reason: x.reason,
            excluded_by: x.excluded_by,
            excluded_at: x.excluded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    pub id: Uuid,
    pub external_id: String,
    pub employee_number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// `male` or `female`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,
    /// `active`, `on_leave` or `resigned`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion: Option<ExclusionDto>,
    pub is_accessible: bool,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub last_synced_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub version: i32,
}

impl From<Employee> for EmployeeDto {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            external_id: e.external_id,
            employee_number: e.employee_number,
            name: e.name,
            email: e.email,
            phone_number: e.phone_number,
            date_of_birth: e.date_of_birth.map(|d| d.to_string()),
            gender: e.gender.map(|g| g.as_str().to_owned()),
            hire_date: e.hire_date.map(|d| d.to_string()),
            status: e.status.as_str().to_owned(),
            department_id: e.department_id,
            department_name: e.department_name,
            department_code: e.department_code,
            position_id: e.position_id,
            position_name: e.position_name,
            rank_id: e.rank_id,
            rank_name: e.rank_name,
            rank_level: e.rank_level,
            manager_id: e.manager_id,
            roles: e.roles,
            exclusion: e.exclusion.map(ExclusionDto::from),
            is_accessible: e.is_accessible,
            last_synced_at: e.last_synced_at,
            created_at: e.created_at,
            updated_at: e.updated_at,
            version: e.version,
        }
    }
}

/// Request DTO for hiding an employee from default listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExcludeEmployeeRequest {
    pub reason: String,
    /// Who made the decision, recorded as `excludedBy`.
    pub actor: String,
}

// === Sync DTOs ===

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunDto {
    /// `departments` or `employees`.
    pub kind: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub success: bool,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: Vec<String>,
}

impl From<SyncRun> for SyncRunDto {
    fn from(run: SyncRun) -> Self {
        Self {
            kind: run.kind.as_str().to_owned(),
            started_at: run.started_at,
            success: run.success,
            processed: run.processed,
            created: run.created,
            updated: run.updated,
            unchanged: run.unchanged,
            errors: run.errors,
        }
    }
}

// === Query parameters ===

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReadParams {
    /// Await a forced sync before reading.
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmployeeListParams {
    /// Include employees hidden by a list exclusion.
    #[serde(default)]
    pub include_excluded: bool,
    /// Await a forced sync before reading.
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SyncParams {
    /// Rewrite every matched record. Defaults to `true`.
    pub force: Option<bool>,
    /// Read the hierarchy-shaped employee feed. Defaults to the module setting.
    pub use_hierarchy_feed: Option<bool>,
}
