//! REST handlers for the directory sync API.
//!
//! Handlers are thin: parse input, call the domain service, map errors to a
//! problem response.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::Json;
use directory_sync_sdk::{EmployeeQuery, SyncKind};
use modkit_errors::Problem;
use uuid::Uuid;

use super::dto::{
    DepartmentDto, EmployeeDto, EmployeeListParams, ExcludeEmployeeRequest, ReadParams,
    SyncParams, SyncRunDto,
};
use super::error::ApiError;
use crate::domain::service::DirectorySyncService;

pub type ApiResult<T> = Result<Json<T>, ApiError>;

// === Departments ===

#[utoipa::path(
    get,
    path = "/directory-sync/v1/departments",
    params(ReadParams),
    responses(
        (status = 200, description = "Live departments", body = [DepartmentDto]),
        (status = 503, description = "Forced refresh timed out", body = Problem),
    ),
    tag = "Departments"
)]
#[tracing::instrument(skip(svc))]
pub async fn list_departments(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Query(params): Query<ReadParams>,
) -> ApiResult<Vec<DepartmentDto>> {
    let departments = svc.get_departments(params.force_refresh).await?;
    Ok(Json(departments.into_iter().map(DepartmentDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/directory-sync/v1/departments/{id}",
    params(("id" = Uuid, Path, description = "Local department id"), ReadParams),
    responses(
        (status = 200, description = "The department", body = DepartmentDto),
        (status = 404, description = "No live department with this id", body = Problem),
    ),
    tag = "Departments"
)]
#[tracing::instrument(skip(svc), fields(department_id = %id))]
pub async fn get_department(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReadParams>,
) -> ApiResult<DepartmentDto> {
    let department = svc.get_department(id, params.force_refresh).await?;
    Ok(Json(DepartmentDto::from(department)))
}

#[utoipa::path(
    get,
    path = "/directory-sync/v1/departments/by-code/{code}",
    params(("code" = String, Path, description = "Department short code"), ReadParams),
    responses(
        (status = 200, description = "The department", body = DepartmentDto),
        (status = 404, description = "No live department with this code", body = Problem),
    ),
    tag = "Departments"
)]
#[tracing::instrument(skip(svc))]
pub async fn get_department_by_code(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Path(code): Path<String>,
    Query(params): Query<ReadParams>,
) -> ApiResult<DepartmentDto> {
    let department = svc
        .get_department_by_code(&code, params.force_refresh)
        .await?;
    Ok(Json(DepartmentDto::from(department)))
}

// === Employees ===

#[utoipa::path(
    get,
    path = "/directory-sync/v1/employees",
    params(EmployeeListParams),
    responses(
        (status = 200, description = "Live employees", body = [EmployeeDto]),
        (status = 503, description = "Forced refresh timed out", body = Problem),
    ),
    tag = "Employees"
)]
#[tracing::instrument(skip(svc))]
pub async fn list_employees(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Query(params): Query<EmployeeListParams>,
) -> ApiResult<Vec<EmployeeDto>> {
    let employees = svc
        .get_employees(EmployeeQuery {
            include_excluded: params.include_excluded,
            force_refresh: params.force_refresh,
        })
        .await?;
    Ok(Json(employees.into_iter().map(EmployeeDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/directory-sync/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Local employee id"), ReadParams),
    responses(
        (status = 200, description = "The employee", body = EmployeeDto),
        (status = 404, description = "No live employee with this id", body = Problem),
    ),
    tag = "Employees"
)]
#[tracing::instrument(skip(svc), fields(employee_id = %id))]
pub async fn get_employee(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReadParams>,
) -> ApiResult<EmployeeDto> {
    let employee = svc.get_employee(id, params.force_refresh).await?;
    Ok(Json(EmployeeDto::from(employee)))
}

#[utoipa::path(
    get,
    path = "/directory-sync/v1/employees/by-number/{number}",
    params(("number" = String, Path, description = "Employee number"), ReadParams),
    responses(
        (status = 200, description = "The employee", body = EmployeeDto),
        (status = 404, description = "No live employee with this number", body = Problem),
    ),
    tag = "Employees"
)]
#[tracing::instrument(skip(svc))]
pub async fn get_employee_by_number(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Path(number): Path<String>,
    Query(params): Query<ReadParams>,
) -> ApiResult<EmployeeDto> {
    let employee = svc
        .get_employee_by_number(&number, params.force_refresh)
        .await?;
    Ok(Json(EmployeeDto::from(employee)))
}

#[utoipa::path(
    get,
    path = "/directory-sync/v1/employees/{id}/manager",
    params(("id" = Uuid, Path, description = "Local employee id")),
    responses(
        (status = 200, description = "The effective manager, or null", body = Option<EmployeeDto>),
        (status = 404, description = "No live employee with this id", body = Problem),
    ),
    tag = "Employees"
)]
#[tracing::instrument(skip(svc), fields(employee_id = %id))]
pub async fn get_manager(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<EmployeeDto>> {
    let manager = svc.resolve_manager(id).await?;
    Ok(Json(manager.map(EmployeeDto::from)))
}

#[utoipa::path(
    put,
    path = "/directory-sync/v1/employees/{id}/exclusion",
    params(("id" = Uuid, Path, description = "Local employee id")),
    request_body = ExcludeEmployeeRequest,
    responses(
        (status = 200, description = "Employee hidden from default listings", body = EmployeeDto),
        (status = 400, description = "Blank reason or actor", body = Problem),
        (status = 404, description = "No live employee with this id", body = Problem),
    ),
    tag = "Employees"
)]
#[tracing::instrument(skip(svc, req), fields(employee_id = %id, actor = %req.actor))]
pub async fn exclude_employee(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ExcludeEmployeeRequest>,
) -> ApiResult<EmployeeDto> {
    let employee = svc.exclude_employee(id, &req.reason, &req.actor).await?;
    Ok(Json(EmployeeDto::from(employee)))
}

#[utoipa::path(
    delete,
    path = "/directory-sync/v1/employees/{id}/exclusion",
    params(("id" = Uuid, Path, description = "Local employee id")),
    responses(
        (status = 200, description = "Exclusion cleared", body = EmployeeDto),
        (status = 404, description = "No live employee with this id", body = Problem),
    ),
    tag = "Employees"
)]
#[tracing::instrument(skip(svc), fields(employee_id = %id))]
pub async fn include_employee(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeDto> {
    let employee = svc.include_employee(id).await?;
    Ok(Json(EmployeeDto::from(employee)))
}

// === Manual sync ===

#[utoipa::path(
    post,
    path = "/directory-sync/v1/sync/departments",
    params(SyncParams),
    responses(
        (status = 200, description = "Run summary", body = SyncRunDto),
        (status = 502, description = "Directory service unavailable", body = Problem),
        (status = 503, description = "Directory service timed out", body = Problem),
    ),
    tag = "Sync"
)]
#[tracing::instrument(skip(svc))]
pub async fn sync_departments(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Query(params): Query<SyncParams>,
) -> ApiResult<SyncRunDto> {
    let run = svc.sync_departments(params.force.unwrap_or(true)).await?;
    Ok(Json(SyncRunDto::from(run)))
}

#[utoipa::path(
    post,
    path = "/directory-sync/v1/sync/employees",
    params(SyncParams),
    responses(
        (status = 200, description = "Run summary", body = SyncRunDto),
        (status = 502, description = "Directory service unavailable", body = Problem),
        (status = 503, description = "Directory service timed out", body = Problem),
    ),
    tag = "Sync"
)]
#[tracing::instrument(skip(svc))]
pub async fn sync_employees(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
    Query(params): Query<SyncParams>,
) -> ApiResult<SyncRunDto> {
    let use_hierarchy_feed = params
        .use_hierarchy_feed
        .unwrap_or(svc.config().use_hierarchy_feed);
    let run = svc
        .sync_employees(params.force.unwrap_or(true), use_hierarchy_feed)
        .await?;
    Ok(Json(SyncRunDto::from(run)))
}

#[utoipa::path(
    get,
    path = "/directory-sync/v1/sync/departments",
    responses(
        (status = 200, description = "Most recent department run, or null", body = Option<SyncRunDto>),
    ),
    tag = "Sync"
)]
pub async fn last_department_run(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
) -> Json<Option<SyncRunDto>> {
    Json(svc.last_run(SyncKind::Departments).map(SyncRunDto::from))
}

#[utoipa::path(
    get,
    path = "/directory-sync/v1/sync/employees",
    responses(
        (status = 200, description = "Most recent employee run, or null", body = Option<SyncRunDto>),
    ),
    tag = "Sync"
)]
pub async fn last_employee_run(
    Extension(svc): Extension<Arc<DirectorySyncService>>,
) -> Json<Option<SyncRunDto>> {
    Json(svc.last_run(SyncKind::Employees).map(SyncRunDto::from))
}
