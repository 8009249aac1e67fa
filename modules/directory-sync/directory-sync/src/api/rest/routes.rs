use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use modkit_errors::Problem;
use utoipa::OpenApi;

use super::{dto, handlers};
use crate::domain::service::DirectorySyncService;

pub const BASE_PATH: &str = "/directory-sync/v1";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Directory Sync API",
        description = "Departments and employees mirrored from the directory service"
    ),
    paths(
        handlers::list_departments,
        handlers::get_department,
        handlers::get_department_by_code,
        handlers::list_employees,
        handlers::get_employee,
        handlers::get_employee_by_number,
        handlers::get_manager,
        handlers::exclude_employee,
        handlers::include_employee,
        handlers::sync_departments,
        handlers::sync_employees,
        handlers::last_department_run,
        handlers::last_employee_run,
    ),
    components(schemas(
        dto::DepartmentDto,
        dto::EmployeeDto,
        dto::ExclusionDto,
        dto::ExcludeEmployeeRequest,
        dto::SyncRunDto,
        Problem,
    )),
    tags(
        (name = "Departments", description = "Mirrored organizational units"),
        (name = "Employees", description = "Mirrored people and list exclusions"),
        (name = "Sync", description = "Manual synchronization runs"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Routes of the module, ready to be merged into the server router.
#[must_use]
pub fn router(service: Arc<DirectorySyncService>) -> Router {
    let api = Router::new()
        .route("/departments", get(handlers::list_departments))
        .route("/departments/{id}", get(handlers::get_department))
        .route(
            "/departments/by-code/{code}",
            get(handlers::get_department_by_code),
        )
        .route("/employees", get(handlers::list_employees))
        .route("/employees/{id}", get(handlers::get_employee))
        .route(
            "/employees/by-number/{number}",
            get(handlers::get_employee_by_number),
        )
        .route("/employees/{id}/manager", get(handlers::get_manager))
        .route(
            "/employees/{id}/exclusion",
            put(handlers::exclude_employee).delete(handlers::include_employee),
        )
        .route(
            "/sync/departments",
            post(handlers::sync_departments).get(handlers::last_department_run),
        )
        .route(
            "/sync/employees",
            post(handlers::sync_employees).get(handlers::last_employee_run),
        )
        .route("/openapi.json", get(openapi_json))
        .layer(Extension(service));

    Router::new().nest(BASE_PATH, api)
}
