//! Conversions between `SeaORM` models and SDK records.

use directory_sync_sdk::{Department, Employee, EmploymentStatus, Gender, ListExclusion};
use sea_orm::ActiveValue::{NotSet, Set};
use tracing::warn;

use super::entity::{department, employee};

impl From<department::Model> for Department {
    fn from(model: department::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            name: model.name,
            code: model.code,
            display_order: model.display_order,
            manager_id: model.manager_id,
            parent_id: model.parent_id,
            external_created_at: model.external_created_at,
            external_updated_at: model.external_updated_at,
            last_synced_at: model.last_synced_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        }
    }
}

/// Every column set except `deleted_at`, which only retirement writes.
pub fn department_to_active_model(d: &Department) -> department::ActiveModel {
    department::ActiveModel {
        id: Set(d.id),
        external_id: Set(d.external_id.clone()),
        name: Set(d.name.clone()),
        code: Set(d.code.clone()),
        display_order: Set(d.display_order),
        manager_id: Set(d.manager_id.clone()),
        parent_id: Set(d.parent_id.clone()),
        external_created_at: Set(d.external_created_at),
        external_updated_at: Set(d.external_updated_at),
        last_synced_at: Set(d.last_synced_at),
        created_at: Set(d.created_at),
        updated_at: Set(d.updated_at),
        deleted_at: NotSet,
        version: Set(d.version),
    }
}

impl From<employee::Model> for Employee {
    fn from(model: employee::Model) -> Self {
        let status = EmploymentStatus::from_stored(&model.status).unwrap_or_else(|| {
            warn!(employee_id = %model.id, status = %model.status, "unknown stored status");
            EmploymentStatus::Active
        });
        let roles = serde_json::from_str::<Vec<String>>(&model.roles).unwrap_or_else(|e| {
            warn!(employee_id = %model.id, error = %e, "stored roles are not a JSON array");
            Vec::new()
        });
        let exclusion = match (model.exclusion_reason, model.excluded_by, model.excluded_at) {
            (Some(reason), Some(excluded_by), Some(excluded_at)) => Some(ListExclusion {
                reason,
                excluded_by,
                excluded_at,
            }),
            _ => None,
        };

        Self {
            id: model.id,
            external_id: model.external_id,
            employee_number: model.employee_number,
            name: model.name,
            email: model.email,
            phone_number: model.phone_number,
            date_of_birth: model.date_of_birth,
            gender: model.gender.as_deref().and_then(Gender::from_stored),
            hire_date: model.hire_date,
            status,
            department_id: model.department_id,
            department_name: model.department_name,
            department_code: model.department_code,
            position_id: model.position_id,
            position_name: model.position_name,
            rank_id: model.rank_id,
            rank_name: model.rank_name,
            rank_level: model.rank_level,
            manager_id: model.manager_id,
            roles,
            exclusion,
            is_accessible: model.is_accessible,
            last_synced_at: model.last_synced_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        }
    }
}

pub fn employee_to_active_model(e: &Employee) -> employee::ActiveModel {
    let exclusion = e.exclusion.as_ref();
    employee::ActiveModel {
        id: Set(e.id),
        external_id: Set(e.external_id.clone()),
        employee_number: Set(e.employee_number.clone()),
        name: Set(e.name.clone()),
        email: Set(e.email.clone()),
        phone_number: Set(e.phone_number.clone()),
        date_of_birth: Set(e.date_of_birth),
        gender: Set(e.gender.map(|g| g.as_str().to_owned())),
        hire_date: Set(e.hire_date),
        status: Set(e.status.as_str().to_owned()),
        department_id: Set(e.department_id.clone()),
        department_name: Set(e.department_name.clone()),
        department_code: Set(e.department_code.clone()),
        position_id: Set(e.position_id.clone()),
        position_name: Set(e.position_name.clone()),
        rank_id: Set(e.rank_id.clone()),
        rank_name: Set(e.rank_name.clone()),
        rank_level: Set(e.rank_level),
        manager_id: Set(e.manager_id.clone()),
        roles: Set(serde_json::Value::from(e.roles.clone()).to_string()),
        exclusion_reason: Set(exclusion.map(|x| x.reason.clone())),
        excluded_by: Set(exclusion.map(|x| x.excluded_by.clone())),
        excluded_at: Set(exclusion.map(|x| x.excluded_at)),
        is_accessible: Set(e.is_accessible),
        last_synced_at: Set(e.last_synced_at),
        created_at: Set(e.created_at),
        updated_at: Set(e.updated_at),
        deleted_at: NotSet,
        version: Set(e.version),
    }
}
