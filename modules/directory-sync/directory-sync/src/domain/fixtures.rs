//! Record builders shared by the domain unit tests.

use directory_sync_sdk::{Department, Employee, EmploymentStatus};
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

pub const SEEDED_AT: OffsetDateTime = datetime!(2026-01-01 00:00 UTC);

pub fn department(external_id: &str, code: &str, name: &str) -> Department {
    Department {
        id: Uuid::new_v4(),
        external_id: external_id.to_owned(),
        name: name.to_owned(),
        code: code.to_owned(),
        display_order: 0,
        manager_id: None,
        parent_id: None,
        external_created_at: None,
        external_updated_at: None,
        last_synced_at: Some(SEEDED_AT),
        created_at: SEEDED_AT,
        updated_at: SEEDED_AT,
        version: 1,
    }
}

pub fn employee(external_id: &str, number: &str, name: &str) -> Employee {
    Employee {
        id: Uuid::new_v4(),
        external_id: external_id.to_owned(),
        employee_number: number.to_owned(),
        name: name.to_owned(),
        email: None,
        phone_number: None,
        date_of_birth: None,
        gender: None,
        hire_date: None,
        status: EmploymentStatus::Active,
        department_id: None,
        department_name: None,
        department_code: None,
        position_id: None,
        position_name: None,
        rank_id: None,
        rank_name: None,
        rank_level: None,
        manager_id: None,
        roles: Vec::new(),
        exclusion: None,
        is_accessible: true,
        last_synced_at: Some(SEEDED_AT),
        created_at: SEEDED_AT,
        updated_at: SEEDED_AT,
        version: 1,
    }
}

pub fn in_department(mut e: Employee, department: &Department) -> Employee {
    e.department_id = Some(department.external_id.clone());
    e.department_name = Some(department.name.clone());
    e.department_code = Some(department.code.clone());
    e
}
