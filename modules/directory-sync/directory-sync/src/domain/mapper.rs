//! External record shapes to internal records.
//!
//! Pure functions. Malformed optional fields fall back to a safe default;
//! only a missing identity field rejects a record.

use std::collections::HashMap;

use directory_sync_sdk::{Department, Employee, EmploymentStatus, Gender};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::ports::{ExternalDepartment, ExternalEmployee, ExternalManagerLine};

/// Trimmed, non-empty copy of an optional string.
fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn required(value: &str, field: &str, external_id: &str) -> Result<String, DomainError> {
    present(Some(value)).ok_or_else(|| {
        let id = if external_id.trim().is_empty() {
            "<no id>"
        } else {
            external_id
        };
        DomainError::record_skipped(id, format!("missing {field}"))
    })
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_date(raw: Option<&str>) -> Option<Date> {
    let raw = present(raw)?;
    Date::parse(&raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| OffsetDateTime::parse(&raw, &Rfc3339).ok().map(|ts| ts.date()))
}

/// RFC 3339, or a bare date taken as midnight UTC.
pub fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    let raw = present(raw)?;
    OffsetDateTime::parse(&raw, &Rfc3339).ok().or_else(|| {
        Date::parse(&raw, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(|d| d.with_time(Time::MIDNIGHT).assume_utc())
    })
}

/// An explicit termination flag wins over the status code; unknown codes are active.
pub fn parse_status(status: Option<&str>, is_terminated: Option<bool>) -> EmploymentStatus {
    if is_terminated == Some(true) {
        return EmploymentStatus::Resigned;
    }
    let Some(code) = present(status) else {
        return EmploymentStatus::Active;
    };
    match code.to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
        "ON_LEAVE" | "LEAVE" | "ONLEAVE" | "SUSPENDED" => EmploymentStatus::OnLeave,
        "RESIGNED" | "TERMINATED" | "RETIRED" | "INACTIVE" => EmploymentStatus::Resigned,
        _ => EmploymentStatus::Active,
    }
}

pub fn parse_gender(raw: Option<&str>) -> Option<Gender> {
    match present(raw)?.to_ascii_uppercase().as_str() {
        "M" | "MALE" => Some(Gender::Male),
        "F" | "FEMALE" => Some(Gender::Female),
        _ => None,
    }
}

/// Map an upstream unit. A unit without a short code is keyed by its external id.
///
/// # Errors
/// `RecordMappingSkipped` when the id or name is missing.
pub fn map_department(
    ext: &ExternalDepartment,
    now: OffsetDateTime,
) -> Result<Department, DomainError> {
    let external_id = required(&ext.id, "id", &ext.id)?;
    let name = required(&ext.department_name, "departmentName", &external_id)?;
    let code = present(ext.department_code.as_deref()).unwrap_or_else(|| external_id.clone());
    let parent_id =
        present(ext.parent_department_id.as_deref()).filter(|parent| *parent != external_id);

    Ok(Department {
        id: Uuid::now_v7(),
        external_id,
        name,
        code,
        display_order: ext.order.unwrap_or_default(),
        manager_id: present(ext.manager_id.as_deref()),
        parent_id,
        external_created_at: parse_timestamp(ext.created_at.as_deref()),
        external_updated_at: parse_timestamp(ext.updated_at.as_deref()),
        last_synced_at: Some(now),
        created_at: now,
        updated_at: now,
        version: 1,
    })
}

/// Map an upstream person.
///
/// # Errors
/// `RecordMappingSkipped` when the id, employee number or name is missing.
pub fn map_employee(ext: &ExternalEmployee, now: OffsetDateTime) -> Result<Employee, DomainError> {
    let external_id = required(&ext.id, "id", &ext.id)?;
    let employee_number = required(&ext.employee_number, "employeeNumber", &external_id)?;
    let name = required(&ext.name, "name", &external_id)?;

    let department = ext
        .department
        .as_ref()
        .filter(|d| !d.id.trim().is_empty());
    let position = ext.position.as_ref().filter(|p| !p.id.trim().is_empty());
    let rank = ext.rank.as_ref().filter(|r| !r.id.trim().is_empty());

    Ok(Employee {
        id: Uuid::now_v7(),
        manager_id: present(ext.manager_id.as_deref()).filter(|m| *m != external_id),
        external_id,
        employee_number,
        name,
        email: present(ext.email.as_deref()),
        phone_number: present(ext.phone_number.as_deref()),
        date_of_birth: parse_date(ext.date_of_birth.as_deref()),
        gender: parse_gender(ext.gender.as_deref()),
        hire_date: parse_date(ext.hire_date.as_deref()),
        status: parse_status(ext.status.as_deref(), ext.is_terminated),
        department_id: department.map(|d| d.id.trim().to_owned()),
        department_name: department.and_then(|d| present(d.department_name.as_deref())),
        department_code: department.and_then(|d| present(d.department_code.as_deref())),
        position_id: position.map(|p| p.id.trim().to_owned()),
        position_name: position.and_then(|p| present(p.position_name.as_deref())),
        rank_id: rank.map(|r| r.id.trim().to_owned()),
        rank_name: rank.and_then(|r| present(r.rank_name.as_deref())),
        rank_level: rank.and_then(|r| r.level),
        roles: Vec::new(),
        exclusion: None,
        is_accessible: true,
        last_synced_at: Some(now),
        created_at: now,
        updated_at: now,
        version: 1,
    })
}

/// Employee external id to the external id of the closest manager on the
/// manager-line feed. People never map to themselves.
pub fn manager_map(lines: &[ExternalManagerLine]) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in lines {
        let employee = line.employee_id.trim();
        if employee.is_empty() {
            continue;
        }
        let closest = line
            .departments
            .iter()
            .flat_map(|d| d.manager_line.iter())
            .flat_map(|level| {
                level
                    .managers
                    .iter()
                    .map(move |m| (level.depth, m.employee_id.trim()))
            })
            .filter(|(_, manager)| !manager.is_empty() && *manager != employee)
            .min_by_key(|(depth, _)| *depth);
        if let Some((_, manager)) = closest {
            out.insert(employee.to_owned(), manager.to_owned());
        }
    }
    out
}
