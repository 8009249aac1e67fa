//! Outbound port to the directory service and the record shapes it yields.
//!
//! The wire format is the directory service's concern. Every field decodes
//! through [`lenient`]: a `null` or mistyped value becomes absent (or empty,
//! for identity strings) and the record mapper decides whether the record
//! survives. One malformed record never fails the feed.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::lenient;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Unavailable(String),

    #[error("response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalDepartment {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub department_name: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub department_code: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub parent_department_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub manager_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i32")]
    pub order: Option<i32>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalDepartmentRef {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub department_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub department_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalPosition {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub position_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalRank {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub rank_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_i32")]
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalEmployee {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub employee_number: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub phone_number: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub hire_date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub department: Option<ExternalDepartmentRef>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub position: Option<ExternalPosition>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub rank: Option<ExternalRank>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub manager_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_bool")]
    pub is_terminated: Option<bool>,
}

/// One node of the hierarchy-shaped employee feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalDepartmentNode {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub department_name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub department_code: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub employees: Vec<ExternalEmployee>,
    #[serde(deserialize_with = "lenient::list")]
    pub children: Vec<ExternalDepartmentNode>,
}

impl ExternalDepartmentNode {
    /// Flatten the tree depth-first into the flat employee shape.
    ///
    /// Employees without an explicit department inherit the node they were
    /// listed under.
    #[must_use]
    pub fn flatten(nodes: Vec<Self>) -> Vec<ExternalEmployee> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = nodes.into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            let node_ref = ExternalDepartmentRef {
                id: node.id,
                department_name: node.department_name,
                department_code: node.department_code,
            };
            for mut employee in node.employees {
                if employee.department.is_none() && !node_ref.id.is_empty() {
                    employee.department = Some(node_ref.clone());
                }
                out.push(employee);
            }
            stack.extend(node.children.into_iter().rev());
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalManagerRef {
    #[serde(deserialize_with = "lenient::text")]
    pub employee_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalManagerLevel {
    #[serde(deserialize_with = "lenient::depth")]
    pub depth: u32,
    #[serde(deserialize_with = "lenient::list")]
    pub managers: Vec<ExternalManagerRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalManagerDepartment {
    #[serde(deserialize_with = "lenient::opt_text")]
    pub department_id: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub manager_line: Vec<ExternalManagerLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalManagerLine {
    #[serde(deserialize_with = "lenient::text")]
    pub employee_id: String,
    #[serde(deserialize_with = "lenient::list")]
    pub departments: Vec<ExternalManagerDepartment>,
}

/// Thin adapter over the directory service's feeds. Pure I/O.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_departments(
        &self,
        include_empty: bool,
    ) -> Result<Vec<ExternalDepartment>, UpstreamError>;

    async fn list_employees(
        &self,
        with_detail: bool,
        include_terminated: bool,
    ) -> Result<Vec<ExternalEmployee>, UpstreamError>;

    async fn list_employees_by_hierarchy(
        &self,
        include_terminated: bool,
    ) -> Result<Vec<ExternalDepartmentNode>, UpstreamError>;

    async fn list_manager_lines(&self) -> Result<Vec<ExternalManagerLine>, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: &str) -> ExternalEmployee {
        ExternalEmployee {
            id: id.to_owned(),
            employee_number: format!("N-{id}"),
            name: id.to_owned(),
            ..ExternalEmployee::default()
        }
    }

    #[test]
    fn test_flatten_is_depth_first_and_inherits_department() {
        let tree = vec![ExternalDepartmentNode {
            id: "D1".to_owned(),
            department_name: Some("HQ".to_owned()),
            department_code: Some("HQ".to_owned()),
            employees: vec![employee("e1")],
            children: vec![
                ExternalDepartmentNode {
                    id: "D2".to_owned(),
                    employees: vec![employee("e2")],
                    ..ExternalDepartmentNode::default()
                },
                ExternalDepartmentNode {
                    id: "D3".to_owned(),
                    employees: vec![employee("e3")],
                    ..ExternalDepartmentNode::default()
                },
            ],
        }];

        let flat = ExternalDepartmentNode::flatten(tree);
        let ids: Vec<_> = flat.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e1", "e2", "e3"]);
        assert_eq!(flat[0].department.as_ref().unwrap().id, "D1");
        assert_eq!(flat[2].department.as_ref().unwrap().id, "D3");
    }

    #[test]
    fn test_explicit_department_is_kept_when_flattening() {
        let mut e = employee("e1");
        e.department = Some(ExternalDepartmentRef {
            id: "OTHER".to_owned(),
            ..ExternalDepartmentRef::default()
        });
        let flat = ExternalDepartmentNode::flatten(vec![ExternalDepartmentNode {
            id: "D1".to_owned(),
            employees: vec![e],
            ..ExternalDepartmentNode::default()
        }]);
        assert_eq!(flat[0].department.as_ref().unwrap().id, "OTHER");
    }

    #[test]
    fn test_wire_shape_is_camel_case_and_lenient() {
        let raw = serde_json::json!({
            "id": "E1",
            "employeeNumber": "1001",
            "name": "Kim",
            "phoneNumber": "",
            "department": { "id": "D1", "departmentName": "R&D" },
            "rank": { "id": "R3", "rankName": "Senior", "level": 3 },
            "unknownField": 42
        });
        let e: ExternalEmployee = serde_json::from_value(raw).unwrap();
        assert_eq!(e.employee_number, "1001");
        assert_eq!(e.rank.unwrap().level, Some(3));
        assert_eq!(e.phone_number.as_deref(), Some(""));
        assert!(e.is_terminated.is_none());
    }

    #[test]
    fn test_null_identity_decodes_as_empty_instead_of_failing_the_batch() {
        let raw = serde_json::json!([
            { "id": "E1", "employeeNumber": "1001", "name": "Kim" },
            { "id": "E2", "employeeNumber": null, "name": "Lee" }
        ]);
        let batch: Vec<ExternalEmployee> = serde_json::from_value(raw).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].employee_number, "1001");
        assert_eq!(batch[1].employee_number, "");
        assert_eq!(batch[1].name, "Lee");
    }

    #[test]
    fn test_mistyped_fields_are_coerced_or_dropped() {
        let raw = serde_json::json!({
            "id": 42,
            "employeeNumber": 1001,
            "name": "Kim",
            "email": false,
            "department": "D1",
            "rank": { "id": "R1", "level": "3" },
            "position": { "id": "P1", "positionName": ["x"] },
            "isTerminated": "Y"
        });
        let e: ExternalEmployee = serde_json::from_value(raw).unwrap();
        assert_eq!(e.id, "42");
        assert_eq!(e.employee_number, "1001");
        assert_eq!(e.email.as_deref(), Some("false"));
        assert!(e.department.is_none());
        assert_eq!(e.rank.unwrap().level, Some(3));
        assert_eq!(e.position.unwrap().position_name, None);
        assert_eq!(e.is_terminated, Some(true));
    }

    #[test]
    fn test_manager_lines_tolerate_bad_depths_and_entries() {
        let raw = serde_json::json!({
            "employeeId": "E3",
            "departments": [{
                "managerLine": [
                    { "depth": "two", "managers": [{ "employeeId": "E9" }] },
                    { "depth": 1, "managers": [null, { "employeeId": "E1" }] }
                ]
            }, "garbage"]
        });
        let line: ExternalManagerLine = serde_json::from_value(raw).unwrap();
        assert_eq!(line.departments.len(), 1);
        let levels = &line.departments[0].manager_line;
        assert_eq!(levels[0].depth, u32::MAX);
        assert_eq!(levels[1].managers.len(), 1);
        assert_eq!(levels[1].managers[0].employee_id, "E1");
    }
}
