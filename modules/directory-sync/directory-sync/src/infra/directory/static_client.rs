//! Directory client serving a fixed snapshot: mock mode and tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    DirectoryClient, ExternalDepartment, ExternalDepartmentNode, ExternalEmployee,
    ExternalManagerLine, UpstreamError,
};

/// Everything the directory service would answer, in its wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectorySnapshot {
    pub departments: Vec<ExternalDepartment>,
    pub employees: Vec<ExternalEmployee>,
    /// Served by the hierarchy-shaped feed. Built from `employees` when empty.
    pub hierarchy: Vec<ExternalDepartmentNode>,
    pub manager_lines: Vec<ExternalManagerLine>,
}

#[derive(Default)]
pub struct StaticDirectoryClient {
    snapshot: RwLock<DirectorySnapshot>,
    failure: RwLock<Option<UpstreamError>>,
    department_calls: AtomicUsize,
    employee_calls: AtomicUsize,
}

impl StaticDirectoryClient {
    #[must_use]
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    /// Load a JSON snapshot file.
    ///
    /// # Errors
    /// The file cannot be read or is not a snapshot.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading directory snapshot {}", path.display()))?;
        let snapshot: DirectorySnapshot = serde_json::from_str(&raw)
            .with_context(|| format!("parsing directory snapshot {}", path.display()))?;
        Ok(Self::new(snapshot))
    }

    pub fn replace(&self, snapshot: DirectorySnapshot) {
        *self.snapshot.write() = snapshot;
    }

    pub fn set_departments(&self, departments: Vec<ExternalDepartment>) {
        self.snapshot.write().departments = departments;
    }

    pub fn set_employees(&self, employees: Vec<ExternalEmployee>) {
        self.snapshot.write().employees = employees;
    }

    /// Make every call fail with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<UpstreamError>) {
        *self.failure.write() = error;
    }

    pub fn department_calls(&self) -> usize {
        self.department_calls.load(Ordering::SeqCst)
    }

    pub fn employee_calls(&self) -> usize {
        self.employee_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), UpstreamError> {
        match self.failure.read().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn keep_employee(e: &ExternalEmployee, include_terminated: bool) -> bool {
    include_terminated || e.is_terminated != Some(true)
}

#[async_trait]
impl DirectoryClient for StaticDirectoryClient {
    async fn list_departments(
        &self,
        include_empty: bool,
    ) -> Result<Vec<ExternalDepartment>, UpstreamError> {
        self.department_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let snapshot = self.snapshot.read();
        if include_empty {
            return Ok(snapshot.departments.clone());
        }
        Ok(snapshot
            .departments
            .iter()
            .filter(|d| {
                snapshot.employees.iter().any(|e| {
                    e.department.as_ref().is_some_and(|r| r.id == d.id)
                })
            })
            .cloned()
            .collect())
    }

    async fn list_employees(
        &self,
        _with_detail: bool,
        include_terminated: bool,
    ) -> Result<Vec<ExternalEmployee>, UpstreamError> {
        self.employee_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .snapshot
            .read()
            .employees
            .iter()
            .filter(|e| keep_employee(e, include_terminated))
            .cloned()
            .collect())
    }

    async fn list_employees_by_hierarchy(
        &self,
        include_terminated: bool,
    ) -> Result<Vec<ExternalDepartmentNode>, UpstreamError> {
        self.employee_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let snapshot = self.snapshot.read();
        if !snapshot.hierarchy.is_empty() {
            return Ok(snapshot.hierarchy.clone());
        }
        // One flat node per unit, in department order.
        Ok(snapshot
            .departments
            .iter()
            .map(|d| ExternalDepartmentNode {
                id: d.id.clone(),
                department_name: Some(d.department_name.clone()),
                department_code: d.department_code.clone(),
                employees: snapshot
                    .employees
                    .iter()
                    .filter(|e| keep_employee(e, include_terminated))
                    .filter(|e| e.department.as_ref().is_some_and(|r| r.id == d.id))
                    .cloned()
                    .collect(),
                children: Vec::new(),
            })
            .collect())
    }

    async fn list_manager_lines(&self) -> Result<Vec<ExternalManagerLine>, UpstreamError> {
        self.check_failure()?;
        Ok(self.snapshot.read().manager_lines.clone())
    }
}
