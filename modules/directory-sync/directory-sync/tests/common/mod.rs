#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for directory-sync integration tests

use std::sync::Arc;

use directory_sync::config::DirectorySyncConfig;
use directory_sync::domain::ports::{
    ExternalDepartment, ExternalDepartmentRef, ExternalEmployee,
};
use directory_sync::domain::repo::SyncRepository;
use directory_sync::infra::directory::{DirectorySnapshot, StaticDirectoryClient};
use directory_sync::infra::storage::{
    Migrator, SeaOrmDepartmentRepository, SeaOrmEmployeeRepository,
};
use directory_sync::{Department, DirectorySyncModule, Employee};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Fresh in-memory database with the schema applied.
pub async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub struct Harness {
    pub client: Arc<StaticDirectoryClient>,
    pub departments: Arc<SeaOrmDepartmentRepository>,
    pub employees: Arc<SeaOrmEmployeeRepository>,
    pub module: DirectorySyncModule,
}

/// Module over SQLite and a static directory. Unattended sync stays
/// disabled so that reads never race a background refresh.
pub async fn harness(snapshot: DirectorySnapshot) -> Harness {
    harness_with(snapshot, DirectorySyncConfig::default()).await
}

pub async fn harness_with(snapshot: DirectorySnapshot, config: DirectorySyncConfig) -> Harness {
    let db = migrated_db().await;
    let client = Arc::new(StaticDirectoryClient::new(snapshot));
    let departments = Arc::new(SeaOrmDepartmentRepository::new(db.clone()));
    let employees = Arc::new(SeaOrmEmployeeRepository::new(db));

    let department_repo: Arc<dyn SyncRepository<Department>> = departments.clone();
    let employee_repo: Arc<dyn SyncRepository<Employee>> = employees.clone();
    let module =
        DirectorySyncModule::from_parts(config, client.clone(), department_repo, employee_repo);

    Harness {
        client,
        departments,
        employees,
        module,
    }
}

pub fn ext_department(id: &str, name: &str, parent: Option<&str>) -> ExternalDepartment {
    ExternalDepartment {
        id: id.to_owned(),
        department_name: name.to_owned(),
        department_code: Some(format!("C-{id}")),
        parent_department_id: parent.map(str::to_owned),
        ..ExternalDepartment::default()
    }
}

pub fn ext_employee(id: &str, number: &str, department: Option<&str>) -> ExternalEmployee {
    ExternalEmployee {
        id: id.to_owned(),
        employee_number: number.to_owned(),
        name: format!("Person {id}"),
        email: Some(format!("{id}@example.com").to_lowercase()),
        status: Some("ACTIVE".to_owned()),
        department: department.map(|d| ExternalDepartmentRef {
            id: d.to_owned(),
            ..ExternalDepartmentRef::default()
        }),
        ..ExternalEmployee::default()
    }
}

/// R&D (D1, managed by E1) above Platform (D2, no manager).
pub fn small_org() -> DirectorySnapshot {
    let mut rnd = ext_department("D1", "R&D", None);
    rnd.manager_id = Some("E1".to_owned());
    DirectorySnapshot {
        departments: vec![rnd, ext_department("D2", "Platform", Some("D1"))],
        employees: vec![
            ext_employee("E1", "1001", Some("D1")),
            ext_employee("E2", "1002", Some("D2")),
            ext_employee("E3", "1003", Some("D2")),
        ],
        ..DirectorySnapshot::default()
    }
}
