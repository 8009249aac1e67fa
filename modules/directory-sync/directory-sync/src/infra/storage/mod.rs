//! Storage layer: `SeaORM` entities, migrations and repositories.
//!
//! `in_memory_repo` is a database-free `SyncRepository` for domain tests.

pub mod entity;
pub mod in_memory_repo;
pub mod mapper;
pub mod migrations;
pub mod sea_orm_repo;


pub use in_memory_repo::InMemoryRepository;
pub use migrations::Migrator;
pub use sea_orm_repo::{SeaOrmDepartmentRepository, SeaOrmEmployeeRepository};
