//! Directory Sync SDK
//!
//! This crate provides the public API for the directory-sync module:
//! - `DirectorySyncApi` trait for in-process consumers (controllers, seeders,
//!   other context services)
//! - Model types (`Department`, `Employee`, `SyncRun`, ...)
//! - Error type (`DirectorySyncError`)
//!
//! ```ignore
//! let run = client.sync_employees(true, false).await?;
//! tracing::info!(created = run.created, updated = run.updated, "employee sync finished");
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::DirectorySyncApi;
pub use errors::DirectorySyncError;
pub use models::{
    Department, Employee, EmployeeQuery, EmploymentStatus, Gender, ListExclusion, SyncKind,
    SyncRun,
};
