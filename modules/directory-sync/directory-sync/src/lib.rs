//! Directory Sync Module
//!
//! Mirrors organizational units and people from the external directory
//! service into the local store: reconciles remote against local records,
//! resolves duplicates, infers the reporting hierarchy and refreshes itself
//! when the local copy goes stale.
//!
//! ## Public API
//!
//! The public API is defined in the `directory-sync-sdk` crate and re-exported here:
//! - `DirectorySyncApi` - trait for in-process consumers
//! - `Department`, `Employee`, `SyncRun` - data models
//! - `DirectorySyncError` - error types
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
// === PUBLIC API (from SDK) ===
pub use directory_sync_sdk::{
    Department, DirectorySyncApi, DirectorySyncError, Employee, EmployeeQuery, EmploymentStatus,
    Gender, ListExclusion, SyncKind, SyncRun,
};

// === MODULE DEFINITION ===
pub mod module;
pub use module::DirectorySyncModule;

// === LOCAL CLIENT ===
pub mod local_client;

// === INTERNAL MODULES ===
// Exposed for integration tests and the server binary. Only the SDK types
// are a stable public API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
