//! REST surface under `/directory-sync/v1`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use routes::{ApiDoc, router};
