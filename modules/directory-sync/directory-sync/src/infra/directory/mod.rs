//! Directory service adapters implementing `DirectoryClient`.

pub mod http_client;
pub mod static_client;

pub use http_client::HttpDirectoryClient;
pub use static_client::{DirectorySnapshot, StaticDirectoryClient};
