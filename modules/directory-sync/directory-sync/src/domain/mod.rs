pub mod error;
pub mod gate;
pub mod hierarchy;
pub mod lenient;
pub mod mapper;
pub mod persister;
pub mod ports;
pub mod reconcile;
pub mod records;
pub mod repo;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod persister_test;
