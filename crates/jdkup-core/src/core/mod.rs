//! Internal implementation modules for `jdkup-core`.
//!
//! The CLI goes through the handlers and types re-exported from the crate
//! root rather than importing these modules directly.

pub mod commands;
pub mod config;
pub mod discovery;
pub mod errors;
pub(crate) mod fs;
pub mod jdks;
pub(crate) mod net;
pub mod probe;
pub mod provision;
pub mod query;
pub mod repository;
pub mod services;
#[cfg(test)]
pub(crate) mod test_support;
pub mod tooling;
pub mod transfer;
