//! # Infrastructure Adapters
//!
//! Concrete implementations of the search and report storage interfaces.

pub mod filesystem_reports;
pub mod memory;

pub use filesystem_reports::FilesystemReportStore;
pub use memory::{InMemoryReportStore, InMemorySearchStore};
