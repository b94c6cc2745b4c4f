//! Book and user storage for the library catalog.
//!
//! This crate provides a storage abstraction over the two catalog record
//! types and the join between them. It ships an in-memory store (for tests
//! and throwaway instances) and a SQLite store for durable deployments.

mod error;
mod memory;
mod sqlite;
mod traits;

#[cfg(test)]
mod conformance;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
