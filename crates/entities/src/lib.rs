//! Core entity definitions for the library catalog.
//!
//! This crate defines the records shared by the storage layer, the book
//! service and the HTTP API: books, users and the loans that join them.

mod book;
mod loan;
mod user;

pub use book::*;
pub use loan::*;
pub use user::*;
