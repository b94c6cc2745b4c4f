//! Business logic services.

pub mod book_service;
pub mod clock;
