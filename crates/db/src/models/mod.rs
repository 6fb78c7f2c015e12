//! Row models and insert DTOs for the persisted collections.

pub mod project;
pub mod todo;
pub mod user;
