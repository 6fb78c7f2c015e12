//! Domain logic for the task-management API.
//!
//! This crate performs no I/O. It holds the ownership guard, the query
//! shaper, field-level rules for todos and projects, and the typed request
//! payloads validated before they reach the service layer.

pub mod attachment;
pub mod error;
pub mod guard;
pub mod project;
pub mod query;
pub mod serde_util;
pub mod todo;
pub mod types;
pub mod user;
