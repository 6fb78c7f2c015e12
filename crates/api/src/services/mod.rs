//! Resource services: ownership checks, field rules and persistence for
//! projects and todos, followed by the realtime broadcast of each mutation.
//!
//! Handlers parse and validate the request, then call in here. A broadcast
//! never fails the request that triggered it.

pub mod project;
pub mod todo;
