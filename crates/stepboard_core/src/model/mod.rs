//! Plain data records for projects and their ordered steps.
//!
//! # Responsibility
//! - Define the records passed by value between repositories, services and
//!   callers. No record carries a connection or lazy-loads relations.
//! - Own input validation for create/update payloads.
//!
//! # Invariants
//! - A step belongs to exactly one project; deleting the project deletes it.
//! - Step positions inside one project form the dense sequence `1..=N`.

pub mod project;
pub mod step;

/// Upper bound on title length, in characters, for projects and steps.
pub const MAX_TITLE_CHARS: usize = 120;
