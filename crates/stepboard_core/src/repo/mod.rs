//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for projects and steps.
//! - Isolate SQLite query and transaction details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`ProjectNotFound`,
//!   `StepNotFound`, ...) in addition to DB transport errors.
//! - Every write that touches `steps.position` runs inside one
//!   `BEGIN IMMEDIATE` transaction and leaves positions dense on commit.

mod error;
pub mod project_repo;
pub mod reorder;
mod schema_guard;
pub mod step_repo;

pub use error::{RepoError, RepoResult};
