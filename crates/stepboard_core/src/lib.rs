//! Core domain logic for stepboard: projects holding densely ordered steps.
//! This crate is the single source of truth for step ordering invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::project::{NewProject, Project, ProjectId, ProjectPatch, ProjectWithSteps};
pub use model::step::{NewStep, Step, StepId, StepOrderBy, StepPatch};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::reorder::{ShiftDirection, ShiftPlan, PARKED_POSITION};
pub use repo::step_repo::{SqliteStepRepository, StepRepository};
pub use repo::{RepoError, RepoResult};
pub use service::project_service::ProjectService;
pub use service::step_service::StepService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
