use crate::model::project::{ProjectId, ProjectValidationError};
use crate::model::step::{StepId, StepValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error kinds for project and step use cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Payload failed field validation.
    Validation(String),
    ProjectNotFound(ProjectId),
    StepNotFound {
        project_uuid: ProjectId,
        step_uuid: StepId,
    },
    /// Reorder target outside `1..=member_count`.
    InvalidTargetPosition {
        step_uuid: StepId,
        target: i64,
        member_count: usize,
    },
    /// Create position outside `1..=member_count + 1`.
    InvalidPosition { position: i64, member_count: usize },
    /// Create position already taken.
    DuplicatePosition {
        project_uuid: ProjectId,
        position: i64,
    },
    /// Invariant breach or unreadable stored data. Not caused by the caller.
    Internal(RepoError),
    /// Storage or lock failure. Safe to retry against fresh state.
    Persistence(RepoError),
}

impl ServiceError {
    /// Stable machine-readable code for presentation layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidPosition { .. } => "VALIDATION_ERROR",
            Self::ProjectNotFound(_) => "PROJECT_NOT_FOUND",
            Self::StepNotFound { .. } => "STEP_NOT_FOUND",
            Self::InvalidTargetPosition { .. } => "INVALID_REORDER_TARGET",
            Self::DuplicatePosition { .. } => "DUPLICATE_STEP_ORDER",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Whether the failure maps to a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_) | Self::StepNotFound { .. })
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::StepNotFound {
                project_uuid,
                step_uuid,
            } => write!(f, "step {step_uuid} not found in project {project_uuid}"),
            Self::InvalidTargetPosition {
                step_uuid,
                target,
                member_count,
            } => write!(
                f,
                "cannot move step {step_uuid} to position {target}; valid range is 1..={member_count}"
            ),
            Self::InvalidPosition {
                position,
                member_count,
            } => write!(
                f,
                "step position {position} is outside 1..={}; positions must stay dense",
                member_count + 1
            ),
            Self::DuplicatePosition {
                project_uuid,
                position,
            } => write!(
                f,
                "position {position} is already taken in project {project_uuid}"
            ),
            Self::Internal(err) => write!(f, "internal error: {err}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Internal(err) | Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            RepoError::StepNotFound {
                project_uuid,
                step_uuid,
            } => Self::StepNotFound {
                project_uuid,
                step_uuid,
            },
            RepoError::InvalidTargetPosition {
                step_uuid,
                target,
                member_count,
            } => Self::InvalidTargetPosition {
                step_uuid,
                target,
                member_count,
            },
            RepoError::InvalidPosition {
                position,
                member_count,
            } => Self::InvalidPosition {
                position,
                member_count,
            },
            RepoError::DuplicatePosition {
                project_uuid,
                position,
            } => Self::DuplicatePosition {
                project_uuid,
                position,
            },
            db @ RepoError::Db(_) => Self::Persistence(db),
            other => Self::Internal(other),
        }
    }
}

impl From<ProjectValidationError> for ServiceError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<StepValidationError> for ServiceError {
    fn from(value: StepValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}
