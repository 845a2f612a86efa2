use crate::db::DbError;
use crate::model::project::ProjectId;
use crate::model::step::StepId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from project and step repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error, including lock wait timeouts.
    Db(DbError),
    /// Project does not exist.
    ProjectNotFound(ProjectId),
    /// Step does not exist inside the given project.
    StepNotFound {
        project_uuid: ProjectId,
        step_uuid: StepId,
    },
    /// Reorder target lies outside `1..=member_count`.
    InvalidTargetPosition {
        step_uuid: StepId,
        target: i64,
        member_count: usize,
    },
    /// Create position outside `1..=member_count + 1`.
    InvalidPosition { position: i64, member_count: usize },
    /// Create position is already taken inside the project.
    DuplicatePosition {
        project_uuid: ProjectId,
        position: i64,
    },
    /// Stored positions are not dense, or the storage layer rejected a shift.
    /// Signals a logic bug or outside interference, never a user error.
    OrderingInvariantBreached {
        project_uuid: ProjectId,
        detail: String,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to valid read model.
    InvalidData(String),
}

impl RepoError {
    /// Stable snake_case code used in log events.
    pub fn log_code(&self) -> &'static str {
        match self {
            Self::Db(err) if err.is_busy() => "db_busy",
            Self::Db(_) => "db_error",
            Self::ProjectNotFound(_) => "project_not_found",
            Self::StepNotFound { .. } => "step_not_found",
            Self::InvalidTargetPosition { .. } => "invalid_target_position",
            Self::InvalidPosition { .. } => "invalid_position",
            Self::DuplicatePosition { .. } => "duplicate_position",
            Self::OrderingInvariantBreached { .. } => "ordering_invariant_breached",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_required_table",
            Self::MissingRequiredColumn { .. } => "missing_required_column",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
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
            Self::OrderingInvariantBreached {
                project_uuid,
                detail,
            } => write!(
                f,
                "step ordering invariant breached in project {project_uuid}: {detail}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
