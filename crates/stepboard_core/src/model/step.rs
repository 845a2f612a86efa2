//! Step domain model.
//!
//! # Invariants
//! - `position` is a 1-based dense rank inside the owning project.
//! - Text edits never carry a position; only the reorder path rewrites
//!   positions of existing steps.

use super::project::ProjectId;
use super::MAX_TITLE_CHARS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable step identifier, unique across all projects.
pub type StepId = Uuid;

/// Persisted step record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub uuid: StepId,
    pub project_uuid: ProjectId,
    pub title: String,
    pub detail: String,
    /// Dense 1-based rank within `project_uuid`.
    pub position: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Create payload for a step. The position must name a free slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStep {
    pub title: String,
    pub detail: String,
    pub position: i64,
}

/// Text-only update payload for a step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepPatch {
    pub title: Option<String>,
    pub detail: Option<String>,
}

/// Sort key for step listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOrderBy {
    #[default]
    Position,
    CreatedAt,
}

/// Validation errors for step payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepValidationError {
    BlankTitle,
    TitleTooLong { chars: usize },
    BlankDetail,
    /// Positions are 1-based.
    PositionOutOfRange(i64),
}

impl Display for StepValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "step title must not be blank"),
            Self::TitleTooLong { chars } => write!(
                f,
                "step title has {chars} characters; at most {MAX_TITLE_CHARS} allowed"
            ),
            Self::BlankDetail => write!(f, "step detail must not be blank"),
            Self::PositionOutOfRange(position) => {
                write!(f, "step position must be >= 1, got {position}")
            }
        }
    }
}

impl Error for StepValidationError {}

impl NewStep {
    pub fn new(title: impl Into<String>, detail: impl Into<String>, position: i64) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
            position,
        }
    }

    /// Returns a trimmed copy, or the first validation failure.
    pub fn normalized(&self) -> Result<Self, StepValidationError> {
        if self.position < 1 {
            return Err(StepValidationError::PositionOutOfRange(self.position));
        }
        Ok(Self {
            title: normalize_title(&self.title)?,
            detail: normalize_detail(&self.detail)?,
            position: self.position,
        })
    }
}

impl StepPatch {
    /// Returns a trimmed copy, or the first validation failure.
    pub fn normalized(&self) -> Result<Self, StepValidationError> {
        Ok(Self {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            detail: self.detail.as_deref().map(normalize_detail).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.detail.is_none()
    }
}

fn normalize_title(value: &str) -> Result<String, StepValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StepValidationError::BlankTitle);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(StepValidationError::TitleTooLong { chars });
    }
    Ok(trimmed.to_string())
}

fn normalize_detail(value: &str) -> Result<String, StepValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StepValidationError::BlankDetail);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{NewStep, StepOrderBy, StepPatch, StepValidationError};

    #[test]
    fn new_step_rejects_zero_position() {
        let err = NewStep::new("t", "d", 0).normalized().unwrap_err();
        assert_eq!(err, StepValidationError::PositionOutOfRange(0));
    }

    #[test]
    fn new_step_rejects_overlong_title() {
        let title = "x".repeat(121);
        let err = NewStep::new(title, "d", 1).normalized().unwrap_err();
        assert_eq!(err, StepValidationError::TitleTooLong { chars: 121 });
    }

    #[test]
    fn patch_rejects_blank_detail() {
        let patch = StepPatch {
            title: None,
            detail: Some("  ".to_string()),
        };
        assert_eq!(patch.normalized().unwrap_err(), StepValidationError::BlankDetail);
    }

    #[test]
    fn order_by_defaults_to_position() {
        assert_eq!(StepOrderBy::default(), StepOrderBy::Position);
    }
}
