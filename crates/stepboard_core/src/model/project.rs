//! Project domain model.

use super::step::Step;
use super::MAX_TITLE_CHARS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Persisted project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub uuid: ProjectId,
    pub title: String,
    pub description: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Project read model joined with its steps in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithSteps {
    #[serde(flatten)]
    pub project: Project,
    pub steps: Vec<Step>,
}

/// Create payload for a project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update payload for a project. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Validation errors for project payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    /// Title is blank after trim.
    BlankTitle,
    /// Title exceeds [`MAX_TITLE_CHARS`].
    TitleTooLong { chars: usize },
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "project title must not be blank"),
            Self::TitleTooLong { chars } => write!(
                f,
                "project title has {chars} characters; at most {MAX_TITLE_CHARS} allowed"
            ),
        }
    }
}

impl Error for ProjectValidationError {}

impl NewProject {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Returns a trimmed copy, or the first validation failure.
    pub fn normalized(&self) -> Result<Self, ProjectValidationError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            description: self.description.trim().to_string(),
        })
    }
}

impl ProjectPatch {
    /// Returns a trimmed copy, or the first validation failure.
    pub fn normalized(&self) -> Result<Self, ProjectValidationError> {
        Ok(Self {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(|value| value.trim().to_string()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

fn normalize_title(value: &str) -> Result<String, ProjectValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProjectValidationError::BlankTitle);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(ProjectValidationError::TitleTooLong { chars });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{NewProject, ProjectPatch, ProjectValidationError};

    #[test]
    fn new_project_is_trimmed() {
        let normalized = NewProject::new("  Launch  ", " notes ").normalized().unwrap();
        assert_eq!(normalized.title, "Launch");
        assert_eq!(normalized.description, "notes");
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = NewProject::new("   ", "").normalized().unwrap_err();
        assert_eq!(err, ProjectValidationError::BlankTitle);
    }

    #[test]
    fn patch_without_fields_is_empty() {
        assert!(ProjectPatch::default().is_empty());
        let patch = ProjectPatch {
            title: Some(" x ".to_string()),
            description: None,
        };
        assert_eq!(patch.normalized().unwrap().title.as_deref(), Some("x"));
    }
}
