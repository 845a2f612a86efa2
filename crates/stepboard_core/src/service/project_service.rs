//! Project use-case service.
//!
//! # Responsibility
//! - Validate project payloads and delegate to the project repository.

use super::{ServiceError, ServiceResult};
use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch, ProjectWithSteps};
use crate::repo::project_repo::ProjectRepository;

/// Project service facade.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_project(&self, project: &NewProject) -> ServiceResult<Project> {
        let normalized = project.normalized()?;
        self.repo.create_project(&normalized).map_err(Into::into)
    }

    /// Lists projects, oldest first.
    pub fn list_projects(&self) -> ServiceResult<Vec<Project>> {
        self.repo.list_projects().map_err(Into::into)
    }

    /// Loads one project with its steps in position order.
    pub fn get_project(&self, id: ProjectId) -> ServiceResult<ProjectWithSteps> {
        self.repo
            .get_project_with_steps(id)?
            .ok_or(ServiceError::ProjectNotFound(id))
    }

    /// Applies a partial update. An empty patch returns the project unchanged.
    pub fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> ServiceResult<Project> {
        let normalized = patch.normalized()?;
        if normalized.is_empty() {
            return self
                .repo
                .get_project(id)?
                .ok_or(ServiceError::ProjectNotFound(id));
        }
        self.repo.update_project(id, &normalized).map_err(Into::into)
    }

    /// Deletes one project and every step it owns.
    pub fn delete_project(&self, id: ProjectId) -> ServiceResult<()> {
        self.repo.delete_project(id).map_err(Into::into)
    }

    /// Returns the first project carrying `title`, creating it when absent.
    ///
    /// The boolean is `true` when the project was created by this call.
    pub fn find_or_create_project(&self, project: &NewProject) -> ServiceResult<(Project, bool)> {
        let normalized = project.normalized()?;
        if let Some(existing) = self.repo.find_project_by_title(&normalized.title)? {
            return Ok((existing, false));
        }
        let created = self.repo.create_project(&normalized)?;
        Ok((created, true))
    }
}
