//! Step use-case service.
//!
//! # Responsibility
//! - Validate step payloads above the repository layer.
//! - Expose the reorder operation with caller-facing error kinds.
//!
//! # Invariants
//! - Only `reorder_step` and `delete_step` change positions of existing steps.

use super::{ServiceError, ServiceResult};
use crate::model::project::ProjectId;
use crate::model::step::{NewStep, Step, StepId, StepOrderBy, StepPatch};
use crate::repo::step_repo::StepRepository;

/// Step service facade.
pub struct StepService<R: StepRepository> {
    repo: R,
}

impl<R: StepRepository> StepService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one step at `step.position`, which must be the next free slot
    /// or an occupied one (rejected as duplicate).
    pub fn create_step(&self, project_uuid: ProjectId, step: &NewStep) -> ServiceResult<Step> {
        let normalized = step.normalized()?;
        self.repo
            .create_step(project_uuid, &normalized)
            .map_err(Into::into)
    }

    /// Appends one step after the current last position.
    pub fn append_step(
        &self,
        project_uuid: ProjectId,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> ServiceResult<Step> {
        let next = self.list_steps(project_uuid, StepOrderBy::Position)?.len() as i64 + 1;
        self.create_step(project_uuid, &NewStep::new(title, detail, next))
    }

    pub fn list_steps(
        &self,
        project_uuid: ProjectId,
        order_by: StepOrderBy,
    ) -> ServiceResult<Vec<Step>> {
        self.repo
            .list_steps(project_uuid, order_by)
            .map_err(Into::into)
    }

    pub fn get_step(&self, project_uuid: ProjectId, step_uuid: StepId) -> ServiceResult<Step> {
        self.repo
            .get_step(project_uuid, step_uuid)?
            .ok_or(ServiceError::StepNotFound {
                project_uuid,
                step_uuid,
            })
    }

    /// Edits title/detail. An empty patch returns the step unchanged.
    pub fn update_step(
        &self,
        project_uuid: ProjectId,
        step_uuid: StepId,
        patch: &StepPatch,
    ) -> ServiceResult<Step> {
        let normalized = patch.normalized()?;
        if normalized.is_empty() {
            return self.get_step(project_uuid, step_uuid);
        }
        self.repo
            .update_step(project_uuid, step_uuid, &normalized)
            .map_err(Into::into)
    }

    /// Deletes one step; later steps move up to keep positions dense.
    pub fn delete_step(&self, project_uuid: ProjectId, step_uuid: StepId) -> ServiceResult<()> {
        self.repo
            .delete_step(project_uuid, step_uuid)
            .map_err(Into::into)
    }

    /// Moves one step to `target` (1-based) and returns the new ordering.
    ///
    /// Moving a step to its current position is a no-op that still validates
    /// the project and step.
    pub fn reorder_step(
        &self,
        project_uuid: ProjectId,
        step_uuid: StepId,
        target: i64,
    ) -> ServiceResult<Vec<Step>> {
        self.repo
            .reorder_step(project_uuid, step_uuid, target)
            .map_err(Into::into)
    }
}
