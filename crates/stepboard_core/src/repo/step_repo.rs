//! Step repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/list/get/edit/delete APIs over `steps` storage.
//! - Route every position mutation through the collision-free shift in
//!   [`crate::repo::reorder`].
//!
//! # Invariants
//! - Steps are only created at a free slot in `1..=N+1`. Slot 0 is reserved
//!   for the reorder engine and is never accepted here.
//! - Deleting a step compacts the positions behind it, so the project stays
//!   dense after commit.
//! - Text edits never touch `position`.

use super::project_repo::{parse_uuid, project_exists};
use super::reorder::{self, ReorderOutcome};
use super::schema_guard::ensure_connection_ready;
use super::{RepoError, RepoResult};
use crate::db::DbError;
use crate::model::project::ProjectId;
use crate::model::step::{NewStep, Step, StepId, StepOrderBy, StepPatch};
use log::{error, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::time::Instant;
use uuid::Uuid;

pub(crate) const STEP_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    title,
    detail,
    position,
    created_at,
    updated_at
FROM steps";

/// Repository interface for step operations.
pub trait StepRepository {
    /// Creates one step at a caller-chosen free position.
    fn create_step(&self, project_uuid: ProjectId, step: &NewStep) -> RepoResult<Step>;
    /// Loads one step scoped to its project.
    fn get_step(&self, project_uuid: ProjectId, step_uuid: StepId) -> RepoResult<Option<Step>>;
    /// Lists all steps of one project.
    fn list_steps(&self, project_uuid: ProjectId, order_by: StepOrderBy)
        -> RepoResult<Vec<Step>>;
    /// Applies a text-only patch.
    fn update_step(
        &self,
        project_uuid: ProjectId,
        step_uuid: StepId,
        patch: &StepPatch,
    ) -> RepoResult<Step>;
    /// Removes one step and closes the gap it leaves.
    fn delete_step(&self, project_uuid: ProjectId, step_uuid: StepId) -> RepoResult<()>;
    /// Moves one step to `target` and returns the project's steps in position
    /// order.
    fn reorder_step(
        &self,
        project_uuid: ProjectId,
        step_uuid: StepId,
        target: i64,
    ) -> RepoResult<Vec<Step>>;
}

/// SQLite-backed step repository.
pub struct SqliteStepRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStepRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "steps",
            &[
                "uuid",
                "project_uuid",
                "title",
                "detail",
                "position",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl StepRepository for SqliteStepRepository<'_> {
    fn create_step(&self, project_uuid: ProjectId, step: &NewStep) -> RepoResult<Step> {
        let step_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !project_exists(&tx, project_uuid)? {
            return Err(RepoError::ProjectNotFound(project_uuid));
        }

        let member_count = count_steps(&tx, project_uuid)?;
        if step.position < 1 || step.position > member_count as i64 + 1 {
            return Err(RepoError::InvalidPosition {
                position: step.position,
                member_count,
            });
        }

        tx.execute(
            "INSERT INTO steps (uuid, project_uuid, title, detail, position)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                step_uuid.to_string(),
                project_uuid.to_string(),
                step.title,
                step.detail,
                step.position,
            ],
        )
        .map_err(|err| {
            let err = DbError::from(err);
            if err.is_unique_violation() {
                warn!(
                    "event=step_create module=repo status=error error_code=duplicate_position project_uuid={} position={}",
                    project_uuid, step.position
                );
                RepoError::DuplicatePosition {
                    project_uuid,
                    position: step.position,
                }
            } else {
                RepoError::Db(err)
            }
        })?;
        tx.commit()?;

        info!(
            "event=step_create module=repo status=ok project_uuid={} step_uuid={} position={}",
            project_uuid, step_uuid, step.position
        );
        load_required_step(self.conn, project_uuid, step_uuid)
    }

    fn get_step(&self, project_uuid: ProjectId, step_uuid: StepId) -> RepoResult<Option<Step>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STEP_SELECT_SQL} WHERE uuid = ?1 AND project_uuid = ?2;"
        ))?;
        let mut rows = stmt.query([step_uuid.to_string(), project_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_step_row(row)?));
        }
        Ok(None)
    }

    fn list_steps(
        &self,
        project_uuid: ProjectId,
        order_by: StepOrderBy,
    ) -> RepoResult<Vec<Step>> {
        if !project_exists(self.conn, project_uuid)? {
            return Err(RepoError::ProjectNotFound(project_uuid));
        }
        match order_by {
            StepOrderBy::Position => list_steps_by_position(self.conn, project_uuid),
            StepOrderBy::CreatedAt => {
                let mut stmt = self.conn.prepare(&format!(
                    "{STEP_SELECT_SQL}
                     WHERE project_uuid = ?1
                     ORDER BY created_at ASC, position ASC;"
                ))?;
                let rows = stmt.query([project_uuid.to_string()])?;
                collect_steps(rows)
            }
        }
    }

    fn update_step(
        &self,
        project_uuid: ProjectId,
        step_uuid: StepId,
        patch: &StepPatch,
    ) -> RepoResult<Step> {
        let changed = self.conn.execute(
            "UPDATE steps
             SET title = COALESCE(?3, title),
                 detail = COALESCE(?4, detail),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND project_uuid = ?2;",
            params![
                step_uuid.to_string(),
                project_uuid.to_string(),
                patch.title,
                patch.detail,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::StepNotFound {
                project_uuid,
                step_uuid,
            });
        }
        load_required_step(self.conn, project_uuid, step_uuid)
    }

    fn delete_step(&self, project_uuid: ProjectId, step_uuid: StepId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let locked = reorder::lock_project_steps(&tx, project_uuid)?;
        let Some(removed) = locked.iter().find(|step| step.uuid == step_uuid) else {
            return Err(missing_step_error(&tx, project_uuid, step_uuid)?);
        };
        reorder::ensure_dense(project_uuid, &locked)?;

        tx.execute("DELETE FROM steps WHERE uuid = ?1;", [step_uuid.to_string()])?;
        reorder::close_gap(&tx, project_uuid, removed.position, locked.len())?;
        reorder::ensure_dense(
            project_uuid,
            &reorder::lock_project_steps(&tx, project_uuid)?,
        )?;
        tx.commit()?;

        info!(
            "event=step_delete module=repo status=ok project_uuid={} step_uuid={} position={}",
            project_uuid, step_uuid, removed.position
        );
        Ok(())
    }

    fn reorder_step(
        &self,
        project_uuid: ProjectId,
        step_uuid: StepId,
        target: i64,
    ) -> RepoResult<Vec<Step>> {
        let started_at = Instant::now();
        match reorder::reorder_step(self.conn, project_uuid, step_uuid, target) {
            Ok(ReorderOutcome::Unchanged(steps)) => {
                info!(
                    "event=step_reorder module=repo status=ok outcome=noop project_uuid={} step_uuid={} target={} duration_ms={}",
                    project_uuid,
                    step_uuid,
                    target,
                    started_at.elapsed().as_millis()
                );
                Ok(steps)
            }
            Ok(ReorderOutcome::Moved { plan, steps }) => {
                info!(
                    "event=step_reorder module=repo status=ok outcome=moved project_uuid={} step_uuid={} from={} to={} shifted={} duration_ms={}",
                    project_uuid,
                    step_uuid,
                    plan.from,
                    plan.to,
                    plan.affected(),
                    started_at.elapsed().as_millis()
                );
                Ok(steps)
            }
            Err(err) => {
                let duration_ms = started_at.elapsed().as_millis();
                match &err {
                    RepoError::OrderingInvariantBreached { .. } => error!(
                        "event=step_reorder module=repo status=error error_code={} project_uuid={} step_uuid={} target={} duration_ms={} error={}",
                        err.log_code(),
                        project_uuid,
                        step_uuid,
                        target,
                        duration_ms,
                        err
                    ),
                    _ => warn!(
                        "event=step_reorder module=repo status=error error_code={} project_uuid={} step_uuid={} target={} duration_ms={}",
                        err.log_code(),
                        project_uuid,
                        step_uuid,
                        target,
                        duration_ms
                    ),
                }
                Err(err)
            }
        }
    }
}

/// Lists one project's steps in position order.
pub(crate) fn list_steps_by_position(
    conn: &Connection,
    project_uuid: ProjectId,
) -> RepoResult<Vec<Step>> {
    let mut stmt = conn.prepare(&format!(
        "{STEP_SELECT_SQL}
         WHERE project_uuid = ?1
         ORDER BY position ASC;"
    ))?;
    let rows = stmt.query([project_uuid.to_string()])?;
    collect_steps(rows)
}

/// Picks `ProjectNotFound` or `StepNotFound` for a step absent from its
/// project's rows.
pub(crate) fn missing_step_error(
    conn: &Connection,
    project_uuid: ProjectId,
    step_uuid: StepId,
) -> RepoResult<RepoError> {
    if project_exists(conn, project_uuid)? {
        Ok(RepoError::StepNotFound {
            project_uuid,
            step_uuid,
        })
    } else {
        Ok(RepoError::ProjectNotFound(project_uuid))
    }
}

pub(crate) fn collect_steps(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Step>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_step_row(row)?);
    }
    Ok(items)
}

fn count_steps(conn: &Connection, project_uuid: ProjectId) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM steps WHERE project_uuid = ?1;",
        [project_uuid.to_string()],
        |row| row.get(0),
    )?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative step count `{count}`")))
}

fn load_required_step(
    conn: &Connection,
    project_uuid: ProjectId,
    step_uuid: StepId,
) -> RepoResult<Step> {
    let step: Option<Step> = conn
        .query_row(
            &format!("{STEP_SELECT_SQL} WHERE uuid = ?1 AND project_uuid = ?2;"),
            [step_uuid.to_string(), project_uuid.to_string()],
            |row| Ok(parse_step_row(row)),
        )
        .optional()?
        .transpose()?;
    step.ok_or(RepoError::StepNotFound {
        project_uuid,
        step_uuid,
    })
}

fn parse_step_row(row: &Row<'_>) -> RepoResult<Step> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;
    Ok(Step {
        uuid: parse_uuid(&uuid_text, "steps.uuid")?,
        project_uuid: parse_uuid(&project_text, "steps.project_uuid")?,
        title: row.get("title")?,
        detail: row.get("detail")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
