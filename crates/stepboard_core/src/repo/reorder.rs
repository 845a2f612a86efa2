//! Step reorder engine.
//!
//! # Responsibility
//! - Move one step to a new position inside its project while shifting every
//!   step between the old and new slot by one, atomically.
//! - Provide the collision-free range shift reused by step deletion.
//!
//! # Invariants
//! - All work for one call runs inside a single `BEGIN IMMEDIATE` transaction.
//!   SQLite grants that write lock to one connection at a time, so two reorders
//!   never interleave and a waiting caller reads the committed result of the
//!   previous one.
//! - The write lock covers the whole database file, not one project. Reorders
//!   on different projects never see each other's rows, but they do queue
//!   behind each other for the length of one transaction.
//! - Validation happens before the first write; any error drops the
//!   transaction, which rolls back every partial shift.
//! - SQLite checks `UNIQUE(project_uuid, position)` row by row, so no single
//!   statement may move a row onto a slot that another row still holds.
//!   Shifts therefore lift the affected range above `N` first and settle it
//!   afterwards.

use super::project_repo::project_exists;
use super::step_repo::{
    collect_steps, list_steps_by_position, missing_step_error, STEP_SELECT_SQL,
};
use super::{RepoError, RepoResult};
use crate::db::DbError;
use crate::model::project::ProjectId;
use crate::model::step::{Step, StepId};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Slot a step occupies while its neighbours shift. Outside `1..=N`.
pub const PARKED_POSITION: i64 = 0;

/// Which way the moved step travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Toward position 1. Steps in `[to, from)` move back by one slot.
    Earlier,
    /// Toward position N. Steps in `(from, to]` move forward by one slot.
    Later,
}

/// Arithmetic of one step relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftPlan {
    pub from: i64,
    pub to: i64,
    pub direction: ShiftDirection,
    /// Lowest old position of the neighbours that shift.
    pub range_start: i64,
    /// Highest old position of the neighbours that shift.
    pub range_end: i64,
    /// Offset added to every shifted neighbour: `+1` or `-1`.
    pub delta: i64,
}

impl ShiftPlan {
    /// Plans a move from `from` to `to`. Returns `None` when they are equal.
    pub fn compute(from: i64, to: i64) -> Option<Self> {
        if from == to {
            return None;
        }
        let plan = if to < from {
            Self {
                from,
                to,
                direction: ShiftDirection::Earlier,
                range_start: to,
                range_end: from - 1,
                delta: 1,
            }
        } else {
            Self {
                from,
                to,
                direction: ShiftDirection::Later,
                range_start: from + 1,
                range_end: to,
                delta: -1,
            }
        };
        Some(plan)
    }

    /// Number of neighbours whose position changes.
    pub fn affected(&self) -> usize {
        (self.range_end - self.range_start + 1) as usize
    }

    /// Applies the plan to one old position, as seen after commit.
    pub fn new_position(&self, step_position: i64) -> i64 {
        if step_position == self.from {
            self.to
        } else if (self.range_start..=self.range_end).contains(&step_position) {
            step_position + self.delta
        } else {
            step_position
        }
    }
}

/// Result of a reorder call.
#[derive(Debug)]
pub(crate) enum ReorderOutcome {
    /// Target equals the current position; nothing was written.
    Unchanged(Vec<Step>),
    Moved { plan: ShiftPlan, steps: Vec<Step> },
}

/// Runs one reorder end to end and returns the committed ordering.
pub(crate) fn reorder_step(
    conn: &Connection,
    project_uuid: ProjectId,
    step_uuid: StepId,
    target: i64,
) -> RepoResult<ReorderOutcome> {
    // Unknown projects fail without taking the write lock.
    if !project_exists(conn, project_uuid)? {
        return Err(RepoError::ProjectNotFound(project_uuid));
    }
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let locked = lock_project_steps(&tx, project_uuid)?;
    let Some(current) = locked
        .iter()
        .find(|step| step.uuid == step_uuid)
        .map(|step| step.position)
    else {
        return Err(missing_step_error(&tx, project_uuid, step_uuid)?);
    };

    let member_count = locked.len();
    if target < 1 || target > member_count as i64 {
        return Err(RepoError::InvalidTargetPosition {
            step_uuid,
            target,
            member_count,
        });
    }
    ensure_dense(project_uuid, &locked)?;

    let Some(plan) = ShiftPlan::compute(current, target) else {
        tx.commit()?;
        return Ok(ReorderOutcome::Unchanged(locked));
    };

    apply_plan(&tx, project_uuid, step_uuid, &plan, member_count)?;
    ensure_dense(project_uuid, &lock_project_steps(&tx, project_uuid)?)?;
    tx.commit()?;

    let steps = list_steps_by_position(conn, project_uuid)?;
    Ok(ReorderOutcome::Moved { plan, steps })
}

/// Reads every step of a project in position order inside the caller's
/// write transaction.
pub(crate) fn lock_project_steps(
    tx: &Transaction<'_>,
    project_uuid: ProjectId,
) -> RepoResult<Vec<Step>> {
    let mut stmt = tx.prepare(&format!(
        "{STEP_SELECT_SQL}
         WHERE project_uuid = ?1
         ORDER BY position ASC;"
    ))?;
    let rows = stmt.query([project_uuid.to_string()])?;
    collect_steps(rows)
}

/// Fails unless `steps`, sorted by position, hold exactly `1..=steps.len()`.
pub(crate) fn ensure_dense(project_uuid: ProjectId, steps: &[Step]) -> RepoResult<()> {
    for (index, step) in steps.iter().enumerate() {
        let expected = index as i64 + 1;
        if step.position != expected {
            return Err(RepoError::OrderingInvariantBreached {
                project_uuid,
                detail: format!(
                    "rank {expected} holds position {} (step {})",
                    step.position, step.uuid
                ),
            });
        }
    }
    Ok(())
}

/// Shifts the steps behind a removed slot back by one.
///
/// `member_count` is the step count before the removal.
pub(crate) fn close_gap(
    tx: &Transaction<'_>,
    project_uuid: ProjectId,
    removed_position: i64,
    member_count: usize,
) -> RepoResult<()> {
    let last = member_count as i64;
    if removed_position >= last {
        return Ok(());
    }
    shift_range(tx, project_uuid, removed_position + 1, last, -1, member_count)
}

fn apply_plan(
    tx: &Transaction<'_>,
    project_uuid: ProjectId,
    step_uuid: StepId,
    plan: &ShiftPlan,
    member_count: usize,
) -> RepoResult<()> {
    set_position(tx, project_uuid, step_uuid, PARKED_POSITION)?;
    shift_range(
        tx,
        project_uuid,
        plan.range_start,
        plan.range_end,
        plan.delta,
        member_count,
    )?;
    set_position(tx, project_uuid, step_uuid, plan.to)
}

fn set_position(
    tx: &Transaction<'_>,
    project_uuid: ProjectId,
    step_uuid: StepId,
    position: i64,
) -> RepoResult<()> {
    let changed = tx
        .execute(
            "UPDATE steps
             SET position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND project_uuid = ?2;",
            params![step_uuid.to_string(), project_uuid.to_string(), position],
        )
        .map_err(|err| shift_error(project_uuid, err))?;
    if changed != 1 {
        return Err(RepoError::OrderingInvariantBreached {
            project_uuid,
            detail: format!("expected to move step {step_uuid} to {position}, updated {changed} rows"),
        });
    }
    Ok(())
}

/// Moves every step with position in `[start, end]` by `delta`.
///
/// Rows are first lifted by `member_count + 1`, which puts them above every
/// occupied slot, then settled onto their final slots. The caller guarantees
/// those final slots are vacant.
fn shift_range(
    tx: &Transaction<'_>,
    project_uuid: ProjectId,
    start: i64,
    end: i64,
    delta: i64,
    member_count: usize,
) -> RepoResult<()> {
    let offset = member_count as i64 + 1;
    let expected = (end - start + 1) as usize;

    let lifted = tx
        .execute(
            "UPDATE steps
             SET position = position + ?4
             WHERE project_uuid = ?1
               AND position BETWEEN ?2 AND ?3;",
            params![project_uuid.to_string(), start, end, offset],
        )
        .map_err(|err| shift_error(project_uuid, err))?;
    if lifted != expected {
        return Err(RepoError::OrderingInvariantBreached {
            project_uuid,
            detail: format!("expected to lift {expected} steps in [{start}, {end}], lifted {lifted}"),
        });
    }

    let settled = tx
        .execute(
            "UPDATE steps
             SET position = position - ?2 + ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE project_uuid = ?1
               AND position >= ?2;",
            params![project_uuid.to_string(), offset, delta],
        )
        .map_err(|err| shift_error(project_uuid, err))?;
    if settled != expected {
        return Err(RepoError::OrderingInvariantBreached {
            project_uuid,
            detail: format!("expected to settle {expected} steps, settled {settled}"),
        });
    }
    Ok(())
}

fn shift_error(project_uuid: ProjectId, err: rusqlite::Error) -> RepoError {
    let err = DbError::from(err);
    if err.is_unique_violation() {
        return RepoError::OrderingInvariantBreached {
            project_uuid,
            detail: format!("storage rejected shift: {err}"),
        };
    }
    RepoError::Db(err)
}
