//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `projects` storage.
//! - Load a project together with its steps in position order.
//!
//! # Invariants
//! - Payloads are normalized by the caller; this layer persists them as given.
//! - Deleting a project cascades to its steps through the foreign key.

use super::schema_guard::ensure_connection_ready;
use super::step_repo::list_steps_by_position;
use super::{RepoError, RepoResult};
use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch, ProjectWithSteps};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    created_at,
    updated_at
FROM projects";

/// Repository interface for project operations.
pub trait ProjectRepository {
    fn create_project(&self, project: &NewProject) -> RepoResult<Project>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Loads one project with steps ordered by position.
    fn get_project_with_steps(&self, id: ProjectId) -> RepoResult<Option<ProjectWithSteps>>;
    /// Lists projects by creation time, oldest first.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> RepoResult<Project>;
    /// Deletes one project and all of its steps.
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
    /// Finds one project by exact title.
    fn find_project_by_title(&self, title: &str) -> RepoResult<Option<Project>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "projects",
            &["uuid", "title", "description", "created_at", "updated_at"],
        )?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &NewProject) -> RepoResult<Project> {
        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO projects (uuid, title, description) VALUES (?1, ?2, ?3);",
            params![uuid.to_string(), project.title, project.description],
        )?;
        info!("event=project_create module=repo status=ok project_uuid={uuid}");
        load_required_project(self.conn, uuid)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn get_project_with_steps(&self, id: ProjectId) -> RepoResult<Option<ProjectWithSteps>> {
        let Some(project) = self.get_project(id)? else {
            return Ok(None);
        };
        let steps = list_steps_by_position(self.conn, id)?;
        Ok(Some(ProjectWithSteps { project, steps }))
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL} ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_project_row(row)?);
        }
        Ok(items)
    }

    fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> RepoResult<Project> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET title = COALESCE(?2, title),
                 description = COALESCE(?3, description),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), patch.title, patch.description],
        )?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        load_required_project(self.conn, id)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        info!("event=project_delete module=repo status=ok project_uuid={id}");
        Ok(())
    }

    fn find_project_by_title(&self, title: &str) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL} WHERE title = ?1 ORDER BY created_at ASC, uuid ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([title])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }
}

/// Returns whether a project row exists.
pub(crate) fn project_exists(conn: &Connection, id: ProjectId) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM projects WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn load_required_project(conn: &Connection, id: ProjectId) -> RepoResult<Project> {
    let mut stmt = conn.prepare(&format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_project_row(row);
    }
    Err(RepoError::ProjectNotFound(id))
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Project {
        uuid: parse_uuid(&uuid_text, "projects.uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
