use rusqlite::Connection;
use stepboard_core::db::open_db_in_memory;
use stepboard_core::{
    NewProject, NewStep, ProjectId, ProjectService, RepoError, ServiceError,
    SqliteProjectRepository, SqliteStepRepository, Step, StepOrderBy, StepPatch,
    StepRepository, StepService,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn create_project(conn: &Connection, title: &str) -> ProjectId {
    let service = ProjectService::new(SqliteProjectRepository::try_new(conn).unwrap());
    service
        .create_project(&NewProject::new(title, ""))
        .unwrap()
        .uuid
}

fn positions(steps: &[Step]) -> Vec<i64> {
    steps.iter().map(|step| step.position).collect()
}

#[test]
fn create_at_next_free_slot_and_list_by_position() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    let first = service
        .create_step(project, &NewStep::new(" Define ", "Write a brief", 1))
        .unwrap();
    let second = service
        .create_step(project, &NewStep::new("Build", "Ship it", 2))
        .unwrap();
    assert_eq!(first.title, "Define");
    assert_eq!(first.project_uuid, project);

    let listed = service.list_steps(project, StepOrderBy::Position).unwrap();
    assert_eq!(positions(&listed), vec![1, 2]);
    assert_eq!(listed[0].uuid, first.uuid);
    assert_eq!(listed[1].uuid, second.uuid);

    let by_creation = service.list_steps(project, StepOrderBy::CreatedAt).unwrap();
    assert_eq!(by_creation.len(), 2);
}

#[test]
fn create_with_taken_position_is_duplicate() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    service.append_step(project, "One", "1").unwrap();

    let err = service
        .create_step(project, &NewStep::new("Clash", "x", 1))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::DuplicatePosition { project_uuid, position: 1 } if project_uuid == project
    ));
    assert_eq!(err.code(), "DUPLICATE_STEP_ORDER");
}

#[test]
fn same_position_in_other_project_is_allowed() {
    let conn = setup();
    let first = create_project(&conn, "First");
    let second = create_project(&conn, "Second");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    service.append_step(first, "A", "a").unwrap();
    let other = service.append_step(second, "B", "b").unwrap();
    assert_eq!(other.position, 1);
}

#[test]
fn create_past_next_free_slot_is_rejected() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    service.append_step(project, "One", "1").unwrap();

    let err = service
        .create_step(project, &NewStep::new("Far", "x", 5))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidPosition {
            position: 5,
            member_count: 1
        }
    ));
}

#[test]
fn repository_rejects_positions_below_one() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let repo = SqliteStepRepository::try_new(&conn).unwrap();
    repo.create_step(project, &NewStep::new("One", "1", 1)).unwrap();

    for position in [0, -1] {
        let err = repo
            .create_step(project, &NewStep::new("Low", "x", position))
            .unwrap_err();
        assert!(
            matches!(
                err,
                RepoError::InvalidPosition { position: p, member_count: 1 } if p == position
            ),
            "position {position} gave {err:?}"
        );

        let service_err = ServiceError::from(err);
        assert_eq!(service_err.code(), "VALIDATION_ERROR");
        assert!(!service_err.is_retryable());
    }

    let listed = repo.list_steps(project, StepOrderBy::Position).unwrap();
    assert_eq!(positions(&listed), vec![1]);
    let reordered = repo.reorder_step(project, listed[0].uuid, 1).unwrap();
    assert_eq!(positions(&reordered), vec![1]);
}

#[test]
fn create_validates_payload_and_project() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    let err = service
        .create_step(project, &NewStep::new("Title", "   ", 1))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(!err.is_not_found());

    let missing = Uuid::new_v4();
    let err = service
        .create_step(missing, &NewStep::new("Title", "detail", 1))
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProjectNotFound(id) if id == missing));
}

#[test]
fn update_edits_text_and_keeps_position() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    service.append_step(project, "One", "1").unwrap();
    let step = service.append_step(project, "Two", "2").unwrap();

    let updated = service
        .update_step(
            project,
            step.uuid,
            &StepPatch {
                title: Some("Second".to_string()),
                detail: None,
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Second");
    assert_eq!(updated.detail, "2");
    assert_eq!(updated.position, 2);
}

#[test]
fn get_and_update_are_scoped_to_project() {
    let conn = setup();
    let first = create_project(&conn, "First");
    let second = create_project(&conn, "Second");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    let step = service.append_step(first, "Mine", "m").unwrap();

    let err = service.get_step(second, step.uuid).unwrap_err();
    assert!(matches!(err, ServiceError::StepNotFound { .. }));

    let err = service
        .update_step(
            second,
            step.uuid,
            &StepPatch {
                title: Some("Hijack".to_string()),
                detail: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::StepNotFound { .. }));
    assert_eq!(service.get_step(first, step.uuid).unwrap().title, "Mine");
}

#[test]
fn delete_compacts_following_positions() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    let ids: Vec<_> = (1..=4)
        .map(|i| {
            service
                .append_step(project, format!("Step {i}"), "detail")
                .unwrap()
                .uuid
        })
        .collect();

    service.delete_step(project, ids[1]).unwrap();

    let listed = service.list_steps(project, StepOrderBy::Position).unwrap();
    assert_eq!(positions(&listed), vec![1, 2, 3]);
    let order: Vec<_> = listed.iter().map(|step| step.uuid).collect();
    assert_eq!(order, vec![ids[0], ids[2], ids[3]]);

    let appended = service.append_step(project, "Tail", "t").unwrap();
    assert_eq!(appended.position, 4);
}

#[test]
fn delete_last_step_needs_no_shift() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    service.append_step(project, "One", "1").unwrap();
    let last = service.append_step(project, "Two", "2").unwrap();

    service.delete_step(project, last.uuid).unwrap();
    let listed = service.list_steps(project, StepOrderBy::Position).unwrap();
    assert_eq!(positions(&listed), vec![1]);
}

#[test]
fn delete_unknown_step_reports_not_found() {
    let conn = setup();
    let project = create_project(&conn, "Plan");
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());

    let err = service.delete_step(project, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ServiceError::StepNotFound { .. }));
    assert!(err.is_not_found());

    let err = service
        .delete_step(Uuid::new_v4(), Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProjectNotFound(_)));
}

#[test]
fn list_for_unknown_project_is_not_found() {
    let conn = setup();
    let service = StepService::new(SqliteStepRepository::try_new(&conn).unwrap());
    let err = service
        .list_steps(Uuid::new_v4(), StepOrderBy::Position)
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProjectNotFound(_)));
}
