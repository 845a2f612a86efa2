//! `stepboard` command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto core project/step services.
//! - Print results as JSON on stdout and failures as `{code, message}` JSON on
//!   stderr.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ProjectCommand, StepCommand};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use stepboard_core::db::{open_db_with, DbError};
use stepboard_core::{
    init_logging, ConfigError, CoreConfig, LoggingError, NewProject, NewStep, ProjectPatch,
    ProjectService, RepoError, ServiceError, SqliteProjectRepository, SqliteStepRepository,
    StepOrderBy, StepPatch, StepService,
};

const SEED_PROJECT_TITLE: &str = "Demo Project";
const SEED_PROJECT_DESCRIPTION: &str = "Seeded project with 3 steps";
const SEED_STEPS: [(&str, &str); 3] = [
    ("Define requirements", "Write a concise project brief."),
    ("Set up repository", "Initialize the workspace and tooling."),
    ("Create initial API", "Projects and steps CRUD with migrations."),
];

#[derive(Parser)]
#[command(name = "stepboard")]
#[command(about = "Manage projects and their ordered steps")]
#[command(version = stepboard_core::core_version())]
struct Cli {
    /// SQLite database file. Overrides STEPBOARD_DATABASE_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Lock wait bound in milliseconds. Overrides STEPBOARD_BUSY_TIMEOUT_MS.
    #[arg(long, global = true)]
    busy_timeout_ms: Option<u64>,
    /// Overrides STEPBOARD_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute log directory. Overrides STEPBOARD_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Creates the demo project and its steps when missing.
    Seed,
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Step {
        #[command(subcommand)]
        command: StepCommand,
    },
}

enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
    Service(ServiceError),
    Output(serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Logging(_) => "CONFIG_ERROR",
            Self::Db(_) | Self::Repo(_) => "PERSISTENCE_ERROR",
            Self::Service(err) => err.code(),
            Self::Output(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Config(err) => err.to_string(),
            Self::Logging(err) => err.to_string(),
            Self::Db(err) => err.to_string(),
            Self::Repo(err) => err.to_string(),
            Self::Service(err) => err.to_string(),
            Self::Output(err) => err.to_string(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let body = json!({ "code": err.code(), "message": err.message() });
            eprintln!("{body}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db_with(&config.database_path, &config.db_options())?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Commands::Seed => seed(&conn),
        Commands::Project { command } => run_project(&conn, command),
        Commands::Step { command } => run_step(&conn, command),
    }
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, CliError> {
    let mut config = CoreConfig::from_env()?;
    if let Some(path) = &cli.db {
        config.database_path = path.clone();
    }
    if let Some(timeout) = cli.busy_timeout_ms {
        config.busy_timeout_ms = timeout;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = stepboard_core::logging::normalize_level(level)?.to_string();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Seed => "seed",
        Commands::Project { .. } => "project",
        Commands::Step { .. } => "step",
    }
}

fn seed(conn: &Connection) -> Result<(), CliError> {
    let projects = ProjectService::new(SqliteProjectRepository::try_new(conn)?);
    let steps = StepService::new(SqliteStepRepository::try_new(conn)?);

    let (project, created) = projects.find_or_create_project(&NewProject::new(
        SEED_PROJECT_TITLE,
        SEED_PROJECT_DESCRIPTION,
    ))?;
    let existing = steps.list_steps(project.uuid, StepOrderBy::Position)?;
    let mut inserted = 0;
    if existing.is_empty() {
        for (index, (title, detail)) in SEED_STEPS.iter().enumerate() {
            steps.create_step(
                project.uuid,
                &NewStep::new(*title, *detail, index as i64 + 1),
            )?;
            inserted += 1;
        }
    }

    print_json(&json!({
        "project_uuid": project.uuid,
        "project_created": created,
        "steps_inserted": inserted,
        "steps_existing": existing.len(),
    }))
}

fn run_project(conn: &Connection, command: ProjectCommand) -> Result<(), CliError> {
    let service = ProjectService::new(SqliteProjectRepository::try_new(conn)?);
    match command {
        ProjectCommand::Create { title, description } => {
            print_json(&service.create_project(&NewProject::new(title, description))?)
        }
        ProjectCommand::List => print_json(&service.list_projects()?),
        ProjectCommand::Show { id } => print_json(&service.get_project(id)?),
        ProjectCommand::Update {
            id,
            title,
            description,
        } => print_json(&service.update_project(id, &ProjectPatch { title, description })?),
        ProjectCommand::Delete { id } => {
            service.delete_project(id)?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn run_step(conn: &Connection, command: StepCommand) -> Result<(), CliError> {
    let service = StepService::new(SqliteStepRepository::try_new(conn)?);
    match command {
        StepCommand::Add {
            project,
            title,
            detail,
            position,
        } => {
            let step = match position {
                Some(position) => {
                    service.create_step(project, &NewStep::new(title, detail, position))?
                }
                None => service.append_step(project, title, detail)?,
            };
            print_json(&step)
        }
        StepCommand::List { project, order_by } => {
            print_json(&service.list_steps(project, order_by.into())?)
        }
        StepCommand::Show { project, step } => print_json(&service.get_step(project, step)?),
        StepCommand::Edit {
            project,
            step,
            title,
            detail,
        } => print_json(&service.update_step(project, step, &StepPatch { title, detail })?),
        StepCommand::Remove { project, step } => {
            service.delete_step(project, step)?;
            print_json(&json!({ "deleted": step }))
        }
        StepCommand::Reorder {
            project,
            step,
            position,
        } => print_json(&service.reorder_step(project, step, position)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use crate::commands::{OrderByArg, StepCommand};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_comes_from_core() {
        assert_eq!(
            Cli::command().get_version(),
            Some(stepboard_core::core_version())
        );
    }

    #[test]
    fn reorder_arguments_parse() {
        let project = uuid::Uuid::new_v4();
        let step = uuid::Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "stepboard",
            "--db",
            "/tmp/x.db",
            "step",
            "reorder",
            &project.to_string(),
            &step.to_string(),
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Step {
                command:
                    StepCommand::Reorder {
                        project: p,
                        step: s,
                        position,
                    },
            } => {
                assert_eq!(p, project);
                assert_eq!(s, step);
                assert_eq!(position, 3);
            }
            _ => panic!("expected step reorder"),
        }
    }

    #[test]
    fn list_order_by_accepts_created_at() {
        let cli = Cli::try_parse_from([
            "stepboard",
            "step",
            "list",
            &uuid::Uuid::new_v4().to_string(),
            "--order-by",
            "created-at",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Step {
                command: StepCommand::List {
                    order_by: OrderByArg::CreatedAt,
                    ..
                }
            }
        ));
    }
}
