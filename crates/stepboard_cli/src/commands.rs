use clap::{Subcommand, ValueEnum};
use stepboard_core::StepOrderBy;
use uuid::Uuid;

#[derive(Subcommand)]
pub(crate) enum ProjectCommand {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    /// Shows one project with its steps in position order.
    Show {
        id: Uuid,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Deletes a project and all of its steps.
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand)]
pub(crate) enum StepCommand {
    /// Adds a step; without --position it is appended after the last one.
    Add {
        project: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        detail: String,
        #[arg(long)]
        position: Option<i64>,
    },
    List {
        project: Uuid,
        #[arg(long, value_enum, default_value_t = OrderByArg::Position)]
        order_by: OrderByArg,
    },
    Show {
        project: Uuid,
        step: Uuid,
    },
    Edit {
        project: Uuid,
        step: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        detail: Option<String>,
    },
    Remove {
        project: Uuid,
        step: Uuid,
    },
    /// Moves a step to a 1-based position and prints the new ordering.
    Reorder {
        project: Uuid,
        step: Uuid,
        position: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum OrderByArg {
    Position,
    CreatedAt,
}

impl From<OrderByArg> for StepOrderBy {
    fn from(value: OrderByArg) -> Self {
        match value {
            OrderByArg::Position => Self::Position,
            OrderByArg::CreatedAt => Self::CreatedAt,
        }
    }
}
