//! Subcommand argument definitions.
//!
//! Each wrapper carries the clap attributes for one command and converts into
//! the matching core parameter type with `From`, so the core stays free of
//! CLI concerns.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand, ValueEnum};
use siteplan_core::{params::*, TaskStatus};
use uuid::Uuid;

/// Fetch and analyze a website
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Absolute http(s) URL of the site
    pub url: String,
}

impl From<AnalyzeArgs> for Analyze {
    fn from(val: AnalyzeArgs) -> Self {
        Analyze { url: val.url }
    }
}

/// Generate an action plan
///
/// The analysis comes either from the database or from a JSON file holding
/// an analysis payload. A plan that could not be saved can be written out
/// with `--save-pending` and stored later with `--pending-file`, without
/// asking the model again.
#[derive(Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["analysis_id", "payload_file", "pending_file"])
))]
pub struct PlanArgs {
    /// ID of a stored analysis
    pub analysis_id: Option<Uuid>,

    /// JSON file with an analysis payload (url, snapshot, report, analyzed_at)
    #[arg(long)]
    pub payload_file: Option<PathBuf>,

    /// JSON file with a previously generated plan that was not saved
    #[arg(long)]
    pub pending_file: Option<PathBuf>,

    /// Where to write the generated plan if saving it fails
    #[arg(long, conflicts_with = "pending_file")]
    pub save_pending: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum AnalysisCommands {
    /// List stored analyses, most recent first
    #[command(alias = "l")]
    List,
    /// Show an analysis with its plan and tasks
    #[command(alias = "s")]
    Show(ShowAnalysisArgs),
    /// Delete an analysis and all of its tasks
    #[command(alias = "d")]
    Delete(DeleteAnalysisArgs),
}

#[derive(Args)]
pub struct ShowAnalysisArgs {
    /// ID of the analysis to display
    pub id: Uuid,
}

impl From<ShowAnalysisArgs> for Id {
    fn from(val: ShowAnalysisArgs) -> Self {
        Id { id: val.id }
    }
}

#[derive(Args)]
pub struct DeleteAnalysisArgs {
    /// ID of the analysis to delete
    pub id: Uuid,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

impl From<DeleteAnalysisArgs> for DeleteAnalysis {
    fn from(val: DeleteAnalysisArgs) -> Self {
        DeleteAnalysis {
            id: val.id,
            confirmed: val.confirm,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List tasks, highest priority first
    #[command(alias = "l")]
    List(ListTasksArgs),
    /// Show the details of one task
    #[command(alias = "s")]
    Show(TaskIdArgs),
    /// Move a task to another status
    #[command(alias = "st")]
    Status(SetStatusArgs),
    /// Replace or clear the notes of a task
    #[command(alias = "n")]
    Notes(SetNotesArgs),
    /// Re-check a task against a fresh fetch of its site
    #[command(alias = "r")]
    Reanalyze(TaskIdArgs),
    /// Delete a single task
    #[command(alias = "d")]
    Delete(TaskIdArgs),
}

/// List tasks
///
/// Filters combine. Without `--sequence` tasks are ordered by priority, then
/// by newest analysis, then by their position in the plan.
#[derive(Args)]
pub struct ListTasksArgs {
    /// Only tasks of this analysis
    #[arg(long)]
    pub analysis: Option<Uuid>,
    /// Only tasks with this status
    #[arg(long, value_enum)]
    pub status: Option<TaskStatusArg>,
    /// Keep the order of the generated plan
    #[arg(long)]
    pub sequence: bool,
}

impl From<ListTasksArgs> for ListTasks {
    fn from(val: ListTasksArgs) -> Self {
        ListTasks {
            analysis_id: val.analysis,
            status: val.status.map(Into::into),
            sequence_order: val.sequence,
        }
    }
}

#[derive(Args)]
pub struct TaskIdArgs {
    /// ID of the task
    pub id: Uuid,
}

impl From<TaskIdArgs> for Id {
    fn from(val: TaskIdArgs) -> Self {
        Id { id: val.id }
    }
}

#[derive(Args)]
pub struct SetStatusArgs {
    /// ID of the task
    pub id: Uuid,
    /// New status
    #[arg(value_enum)]
    pub status: TaskStatusArg,
}

impl From<SetStatusArgs> for SetTaskStatus {
    fn from(val: SetStatusArgs) -> Self {
        SetTaskStatus {
            id: val.id,
            status: val.status.into(),
        }
    }
}

#[derive(Args)]
pub struct SetNotesArgs {
    /// ID of the task
    pub id: Uuid,
    /// New notes. Omit to clear the existing notes
    pub notes: Option<String>,
}

impl From<SetNotesArgs> for SetTaskNotes {
    fn from(val: SetNotesArgs) -> Self {
        SetTaskNotes {
            id: val.id,
            notes: val.notes,
        }
    }
}

/// Command-line spelling of task statuses
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum TaskStatusArg {
    /// Not started
    Pending,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
    /// Deliberately not done
    Skipped,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(val: TaskStatusArg) -> Self {
        match val {
            TaskStatusArg::Pending => TaskStatus::Pending,
            TaskStatusArg::InProgress => TaskStatus::InProgress,
            TaskStatusArg::Completed => TaskStatus::Completed,
            TaskStatusArg::Skipped => TaskStatus::Skipped,
        }
    }
}
