//! Command handlers.
//!
//! Every handler calls one core operation and renders the markdown produced
//! by the core display types.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use siteplan_core::{
    display::{AnalysisSummaries, CreateResult, DeleteResult, OperationStatus, Tasks, UpdateResult},
    params::{Analyze, GeneratePlan, SetTaskNotes, SetTaskStatus},
    LifecycleEngine, Owner, PendingPlan, PlanOutcome, PlanPersistence, Stores,
};

use crate::{
    args::Commands,
    commands::{AnalysisCommands, PlanArgs, TaskCommands},
    renderer::TerminalRenderer,
};

pub struct Cli {
    stores: Stores,
    engine: Option<LifecycleEngine>,
    renderer: TerminalRenderer,
    owner: Option<Owner>,
}

impl Cli {
    /// Handler limited to the store-backed commands.
    pub fn new(stores: Stores, renderer: TerminalRenderer, owner: Option<Owner>) -> Self {
        Self {
            stores,
            engine: None,
            renderer,
            owner,
        }
    }

    /// Handler for every command, including those that fetch and generate.
    pub fn with_engine(
        engine: LifecycleEngine,
        renderer: TerminalRenderer,
        owner: Option<Owner>,
    ) -> Self {
        Self {
            stores: engine.stores().clone(),
            engine: Some(engine),
            renderer,
            owner,
        }
    }

    fn engine(&self) -> Result<&LifecycleEngine> {
        self.engine
            .as_ref()
            .context("This command needs the fetcher and language model, which are not configured")
    }

    fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub async fn run(&self, command: Option<Commands>) -> Result<()> {
        match command {
            Some(Commands::Analyze(args)) => self.analyze(&args.into()).await,
            Some(Commands::Plan(args)) => self.plan(args).await,
            Some(Commands::Analysis { command }) => self.handle_analysis_command(command).await,
            Some(Commands::Task { command }) => self.handle_task_command(command).await,
            None => self.list_analyses().await,
        }
    }

    async fn analyze(&self, params: &Analyze) -> Result<()> {
        let analysis = self
            .engine()?
            .analyze(params, self.owner())
            .await
            .with_context(|| format!("Failed to analyze {}", params.url))?;

        self.renderer.render(&CreateResult::new(analysis).to_string())
    }

    async fn plan(&self, args: PlanArgs) -> Result<()> {
        if let Some(path) = &args.pending_file {
            return self.save_pending(path).await;
        }

        let params = match (args.analysis_id, &args.payload_file) {
            (Some(id), _) => GeneratePlan::stored(id),
            (None, Some(path)) => GeneratePlan::inline(read_json(path)?),
            (None, None) => bail!("Pass an analysis ID or --payload-file"),
        };

        let outcome = self
            .engine()?
            .generate_plan_for(&params, self.owner())
            .await
            .context("Failed to generate plan")?;
        self.renderer.render(&outcome.to_string())?;

        if let (Some(path), PlanPersistence::Unsaved { .. }) =
            (&args.save_pending, &outcome.persistence)
        {
            write_json(path, &outcome.plan)?;
            let note = OperationStatus::success(format!(
                "Plan written to {0}. Save it later with `siteplan plan --pending-file {0}`",
                path.display()
            ));
            self.renderer.render(&format!("\n{note}"))?;
        }
        Ok(())
    }

    /// Stores a plan that was generated earlier but could not be saved.
    async fn save_pending(&self, path: &Path) -> Result<()> {
        let pending: PendingPlan = read_json(path)?;
        let stored = self
            .stores
            .persist_plan(&pending, self.owner())
            .await
            .context("Failed to save plan")?;

        let outcome = PlanOutcome {
            plan: pending,
            persistence: PlanPersistence::Saved(stored),
        };
        self.renderer.render(&outcome.to_string())
    }

    async fn handle_analysis_command(&self, command: AnalysisCommands) -> Result<()> {
        match command {
            AnalysisCommands::List => self.list_analyses().await,
            AnalysisCommands::Show(args) => {
                let detail = self
                    .stores
                    .show_analysis(&args.into(), self.owner())
                    .await
                    .context("Failed to load analysis")?;
                self.renderer.render(&detail.to_string())
            }
            AnalysisCommands::Delete(args) => {
                let deleted = self
                    .stores
                    .delete_analysis(&args.into(), self.owner())
                    .await
                    .context("Failed to delete analysis")?;
                self.renderer.render(&DeleteResult::new(deleted).to_string())
            }
        }
    }

    async fn list_analyses(&self) -> Result<()> {
        let analyses = self
            .stores
            .list_analyses(self.owner())
            .await
            .context("Failed to list analyses")?;
        self.renderer
            .render(&AnalysisSummaries(analyses).to_string())
    }

    async fn handle_task_command(&self, command: TaskCommands) -> Result<()> {
        match command {
            TaskCommands::List(args) => {
                let tasks = self
                    .stores
                    .list_tasks(&args.into(), self.owner())
                    .await
                    .context("Failed to list tasks")?;
                self.renderer.render(&Tasks(tasks).to_string())
            }
            TaskCommands::Show(args) => {
                let task = self
                    .stores
                    .get_task(&args.into(), self.owner())
                    .await
                    .context("Failed to load task")?;
                self.renderer.render(&task.to_string())
            }
            TaskCommands::Status(args) => self.set_status(&args.into()).await,
            TaskCommands::Notes(args) => self.set_notes(&args.into()).await,
            TaskCommands::Reanalyze(args) => {
                let reanalysis = self
                    .engine()?
                    .reanalyze_task(&args.into(), self.owner())
                    .await
                    .context("Failed to reanalyze task")?;
                self.renderer.render(&reanalysis.to_string())
            }
            TaskCommands::Delete(args) => {
                let deleted = self
                    .stores
                    .delete_task(&args.into(), self.owner())
                    .await
                    .context("Failed to delete task")?;
                self.renderer.render(&DeleteResult::new(deleted).to_string())
            }
        }
    }

    async fn set_status(&self, params: &SetTaskStatus) -> Result<()> {
        let change = self
            .stores
            .set_task_status(params, self.owner())
            .await
            .context("Failed to update task status")?;

        let line = format!(
            "Status: {} → {}",
            change.previous.as_str(),
            change.task.status.as_str()
        );
        self.renderer
            .render(&UpdateResult::with_changes(change.task, vec![line]).to_string())
    }

    async fn set_notes(&self, params: &SetTaskNotes) -> Result<()> {
        let task = self
            .stores
            .set_task_notes(params, self.owner())
            .await
            .context("Failed to update task notes")?;

        let change = if task.notes.is_some() {
            "Notes updated"
        } else {
            "Notes cleared"
        };
        self.renderer
            .render(&UpdateResult::with_changes(task, vec![change.to_string()]).to_string())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
