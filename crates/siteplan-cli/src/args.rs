use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use siteplan_core::Owner;

use crate::commands::{AnalysisCommands, AnalyzeArgs, PlanArgs, TaskCommands};

/// Analyze a website and track the resulting improvement plan
///
/// siteplan fetches a page, asks a language model to score it and propose an
/// action plan, and stores the plan as tasks that can be worked through and
/// re-checked against the live site.
#[derive(Parser)]
#[command(version, about, name = "siteplan")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/siteplan/siteplan.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Identity of the caller as established by the authentication layer.
    /// Omit for anonymous use
    #[arg(long, global = true, env = "SITEPLAN_OWNER")]
    pub owner: Option<Owner>,

    #[command(flatten)]
    pub collaborators: CollaboratorArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings for the page fetcher and the language model client
#[derive(ClapArgs, Debug, Clone)]
pub struct CollaboratorArgs {
    /// API key for the chat completions endpoint
    #[arg(long, global = true, env = "SITEPLAN_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Model used for analysis, plans and re-checks
    #[arg(
        long,
        global = true,
        env = "SITEPLAN_LLM_MODEL",
        default_value = "gpt-4o-mini"
    )]
    pub llm_model: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(
        long,
        global = true,
        env = "SITEPLAN_LLM_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub llm_base_url: String,

    /// Seconds to wait for a page fetch
    #[arg(long, global = true, default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Seconds to wait for one model response
    #[arg(long, global = true, default_value_t = 120)]
    pub generation_timeout_secs: u64,
}

/// Available commands for the siteplan CLI
///
/// Without a command the stored analyses are listed.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and analyze a website
    #[command(alias = "a")]
    Analyze(AnalyzeArgs),
    /// Generate an action plan for an analysis
    #[command(alias = "p")]
    Plan(PlanArgs),
    /// Manage stored analyses
    #[command(alias = "an")]
    Analysis {
        #[command(subcommand)]
        command: AnalysisCommands,
    },
    /// Manage the tasks of action plans
    #[command(alias = "t")]
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

impl Commands {
    /// Whether the command talks to the fetcher or the language model.
    pub fn needs_collaborators(&self) -> bool {
        match self {
            Commands::Analyze(_) => true,
            Commands::Plan(args) => args.pending_file.is_none(),
            Commands::Task {
                command: TaskCommands::Reanalyze(_),
            } => true,
            Commands::Analysis { .. } | Commands::Task { .. } => false,
        }
    }
}
