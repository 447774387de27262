//! Production collaborators: an HTTP page fetcher and a chat completions
//! client.

mod chat_completions;
mod http_snapshot;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use siteplan_core::EngineBuilder;

pub use chat_completions::{ChatCompletionsGenerator, ChatConfig};
pub use http_snapshot::HttpSnapshotProvider;

use crate::args::CollaboratorArgs;

/// Registers every collaborator on `builder`.
pub fn install(builder: EngineBuilder, args: &CollaboratorArgs) -> Result<EngineBuilder> {
    let api_key = args
        .llm_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .context("No language model API key configured. Set SITEPLAN_LLM_API_KEY or pass --llm-api-key")?
        .to_string();

    let snapshots = HttpSnapshotProvider::new(Duration::from_secs(args.fetch_timeout_secs))
        .context("Failed to create HTTP client")?;
    let generator = Arc::new(
        ChatCompletionsGenerator::new(ChatConfig {
            api_key,
            model: args.llm_model.clone(),
            base_url: args.llm_base_url.clone(),
            timeout: Duration::from_secs(args.generation_timeout_secs),
        })
        .context("Failed to create language model client")?,
    );

    Ok(builder
        .with_snapshot_provider(Arc::new(snapshots))
        .with_insight_generator(generator.clone())
        .with_plan_generator(generator.clone())
        .with_task_evaluator(generator))
}
