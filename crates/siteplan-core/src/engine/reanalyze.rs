//! Re-checking a task against a fresh snapshot of its site.

use log::info;

use super::{checked, LifecycleEngine, Reanalysis};
use crate::{
    error::{Result, Stage},
    models::Owner,
    params::Id,
};

impl LifecycleEngine {
    /// Evaluates a task against a freshly fetched snapshot of its analysis'
    /// URL and records the verdict on the task.
    ///
    /// The task status is never changed here; moving the task to
    /// `completed` stays an explicit caller decision.
    pub async fn reanalyze_task(&self, params: &Id, owner: Option<&Owner>) -> Result<Reanalysis> {
        let task = self.stores.get_task(params, owner).await?;

        let analysis = self
            .stores
            .get_analysis(
                &Id {
                    id: task.analysis_id,
                },
                owner,
            )
            .await?;

        let snapshot = self.fetch_snapshot(&analysis.url).await?;

        let verdict = self
            .evaluator
            .evaluate_task(&task, &snapshot)
            .await
            .map_err(|e| e.into_generation_error(Stage::Evaluation))?;
        let verdict = checked(verdict, Stage::Evaluation)?;

        let task = self
            .stores
            .attach_reanalysis(task.id, owner, &verdict)
            .await?;

        info!(
            "Reanalyzed task {}: {}",
            task.id,
            verdict.outcome.as_str()
        );
        Ok(Reanalysis { task, verdict })
    }
}
