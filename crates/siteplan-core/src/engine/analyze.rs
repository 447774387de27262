//! The `analyze` use case.

use jiff::Timestamp;
use log::{debug, info};

use super::{checked, LifecycleEngine};
use crate::{
    error::{EngineError, Result, Stage},
    models::{Analysis, AnalysisPayload, Owner, Snapshot, Validate},
    params::Analyze,
};

impl LifecycleEngine {
    /// Fetches the site, generates an analysis report and stores both as a
    /// new [`Analysis`].
    ///
    /// Single attempt: if either collaborator fails nothing is persisted and
    /// the failure is returned as is.
    pub async fn analyze(&self, params: &Analyze, owner: Option<&Owner>) -> Result<Analysis> {
        let url = params.validated_url()?;

        let snapshot = self.fetch_snapshot(&url).await?;

        let report = self
            .insights
            .generate_analysis(&snapshot)
            .await
            .map_err(|e| e.into_generation_error(Stage::Insight))?;
        let report = checked(report, Stage::Insight)?;

        let payload = AnalysisPayload {
            url,
            snapshot,
            report,
            analyzed_at: Timestamp::now(),
        };

        let creator = owner.cloned();
        let analysis = self
            .stores
            .with_database(move |db| db.create_analysis(creator.as_ref(), &payload))
            .await?;

        info!(
            "Created analysis {} for {} (score {})",
            analysis.id, analysis.url, analysis.report.overall_score
        );
        Ok(analysis)
    }

    /// Fetches and validates a fresh snapshot of `url`.
    pub(crate) async fn fetch_snapshot(&self, url: &str) -> Result<Snapshot> {
        debug!("Fetching snapshot of {url}");

        let snapshot = self
            .snapshots
            .fetch_snapshot(url)
            .await
            .map_err(|e| e.into_fetch_error(url))?;

        snapshot.validate().map_err(|e| EngineError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(snapshot)
    }
}
