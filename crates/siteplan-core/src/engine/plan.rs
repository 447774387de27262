//! Plan generation with the upsert-by-URL policy.

use log::{info, warn};

use super::{checked, LifecycleEngine, PendingPlan, PlanOutcome, PlanPersistence, Stores};
use crate::{
    error::{Result, Stage},
    models::{AnalysisPayload, Owner, StoredPlan, Validate},
    params::{normalize_url, GeneratePlan, Id, PlanSource},
};

impl LifecycleEngine {
    /// Generates an action plan and attaches it to the latest analysis of
    /// the caller for the same URL, creating one if none exists.
    ///
    /// A stored analysis must exist and belong to the caller before the
    /// plan generator is called. Generator failures abort with no writes. If
    /// storing fails after a successful generation, the plan is still
    /// returned with [`PlanPersistence::Unsaved`] so the caller can retry
    /// through [`Stores::persist_plan`].
    pub async fn generate_plan_for(
        &self,
        params: &GeneratePlan,
        owner: Option<&Owner>,
    ) -> Result<PlanOutcome> {
        let payload = match &params.source {
            PlanSource::Stored { analysis_id } => self
                .stores
                .get_analysis(&Id { id: *analysis_id }, owner)
                .await?
                .payload(),
            PlanSource::Inline { payload } => accepted_payload(payload)?,
        };

        let plan = self
            .plans
            .generate_plan(&payload.report, &payload.snapshot)
            .await
            .map_err(|e| e.into_generation_error(Stage::Plan))?;
        let plan = checked(plan, Stage::Plan)?;

        let pending = PendingPlan { payload, plan };

        let persistence = match self.stores.persist_plan(&pending, owner).await {
            Ok(stored) => PlanPersistence::Saved(stored),
            Err(e) => {
                warn!(
                    "Plan for {} was generated but could not be saved: {e}",
                    pending.payload.url
                );
                PlanPersistence::Unsaved {
                    warning: format!("Plan generated but not saved: {e}"),
                }
            }
        };

        Ok(PlanOutcome {
            plan: pending,
            persistence,
        })
    }
}

impl Stores {
    /// Stores a generated plan on the latest analysis for the caller and the
    /// payload's URL, creating the analysis from the payload when there is
    /// none. The previous task set of that analysis is replaced.
    ///
    /// Both halves of `pending` may come from outside the process, so they
    /// are checked again here; nothing is written when either is rejected.
    pub async fn persist_plan(
        &self,
        pending: &PendingPlan,
        owner: Option<&Owner>,
    ) -> Result<StoredPlan> {
        let payload = accepted_payload(&pending.payload)?;
        pending.plan.validate()?;

        let owner = owner.cloned();
        let plan = pending.plan.clone();

        let stored = self
            .with_database(move |db| db.upsert_plan_by_url(owner.as_ref(), &payload, &plan))
            .await?;

        info!(
            "Attached plan with {} tasks to {} analysis {} for {}",
            stored.tasks.len(),
            if stored.created { "new" } else { "existing" },
            stored.analysis.id,
            stored.analysis.url
        );
        Ok(stored)
    }
}

/// Checks analysis data supplied by the caller and normalizes its URL the
/// same way [`crate::params::Analyze::validated_url`] does.
fn accepted_payload(payload: &AnalysisPayload) -> Result<AnalysisPayload> {
    payload.validate()?;
    let url = normalize_url(&payload.url)?;
    Ok(AnalysisPayload {
        url,
        ..payload.clone()
    })
}
