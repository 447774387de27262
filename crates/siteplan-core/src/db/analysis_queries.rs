//! Analysis CRUD operations and queries.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::{
    task_queries,
    utils::{
        format_timestamp, json_at, optional_json_at, optional_timestamp_at, owner_at,
        timestamp_at, to_json, uuid_at,
    },
};
use crate::{
    error::{DatabaseResultExt, EngineError, Result},
    models::{
        owner_matches, ActionPlan, Analysis, AnalysisPayload, AnalysisReport, AnalysisSummary,
        GeneratedPlan, Owner, StoredPlan,
    },
};

const INSERT_ANALYSIS_SQL: &str = "INSERT INTO analyses (id, owner, url, snapshot, report, analyzed_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)";
const SELECT_ANALYSIS_SQL: &str = "SELECT id, owner, url, snapshot, report, plan_summary, plan_timeline, plan_quick_wins, plan_generated_at, analyzed_at, created_at, updated_at FROM analyses WHERE id = ?1";
const SELECT_LATEST_ANALYSIS_SQL: &str = "SELECT id, owner, url, snapshot, report, plan_summary, plan_timeline, plan_quick_wins, plan_generated_at, analyzed_at, created_at, updated_at FROM analyses WHERE owner IS ?1 AND url = ?2 ORDER BY analyzed_at DESC, created_at DESC LIMIT 1";
const SELECT_LATEST_ANALYSIS_ID_SQL: &str = "SELECT id FROM analyses WHERE owner IS ?1 AND url = ?2 ORDER BY analyzed_at DESC, created_at DESC LIMIT 1";
const SELECT_ANALYSIS_OWNER_SQL: &str = "SELECT owner FROM analyses WHERE id = ?1";
const UPDATE_ANALYSIS_PLAN_SQL: &str = "UPDATE analyses SET plan_summary = ?1, plan_timeline = ?2, plan_quick_wins = ?3, plan_generated_at = ?4, updated_at = ?4 WHERE id = ?5";
const DELETE_ANALYSIS_TASKS_SQL: &str = "DELETE FROM tasks WHERE analysis_id = ?1";
const DELETE_ANALYSIS_SQL: &str = "DELETE FROM analyses WHERE id = ?1";
const LIST_ANALYSES_SQL: &str = "SELECT a.id, a.url, a.report, a.plan_summary, a.analyzed_at, COUNT(t.id), COALESCE(SUM(CASE WHEN t.status = 'completed' THEN 1 ELSE 0 END), 0) FROM analyses a LEFT JOIN tasks t ON t.analysis_id = a.id WHERE a.owner IS ?1 GROUP BY a.id ORDER BY a.analyzed_at DESC, a.created_at DESC";

/// Helper function to construct an Analysis from a database row
fn build_analysis_from_row(row: &rusqlite::Row) -> rusqlite::Result<Analysis> {
    let plan_summary: Option<String> = row.get(5)?;
    let plan_generated_at = optional_timestamp_at(row, 8)?;

    let plan = match (plan_summary, plan_generated_at) {
        (Some(summary), Some(generated_at)) => Some(ActionPlan {
            summary,
            timeline: row.get(6)?,
            quick_wins: optional_json_at(row, 7)?.unwrap_or_default(),
            generated_at,
        }),
        _ => None,
    };

    Ok(Analysis {
        id: uuid_at(row, 0)?,
        owner: owner_at(row, 1)?,
        url: row.get(2)?,
        snapshot: json_at(row, 3)?,
        report: json_at(row, 4)?,
        plan,
        analyzed_at: timestamp_at(row, 9)?,
        created_at: timestamp_at(row, 10)?,
        updated_at: timestamp_at(row, 11)?,
    })
}

fn insert_analysis(
    conn: &Connection,
    owner: Option<&Owner>,
    payload: &AnalysisPayload,
    now: Timestamp,
) -> Result<Analysis> {
    let id = Uuid::new_v4();

    conn.execute(
        INSERT_ANALYSIS_SQL,
        params![
            id.to_string(),
            owner.map(Owner::as_str),
            &payload.url,
            to_json(&payload.snapshot)?,
            to_json(&payload.report)?,
            format_timestamp(payload.analyzed_at),
            format_timestamp(now),
        ],
    )
    .db_context("Failed to insert analysis")?;

    Ok(Analysis {
        id,
        owner: owner.cloned(),
        url: payload.url.clone(),
        snapshot: payload.snapshot.clone(),
        report: payload.report.clone(),
        plan: None,
        analyzed_at: payload.analyzed_at,
        created_at: now,
        updated_at: now,
    })
}

fn select_analysis(conn: &Connection, id: Uuid) -> Result<Option<Analysis>> {
    conn.query_row(
        SELECT_ANALYSIS_SQL,
        params![id.to_string()],
        build_analysis_from_row,
    )
    .optional()
    .db_context("Failed to query analysis")
}

fn write_plan(conn: &Connection, id: Uuid, plan: &ActionPlan) -> Result<()> {
    let rows_affected = conn
        .execute(
            UPDATE_ANALYSIS_PLAN_SQL,
            params![
                &plan.summary,
                &plan.timeline,
                to_json(&plan.quick_wins)?,
                format_timestamp(plan.generated_at),
                id.to_string()
            ],
        )
        .db_context("Failed to attach plan")?;

    if rows_affected == 0 {
        return Err(EngineError::AnalysisNotFound { id: id.to_string() });
    }
    Ok(())
}

/// Verifies an analysis exists and belongs to `owner`.
pub(super) fn ensure_analysis_access(
    conn: &Connection,
    id: Uuid,
    owner: Option<&Owner>,
) -> Result<()> {
    let record_owner: Option<Option<String>> = conn
        .query_row(SELECT_ANALYSIS_OWNER_SQL, params![id.to_string()], |row| {
            row.get(0)
        })
        .optional()
        .db_context("Failed to look up analysis")?;

    match record_owner {
        None => Err(EngineError::AnalysisNotFound { id: id.to_string() }),
        Some(record) if owner_matches(record.as_deref(), owner) => Ok(()),
        Some(_) => Err(EngineError::Unauthorized {
            resource: "analysis",
        }),
    }
}

impl super::Database {
    /// Inserts a new analysis. Never deduplicates: two calls with the same
    /// owner and URL produce two records.
    pub fn create_analysis(
        &mut self,
        owner: Option<&Owner>,
        payload: &AnalysisPayload,
    ) -> Result<Analysis> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let analysis = insert_analysis(&tx, owner, payload, Timestamp::now())?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(analysis)
    }

    /// Retrieves an analysis by its ID.
    pub fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>> {
        select_analysis(&self.connection, id)
    }

    /// Returns the most recently analyzed record for exactly this owner and
    /// URL. An anonymous owner only ever matches anonymous records.
    pub fn latest_analysis(&self, owner: Option<&Owner>, url: &str) -> Result<Option<Analysis>> {
        self.connection
            .query_row(
                SELECT_LATEST_ANALYSIS_SQL,
                params![owner.map(Owner::as_str), url],
                build_analysis_from_row,
            )
            .optional()
            .db_context("Failed to query latest analysis")
    }

    /// Overwrites the plan fields of an existing analysis. `analyzed_at` is
    /// left untouched.
    pub fn attach_plan(&mut self, id: Uuid, plan: &ActionPlan) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        write_plan(&tx, id, plan)?;

        tx.commit().db_context("Failed to commit transaction")
    }

    /// Lists the analyses of an owner, most recently analyzed first.
    pub fn list_analyses(&self, owner: Option<&Owner>) -> Result<Vec<AnalysisSummary>> {
        let mut stmt = self
            .connection
            .prepare(LIST_ANALYSES_SQL)
            .db_context("Failed to prepare query")?;

        let summaries = stmt
            .query_map(params![owner.map(Owner::as_str)], |row| {
                let report: AnalysisReport = json_at(row, 2)?;
                Ok(AnalysisSummary {
                    id: uuid_at(row, 0)?,
                    url: row.get(1)?,
                    overall_score: report.overall_score,
                    plan_summary: row.get(3)?,
                    analyzed_at: timestamp_at(row, 4)?,
                    total_tasks: row.get::<_, i64>(5)? as u32,
                    completed_tasks: row.get::<_, i64>(6)? as u32,
                })
            })
            .db_context("Failed to query analyses")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch analyses")?;

        Ok(summaries)
    }

    /// Permanently deletes an analysis and every task that references it.
    /// Returns the deleted record.
    pub fn delete_analysis(&mut self, id: Uuid, owner: Option<&Owner>) -> Result<Analysis> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        ensure_analysis_access(&tx, id, owner)?;

        let analysis =
            select_analysis(&tx, id)?.ok_or_else(|| EngineError::AnalysisNotFound {
                id: id.to_string(),
            })?;

        // The foreign key cascades as well; deleting explicitly keeps the
        // behaviour independent of the connection's PRAGMA state.
        tx.execute(DELETE_ANALYSIS_TASKS_SQL, params![id.to_string()])
            .db_context("Failed to delete analysis tasks")?;

        tx.execute(DELETE_ANALYSIS_SQL, params![id.to_string()])
            .db_context("Failed to delete analysis")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(analysis)
    }

    /// Attaches a generated plan to the latest analysis for `(owner, url)`,
    /// creating the analysis from `payload` when none exists, and replaces
    /// its task set. Everything happens in one IMMEDIATE transaction, so
    /// concurrent callers for the same pair serialize on the write lock and
    /// never observe or produce a partial task list.
    pub fn upsert_plan_by_url(
        &mut self,
        owner: Option<&Owner>,
        payload: &AnalysisPayload,
        plan: &GeneratedPlan,
    ) -> Result<StoredPlan> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let now = Timestamp::now();

        let existing: Option<String> = tx
            .query_row(
                SELECT_LATEST_ANALYSIS_ID_SQL,
                params![owner.map(Owner::as_str), &payload.url],
                |row| row.get(0),
            )
            .optional()
            .db_context("Failed to look up existing analysis")?;

        let (analysis_id, created) = match existing {
            Some(raw) => {
                let id = raw.parse::<Uuid>().map_err(|e| EngineError::Internal {
                    message: format!("Corrupt analysis id in database: {e}"),
                })?;
                (id, false)
            }
            None => (insert_analysis(&tx, owner, payload, now)?.id, true),
        };

        write_plan(&tx, analysis_id, &ActionPlan::from_generated(plan, now))?;
        let tasks = task_queries::replace_task_rows(&tx, analysis_id, owner, &plan.tasks, now)?;

        let analysis =
            select_analysis(&tx, analysis_id)?.ok_or_else(|| EngineError::AnalysisNotFound {
                id: analysis_id.to_string(),
            })?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(StoredPlan {
            analysis,
            created,
            tasks,
        })
    }
}
