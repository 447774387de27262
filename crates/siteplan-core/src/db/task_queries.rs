//! Task CRUD operations, queries and the status transition rules.

use jiff::Timestamp;
use rusqlite::{
    params, params_from_iter, types::Value, Connection, OptionalExtension, TransactionBehavior,
};
use uuid::Uuid;

use super::{
    analysis_queries::ensure_analysis_access,
    utils::{
        format_timestamp, optional_json_at, optional_timestamp_at, owner_at, parsed_at,
        timestamp_at, to_json, uuid_at,
    },
};
use crate::{
    error::{DatabaseResultExt, EngineError, Result},
    models::{
        owner_matches, Owner, Priority, StatusChange, StatusCounts, Task, TaskDraft, TaskFilter,
        TaskOrder, TaskStatus, Verdict,
    },
};

const TASK_COLUMNS: &str = "id, analysis_id, owner, category, priority, effort, impact, title, description, estimated_time, status, notes, sequence, last_reanalysis, last_reanalyzed_at, started_at, completed_at, created_at, updated_at";

const INSERT_TASK_SQL: &str = "INSERT INTO tasks (id, analysis_id, owner, category, priority, effort, impact, title, description, estimated_time, status, sequence, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending', ?11, ?12, ?12)";
const DELETE_TASKS_FOR_ANALYSIS_SQL: &str = "DELETE FROM tasks WHERE analysis_id = ?1";
const SELECT_TASK_OWNER_SQL: &str = "SELECT owner FROM tasks WHERE id = ?1";
const UPDATE_TASK_STATUS_SQL: &str = "UPDATE tasks SET status = ?1, updated_at = ?2, started_at = CASE WHEN ?1 = 'in_progress' AND started_at IS NULL THEN ?2 ELSE started_at END, completed_at = CASE WHEN ?1 = 'completed' AND status <> 'completed' THEN ?2 ELSE completed_at END WHERE id = ?3";
const UPDATE_TASK_NOTES_SQL: &str = "UPDATE tasks SET notes = ?1, updated_at = ?2 WHERE id = ?3";
const UPDATE_TASK_REANALYSIS_SQL: &str =
    "UPDATE tasks SET last_reanalysis = ?1, last_reanalyzed_at = ?2, updated_at = ?2 WHERE id = ?3";
const DELETE_TASK_SQL: &str = "DELETE FROM tasks WHERE id = ?1";
const COUNT_TASKS_BY_STATUS_SQL: &str =
    "SELECT status, COUNT(*) FROM tasks WHERE analysis_id = ?1 GROUP BY status";

const SEQUENCE_ORDER: &str = " ORDER BY created_at DESC, analysis_id, sequence";

/// Highest priority first, then newest analysis, then plan sequence.
fn priority_order() -> String {
    let ranks: String = [Priority::High, Priority::Medium, Priority::Low]
        .iter()
        .map(|priority| format!(" WHEN '{}' THEN {}", priority.as_str(), priority.rank()))
        .collect();
    format!(" ORDER BY CASE priority{ranks} END, created_at DESC, sequence")
}

/// Helper function to construct a Task from a database row
fn build_task_from_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: uuid_at(row, 0)?,
        analysis_id: uuid_at(row, 1)?,
        owner: owner_at(row, 2)?,
        category: row.get(3)?,
        priority: parsed_at(row, 4)?,
        effort: row.get(5)?,
        impact: row.get(6)?,
        title: row.get(7)?,
        description: row.get(8)?,
        estimated_time: row.get(9)?,
        status: parsed_at(row, 10)?,
        notes: row.get(11)?,
        sequence: row.get::<_, i64>(12)? as u32,
        last_reanalysis: optional_json_at(row, 13)?,
        last_reanalyzed_at: optional_timestamp_at(row, 14)?,
        started_at: optional_timestamp_at(row, 15)?,
        completed_at: optional_timestamp_at(row, 16)?,
        created_at: timestamp_at(row, 17)?,
        updated_at: timestamp_at(row, 18)?,
    })
}

fn select_task(conn: &Connection, id: Uuid) -> Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id.to_string()],
        build_task_from_row,
    )
    .optional()
    .db_context("Failed to query task")
}

fn ensure_task_access(conn: &Connection, id: Uuid, owner: Option<&Owner>) -> Result<()> {
    let record_owner: Option<Option<String>> = conn
        .query_row(SELECT_TASK_OWNER_SQL, params![id.to_string()], |row| {
            row.get(0)
        })
        .optional()
        .db_context("Failed to look up task")?;

    match record_owner {
        None => Err(EngineError::TaskNotFound { id: id.to_string() }),
        Some(record) if owner_matches(record.as_deref(), owner) => Ok(()),
        Some(_) => Err(EngineError::Unauthorized { resource: "task" }),
    }
}

fn require_task(conn: &Connection, id: Uuid) -> Result<Task> {
    select_task(conn, id)?.ok_or_else(|| EngineError::TaskNotFound { id: id.to_string() })
}

/// Inserts drafts as pending tasks with sequence positions 0..n-1 in input
/// order.
fn insert_task_rows(
    conn: &Connection,
    analysis_id: Uuid,
    owner: Option<&Owner>,
    drafts: &[TaskDraft],
    now: Timestamp,
) -> Result<Vec<Task>> {
    let now_str = format_timestamp(now);
    let mut stmt = conn
        .prepare(INSERT_TASK_SQL)
        .db_context("Failed to prepare task insert")?;

    let mut tasks = Vec::with_capacity(drafts.len());
    for (sequence, draft) in drafts.iter().enumerate() {
        let id = Uuid::new_v4();
        stmt.execute(params![
            id.to_string(),
            analysis_id.to_string(),
            owner.map(Owner::as_str),
            &draft.category,
            draft.priority.as_str(),
            &draft.effort,
            &draft.impact,
            &draft.title,
            &draft.description,
            draft.estimated_time.as_deref(),
            sequence as i64,
            &now_str,
        ])
        .db_context("Failed to insert task")?;

        tasks.push(Task {
            id,
            analysis_id,
            owner: owner.cloned(),
            category: draft.category.clone(),
            priority: draft.priority,
            effort: draft.effort.clone(),
            impact: draft.impact.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            estimated_time: draft.estimated_time.clone(),
            status: TaskStatus::Pending,
            notes: None,
            sequence: sequence as u32,
            last_reanalysis: None,
            last_reanalyzed_at: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        });
    }

    Ok(tasks)
}

/// Drops the current task set of an analysis and inserts `drafts` in its
/// place. Must run inside the caller's transaction.
pub(super) fn replace_task_rows(
    conn: &Connection,
    analysis_id: Uuid,
    owner: Option<&Owner>,
    drafts: &[TaskDraft],
    now: Timestamp,
) -> Result<Vec<Task>> {
    conn.execute(DELETE_TASKS_FOR_ANALYSIS_SQL, params![analysis_id.to_string()])
        .db_context("Failed to delete previous tasks")?;

    insert_task_rows(conn, analysis_id, owner, drafts, now)
}

impl super::Database {
    /// Creates tasks for an analysis in bulk. Either every draft is stored or
    /// none is.
    pub fn create_tasks(
        &mut self,
        analysis_id: Uuid,
        owner: Option<&Owner>,
        drafts: &[TaskDraft],
    ) -> Result<Vec<Task>> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        ensure_analysis_access(&tx, analysis_id, owner)?;
        let tasks = insert_task_rows(&tx, analysis_id, owner, drafts, Timestamp::now())?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(tasks)
    }

    /// Lists the tasks of an owner matching `filter`.
    pub fn list_tasks(&self, owner: Option<&Owner>, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner IS ?");
        let mut values = vec![owner.map_or(Value::Null, |o| Value::Text(o.as_str().into()))];

        if let Some(analysis_id) = filter.analysis_id {
            sql.push_str(" AND analysis_id = ?");
            values.push(Value::Text(analysis_id.to_string()));
        }

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(Value::Text(status.as_str().into()));
        }

        match filter.order {
            TaskOrder::Priority => sql.push_str(&priority_order()),
            TaskOrder::Sequence => sql.push_str(SEQUENCE_ORDER),
        }

        let mut stmt = self
            .connection
            .prepare(&sql)
            .db_context("Failed to prepare query")?;

        let tasks = stmt
            .query_map(params_from_iter(values), build_task_from_row)
            .db_context("Failed to query tasks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch tasks")?;

        Ok(tasks)
    }

    /// Retrieves a task by its ID without an ownership check.
    pub fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        select_task(&self.connection, id)
    }

    /// Moves a task to `status`, applying the transition side effects:
    /// `started_at` is stamped on the first entry into `in_progress` only,
    /// `completed_at` on every fresh entry into `completed`, and
    /// `updated_at` on every call.
    ///
    /// The previous status is read in the same transaction as the update.
    pub fn set_task_status(
        &mut self,
        id: Uuid,
        owner: Option<&Owner>,
        status: TaskStatus,
    ) -> Result<StatusChange> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        ensure_task_access(&tx, id, owner)?;
        let previous = require_task(&tx, id)?.status;

        tx.execute(
            UPDATE_TASK_STATUS_SQL,
            params![
                status.as_str(),
                format_timestamp(Timestamp::now()),
                id.to_string()
            ],
        )
        .db_context("Failed to update task status")?;

        let task = require_task(&tx, id)?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(StatusChange { previous, task })
    }

    /// Replaces a task's notes. Blank notes clear the field.
    pub fn set_task_notes(
        &mut self,
        id: Uuid,
        owner: Option<&Owner>,
        notes: Option<&str>,
    ) -> Result<Task> {
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        ensure_task_access(&tx, id, owner)?;

        tx.execute(
            UPDATE_TASK_NOTES_SQL,
            params![notes, format_timestamp(Timestamp::now()), id.to_string()],
        )
        .db_context("Failed to update task notes")?;

        let task = require_task(&tx, id)?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(task)
    }

    /// Stores the latest verdict for a task. The status is left unchanged.
    pub fn attach_reanalysis(
        &mut self,
        id: Uuid,
        owner: Option<&Owner>,
        verdict: &Verdict,
    ) -> Result<Task> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        ensure_task_access(&tx, id, owner)?;

        tx.execute(
            UPDATE_TASK_REANALYSIS_SQL,
            params![
                to_json(verdict)?,
                format_timestamp(Timestamp::now()),
                id.to_string()
            ],
        )
        .db_context("Failed to attach reanalysis result")?;

        let task = require_task(&tx, id)?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(task)
    }

    /// Deletes a single task and returns it.
    pub fn delete_task(&mut self, id: Uuid, owner: Option<&Owner>) -> Result<Task> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        ensure_task_access(&tx, id, owner)?;
        let task = require_task(&tx, id)?;

        tx.execute(DELETE_TASK_SQL, params![id.to_string()])
            .db_context("Failed to delete task")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(task)
    }

    /// Counts the tasks of an analysis by status.
    pub fn status_counts(&self, analysis_id: Uuid) -> Result<StatusCounts> {
        let mut stmt = self
            .connection
            .prepare(COUNT_TASKS_BY_STATUS_SQL)
            .db_context("Failed to prepare query")?;

        let rows = stmt
            .query_map(params![analysis_id.to_string()], |row| {
                Ok((parsed_at::<TaskStatus>(row, 0)?, row.get::<_, i64>(1)?))
            })
            .db_context("Failed to count tasks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch task counts")?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status, count as u32);
        }
        Ok(counts)
    }
}
