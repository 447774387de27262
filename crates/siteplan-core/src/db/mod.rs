//! Database operations and SQLite management for analyses and tasks.
//!
//! This module provides the low-level stores of the engine. A [`Database`]
//! wraps one SQLite connection; the engine opens one per operation and drops
//! it before returning.
//!
//! - [`analysis_queries`]: the Analysis Store, including the atomic
//!   upsert-by-URL used by plan generation
//! - [`task_queries`]: the Task Store and the status state machine
//! - [`migrations`]: schema initialization and version checks
//! - [`utils`]: row decoding and timestamp encoding helpers

use std::{path::Path, time::Duration};

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod analysis_queries;
pub mod migrations;
pub mod task_queries;
pub mod utils;

/// How long a connection waits for another writer before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .db_context("Failed to configure busy timeout")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
