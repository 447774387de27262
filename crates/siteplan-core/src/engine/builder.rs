//! Builder for creating and configuring engine instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;

use super::{LifecycleEngine, Stores};
use crate::{
    collaborators::{InsightGenerator, PlanGenerator, SnapshotProvider, TaskEvaluator},
    error::{EngineError, Result},
};

/// Builder for [`LifecycleEngine`] and [`Stores`].
///
/// Collaborators are constructed once at process start and injected here;
/// the engine keeps them for its whole lifetime.
#[derive(Default)]
pub struct EngineBuilder {
    database_path: Option<PathBuf>,
    snapshots: Option<Arc<dyn SnapshotProvider>>,
    insights: Option<Arc<dyn InsightGenerator>>,
    plans: Option<Arc<dyn PlanGenerator>>,
    evaluator: Option<Arc<dyn TaskEvaluator>>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/siteplan/siteplan.db` or
    /// `~/.local/share/siteplan/siteplan.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_snapshot_provider(mut self, provider: Arc<dyn SnapshotProvider>) -> Self {
        self.snapshots = Some(provider);
        self
    }

    pub fn with_insight_generator(mut self, generator: Arc<dyn InsightGenerator>) -> Self {
        self.insights = Some(generator);
        self
    }

    pub fn with_plan_generator(mut self, generator: Arc<dyn PlanGenerator>) -> Self {
        self.plans = Some(generator);
        self
    }

    pub fn with_task_evaluator(mut self, evaluator: Arc<dyn TaskEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Builds a store-only handle. Collaborators, if set, are ignored.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::FileSystem` if the database directory cannot be
    /// created, or `EngineError::Persistence` if schema initialization fails
    pub async fn build_stores(self) -> Result<Stores> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        debug!("Using database at {}", db_path.display());

        let stores = Stores::new(db_path);
        // Opening a connection initializes the schema
        stores.with_database(|_| Ok(())).await?;
        Ok(stores)
    }

    /// Builds the configured engine.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Configuration` if any collaborator is missing,
    /// in addition to the errors of [`EngineBuilder::build_stores`]
    pub async fn build(mut self) -> Result<LifecycleEngine> {
        let snapshots = require(self.snapshots.take(), "snapshot provider")?;
        let insights = require(self.insights.take(), "insight generator")?;
        let plans = require(self.plans.take(), "plan generator")?;
        let evaluator = require(self.evaluator.take(), "task evaluator")?;

        Ok(LifecycleEngine {
            stores: self.build_stores().await?,
            snapshots,
            insights,
            plans,
            evaluator,
        })
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("siteplan")
            .place_data_file("siteplan.db")
            .map_err(|e| EngineError::XdgDirectory(e.to_string()))
    }
}

fn require<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| EngineError::Configuration {
        message: format!("No {name} configured"),
    })
}
