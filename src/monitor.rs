//! Entry points for the dashboard layer: occurrence queries plus
//! start/stop control of the single active tail session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    catalog::PatternCatalog,
    classifier::Classifier,
    config::MonitorConfig,
    db::{AggregateStats, Database, Occurrence, OccurrenceSummary, STATUS_REVIEWED},
    enricher::{Enricher, NoLookup, SolutionLookup, WebSearchLookup},
    notifier::Notifier,
    pipeline::Pipeline,
    tailer::{TailOptions, TailSession, TailerState},
};

/// Outcome of a control operation, shaped for a JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ControlStatus {
    pub fn success() -> Self {
        Self {
            status: "success".into(),
            message: None,
        }
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

pub struct Monitor {
    db: Database,
    pipeline: Pipeline,
    options: TailOptions,
    session: Mutex<Option<TailSession>>,
}

impl Monitor {
    pub fn new(pipeline: Pipeline, options: TailOptions) -> Self {
        Self {
            db: pipeline.database().clone(),
            pipeline,
            options,
            session: Mutex::new(None),
        }
    }

    /// Wire the built-in catalog, the configured lookup and notifier, and
    /// the configured gating into a monitor.
    pub fn from_config(
        db: Database,
        config: &MonitorConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let catalog = Arc::new(PatternCatalog::builtin()?);

        let lookup: Arc<dyn SolutionLookup> = if config.solution_lookup {
            Arc::new(WebSearchLookup::new(config.lookup_timeout()))
        } else {
            Arc::new(NoLookup)
        };
        let enricher = Enricher::new(Arc::clone(&catalog), lookup)
            .with_lookup_timeout(config.lookup_timeout());

        let pipeline = Pipeline::new(Classifier::new(catalog), enricher, db)
            .configured(config, notifier);

        Ok(Self::new(pipeline, TailOptions::from(config)))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Begin tailing `paths`. A second call while a session is running
    /// leaves that session untouched.
    pub async fn start_monitoring(&self, paths: Vec<PathBuf>) -> ControlStatus {
        if paths.is_empty() {
            return ControlStatus::error("No log paths provided");
        }

        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if session.is_running() {
                warn!("start requested while monitoring is already active");
                return ControlStatus::success_with("Monitoring already active");
            }
        }

        match TailSession::start(paths, self.pipeline.clone(), self.options.clone()) {
            Ok(session) => {
                info!("Monitoring started for {:?}", session.paths());
                *guard = Some(session);
                ControlStatus::success()
            }
            Err(err) => {
                error!("failed to start monitoring: {err:#}");
                ControlStatus::error(err.to_string())
            }
        }
    }

    /// Stop the active session, if any. Stopping an idle monitor succeeds.
    pub async fn stop_monitoring(&self) -> ControlStatus {
        let mut guard = self.session.lock().await;
        let Some(mut session) = guard.take() else {
            return ControlStatus::success();
        };

        match session.stop().await {
            Ok(()) => ControlStatus::success(),
            Err(err) => {
                error!("failed to stop monitoring cleanly: {err:#}");
                ControlStatus::error(err.to_string())
            }
        }
    }

    pub async fn state(&self) -> TailerState {
        self.session
            .lock()
            .await
            .as_ref()
            .map(TailSession::state)
            .unwrap_or_default()
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<OccurrenceSummary>> {
        self.db.recent_occurrences(limit).await
    }

    /// `Ok(None)` means no occurrence has this id.
    pub async fn get_occurrence(&self, id: i64) -> Result<Option<Occurrence>> {
        self.db.get_occurrence(id).await
    }

    pub async fn get_stats(&self) -> Result<AggregateStats> {
        self.db.occurrence_stats().await
    }

    pub async fn mark_reviewed(&self, id: i64) -> Result<bool> {
        self.db.set_occurrence_status(id, STATUS_REVIEWED).await
    }
}
