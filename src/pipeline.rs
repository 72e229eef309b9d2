use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::{
    classifier::Classifier,
    config::MonitorConfig,
    db::{Database, NewOccurrence},
    enricher::{should_process, Enricher},
    notifier::{NoopNotifier, Notifier},
};

/// Classify → enrich → store → notify, for one line at a time.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Classifier,
    enricher: Enricher,
    db: Database,
    notifier: Arc<dyn Notifier>,
    enabled_kinds: Arc<HashSet<String>>,
    notifications_enabled: bool,
}

impl Pipeline {
    /// Pipeline with every kind enabled and notifications off.
    pub fn new(classifier: Classifier, enricher: Enricher, db: Database) -> Self {
        Self {
            classifier,
            enricher,
            db,
            notifier: Arc::new(NoopNotifier),
            enabled_kinds: Arc::new(HashSet::new()),
            notifications_enabled: false,
        }
    }

    pub fn with_enabled_kinds(mut self, enabled_kinds: HashSet<String>) -> Self {
        self.enabled_kinds = Arc::new(enabled_kinds);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, enabled: bool) -> Self {
        self.notifier = notifier;
        self.notifications_enabled = enabled;
        self
    }

    /// Apply the gating parts of `config`: enabled kinds and the
    /// notification switch.
    pub fn configured(self, config: &MonitorConfig, notifier: Arc<dyn Notifier>) -> Self {
        self.with_enabled_kinds(config.enabled_kinds())
            .with_notifier(notifier, config.email_notifications)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Build the occurrence for `line`, or `None` when nothing matches or
    /// the kind is switched off. After `cancel_token` fires the static
    /// remedy is used instead of a lookup.
    pub async fn build_occurrence(
        &self,
        line: &str,
        log_file: &str,
        cancel_token: &CancellationToken,
    ) -> Option<NewOccurrence> {
        let detection = self.classifier.detect(line)?;

        if !should_process(&detection.kind, &self.enabled_kinds) {
            return None;
        }

        let analysis = self.enricher.analyze(&detection.kind, &detection.message);
        let solution = self
            .enricher
            .solution(&detection.kind, &detection.message, cancel_token)
            .await;
        let code_fix = self.enricher.code_fix(&detection.kind, &detection.message);
        let severity = self.enricher.severity(&detection.kind);

        Some(NewOccurrence {
            log_file: log_file.to_string(),
            error_type: detection.kind,
            error_message: detection.message,
            full_log: line.to_string(),
            analysis,
            solution,
            code_fix,
            severity,
        })
    }

    /// Run one line through the whole pipeline. Returns the stored id, or
    /// `None` when the line produced no occurrence.
    pub async fn process_line(
        &self,
        line: &str,
        log_file: &str,
        cancel_token: &CancellationToken,
    ) -> Result<Option<i64>> {
        let Some(occurrence) = self.build_occurrence(line, log_file, cancel_token).await else {
            return Ok(None);
        };

        let id = self
            .db
            .append_occurrence(&occurrence)
            .await
            .with_context(|| format!("failed to persist {} from {}", occurrence.error_type, log_file))?;

        if self.notifications_enabled {
            self.notifier.notify(id, &occurrence);
        }

        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PatternCatalog, Severity};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(i64, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, occurrence_id: i64, occurrence: &NewOccurrence) {
            self.seen
                .lock()
                .unwrap()
                .push((occurrence_id, occurrence.error_type.clone()));
        }
    }

    fn never() -> CancellationToken {
        CancellationToken::new()
    }

    fn pipeline(db: Database) -> Pipeline {
        let catalog = Arc::new(PatternCatalog::builtin().unwrap());
        Pipeline::new(
            Classifier::new(Arc::clone(&catalog)),
            Enricher::offline(catalog),
            db,
        )
    }

    #[tokio::test]
    async fn stores_type_error_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        let pipeline = pipeline(db.clone());

        let line = "2024-01-01 ERROR TypeError: unsupported operand";
        let id = pipeline
            .process_line(line, "/var/log/app.log", &never())
            .await
            .unwrap()
            .expect("occurrence stored");

        let stored = db.get_occurrence(id).await.unwrap().unwrap();
        assert_eq!(stored.error_type, "TypeError");
        assert_eq!(stored.error_message, "unsupported operand");
        assert_eq!(stored.severity, Severity::High);
        assert_eq!(stored.full_log, line);
        assert_eq!(stored.log_file, "/var/log/app.log");
        assert!(!stored.analysis.is_empty());
        assert_eq!(stored.status, "new");

        assert_eq!(db.occurrence_stats().await.unwrap().total_logs, 1);
    }

    #[tokio::test]
    async fn unmatched_and_disabled_lines_store_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        let pipeline = pipeline(db.clone())
            .with_enabled_kinds(["KeyError".to_string()].into_iter().collect());

        assert_eq!(
            pipeline.process_line("all systems nominal", "a.log", &never()).await.unwrap(),
            None
        );
        assert_eq!(
            pipeline
                .process_line("TypeError: unsupported operand", "a.log", &never())
                .await
                .unwrap(),
            None
        );
        assert!(pipeline
            .process_line("KeyError: 'id'", "a.log", &never())
            .await
            .unwrap()
            .is_some());

        assert_eq!(db.occurrence_stats().await.unwrap().total_logs, 1);
    }

    #[tokio::test]
    async fn notifier_fires_once_per_stored_occurrence_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        let recorder = Arc::new(RecordingNotifier::default());

        let enabled = pipeline(db.clone()).with_notifier(recorder.clone(), true);
        let id = enabled
            .process_line("ValueError: bad", "a.log", &never())
            .await
            .unwrap()
            .unwrap();
        enabled.process_line("nothing here", "a.log", &never()).await.unwrap();

        let disabled = pipeline(db).with_notifier(recorder.clone(), false);
        disabled.process_line("ValueError: again", "a.log", &never()).await.unwrap();

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(id, "ValueError".to_string())]);
    }
}
