use std::collections::HashSet;

use logwarden::{Database, NewOccurrence, Severity};
use serde::{Deserialize, Serialize};

fn occurrence(kind: &str, severity: Severity) -> NewOccurrence {
    NewOccurrence {
        log_file: "/var/log/app.log".into(),
        error_type: kind.into(),
        error_message: "something broke".into(),
        full_log: format!("ERROR {kind}: something broke"),
        analysis: format!("analysis of {kind}"),
        solution: "fix it".into(),
        code_fix: String::new(),
        severity,
    }
}

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::new(dir.path().join("logwarden.sqlite3")).unwrap()
}

#[tokio::test]
async fn append_then_get_returns_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let mut record = occurrence("KeyError", Severity::Medium);
    record.code_fix = "value = my_dict.get(\"key\", default_value)".into();
    let id = db.append_occurrence(&record).await.unwrap();

    let stored = db.get_occurrence(id).await.unwrap().unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.log_file, record.log_file);
    assert_eq!(stored.error_type, record.error_type);
    assert_eq!(stored.error_message, record.error_message);
    assert_eq!(stored.full_log, record.full_log);
    assert_eq!(stored.analysis, record.analysis);
    assert_eq!(stored.solution, record.solution);
    assert_eq!(stored.code_fix, record.code_fix);
    assert_eq!(stored.severity, record.severity);
    assert_eq!(stored.status, "new");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    assert!(db.get_occurrence(42).await.unwrap().is_none());
}

#[tokio::test]
async fn ids_increase_with_each_append() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let first = db.append_occurrence(&occurrence("TypeError", Severity::High)).await.unwrap();
    let second = db.append_occurrence(&occurrence("TypeError", Severity::High)).await.unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn recent_is_newest_first_and_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let mut ids = Vec::new();
    for kind in ["TypeError", "KeyError", "ValueError"] {
        ids.push(db.append_occurrence(&occurrence(kind, Severity::Low)).await.unwrap());
    }

    let recent = db.recent_occurrences(2).await.unwrap();
    assert_eq!(
        recent.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1]]
    );
    assert_eq!(recent[0].error_type, "ValueError");
    assert!(recent[0].timestamp >= recent[1].timestamp);

    assert_eq!(db.recent_occurrences(10).await.unwrap().len(), 3);
    assert!(db.recent_occurrences(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_truncates_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let mut record = occurrence("SyntaxError", Severity::Low);
    record.analysis = "x".repeat(300);
    let id = db.append_occurrence(&record).await.unwrap();

    let recent = db.recent_occurrences(1).await.unwrap();
    assert_eq!(recent[0].short_analysis.len(), 200);

    let full = db.get_occurrence(id).await.unwrap().unwrap();
    assert_eq!(full.analysis.len(), 300);
}

#[tokio::test]
async fn stats_aggregate_counts() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let empty = db.occurrence_stats().await.unwrap();
    assert_eq!(empty.total_logs, 0);
    assert!(empty.top_errors.is_empty());

    let mix = [
        ("TypeError", Severity::High),
        ("TypeError", Severity::High),
        ("TypeError", Severity::High),
        ("KeyError", Severity::Medium),
        ("KeyError", Severity::Medium),
        ("500Error", Severity::Critical),
        ("404Error", Severity::Medium),
        ("NameError", Severity::Low),
        ("SyntaxError", Severity::Low),
        ("TimeoutError", Severity::Low),
    ];
    for (kind, severity) in mix {
        db.append_occurrence(&occurrence(kind, severity)).await.unwrap();
    }

    let stats = db.occurrence_stats().await.unwrap();
    assert_eq!(stats.total_logs, 10);
    assert_eq!(stats.today_count, 10);

    assert_eq!(stats.top_errors.len(), 5);
    assert_eq!(stats.top_errors[0].error_type, "TypeError");
    assert_eq!(stats.top_errors[0].count, 3);
    assert_eq!(stats.top_errors[1].error_type, "KeyError");
    assert_eq!(stats.top_errors[1].count, 2);
    // single-count kinds tie and are ordered by name
    assert_eq!(stats.top_errors[2].error_type, "404Error");

    assert_eq!(stats.severity_count(Severity::Critical), 1);
    assert_eq!(stats.severity_count(Severity::High), 3);
    assert_eq!(stats.severity_count(Severity::Medium), 3);
    assert_eq!(stats.severity_count(Severity::Low), 3);
}

#[tokio::test]
async fn concurrent_appends_are_all_counted() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let mut handles = Vec::new();
    for _ in 0..25 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.append_occurrence(&occurrence("ConnectionError", Severity::High))
                .await
                .unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 25);
    assert_eq!(db.occurrence_stats().await.unwrap().total_logs, 25);
}

#[tokio::test]
async fn status_update_touches_only_status() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let id = db.append_occurrence(&occurrence("IndexError", Severity::Medium)).await.unwrap();
    let before = db.get_occurrence(id).await.unwrap().unwrap();

    assert!(db.set_occurrence_status(id, "reviewed").await.unwrap());
    assert!(!db.set_occurrence_status(id + 100, "reviewed").await.unwrap());

    let after = db.get_occurrence(id).await.unwrap().unwrap();
    assert_eq!(after.status, "reviewed");
    assert_eq!(after.timestamp, before.timestamp);
    assert_eq!(after.analysis, before.analysis);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct DashboardPrefs {
    page_size: u32,
    hidden_kinds: Vec<String>,
}

#[tokio::test]
async fn settings_round_trip_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    assert_eq!(db.get_setting::<DashboardPrefs>("dashboard").await.unwrap(), None);

    let prefs = DashboardPrefs {
        page_size: 25,
        hidden_kinds: vec!["TimeoutError".into()],
    };
    db.put_setting("dashboard", &prefs).await.unwrap();
    assert_eq!(
        db.get_setting::<DashboardPrefs>("dashboard").await.unwrap(),
        Some(prefs)
    );

    db.put_setting("language", &"de").await.unwrap();
    db.put_setting("language", &"fr").await.unwrap();
    assert_eq!(
        db.get_setting::<String>("language").await.unwrap().as_deref(),
        Some("fr")
    );
}

#[tokio::test]
async fn reopening_keeps_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let db = open_db(&dir);
        db.append_occurrence(&occurrence("MemoryError", Severity::Critical))
            .await
            .unwrap()
    };

    let db = open_db(&dir);
    let stored = db.get_occurrence(id).await.unwrap().unwrap();
    assert_eq!(stored.error_type, "MemoryError");
}
