use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_severity, to_i64, to_u64},
    models::{
        occurrence::shorten_analysis, stats::TOP_ERROR_KINDS, AggregateStats, ErrorTypeCount,
        NewOccurrence, Occurrence, OccurrenceSummary, SeverityCount,
    },
};

fn row_to_occurrence(row: &Row) -> Result<Occurrence> {
    let timestamp: String = row.get("timestamp")?;
    let severity: String = row.get("severity")?;

    Ok(Occurrence {
        id: row.get("id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        log_file: row.get("log_file")?,
        error_type: row.get("error_type")?,
        error_message: row.get("error_message")?,
        full_log: row.get("full_log")?,
        analysis: row.get("analysis")?,
        solution: row.get("solution")?,
        code_fix: row.get("code_fix")?,
        severity: parse_severity(&severity)?,
        status: row.get("status")?,
    })
}

fn row_to_summary(row: &Row) -> Result<OccurrenceSummary> {
    let timestamp: String = row.get("timestamp")?;
    let severity: String = row.get("severity")?;
    let analysis: String = row.get("analysis")?;

    Ok(OccurrenceSummary {
        id: row.get("id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        log_file: row.get("log_file")?,
        error_type: row.get("error_type")?,
        error_message: row.get("error_message")?,
        short_analysis: shorten_analysis(&analysis),
        severity: parse_severity(&severity)?,
        status: row.get("status")?,
    })
}

impl Database {
    /// Persist a detected occurrence and return its id. The timestamp is
    /// taken on the writer thread so ids and timestamps advance together.
    pub async fn append_occurrence(&self, occurrence: &NewOccurrence) -> Result<i64> {
        let record = occurrence.clone();
        self.execute(move |conn| {
            let timestamp = format_datetime(&Utc::now());
            conn.execute(
                "INSERT INTO logs (timestamp, log_file, error_type, error_message, full_log,
                                   analysis, solution, code_fix, severity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    timestamp,
                    record.log_file,
                    record.error_type,
                    record.error_message,
                    record.full_log,
                    record.analysis,
                    record.solution,
                    record.code_fix,
                    record.severity.as_str(),
                ],
            )
            .context("failed to insert occurrence")?;

            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Newest occurrences first, at most `limit` of them.
    pub async fn recent_occurrences(&self, limit: usize) -> Result<Vec<OccurrenceSummary>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = to_i64(limit as u64)?;

        self.read(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, log_file, error_type, error_message, analysis, severity, status
                 FROM logs
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut summaries = Vec::new();
            while let Some(row) = rows.next()? {
                summaries.push(row_to_summary(row)?);
            }

            Ok(summaries)
        })
        .await
    }

    pub async fn get_occurrence(&self, id: i64) -> Result<Option<Occurrence>> {
        self.read(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, log_file, error_type, error_message, full_log,
                        analysis, solution, code_fix, severity, status
                 FROM logs
                 WHERE id = ?1",
            )?;

            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_occurrence(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Change the workflow status of an occurrence. Returns false when the
    /// id does not exist.
    pub async fn set_occurrence_status(&self, id: i64, status: &str) -> Result<bool> {
        let status = status.to_string();
        self.execute(move |conn| {
            let rows_affected = conn
                .execute(
                    "UPDATE logs SET status = ?1 WHERE id = ?2",
                    params![status, id],
                )
                .context("failed to update occurrence status")?;
            Ok(rows_affected > 0)
        })
        .await
    }

    /// Totals, today's count, top kinds and per-severity counts, all read
    /// from the same snapshot.
    pub async fn occurrence_stats(&self) -> Result<AggregateStats> {
        let today = Utc::now().format("%Y-%m-%d").to_string();

        self.read(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open stats read transaction")?;

            let total: i64 = tx.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;

            let today_count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM logs WHERE substr(timestamp, 1, 10) = ?1",
                params![today],
                |row| row.get(0),
            )?;

            let mut top_errors = Vec::new();
            {
                let mut stmt = tx.prepare(
                    "SELECT error_type, COUNT(*) AS count
                     FROM logs
                     GROUP BY error_type
                     ORDER BY count DESC, error_type ASC
                     LIMIT ?1",
                )?;
                let mut rows = stmt.query(params![TOP_ERROR_KINDS as i64])?;
                while let Some(row) = rows.next()? {
                    let count: i64 = row.get(1)?;
                    top_errors.push(ErrorTypeCount {
                        error_type: row.get(0)?,
                        count: to_u64(count, "count")?,
                    });
                }
            }

            let mut by_severity = Vec::new();
            {
                let mut stmt = tx.prepare(
                    "SELECT severity, COUNT(*) AS count
                     FROM logs
                     GROUP BY severity
                     ORDER BY severity ASC",
                )?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    let severity: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    by_severity.push(SeverityCount {
                        severity: parse_severity(&severity)?,
                        count: to_u64(count, "count")?,
                    });
                }
            }

            tx.finish().context("failed to close stats read transaction")?;

            Ok(AggregateStats {
                total_logs: to_u64(total, "total")?,
                today_count: to_u64(today_count, "today_count")?,
                top_errors,
                by_severity,
            })
        })
        .await
    }
}
