//! Occurrence data models.
//!
//! An occurrence is one classified and enriched error line. The pipeline
//! builds a [`NewOccurrence`]; the store assigns `id`, `timestamp` and the
//! initial `status` when it persists it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Severity;

pub const STATUS_NEW: &str = "new";
pub const STATUS_REVIEWED: &str = "reviewed";

/// Number of characters of `analysis` kept in a summary.
pub const SHORT_ANALYSIS_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOccurrence {
    pub log_file: String,
    pub error_type: String,
    pub error_message: String,
    pub full_log: String,
    pub analysis: String,
    pub solution: String,
    pub code_fix: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub log_file: String,
    pub error_type: String,
    pub error_message: String,
    pub full_log: String,
    pub analysis: String,
    pub solution: String,
    pub code_fix: String,
    pub severity: Severity,
    pub status: String,
}

/// Row shape for dashboard listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceSummary {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub log_file: String,
    pub error_type: String,
    pub error_message: String,
    pub short_analysis: String,
    pub severity: Severity,
    pub status: String,
}

pub fn shorten_analysis(analysis: &str) -> String {
    analysis.chars().take(SHORT_ANALYSIS_CHARS).collect()
}
