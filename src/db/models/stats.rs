use serde::{Deserialize, Serialize};

use crate::catalog::Severity;

/// How many error kinds `top_errors` reports.
pub const TOP_ERROR_KINDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTypeCount {
    pub error_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: u64,
}

/// Aggregates computed on demand from the occurrence table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_logs: u64,
    pub today_count: u64,
    pub top_errors: Vec<ErrorTypeCount>,
    pub by_severity: Vec<SeverityCount>,
}

impl AggregateStats {
    pub fn severity_count(&self, severity: Severity) -> u64 {
        self.by_severity
            .iter()
            .find(|entry| entry.severity == severity)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}
