//! Turns a detection into the texts shown to a human: analysis, severity,
//! remedy and code fix.

pub mod lookup;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::catalog::{PatternCatalog, Severity};

pub use lookup::{NoLookup, SolutionLookup, WebSearchLookup};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

const GENERIC_SOLUTION: &str = "Review the error message and stack trace for specific details.";

/// Only this many characters of the message go into a lookup query.
const QUERY_MESSAGE_CHARS: usize = 50;

/// An empty set means every kind is enabled.
pub fn should_process(kind: &str, enabled_kinds: &HashSet<String>) -> bool {
    enabled_kinds.is_empty() || enabled_kinds.contains(kind)
}

#[derive(Clone)]
pub struct Enricher {
    catalog: Arc<PatternCatalog>,
    lookup: Arc<dyn SolutionLookup>,
    lookup_timeout: Duration,
}

impl Enricher {
    pub fn new(catalog: Arc<PatternCatalog>, lookup: Arc<dyn SolutionLookup>) -> Self {
        Self {
            catalog,
            lookup,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Enricher that only ever uses the static remedies.
    pub fn offline(catalog: Arc<PatternCatalog>) -> Self {
        Self::new(catalog, Arc::new(NoLookup))
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn analyze(&self, kind: &str, message: &str) -> String {
        match self
            .catalog
            .get(kind)
            .and_then(|rule| rule.analysis_template())
        {
            Some(template) => template.replace("{message}", message),
            None => format!("Error detected: {kind} - {message}"),
        }
    }

    /// Kinds outside the catalog are `low`.
    pub fn severity(&self, kind: &str) -> Severity {
        self.catalog
            .get(kind)
            .map(|rule| rule.severity())
            .unwrap_or_default()
    }

    /// Canned fix snippet, or an empty string when the kind has none.
    pub fn code_fix(&self, kind: &str, _message: &str) -> String {
        self.catalog
            .get(kind)
            .and_then(|rule| rule.code_fix())
            .unwrap_or_default()
            .to_string()
    }

    pub fn default_solution(&self, kind: &str) -> String {
        self.catalog
            .get(kind)
            .and_then(|rule| rule.default_solution())
            .unwrap_or(GENERIC_SOLUTION)
            .to_string()
    }

    /// Ask the lookup for a remedy, bounded by the lookup timeout. Anything
    /// other than a non-blank answer yields the static remedy, and so does
    /// cancellation: once `cancel_token` fires no lookup is waited on.
    pub async fn solution(
        &self,
        kind: &str,
        message: &str,
        cancel_token: &CancellationToken,
    ) -> String {
        if cancel_token.is_cancelled() {
            return self.default_solution(kind);
        }

        let short_message: String = message.chars().take(QUERY_MESSAGE_CHARS).collect();
        let query = format!("{kind} {short_message}");

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_debug!("solution lookup for {} abandoned on shutdown", kind);
                self.default_solution(kind)
            }
            result = tokio::time::timeout(self.lookup_timeout, self.lookup.lookup(&query)) => {
                match result {
                    Ok(Some(text)) if !text.trim().is_empty() => text,
                    Ok(_) => self.default_solution(kind),
                    Err(_) => {
                        log_debug!(
                            "solution lookup timed out after {:?} for {}",
                            self.lookup_timeout,
                            kind
                        );
                        self.default_solution(kind)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedLookup(&'static str);

    #[async_trait]
    impl SolutionLookup for FixedLookup {
        async fn lookup(&self, _query: &str) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    struct StalledLookup;

    #[async_trait]
    impl SolutionLookup for StalledLookup {
        async fn lookup(&self, _query: &str) -> Option<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Some("too late".into())
        }
    }

    fn catalog() -> Arc<PatternCatalog> {
        Arc::new(PatternCatalog::builtin().unwrap())
    }

    #[test]
    fn empty_enabled_set_allows_everything() {
        let empty = HashSet::new();
        assert!(should_process("TypeError", &empty));

        let only_type: HashSet<String> = ["TypeError".to_string()].into_iter().collect();
        assert!(should_process("TypeError", &only_type));
        assert!(!should_process("KeyError", &only_type));
    }

    #[test]
    fn severity_table() {
        let enricher = Enricher::offline(catalog());
        let expected = [
            ("500Error", Severity::Critical),
            ("DatabaseError", Severity::Critical),
            ("MemoryError", Severity::Critical),
            ("RecursionError", Severity::Critical),
            ("TypeError", Severity::High),
            ("AttributeError", Severity::High),
            ("ImportError", Severity::High),
            ("ConnectionError", Severity::High),
            ("ValueError", Severity::Medium),
            ("KeyError", Severity::Medium),
            ("IndexError", Severity::Medium),
            ("404Error", Severity::Medium),
            ("SyntaxError", Severity::Low),
            ("NameError", Severity::Low),
            ("TimeoutError", Severity::Low),
            ("403Error", Severity::Low),
            ("NotInCatalog", Severity::Low),
        ];
        for (kind, severity) in expected {
            assert_eq!(enricher.severity(kind), severity, "{kind}");
        }
    }

    #[test]
    fn every_catalog_kind_has_a_severity() {
        let catalog = catalog();
        let enricher = Enricher::offline(Arc::clone(&catalog));
        for kind in catalog.kinds() {
            assert!(Severity::ALL.contains(&enricher.severity(kind)));
        }
    }

    #[test]
    fn analysis_interpolates_message_or_falls_back() {
        let enricher = Enricher::offline(catalog());

        let analysis = enricher.analyze("KeyError", "'id'");
        assert!(analysis.starts_with("Dictionary key error: 'id'."));

        assert_eq!(
            enricher.analyze("TimeoutError", "timeout"),
            "Error detected: TimeoutError - timeout"
        );
        assert_eq!(
            enricher.analyze("404Error", "404"),
            "HTTP 404 Not Found error. The requested resource could not be found on the server."
        );
    }

    #[test]
    fn code_fix_may_be_empty() {
        let enricher = Enricher::offline(catalog());
        assert!(enricher.code_fix("KeyError", "'id'").contains("my_dict.get"));
        assert_eq!(enricher.code_fix("ImportError", "no module"), "");
        assert_eq!(enricher.code_fix("Unknown", "x"), "");
    }

    #[tokio::test]
    async fn solution_falls_back_when_lookup_finds_nothing() {
        let enricher = Enricher::offline(catalog());
        assert_eq!(
            enricher.solution("KeyError", "'id'", &CancellationToken::new()).await,
            "Use .get() method or check if key exists before accessing dictionary."
        );
        assert_eq!(
            enricher.solution("Mystery", "?", &CancellationToken::new()).await,
            GENERIC_SOLUTION
        );
    }

    #[tokio::test]
    async fn solution_prefers_lookup_answer() {
        let enricher = Enricher::new(catalog(), Arc::new(FixedLookup("use a default value")));
        assert_eq!(
            enricher.solution("KeyError", "'id'", &CancellationToken::new()).await,
            "use a default value"
        );

        let blank = Enricher::new(catalog(), Arc::new(FixedLookup("   ")));
        assert_eq!(
            blank.solution("TypeError", "x", &CancellationToken::new()).await,
            blank.default_solution("TypeError")
        );
    }

    #[tokio::test]
    async fn solution_times_out_to_default() {
        let enricher = Enricher::new(catalog(), Arc::new(StalledLookup))
            .with_lookup_timeout(Duration::from_millis(20));
        assert_eq!(
            enricher.solution("ValueError", "bad", &CancellationToken::new()).await,
            enricher.default_solution("ValueError")
        );
    }

    #[tokio::test]
    async fn cancellation_cuts_a_pending_lookup_short() {
        let enricher = Enricher::new(catalog(), Arc::new(StalledLookup))
            .with_lookup_timeout(Duration::from_secs(3600));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        assert_eq!(
            enricher.solution("TypeError", "x", &token).await,
            enricher.default_solution("TypeError")
        );
        assert!(started.elapsed() < Duration::from_secs(1));

        // already cancelled: the lookup is never started
        let answered = Enricher::new(catalog(), Arc::new(FixedLookup("from the web")));
        assert_eq!(
            answered.solution("KeyError", "'id'", &token).await,
            answered.default_solution("KeyError")
        );
    }
}
