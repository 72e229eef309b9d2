use std::sync::Arc;

use serde::Serialize;

use crate::catalog::PatternCatalog;

/// Error kind and message pulled out of a single log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    catalog: Arc<PatternCatalog>,
}

impl Classifier {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// First rule in catalog order that matches `line`, if any.
    pub fn detect(&self, line: &str) -> Option<Detection> {
        self.catalog.rules().iter().find_map(|rule| {
            rule.extract(line).map(|message| Detection {
                kind: rule.kind().to_string(),
                message,
            })
        })
    }
}
