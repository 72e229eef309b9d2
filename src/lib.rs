//! Log monitoring core: tails log files, classifies new lines against an
//! ordered catalog of error signatures, enriches each match and stores it
//! in SQLite for a dashboard to query.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod db;
pub mod enricher;
pub mod monitor;
pub mod notifier;
pub mod pipeline;
pub mod tailer;
mod utils;

pub use catalog::{ErrorRule, PatternCatalog, Severity};
pub use classifier::{Classifier, Detection};
pub use config::{ConfigStore, MonitorConfig};
pub use db::{AggregateStats, Database, NewOccurrence, Occurrence, OccurrenceSummary};
pub use enricher::{Enricher, NoLookup, SolutionLookup, WebSearchLookup};
pub use monitor::{ControlStatus, Monitor};
pub use notifier::{LogNotifier, NoopNotifier, Notifier};
pub use pipeline::Pipeline;
pub use tailer::{TailOptions, TailSession, TailerState};
