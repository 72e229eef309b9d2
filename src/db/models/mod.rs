pub mod occurrence;
pub mod stats;

pub use occurrence::{NewOccurrence, Occurrence, OccurrenceSummary, STATUS_NEW, STATUS_REVIEWED};
pub use stats::{AggregateStats, ErrorTypeCount, SeverityCount};
