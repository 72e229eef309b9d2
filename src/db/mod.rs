mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use models::{
    AggregateStats, ErrorTypeCount, NewOccurrence, Occurrence, OccurrenceSummary, SeverityCount,
    STATUS_NEW, STATUS_REVIEWED,
};
