//! Alert hook fired after an occurrence is stored.
//!
//! Delivery (mail formatting, SMTP) lives outside this crate. A notifier
//! must not fail the pipeline: implementations handle and log their own
//! errors.

use log::warn;

use crate::db::NewOccurrence;

pub trait Notifier: Send + Sync {
    fn notify(&self, occurrence_id: i64, occurrence: &NewOccurrence);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _occurrence_id: i64, _occurrence: &NewOccurrence) {}
}

/// Writes one alert line per occurrence to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    recipient: Option<String>,
}

impl LogNotifier {
    pub fn new(recipient: impl Into<String>) -> Self {
        let recipient = recipient.into();
        Self {
            recipient: (!recipient.is_empty()).then_some(recipient),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, occurrence_id: i64, occurrence: &NewOccurrence) {
        let Some(recipient) = &self.recipient else {
            return;
        };

        warn!(
            "alert for {}: [{}] {} detected in {} (occurrence #{}): {}",
            recipient,
            occurrence.severity,
            occurrence.error_type,
            occurrence.log_file,
            occurrence_id,
            occurrence.error_message
        );
    }
}
