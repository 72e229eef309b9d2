pub mod loop_worker;
pub mod offsets;
pub mod session;

use std::time::Duration;

pub use loop_worker::{poll_cycle, CycleReport};
pub use offsets::{read_appended, FileOffsets, TailChunk};
pub use session::{TailSession, TailerState};

use crate::config::MonitorConfig;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TailOptions {
    pub poll_interval: Duration,
    pub start_from_end: bool,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            start_from_end: false,
        }
    }
}

impl From<&MonitorConfig> for TailOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            start_from_end: config.start_from_end,
        }
    }
}
