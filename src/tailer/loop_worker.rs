use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::pipeline::Pipeline;

use super::offsets::{read_appended, FileOffsets, TailChunk};
use super::TailOptions;

// Set to false to silence per-cycle diagnostics from this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub files_read: usize,
    pub lines_seen: usize,
    pub occurrences_stored: usize,
}

pub async fn tail_loop(
    paths: Vec<PathBuf>,
    pipeline: Pipeline,
    options: TailOptions,
    cancel_token: CancellationToken,
) {
    let mut offsets = FileOffsets::new();
    if options.start_from_end {
        offsets.skip_existing(&paths);
    }

    let mut ticker = tokio::time::interval(options.poll_interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!(
        "tail loop started for {} file(s), polling every {:?}",
        paths.len(),
        options.poll_interval
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("tail loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let report = poll_cycle(&paths, &pipeline, &mut offsets, &cancel_token).await;
                if report.occurrences_stored > 0 {
                    log_info!(
                        "poll cycle stored {} occurrence(s) from {} line(s)",
                        report.occurrences_stored,
                        report.lines_seen
                    );
                }
            }
        }
    }
}

/// Read every watched file once and run new lines through the pipeline.
/// Stops before opening another file once cancellation is requested; the
/// lines of a file already read are still stored, with static remedies in
/// place of lookups, so one batch never holds up shutdown.
pub async fn poll_cycle(
    paths: &[PathBuf],
    pipeline: &Pipeline,
    offsets: &mut FileOffsets,
    cancel_token: &CancellationToken,
) -> CycleReport {
    let mut report = CycleReport::default();

    for path in paths {
        if cancel_token.is_cancelled() {
            break;
        }

        let chunk = match read_chunk(path, offsets.get(path)).await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                log_debug!("{} does not exist yet, skipping", path.display());
                continue;
            }
            Err(err) => {
                log_warn!("failed to read {}: {err:#}", path.display());
                continue;
            }
        };

        offsets.advance(path, chunk.consumed);
        report.files_read += 1;

        let log_file = path.to_string_lossy();
        for line in &chunk.lines {
            report.lines_seen += 1;
            match pipeline.process_line(line, &log_file, cancel_token).await {
                Ok(Some(_)) => report.occurrences_stored += 1,
                Ok(None) => {}
                Err(err) => log_error!("dropping occurrence from {}: {err:#}", log_file),
            }
        }
    }

    report
}

async fn read_chunk(path: &Path, offset: u64) -> Result<Option<TailChunk>> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_appended(&owned, offset))
        .await
        .context("file read worker join failed")?
        .with_context(|| format!("reading from offset {offset}"))
}
