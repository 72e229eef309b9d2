use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::pipeline::Pipeline;

use super::loop_worker::tail_loop;
use super::TailOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TailerState {
    Idle,
    Running,
    Stopping,
}

impl Default for TailerState {
    fn default() -> Self {
        TailerState::Idle
    }
}

/// One monitoring session: a polling task over a fixed set of files with
/// its own offsets, cancellation token and lifecycle state.
pub struct TailSession {
    paths: Vec<PathBuf>,
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
    state_tx: watch::Sender<TailerState>,
}

impl TailSession {
    /// Spawn the polling task. Must be called inside a tokio runtime.
    pub fn start(paths: Vec<PathBuf>, pipeline: Pipeline, options: TailOptions) -> Result<Self> {
        let mut unique = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        if unique.is_empty() {
            bail!("no log paths provided");
        }

        let cancel_token = CancellationToken::new();
        let (state_tx, _) = watch::channel(TailerState::Running);

        info!("Starting tail session for {} file(s)", unique.len());
        let handle = tokio::spawn(tail_loop(
            unique.clone(),
            pipeline,
            options,
            cancel_token.clone(),
        ));

        Ok(Self {
            paths: unique,
            handle: Some(handle),
            cancel_token,
            state_tx,
        })
    }

    pub fn state(&self) -> TailerState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TailerState> {
        self.state_tx.subscribe()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_running(&self) -> bool {
        self.state() == TailerState::Running
    }

    /// Cancel the loop and wait for it to exit. Safe to call repeatedly.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        self.state_tx.send_replace(TailerState::Stopping);
        self.cancel_token.cancel();

        let joined = handle.await.context("tail loop task failed to join");
        self.state_tx.send_replace(TailerState::Idle);
        info!("Tail session stopped");
        joined
    }
}

impl Drop for TailSession {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
