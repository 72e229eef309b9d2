use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use tokio::sync::oneshot;

use super::migrations::run_migrations;

/// How long a reader waits on a lock held by the writer before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum WriterMsg {
    Run(Job),
    Close,
}

/// The writer thread and the queue feeding it. Dropping the last handle
/// drains queued jobs, then joins the thread.
struct Writer {
    queue: mpsc::Sender<WriterMsg>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Writer {
    fn spawn(path: PathBuf) -> Result<Self> {
        let (queue, jobs) = mpsc::channel::<WriterMsg>();
        let (opened_tx, opened_rx) = mpsc::channel::<Result<()>>();

        let thread = thread::Builder::new()
            .name("logwarden-db".into())
            .spawn(move || {
                let mut conn = match open_for_writing(&path) {
                    Ok(conn) => {
                        let _ = opened_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = opened_tx.send(Err(err));
                        return;
                    }
                };

                for msg in jobs {
                    match msg {
                        WriterMsg::Run(job) => job(&mut conn),
                        WriterMsg::Close => break,
                    }
                }
                info!("occurrence writer for {} closed", path.display());
            })
            .context("failed to spawn database writer thread")?;

        opened_rx
            .recv()
            .context("database writer exited while opening the store")??;

        Ok(Self {
            queue,
            thread: Mutex::new(Some(thread)),
        })
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        // Close is queued behind pending jobs, so they still run.
        if self.queue.send(WriterMsg::Close).is_err() {
            error!("occurrence writer stopped before close was requested");
        }
        if handle.join().is_err() {
            error!("occurrence writer thread panicked");
        }
    }
}

fn open_for_writing(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    // WAL lets the read-only connections run alongside the writer.
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("WAL unavailable for {}: {err}", path.display());
    }
    conn.busy_timeout(BUSY_TIMEOUT)?;
    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

/// Handle to the occurrence store.
///
/// All writes funnel through one dedicated thread that owns the only
/// read-write connection, so appends are serialized no matter how many
/// callers hold a clone. Reads open their own read-only connection on the
/// blocking pool and never wait on each other.
#[derive(Clone)]
pub struct Database {
    writer: Arc<Writer>,
    db_path: Arc<PathBuf>,
}

impl Database {
    /// Open (or create) the store at `db_path` and bring its schema up to
    /// date before returning.
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(dir) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let writer = Writer::spawn(db_path.clone())?;
        info!("occurrence store ready at {}", db_path.display());

        Ok(Self {
            writer: Arc::new(writer),
            db_path: Arc::new(db_path),
        })
    }

    /// Run `task` on the writer thread. Tasks run one at a time in
    /// submission order.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // The caller may have given up waiting; the write still stands.
            let _ = reply_tx.send(task(conn));
        });

        self.writer
            .queue
            .send(WriterMsg::Run(job))
            .map_err(|_| anyhow!("occurrence writer is no longer running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("occurrence writer dropped the job"))?
    }

    /// Run `task` against a fresh read-only connection on the blocking pool.
    pub async fn read<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = Arc::clone(&self.db_path);
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open_with_flags(
                path.as_path(),
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_context(|| format!("failed to open read connection to {}", path.display()))?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            task(&mut conn)
        })
        .await
        .context("database read worker join failed")?
    }
}
