use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use netlog_core::EntityStore;
use netlog_model::RequestRecord;
use netlog_wire::{Frame, LineFramer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::writer;

/// Lines are batched under a single store lock before being applied, per
/// spec §5 ("the consumer acquires it per line batch, not per line").
const BATCH_LINES: usize = 64;

/// Component H: orchestrates the line framer and entity store when driven
/// from a FIFO, synchronizing `clear`/`emit` with the producer's recording
/// boundaries.
pub struct StreamRunner {
    store: Arc<Mutex<EntityStore>>,
    fifo_path: PathBuf,
    verbatim_path: Option<PathBuf>,
    task: Option<JoinHandle<()>>,
}

impl Default for StreamRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRunner {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(EntityStore::new())),
            fifo_path: PathBuf::new(),
            verbatim_path: None,
            task: None,
        }
    }

    /// Creates the FIFO under `dir` and returns its path for the producer
    /// (SPEC_FULL §4 item 4).
    pub fn create(&mut self, dir: &Path) -> Result<PathBuf, RunnerError> {
        let path = dir.join("netlog.pipe");
        create_fifo(&path)?;
        self.fifo_path = path.clone();
        Ok(path)
    }

    /// Opens the FIFO for read and spawns the background consumer task. If
    /// `verbatim_path` is set, every raw line is also teed there before
    /// decoding (SPEC_FULL §4 item 1).
    pub async fn start(&mut self, verbatim_path: Option<PathBuf>) -> Result<(), RunnerError> {
        let file = tokio::fs::File::open(&self.fifo_path)
            .await
            .map_err(RunnerError::Open)?;
        let lines = BufReader::new(file).lines();

        let verbatim = match &verbatim_path {
            Some(path) => Some(
                tokio::fs::File::create(path)
                    .await
                    .map_err(RunnerError::Open)?,
            ),
            None => None,
        };
        self.verbatim_path = verbatim_path;

        let store = Arc::clone(&self.store);
        self.task = Some(tokio::spawn(run_reader(store, lines, verbatim)));
        Ok(())
    }

    /// Wipes request-scoped entities, keeping constants and long-lived
    /// socket/session state (spec §4.D, §4.H).
    pub async fn clear_requests(&self) {
        self.store.lock().await.clear_requests();
    }

    pub async fn write_netlog_requests(&self, out_path: &Path) -> Result<(), RunnerError> {
        let records: Vec<RequestRecord> = self.store.lock().await.run_post_process();
        writer::write_netlog_requests(out_path, &records)
    }

    /// Joins the reader task, aborting it if it outlives `timeout`
    /// (SPEC_FULL §4 item 3), then gzips and removes the verbatim copy and
    /// unlinks the FIFO.
    pub async fn stop(&mut self, timeout: Duration) -> Result<(), RunnerError> {
        if let Some(task) = self.task.take() {
            let abort_handle = task.abort_handle();
            if tokio::time::timeout(timeout, task).await.is_err() {
                tracing::warn!(?timeout, "netlog reader task exceeded shutdown timeout; aborting");
                abort_handle.abort();
            }
        }
        if let Some(verbatim_path) = self.verbatim_path.take() {
            if verbatim_path.exists() {
                writer::compress_verbatim_copy(&verbatim_path)?;
            }
        }
        if self.fifo_path.exists() {
            std::fs::remove_file(&self.fifo_path).map_err(RunnerError::Write)?;
        }
        Ok(())
    }
}

async fn run_reader(
    store: Arc<Mutex<EntityStore>>,
    mut lines: tokio::io::Lines<BufReader<tokio::fs::File>>,
    mut verbatim: Option<tokio::fs::File>,
) {
    let mut framer = LineFramer::new();
    let mut batch: Vec<String> = Vec::with_capacity(BATCH_LINES);
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(sink) = verbatim.as_mut() {
                    if let Err(err) = tee_line(sink, &line).await {
                        tracing::warn!(%err, "failed to write verbatim netlog copy");
                    }
                }
                batch.push(line);
                if batch.len() >= BATCH_LINES {
                    apply_batch(&store, &mut framer, &mut batch).await;
                }
            }
            Ok(None) => {
                apply_batch(&store, &mut framer, &mut batch).await;
                break;
            }
            Err(err) => {
                tracing::warn!(%err, "netlog pipe read failed; stopping consumer");
                apply_batch(&store, &mut framer, &mut batch).await;
                break;
            }
        }
    }
}

async fn tee_line(sink: &mut tokio::fs::File, line: &str) -> std::io::Result<()> {
    sink.write_all(line.as_bytes()).await?;
    sink.write_all(b"\n").await
}

async fn apply_batch(store: &Arc<Mutex<EntityStore>>, framer: &mut LineFramer, batch: &mut Vec<String>) {
    if batch.is_empty() {
        return;
    }
    let mut guard = store.lock().await;
    for line in batch.drain(..) {
        match framer.feed_line(&line) {
            Some(Frame::Constants(value)) => guard.load_constants(&value),
            Some(Frame::Event(value)) => guard.handle_event(&value),
            None => {}
        }
    }
}

fn create_fifo(path: &Path) -> Result<(), RunnerError> {
    let to_err = |source: std::io::Error| RunnerError::Fifo {
        path: path.to_path_buf(),
        source,
    };
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        to_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path contains a NUL byte",
        ))
    })?;
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    if rc != 0 {
        return Err(to_err(std::io::Error::last_os_error()));
    }
    Ok(())
}
