//! Append-Only Log persistence support.
//!
//! Every mutating command is recorded as one UTF-8 line:
//!
//! ```text
//! VERB ARG1 ARG2 ...
//! ```
//!
//! Fields containing a space, `\n` or `\r` are wrapped in double quotes
//! with embedded quotes backslash-escaped. Records are queued on an
//! unbounded channel and written by a single dedicated task, so producers
//! never block on disk I/O; each record is flushed (not fsynced), which
//! means a crash can lose the in-flight tail of the queue.
//!
//! The SET record carries its TTL as a relative `PX <ms>` duration, so
//! replaying a log long after it was written extends effective deadlines
//! relative to real time. This is preserved for compatibility with
//! existing log files.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, warn};

use crate::error::Result;

/// How long `close` waits for the writer task to drain its queue.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

enum LogEvent {
    Record(String),
    Shutdown,
}

/// Handle to the append-only log writer task.
pub struct AofLog {
    path: PathBuf,
    tx: UnboundedSender<LogEvent>,
    writer_task: Mutex<Option<JoinHandle<()>>>,
}

impl AofLog {
    /// Open the log for appending, creating the parent directory if needed,
    /// and spawn the writer task. Must be called inside a tokio runtime.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    LogEvent::Record(line) => {
                        let outcome = writer
                            .write_all(line.as_bytes())
                            .and_then(|_| writer.write_all(b"\n"))
                            .and_then(|_| writer.flush());
                        if let Err(e) = outcome {
                            error!(error = %e, "append-only log write failed, record lost");
                        }
                    }
                    LogEvent::Shutdown => break,
                }
            }
        });

        Ok(Self {
            path,
            tx,
            writer_task: Mutex::new(Some(task)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enqueue one record. Never blocks; a record sent after shutdown is
    /// dropped with a warning.
    pub fn append(&self, record: String) {
        if self.tx.send(LogEvent::Record(record)).is_err() {
            warn!("append-only log writer has exited, record dropped");
        }
    }

    /// Queue a shutdown marker behind all pending records and wait for the
    /// writer to drain, bounded by [`DRAIN_TIMEOUT`].
    pub async fn close(&self) {
        let _ = self.tx.send(LogEvent::Shutdown);
        let task = self.writer_task.lock().take();
        if let Some(task) = task {
            if timeout(DRAIN_TIMEOUT, task).await.is_err() {
                warn!("append-only log writer did not drain in time");
            }
        }
    }

    /// Read the log at `path` line by line and apply each record through
    /// `apply`. Blank lines are skipped; a missing file is an empty log.
    /// Returns the number of lines handed to `apply`.
    pub fn replay<F>(path: &Path, mut apply: F) -> Result<u64>
    where
        F: FnMut(&str),
    {
        if !path.exists() {
            return Ok(0);
        }

        let reader = BufReader::new(File::open(path)?);
        let mut replayed = 0u64;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            apply(&line);
            replayed += 1;
        }
        Ok(replayed)
    }
}

/// Encode one record: escape each field and join with single spaces.
pub(crate) fn encode_record(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| escape(field))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trim a field and wrap it in double quotes when it contains a space or
/// line break, escaping embedded quotes.
pub(crate) fn escape(field: &str) -> String {
    let field = field.trim();
    if field.contains(' ') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\\\""))
    } else {
        field.to_string()
    }
}

/// Reverse of [`escape`]: strip surrounding quotes and unescape embedded
/// quotes. Unquoted fields pass through trimmed.
pub(crate) fn unescape(field: &str) -> String {
    let field = field.trim();
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\\\"", "\"")
    } else {
        field.to_string()
    }
}

/// Split a record on spaces while honoring double-quoted regions. Quote
/// characters are retained in the returned fields; [`unescape`] strips
/// them.
pub(crate) fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    fields.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }

    fields
}
