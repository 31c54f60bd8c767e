//! Background durable-tier worker.
//!
//! One bounded queue feeding one worker thread per store. Persist jobs
//! carry entry ids, not row snapshots: the worker resolves the id against
//! the authoritative fast tier at apply time, so a job dequeued after a
//! newer mutation writes the newer state no matter how the enqueues
//! interleaved, and a job for an entry that has since been deleted is
//! skipped instead of resurrecting the row. Capture-path submissions drop
//! the job (with a warning) when the queue is full; the next job for the
//! same entry reconciles. Command submissions block until enqueued. A
//! failed write is logged and never retried.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::database::Database;
use crate::interface::Entry;

/// Queue depth before capture-path jobs start getting dropped.
const QUEUE_CAPACITY: usize = 256;

/// Where the worker reads an entry's current state when it applies a
/// persist job.
pub(crate) trait SnapshotSource: Send + Sync {
    fn entry_snapshot(&self, id: i64) -> Option<Entry>;
}

pub(crate) enum WriteJob {
    /// Mirror this entry's current fast-tier row, first write or any later
    /// mutation. Resolved at apply time, not enqueue time.
    Persist(i64),
    Delete(i64),
    Clear,
    /// Ack once every job queued before this one has been applied.
    Flush(SyncSender<()>),
    Shutdown,
}

pub(crate) struct DurableWriter {
    tx: SyncSender<WriteJob>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DurableWriter {
    pub fn spawn(db: Arc<Database>, source: Arc<dyn SnapshotSource>) -> Self {
        let (tx, rx) = mpsc::sync_channel(QUEUE_CAPACITY);
        let handle = std::thread::Builder::new()
            .name("magpie-writer".to_string())
            .spawn(move || run_worker(db, source, rx))
            .expect("Failed to spawn durable writer thread");
        Self {
            tx,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Capture-path submit: never blocks. A full queue drops the job.
    pub fn submit_capture(&self, job: WriteJob) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("durable write queue full, dropping capture mirror job");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("durable writer is gone, dropping capture mirror job");
            }
        }
    }

    /// Command-path submit: blocks until the job is queued.
    pub fn submit(&self, job: WriteJob) {
        if self.tx.send(job).is_err() {
            warn!("durable writer is gone, dropping command mirror job");
        }
    }

    /// Block until every job queued before this call has been applied.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        if self.tx.send(WriteJob::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Drain the queue, then stop and join the worker.
    pub fn close(&self) {
        self.flush();
        let _ = self.tx.send(WriteJob::Shutdown);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DurableWriter {
    fn drop(&mut self) {
        // Unclean stop: whatever is still queued is abandoned.
        let _ = self.tx.try_send(WriteJob::Shutdown);
    }
}

fn run_worker(db: Arc<Database>, source: Arc<dyn SnapshotSource>, rx: Receiver<WriteJob>) {
    while let Ok(job) = rx.recv() {
        match job {
            WriteJob::Persist(id) => match source.entry_snapshot(id) {
                Some(entry) => {
                    if let Err(e) = db.upsert_entry(&entry) {
                        warn!(id, error = %e, "durable upsert failed");
                    }
                }
                // Deleted, swept, or cleared since this job was queued;
                // the removal's own job handles the durable row.
                None => debug!(id, "entry gone before durable write, skipping"),
            },
            WriteJob::Delete(id) => {
                if let Err(e) = db.delete_entry(id) {
                    warn!(id, error = %e, "durable delete failed");
                }
            }
            WriteJob::Clear => {
                if let Err(e) = db.clear_all() {
                    warn!(error = %e, "durable clear failed");
                }
            }
            WriteJob::Flush(ack) => {
                let _ = ack.send(());
            }
            WriteJob::Shutdown => break,
        }
    }
    debug!("durable writer stopped");
}
