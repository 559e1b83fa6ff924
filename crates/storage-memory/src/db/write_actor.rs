use super::{LedgerTables, MemoryDatabase};
use crate::errors::StorageError;
use eventplan_core::errors::Result;
use log::{debug, error};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::{mpsc, oneshot};

// A write job runs against a working copy of the tables.
type Job<T> = Box<dyn FnOnce(&mut LedgerTables) -> Result<T> + Send + 'static>;

type Reply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job<Box<dyn Any + Send + 'static>>, Reply)>,
}

impl WriteHandle {
    /// Executes a job on the writer actor.
    ///
    /// The job sees a private copy of the committed tables. Its writes are
    /// published only if it returns `Ok`; once queued, the job runs to the end
    /// even if the caller stops waiting for the reply.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut LedgerTables) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |tables| job(tables).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| StorageError::WriterUnavailable("job channel closed".to_string()))?;

        let boxed = ret_rx
            .await
            .map_err(|_| StorageError::WriterUnavailable("reply dropped".to_string()))??;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| StorageError::ResultTypeMismatch.into())
    }
}

/// Spawns a background Tokio task that is the only writer to the database.
///
/// Jobs are processed serially, so every job observes the result of the
/// previous one.
pub fn spawn_writer(db: MemoryDatabase) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(Job<Box<dyn Any + Send + 'static>>, Reply)>(1024);

    tokio::spawn(async move {
        while let Some((job, reply_tx)) = rx.recv().await {
            let mut working = db.snapshot();
            let result = panic::catch_unwind(AssertUnwindSafe(|| job(&mut working)))
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    error!("Write job panicked: {}", message);
                    Err(StorageError::JobPanicked(message).into())
                });
            match &result {
                Ok(_) => db.commit(working),
                Err(e) => debug!("Write job rolled back: {}", e),
            }
            // The requester may have gone away; the outcome stands either way.
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor stopped");
    });

    WriteHandle { tx }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
