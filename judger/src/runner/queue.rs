//! A bounded FIFO of judge calls, drained by a fixed number of workers.

use futures::future::BoxFuture;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
};

use crate::config::QueueConfig;

type Job = BoxFuture<'static, ()>;

#[derive(Debug, err_derive::Error)]
pub enum QueueError {
    #[error(display = "Submission queue is shut down")]
    Closed,
    #[error(display = "Queued task was dropped before completing")]
    Dropped,
}

/// At most `width` enqueued tasks run at once; the rest wait in arrival order.
/// Enqueuers are suspended while `capacity` tasks are already pending.
///
/// Dropping the queue closes admission; workers drain what is left and exit.
pub struct SubmissionQueue {
    tx: std::sync::Mutex<Option<mpsc::Sender<Job>>>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
    in_flight: Arc<AtomicUsize>,
    width: usize,
}

impl SubmissionQueue {
    /// Create the queue and spawn its workers. Must be called inside a
    /// tokio runtime.
    pub fn new(width: usize, capacity: usize) -> Self {
        let width = width.max(1);
        let (tx, rx) = mpsc::channel::<Job>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let workers = (0..width)
            .map(|id| {
                let rx = rx.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    loop {
                        // Holding the lock only while receiving keeps tasks FIFO
                        let job = { rx.lock().await.recv().await };
                        let job = match job {
                            Some(job) => job,
                            None => break,
                        };
                        in_flight.fetch_add(1, Ordering::SeqCst);
                        let _guard = scopeguard::guard((), |_| {
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                        });
                        job.await;
                    }
                    tracing::trace!(worker = id, "Queue worker exited");
                })
            })
            .collect();

        SubmissionQueue {
            tx: std::sync::Mutex::new(Some(tx)),
            workers: std::sync::Mutex::new(workers),
            in_flight,
            width,
        }
    }

    pub fn from_config(cfg: &QueueConfig) -> Self {
        Self::new(cfg.width, cfg.capacity)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of tasks currently executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Queue `task` and wait for its result.
    pub async fn enqueue<F, T>(&self, task: F) -> Result<T, QueueError>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let tx = self
            .tx
            .lock()
            .map_err(|_| QueueError::Closed)?
            .clone()
            .ok_or(QueueError::Closed)?;
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = result_tx.send(task.await);
        });
        tx.send(job).await.map_err(|_| QueueError::Closed)?;
        drop(tx);
        result_rx.await.map_err(|_| QueueError::Dropped)
    }

    /// Stop accepting tasks, let workers finish what is already queued, then
    /// wait for them to exit.
    pub async fn shutdown(&self) {
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }
        let workers = match self.workers.lock() {
            Ok(mut w) => std::mem::take(&mut *w),
            Err(_) => return,
        };
        for worker in workers {
            let _ = worker.await;
        }
    }
}

impl std::fmt::Debug for SubmissionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionQueue")
            .field("width", &self.width)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
