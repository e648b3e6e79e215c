use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, error};
use tokio::sync::{Mutex, Notify, mpsc};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

impl Pending {
    fn start(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Fixed number of workers draining a bounded job queue.
///
/// Jobs report their own outcome; the pool never hands results back to the submitter.
/// Workers stop once every handle to the pool is dropped and the queue is empty.
#[derive(Clone)]
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    pending: Arc<Pending>,
}

impl WorkerPool {
    /// Must be called inside a tokio runtime.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let pending = Arc::new(Pending::default());

        for worker in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let pending = Arc::clone(&pending);
            tokio::spawn(async move {
                loop {
                    let job = receiver.lock().await.recv().await;
                    let Some(job) = job else {
                        break;
                    };
                    // A panicking job must not take the worker down with it.
                    if let Err(err) = tokio::spawn(job).await {
                        error!("Worker {worker}: job failed: {err}");
                    }
                    pending.finish();
                }
                debug!("Worker {worker} stopped");
            });
        }

        Self { sender, pending }
    }

    /// Queues a job. Waits only while the queue is full.
    pub async fn submit<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.start();
        if self.sender.send(Box::pin(job)).await.is_err() {
            error!("Worker pool is closed, job dropped");
            self.pending.finish();
        }
    }

    /// Queued plus running jobs.
    pub fn pending(&self) -> usize {
        self.pending.count.load(Ordering::SeqCst)
    }

    /// Resolves once no submitted job is queued or running.
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.pending.idle.notified();
            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }
}
