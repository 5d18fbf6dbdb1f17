//! Bounded, fire-and-forget persistence pipeline.
//!
//! Submissions go through a bounded queue drained by a small set of
//! permanent workers. When the queue runs more than half full, short-lived
//! surge workers are added up to a cap; they exit after sitting idle.
//! When the queue is full the submission is dropped, never the request.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::sync::{Mutex, mpsc};

use crate::{
    ApiCall,
    store::{CallRecord, CallStore},
};

/// How long a surge worker waits for work before exiting.
const SURGE_IDLE: Duration = Duration::from_millis(500);

type SharedReceiver = Arc<Mutex<mpsc::Receiver<ApiCall>>>;

/// Queues API calls and persists them from a bounded worker set.
pub struct PersistentTracker {
    tx: mpsc::Sender<ApiCall>,
    rx: SharedReceiver,
    store: Arc<dyn CallStore>,
    workers: Arc<AtomicUsize>,
    max_workers: usize,
    dropped: AtomicU64,
}

impl PersistentTracker {
    /// Starts the permanent workers and returns the tracker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(store: Arc<dyn CallStore>, queue_capacity: usize, min_workers: usize, max_workers: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));
        let workers = Arc::new(AtomicUsize::new(min_workers));

        for _ in 0..min_workers {
            tokio::spawn(worker_loop(store.clone(), rx.clone(), None, workers.clone()));
        }

        Self {
            tx,
            rx,
            store,
            workers,
            max_workers,
            dropped: AtomicU64::new(0),
        }
    }

    /// Queues one call and returns immediately.
    pub fn submit(&self, api_call: ApiCall) {
        match self.tx.try_send(api_call) {
            Ok(()) => self.maybe_spawn_surge_worker(),
            Err(mpsc::error::TrySendError::Full(call)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Tracking queue is full, dropping {} {}", call.http_method, call.path);
            }
            Err(mpsc::error::TrySendError::Closed(call)) => {
                log::warn!("Tracking queue is closed, dropping {} {}", call.http_method, call.path);
            }
        }
    }

    /// Number of submissions dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn maybe_spawn_surge_worker(&self) {
        // Remaining capacity above half the queue means the permanent
        // workers are keeping up.
        if self.tx.capacity() * 2 >= self.tx.max_capacity() {
            return;
        }

        let live = self.workers.fetch_add(1, Ordering::Relaxed);
        if live >= self.max_workers {
            self.workers.fetch_sub(1, Ordering::Relaxed);
            return;
        }

        tokio::spawn(worker_loop(
            self.store.clone(),
            self.rx.clone(),
            Some(SURGE_IDLE),
            self.workers.clone(),
        ));
    }
}

/// Drains the queue into the store. Permanent workers (`idle` of `None`)
/// run until the channel closes; surge workers also exit once no work
/// arrives within `idle`.
async fn worker_loop(store: Arc<dyn CallStore>, rx: SharedReceiver, idle: Option<Duration>, workers: Arc<AtomicUsize>) {
    loop {
        let call = {
            let mut receiver = rx.lock().await;

            let received = match idle {
                Some(limit) => match tokio::time::timeout(limit, receiver.recv()).await {
                    Ok(received) => received,
                    Err(_) => break,
                },
                None => receiver.recv().await,
            };

            match received {
                Some(call) => call,
                None => break,
            }
        };

        // The timestamp records when the call was written, not received.
        let record = CallRecord::capture(call);

        if let Err(error) = store.insert(record).await {
            log::warn!("Failed to persist tracked call: {error}");
        }
    }

    workers.fetch_sub(1, Ordering::Relaxed);
}
