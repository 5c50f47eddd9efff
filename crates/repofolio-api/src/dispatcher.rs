// Rate-limited serial dispatcher
//
// Everything this workspace sends over the wire goes through here. A single
// worker drains a FIFO queue, runs one request at a time, and sleeps a fixed
// minimum gap before starting the next. That keeps an unauthenticated client
// under GitHub's abuse-detection thresholds without needing a server-side
// proxy.
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    #[error("dispatcher worker has shut down")]
    WorkerGone,
}

/// Handle to the shared request queue. Cheap to clone; all clones feed the
/// same worker, so serialization is system-wide no matter how many logical
/// callers hold a handle.
#[derive(Clone)]
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Job>,
}

impl Dispatcher {
    /// Spawn the worker loop. `min_gap` is the minimum delay between the
    /// start of one task and the start of the next.
    pub fn new(min_gap: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                // Await the task to completion (ok or err) before pacing.
                job.await;
                tokio::time::sleep(min_gap).await;
            }
            debug!("dispatcher queue closed, worker exiting");
        });

        Self { queue: tx }
    }

    /// Queue a task and wait for its result.
    ///
    /// Tasks run strictly in submission order. A task's failure is only
    /// visible to its own caller; the queue keeps draining.
    pub async fn submit<T, Fut>(&self, task: Fut) -> Result<T, DispatchError>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            // Receiver may be gone if the caller stopped waiting; fine.
            let _ = tx.send(task.await);
        });

        self.queue.send(job).map_err(|_| DispatchError::WorkerGone)?;
        rx.await.map_err(|_| DispatchError::WorkerGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_tasks_run_in_submission_order() {
        let dispatcher = Dispatcher::new(Duration::from_millis(1));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5u32 {
            let d = dispatcher.clone();
            let seen = Arc::clone(&seen);
            handles.push(async move {
                d.submit(async move {
                    seen.lock().unwrap().push(i);
                    i
                })
                .await
            });
        }

        // Submit happens in iteration order because submit enqueues before
        // awaiting; join the lot afterwards.
        let results = futures::future::join_all(handles).await;
        for (i, r) in results.into_iter().enumerate() {
            assert_eq!(r.unwrap(), i as u32);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimum_gap_between_task_starts() {
        let gap = Duration::from_millis(500);
        let dispatcher = Dispatcher::new(gap);
        let starts = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let d = dispatcher.clone();
            let starts = Arc::clone(&starts);
            handles.push(async move {
                d.submit(async move {
                    starts.lock().unwrap().push(tokio::time::Instant::now());
                })
                .await
            });
        }
        futures::future::join_all(handles).await;

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= gap);
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_block_the_queue() {
        let dispatcher = Dispatcher::new(Duration::from_millis(1));

        let failing = dispatcher.submit(async { Err::<u32, &str>("boom") });
        let ok = dispatcher.submit(async { Ok::<u32, &str>(7) });

        let (failing, ok) = tokio::join!(failing, ok);
        assert_eq!(failing.unwrap(), Err("boom"));
        assert_eq!(ok.unwrap(), Ok(7));
    }
}
