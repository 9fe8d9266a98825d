//! Per-conversation serial job queue.
//!
//! Guarantees that jobs submitted for one conversation key run one at a
//! time, in submission order, while queues for distinct keys drain fully
//! concurrently. Queues are created lazily on first submission and
//! removed once drained, so an idle process holds no per-key state.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::session::ConversationKey;
use crate::Result;

/// One queued unit of "invoke the agent, relay the result" work.
pub type Job = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Pending jobs for one conversation key plus its consumer flag.
///
/// `consumer_running` is set when a consumer task is spawned and never
/// cleared; a drained consumer removes the whole entry instead, so a
/// later submission starts from scratch.
#[derive(Default)]
struct KeyQueue {
    jobs: VecDeque<Job>,
    consumer_running: bool,
}

impl std::fmt::Debug for KeyQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyQueue")
            .field("pending", &self.jobs.len())
            .field("consumer_running", &self.consumer_running)
            .finish()
    }
}

type KeyQueueMap = Arc<Mutex<HashMap<ConversationKey, KeyQueue>>>;

/// Serial executor keyed by conversation.
///
/// All queue bookkeeping lives behind a single mutex: a submission's
/// "is a consumer running" check and a consumer's "queue empty, retire"
/// step take the same lock, so a job submitted while the consumer is
/// retiring either lands in the still-live queue or creates a fresh
/// entry with its own consumer. Every submitted job runs exactly once.
#[derive(Debug, Default)]
pub struct SessionQueue {
    queues: KeyQueueMap,
}

impl SessionQueue {
    /// Create an empty queue manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job to the queue for `key` and return immediately.
    ///
    /// Spawns a consumer task for the key if none is running. The job
    /// executes after every previously submitted job for the same key
    /// has finished; jobs for other keys are unaffected.
    pub async fn submit<F>(&self, key: ConversationKey, job: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let mut queues = self.queues.lock().await;
        let entry = queues.entry(key.clone()).or_default();
        entry.jobs.push_back(Box::pin(job));

        if !entry.consumer_running {
            entry.consumer_running = true;
            tokio::spawn(consume(Arc::clone(&self.queues), key));
        }
    }

    /// Number of keys with live bookkeeping (pending jobs or a consumer).
    pub async fn active_keys(&self) -> usize {
        self.queues.lock().await.len()
    }
}

/// Drain the queue for `key` until it is observed empty, then retire.
///
/// The pop and the retire both happen under the map lock, which is the
/// same ordering point `submit` uses, so no submission can be dropped
/// between "queue empty" and "entry removed".
async fn consume(queues: KeyQueueMap, key: ConversationKey) {
    loop {
        let job = {
            let mut map = queues.lock().await;
            let Some(entry) = map.get_mut(&key) else {
                break;
            };
            match entry.jobs.pop_front() {
                Some(job) => job,
                None => {
                    map.remove(&key);
                    break;
                }
            }
        };

        match AssertUnwindSafe(job).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(%key, %err, "job failed; continuing with next job");
            }
            Err(_panic) => {
                error!(%key, "job panicked; continuing with next job");
            }
        }
    }
}
