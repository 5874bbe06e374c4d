//! The delivery worker pool (§4.6). Grounded on
//! `booking-queue-cell/src/services/worker.rs`'s `BookingWorkerService`:
//! N tasks draining a shared queue, generalized from Redis `dequeue_job`
//! behind a pool connection to a `tokio::sync::Mutex`-guarded `mpsc`
//! receiver (§12.2), and its graceful-shutdown-by-drain idiom.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use shared_store::AppStore;
use tokio::sync::{mpsc::Receiver, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::delivery::deliver_once;
use crate::dispatcher::QueuedEvent;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` tasks draining `receiver`. Workers keep
    /// running until the channel's `Sender` half is dropped and every
    /// already-queued event has been processed.
    pub fn spawn(worker_count: usize, receiver: Receiver<QueuedEvent>, store: Arc<AppStore>, http: Client) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));
        let handles = (0..worker_count.max(1))
            .map(|worker_id| {
                let receiver = receiver.clone();
                let store = store.clone();
                let http = http.clone();
                tokio::spawn(async move {
                    debug!(worker_id, "webhook worker started");
                    loop {
                        let queued = receiver.lock().await.recv().await;
                        match queued {
                            Some(event) => process_event(&store, &http, event).await,
                            None => break,
                        }
                    }
                    debug!(worker_id, "webhook worker stopped");
                })
            })
            .collect();
        Self { handles }
    }

    /// Awaits every worker's exit. Callers drop the paired `Sender` first so
    /// `recv()` returns `None` once in-flight deliveries finish — no new
    /// deliveries start after that point (§4.6's graceful-shutdown rule).
    pub async fn shutdown(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!("webhook worker task panicked: {}", err);
            }
        }
    }
}

async fn process_event(store: &Arc<AppStore>, http: &Client, queued: QueuedEvent) {
    let subscribers = store.all_subscriptions().await.into_iter().filter(|s| s.wants(queued.event));

    for mut subscription in subscribers {
        loop {
            let attempt = deliver_once(http, &subscription, queued.event, &queued.payload).await;
            let now = Utc::now();
            match attempt {
                Ok(()) => {
                    subscription.record_success(now);
                    info!(subscription_id = %subscription.id, event = queued.event.as_str(), "webhook delivered");
                    break;
                }
                Err(reason) => {
                    subscription.record_failure(now, reason.clone());
                    warn!(subscription_id = %subscription.id, reason = %reason, "webhook delivery failed");
                    if !subscription.is_active {
                        warn!(subscription_id = %subscription.id, "subscription disabled: max retries exceeded");
                        break;
                    }
                    tokio::time::sleep(subscription.backoff_delay()).await;
                }
            }
        }
        store.put_subscription(subscription).await;
    }
}
