//! The webhook delivery worker pool.
//!
//! The request path only appends outbox rows; these workers do every
//! outbound POST. Each worker claims a batch with a lease (so a row is
//! delivered by one worker at a time), attempts delivery, and the row's
//! status columns absorb the outcome. Per-merchant ordering is not
//! guaranteed; rows are independent.

use common_utils::date_time;
use payflow_env::logger;
use time::{Duration, PrimitiveDateTime};

use crate::{
    consts,
    core::{
        errors::{self, CustomResult},
        webhooks,
    },
    routes::AppState,
};

/// Spawn the configured number of workers onto the runtime.
pub fn spawn_workers(state: &AppState) {
    for worker_id in 0..state.conf.webhooks.workers {
        let state = state.clone();
        tokio::spawn(run_worker(state, worker_id));
    }
}

async fn run_worker(state: AppState, worker_id: usize) {
    logger::info!(worker_id, "webhook delivery worker started");
    let poll_interval = std::time::Duration::from_millis(state.conf.webhooks.poll_interval_ms);

    loop {
        match drain_once(&state, date_time::now()).await {
            Ok(0) => tokio::time::sleep(poll_interval).await,
            Ok(delivered) => {
                logger::debug!(worker_id, delivered, "drained outbox batch");
            }
            Err(error) => {
                logger::error!(?error, worker_id, "outbox poll failed");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

/// Claim and deliver one batch of rows due at `now`. Returns how many rows
/// were claimed. `now` is a parameter so tests can walk the backoff
/// schedule without sleeping through it.
pub async fn drain_once(
    state: &AppState,
    now: PrimitiveDateTime,
) -> CustomResult<usize, errors::StorageError> {
    let lease_until = now + Duration::seconds(consts::WEBHOOK_CLAIM_LEASE_SECS);
    let claimed = state
        .store
        .claim_due_webhook_events(now, lease_until, state.conf.webhooks.batch_size)
        .await?;

    let count = claimed.len();
    for event in claimed {
        webhooks::deliver_webhook_event(state, event, now).await;
    }
    Ok(count)
}
