use api_models::enums::WebhookDeliveryStatus;
use common_utils::{date_time, ext_traits::StringExt};
use error_stack::{report, ResultExt};
use time::PrimitiveDateTime;

use super::{MockDb, Store};
use crate::{
    core::errors::{self, CustomResult},
    types::storage,
};

#[async_trait::async_trait]
pub trait WebhookEventInterface {
    async fn insert_webhook_event(
        &self,
        event: storage::WebhookEventNew,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError>;

    /// Atomically claim up to `limit` pending rows due at `now`, pushing
    /// their `next_attempt_at` to `lease_until` so other workers skip them
    /// while the delivery is in flight.
    async fn claim_due_webhook_events(
        &self,
        now: PrimitiveDateTime,
        lease_until: PrimitiveDateTime,
        limit: i64,
    ) -> CustomResult<Vec<storage::WebhookEvent>, errors::StorageError>;

    async fn update_webhook_event(
        &self,
        event_id: i64,
        update: storage::WebhookEventUpdate,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError>;

    async fn find_webhook_event_by_id(
        &self,
        event_id: i64,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError>;

    async fn list_webhook_events_by_merchant_id(
        &self,
        merchant_id: &str,
    ) -> CustomResult<Vec<storage::WebhookEvent>, errors::StorageError>;

    async fn insert_webhook_log(
        &self,
        log: storage::WebhookLogNew,
    ) -> CustomResult<storage::WebhookLog, errors::StorageError>;

    async fn list_webhook_logs_by_merchant_id(
        &self,
        merchant_id: &str,
        limit: i64,
    ) -> CustomResult<Vec<storage::WebhookLog>, errors::StorageError>;
}

#[derive(sqlx::FromRow)]
struct WebhookEventDbRow {
    id: i64,
    merchant_id: String,
    event: String,
    payload: serde_json::Value,
    status: String,
    attempts: i32,
    next_attempt_at: PrimitiveDateTime,
    last_response_code: Option<i32>,
    last_response_body: Option<String>,
    created_at: PrimitiveDateTime,
}

impl TryFrom<WebhookEventDbRow> for storage::WebhookEvent {
    type Error = error_stack::Report<errors::StorageError>;

    fn try_from(row: WebhookEventDbRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            merchant_id: row.merchant_id,
            event: row
                .event
                .parse_enum("EventType")
                .change_context(errors::StorageError::SerializationFailed)?,
            payload: row.payload,
            status: row
                .status
                .parse_enum("WebhookDeliveryStatus")
                .change_context(errors::StorageError::SerializationFailed)?,
            attempts: row.attempts,
            next_attempt_at: row.next_attempt_at,
            last_response_code: row.last_response_code,
            last_response_body: row.last_response_body,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WebhookLogDbRow {
    id: i64,
    event_id: i64,
    merchant_id: String,
    event: String,
    attempt: i32,
    response_code: Option<i32>,
    response_body: Option<String>,
    delivery_status: String,
    created_at: PrimitiveDateTime,
}

impl TryFrom<WebhookLogDbRow> for storage::WebhookLog {
    type Error = error_stack::Report<errors::StorageError>;

    fn try_from(row: WebhookLogDbRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            merchant_id: row.merchant_id,
            event: row
                .event
                .parse_enum("EventType")
                .change_context(errors::StorageError::SerializationFailed)?,
            attempt: row.attempt,
            response_code: row.response_code,
            response_body: row.response_body,
            delivery_status: row
                .delivery_status
                .parse_enum("WebhookDeliveryStatus")
                .change_context(errors::StorageError::SerializationFailed)?,
            created_at: row.created_at,
        })
    }
}

/// Append outbox rows within an open transition transaction.
pub(super) async fn insert_webhook_events_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    events: Vec<storage::WebhookEventNew>,
) -> CustomResult<(), errors::StorageError> {
    let now = date_time::now();
    for event in events {
        sqlx::query(
            "INSERT INTO webhook_events \
             (merchant_id, event, payload, status, attempts, next_attempt_at, created_at) \
             VALUES ($1, $2, $3, 'pending', 0, $4, $4)",
        )
        .bind(&event.merchant_id)
        .bind(event.event.to_string())
        .bind(&event.payload)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(errors::StorageError::from)?;
    }
    Ok(())
}

impl MockDb {
    /// Counterpart of [`insert_webhook_events_tx`] for the in-memory store.
    /// Always acquire the events mutex last.
    pub(super) async fn append_webhook_events(&self, events: Vec<storage::WebhookEventNew>) {
        let now = date_time::now();
        let mut stored = self.webhook_events.lock().await;
        for event in events {
            stored.push(storage::WebhookEvent {
                id: self.next_id(),
                merchant_id: event.merchant_id,
                event: event.event,
                payload: event.payload,
                status: WebhookDeliveryStatus::Pending,
                attempts: 0,
                next_attempt_at: now,
                last_response_code: None,
                last_response_body: None,
                created_at: now,
            });
        }
    }
}

#[async_trait::async_trait]
impl WebhookEventInterface for Store {
    async fn insert_webhook_event(
        &self,
        event: storage::WebhookEventNew,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError> {
        let now = date_time::now();
        let row: WebhookEventDbRow = sqlx::query_as(
            "INSERT INTO webhook_events \
             (merchant_id, event, payload, status, attempts, next_attempt_at, created_at) \
             VALUES ($1, $2, $3, 'pending', 0, $4, $4) RETURNING *",
        )
        .bind(&event.merchant_id)
        .bind(event.event.to_string())
        .bind(&event.payload)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        row.try_into()
    }

    async fn claim_due_webhook_events(
        &self,
        now: PrimitiveDateTime,
        lease_until: PrimitiveDateTime,
        limit: i64,
    ) -> CustomResult<Vec<storage::WebhookEvent>, errors::StorageError> {
        let rows: Vec<WebhookEventDbRow> = sqlx::query_as(
            "UPDATE webhook_events SET next_attempt_at = $2 \
             WHERE id IN ( \
                 SELECT id FROM webhook_events \
                 WHERE status = 'pending' AND next_attempt_at <= $1 \
                 ORDER BY next_attempt_at \
                 LIMIT $3 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING *",
        )
        .bind(now)
        .bind(lease_until)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_webhook_event(
        &self,
        event_id: i64,
        update: storage::WebhookEventUpdate,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError> {
        let row: WebhookEventDbRow = match update {
            storage::WebhookEventUpdate::DeliverySucceeded {
                response_code,
                response_body,
            } => sqlx::query_as(
                "UPDATE webhook_events SET status = 'delivered', attempts = attempts + 1, \
                 last_response_code = $2, last_response_body = $3 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(event_id)
            .bind(response_code)
            .bind(response_body)
            .fetch_one(&self.pool)
            .await
            .map_err(errors::StorageError::from)?,
            storage::WebhookEventUpdate::DeliveryFailed {
                response_code,
                response_body,
                next_attempt_at,
            } => sqlx::query_as(
                "UPDATE webhook_events SET attempts = attempts + 1, next_attempt_at = $2, \
                 last_response_code = $3, last_response_body = $4 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(event_id)
            .bind(next_attempt_at)
            .bind(response_code)
            .bind(response_body)
            .fetch_one(&self.pool)
            .await
            .map_err(errors::StorageError::from)?,
            storage::WebhookEventUpdate::RetriesExhausted {
                response_code,
                response_body,
            } => sqlx::query_as(
                "UPDATE webhook_events SET status = 'failed', attempts = attempts + 1, \
                 last_response_code = $2, last_response_body = $3 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(event_id)
            .bind(response_code)
            .bind(response_body)
            .fetch_one(&self.pool)
            .await
            .map_err(errors::StorageError::from)?,
        };

        row.try_into()
    }

    async fn find_webhook_event_by_id(
        &self,
        event_id: i64,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError> {
        let row: WebhookEventDbRow =
            sqlx::query_as("SELECT * FROM webhook_events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(errors::StorageError::from)?
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "webhook event {event_id}"
                    )))
                })?;

        row.try_into()
    }

    async fn list_webhook_events_by_merchant_id(
        &self,
        merchant_id: &str,
    ) -> CustomResult<Vec<storage::WebhookEvent>, errors::StorageError> {
        let rows: Vec<WebhookEventDbRow> =
            sqlx::query_as("SELECT * FROM webhook_events WHERE merchant_id = $1 ORDER BY id")
                .bind(merchant_id)
                .fetch_all(&self.pool)
                .await
                .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert_webhook_log(
        &self,
        log: storage::WebhookLogNew,
    ) -> CustomResult<storage::WebhookLog, errors::StorageError> {
        let row: WebhookLogDbRow = sqlx::query_as(
            "INSERT INTO webhook_logs \
             (event_id, merchant_id, event, attempt, response_code, response_body, \
              delivery_status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(log.event_id)
        .bind(&log.merchant_id)
        .bind(log.event.to_string())
        .bind(log.attempt)
        .bind(log.response_code)
        .bind(&log.response_body)
        .bind(log.delivery_status.to_string())
        .bind(date_time::now())
        .fetch_one(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        row.try_into()
    }

    async fn list_webhook_logs_by_merchant_id(
        &self,
        merchant_id: &str,
        limit: i64,
    ) -> CustomResult<Vec<storage::WebhookLog>, errors::StorageError> {
        let rows: Vec<WebhookLogDbRow> = sqlx::query_as(
            "SELECT * FROM webhook_logs WHERE merchant_id = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(merchant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[async_trait::async_trait]
impl WebhookEventInterface for MockDb {
    async fn insert_webhook_event(
        &self,
        event: storage::WebhookEventNew,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError> {
        let now = date_time::now();
        let event = storage::WebhookEvent {
            id: self.next_id(),
            merchant_id: event.merchant_id,
            event: event.event,
            payload: event.payload,
            status: WebhookDeliveryStatus::Pending,
            attempts: 0,
            next_attempt_at: now,
            last_response_code: None,
            last_response_body: None,
            created_at: now,
        };
        self.webhook_events.lock().await.push(event.clone());
        Ok(event)
    }

    async fn claim_due_webhook_events(
        &self,
        now: PrimitiveDateTime,
        lease_until: PrimitiveDateTime,
        limit: i64,
    ) -> CustomResult<Vec<storage::WebhookEvent>, errors::StorageError> {
        let mut events = self.webhook_events.lock().await;
        let mut claimed = Vec::new();
        for event in events.iter_mut() {
            if claimed.len() >= limit.unsigned_abs() as usize {
                break;
            }
            if event.status == WebhookDeliveryStatus::Pending && event.next_attempt_at <= now {
                event.next_attempt_at = lease_until;
                claimed.push(event.clone());
            }
        }
        Ok(claimed)
    }

    async fn update_webhook_event(
        &self,
        event_id: i64,
        update: storage::WebhookEventUpdate,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError> {
        self.webhook_events
            .lock()
            .await
            .iter_mut()
            .find(|event| event.id == event_id)
            .map(|event| {
                *event = update.apply(event.clone());
                event.clone()
            })
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "webhook event {event_id}"
                )))
            })
    }

    async fn find_webhook_event_by_id(
        &self,
        event_id: i64,
    ) -> CustomResult<storage::WebhookEvent, errors::StorageError> {
        self.webhook_events
            .lock()
            .await
            .iter()
            .find(|event| event.id == event_id)
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "webhook event {event_id}"
                )))
            })
    }

    async fn list_webhook_events_by_merchant_id(
        &self,
        merchant_id: &str,
    ) -> CustomResult<Vec<storage::WebhookEvent>, errors::StorageError> {
        Ok(self
            .webhook_events
            .lock()
            .await
            .iter()
            .filter(|event| event.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn insert_webhook_log(
        &self,
        log: storage::WebhookLogNew,
    ) -> CustomResult<storage::WebhookLog, errors::StorageError> {
        let log = storage::WebhookLog {
            id: self.next_id(),
            event_id: log.event_id,
            merchant_id: log.merchant_id,
            event: log.event,
            attempt: log.attempt,
            response_code: log.response_code,
            response_body: log.response_body,
            delivery_status: log.delivery_status,
            created_at: date_time::now(),
        };
        self.webhook_logs.lock().await.push(log.clone());
        Ok(log)
    }

    async fn list_webhook_logs_by_merchant_id(
        &self,
        merchant_id: &str,
        limit: i64,
    ) -> CustomResult<Vec<storage::WebhookLog>, errors::StorageError> {
        let logs = self.webhook_logs.lock().await;
        let mut matching: Vec<_> = logs
            .iter()
            .filter(|log| log.merchant_id == merchant_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));
        matching.truncate(limit.unsigned_abs() as usize);
        Ok(matching)
    }
}
