use api_models::enums::{PaymentStatus, RefundStatus};
use common_utils::{date_time, ext_traits::StringExt};
use error_stack::{report, ResultExt};
use time::PrimitiveDateTime;

use super::{events, MockDb, Store};
use crate::{
    core::errors::{self, CustomResult},
    types::storage,
};

#[async_trait::async_trait]
pub trait RefundInterface {
    /// Insert a refund for its payment in one transaction: the payment row
    /// is locked, the refundable balance is re-computed under the lock, and
    /// a processed refund moves the payment to `partially_refunded` or
    /// `refunded` while appending the given outbox rows.
    async fn create_refund(
        &self,
        refund: storage::RefundNew,
        events: Vec<storage::WebhookEventNew>,
    ) -> CustomResult<(storage::Refund, storage::Payment), errors::StorageError>;

    async fn list_refunds_by_payment_id(
        &self,
        payment_id: i64,
    ) -> CustomResult<Vec<storage::Refund>, errors::StorageError>;

    async fn find_refund_by_payment_id_idempotency_key(
        &self,
        payment_id: i64,
        idempotency_key: &str,
    ) -> CustomResult<Option<storage::Refund>, errors::StorageError>;

    async fn get_refunded_volume(&self) -> CustomResult<i64, errors::StorageError>;
}

#[derive(sqlx::FromRow)]
struct RefundDbRow {
    id: i64,
    refund_ref: String,
    payment_id: i64,
    payment_ref: String,
    merchant_id: String,
    amount: i64,
    currency: String,
    reason: Option<String>,
    notes: Option<String>,
    status: String,
    idempotency_key: Option<String>,
    created_at: PrimitiveDateTime,
}

impl TryFrom<RefundDbRow> for storage::Refund {
    type Error = error_stack::Report<errors::StorageError>;

    fn try_from(row: RefundDbRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            refund_ref: row.refund_ref,
            payment_id: row.payment_id,
            payment_ref: row.payment_ref,
            merchant_id: row.merchant_id,
            amount: row.amount,
            currency: row
                .currency
                .parse_enum("Currency")
                .change_context(errors::StorageError::SerializationFailed)?,
            reason: row.reason,
            notes: row.notes,
            status: row
                .status
                .parse_enum("RefundStatus")
                .change_context(errors::StorageError::SerializationFailed)?,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
        })
    }
}

#[async_trait::async_trait]
impl RefundInterface for Store {
    async fn create_refund(
        &self,
        refund: storage::RefundNew,
        events: Vec<storage::WebhookEventNew>,
    ) -> CustomResult<(storage::Refund, storage::Payment), errors::StorageError> {
        let mut tx = self.pool.begin().await.map_err(errors::StorageError::from)?;

        // Raw row fetch with the lock; only the fields the checks need.
        let (payment_amount, payment_status): (i64, String) = sqlx::query_as(
            "SELECT amount, status FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(refund.payment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(errors::StorageError::from)?
        .ok_or_else(|| {
            report!(errors::StorageError::ValueNotFound(format!(
                "payment {}",
                refund.payment_id
            )))
        })?;
        let payment_status: PaymentStatus = payment_status
            .parse_enum("PaymentStatus")
            .change_context(errors::StorageError::SerializationFailed)?;

        if !payment_status.is_refundable() {
            return Err(report!(errors::StorageError::InvalidTransition {
                entity: "payment",
                current_state: payment_status.to_string(),
                expected: "captured, partially_refunded".to_string(),
            }));
        }

        let already_refunded: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM refunds \
             WHERE payment_id = $1 AND status = 'processed'",
        )
        .bind(refund.payment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(errors::StorageError::from)?;

        if refund.status == RefundStatus::Processed
            && already_refunded + refund.amount > payment_amount
        {
            return Err(report!(errors::StorageError::RefundBalanceExceeded));
        }

        let refund_row: RefundDbRow = sqlx::query_as(
            "INSERT INTO refunds \
             (refund_ref, payment_id, payment_ref, merchant_id, amount, currency, reason, notes, \
              status, idempotency_key, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(&refund.refund_ref)
        .bind(refund.payment_id)
        .bind(&refund.payment_ref)
        .bind(&refund.merchant_id)
        .bind(refund.amount)
        .bind(refund.currency.to_string())
        .bind(&refund.reason)
        .bind(&refund.notes)
        .bind(refund.status.to_string())
        .bind(&refund.idempotency_key)
        .bind(date_time::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(errors::StorageError::from)?;
        let inserted: storage::Refund = refund_row.try_into()?;

        let payment_update = if refund.status == RefundStatus::Processed {
            let refunded_total = already_refunded + refund.amount;
            let status = if refunded_total == payment_amount {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::PartiallyRefunded
            };
            Some(status)
        } else {
            None
        };

        let payment_row: super::payments::PaymentDbRow = match payment_update {
            Some(status) => {
                sqlx::query_as("UPDATE payments SET status = $2 WHERE id = $1 RETURNING *")
                    .bind(refund.payment_id)
                    .bind(status.to_string())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(errors::StorageError::from)?
            }
            None => sqlx::query_as("SELECT * FROM payments WHERE id = $1")
                .bind(refund.payment_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(errors::StorageError::from)?,
        };
        let payment: storage::Payment = payment_row.try_into()?;

        events::insert_webhook_events_tx(&mut tx, events).await?;

        tx.commit().await.map_err(errors::StorageError::from)?;
        Ok((inserted, payment))
    }

    async fn list_refunds_by_payment_id(
        &self,
        payment_id: i64,
    ) -> CustomResult<Vec<storage::Refund>, errors::StorageError> {
        let rows: Vec<RefundDbRow> =
            sqlx::query_as("SELECT * FROM refunds WHERE payment_id = $1 ORDER BY id")
                .bind(payment_id)
                .fetch_all(&self.pool)
                .await
                .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_refund_by_payment_id_idempotency_key(
        &self,
        payment_id: i64,
        idempotency_key: &str,
    ) -> CustomResult<Option<storage::Refund>, errors::StorageError> {
        let row: Option<RefundDbRow> = sqlx::query_as(
            "SELECT * FROM refunds WHERE payment_id = $1 AND idempotency_key = $2",
        )
        .bind(payment_id)
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_refunded_volume(&self) -> CustomResult<i64, errors::StorageError> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM refunds WHERE status = 'processed'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| report!(errors::StorageError::from(error)))
    }
}

#[async_trait::async_trait]
impl RefundInterface for MockDb {
    async fn create_refund(
        &self,
        refund: storage::RefundNew,
        events: Vec<storage::WebhookEventNew>,
    ) -> CustomResult<(storage::Refund, storage::Payment), errors::StorageError> {
        let mut payments = self.payments.lock().await;
        let mut refunds = self.refunds.lock().await;

        let payment = payments
            .iter_mut()
            .find(|payment| payment.id == refund.payment_id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "payment {}",
                    refund.payment_id
                )))
            })?;

        if !payment.status.is_refundable() {
            return Err(report!(errors::StorageError::InvalidTransition {
                entity: "payment",
                current_state: payment.status.to_string(),
                expected: "captured, partially_refunded".to_string(),
            }));
        }

        if let Some(key) = refund.idempotency_key.as_deref() {
            if refunds.iter().any(|existing| {
                existing.payment_id == refund.payment_id
                    && existing.idempotency_key.as_deref() == Some(key)
            }) {
                return Err(report!(errors::StorageError::DuplicateValue {
                    entity: "refund",
                    key: Some(key.to_string()),
                }));
            }
        }

        let already_refunded: i64 = refunds
            .iter()
            .filter(|existing| {
                existing.payment_id == refund.payment_id
                    && existing.status == RefundStatus::Processed
            })
            .map(|existing| existing.amount)
            .sum();

        if refund.status == RefundStatus::Processed
            && already_refunded + refund.amount > payment.amount
        {
            return Err(report!(errors::StorageError::RefundBalanceExceeded));
        }

        let inserted = storage::Refund {
            id: self.next_id(),
            refund_ref: refund.refund_ref,
            payment_id: refund.payment_id,
            payment_ref: refund.payment_ref,
            merchant_id: refund.merchant_id,
            amount: refund.amount,
            currency: refund.currency,
            reason: refund.reason,
            notes: refund.notes,
            status: refund.status,
            idempotency_key: refund.idempotency_key,
            created_at: date_time::now(),
        };
        refunds.push(inserted.clone());

        if refund.status == RefundStatus::Processed {
            let refunded_total = already_refunded + refund.amount;
            payment.status = if refunded_total == payment.amount {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::PartiallyRefunded
            };
        }
        let payment = payment.clone();

        self.append_webhook_events(events).await;

        Ok((inserted, payment))
    }

    async fn list_refunds_by_payment_id(
        &self,
        payment_id: i64,
    ) -> CustomResult<Vec<storage::Refund>, errors::StorageError> {
        Ok(self
            .refunds
            .lock()
            .await
            .iter()
            .filter(|refund| refund.payment_id == payment_id)
            .cloned()
            .collect())
    }

    async fn find_refund_by_payment_id_idempotency_key(
        &self,
        payment_id: i64,
        idempotency_key: &str,
    ) -> CustomResult<Option<storage::Refund>, errors::StorageError> {
        Ok(self
            .refunds
            .lock()
            .await
            .iter()
            .find(|refund| {
                refund.payment_id == payment_id
                    && refund.idempotency_key.as_deref() == Some(idempotency_key)
            })
            .cloned())
    }

    async fn get_refunded_volume(&self) -> CustomResult<i64, errors::StorageError> {
        Ok(self
            .refunds
            .lock()
            .await
            .iter()
            .filter(|refund| refund.status == RefundStatus::Processed)
            .map(|refund| refund.amount)
            .sum())
    }
}
