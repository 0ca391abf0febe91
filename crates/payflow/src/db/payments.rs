use api_models::enums::{OrderStatus, PaymentStatus};
use common_utils::{date_time, ext_traits::StringExt};
use error_stack::{report, ResultExt};
use masking::PeekInterface;
use time::PrimitiveDateTime;

use super::{events, orders::OrderDbRow, MockDb, Store};
use crate::{
    core::errors::{self, CustomResult},
    types::storage,
};

#[async_trait::async_trait]
pub trait PaymentInterface {
    /// Insert a payment attempt for its order, all in one transaction: the
    /// order row is locked, a paid order or an existing non-failed payment
    /// aborts the transaction, and a first attempt advances the order to
    /// `attempted`.
    async fn insert_payment_attempt(
        &self,
        payment: storage::PaymentNew,
    ) -> CustomResult<(storage::Payment, storage::Order), errors::StorageError>;

    /// Apply a payment transition and optionally an order transition in one
    /// transaction, appending the given outbox rows. The payment must be in
    /// one of `allowed_from`, otherwise the transaction aborts.
    async fn process_payment_transition(
        &self,
        payment_id: i64,
        allowed_from: &[PaymentStatus],
        update: storage::PaymentUpdate,
        order_update: Option<storage::OrderUpdate>,
        events: Vec<storage::WebhookEventNew>,
    ) -> CustomResult<(storage::Payment, storage::Order), errors::StorageError>;

    async fn find_payment_by_payment_ref(
        &self,
        payment_ref: &str,
    ) -> CustomResult<storage::Payment, errors::StorageError>;

    async fn list_payments_by_order_id(
        &self,
        order_id: i64,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError>;

    /// Payment history of one derived customer identity, oldest first,
    /// bounded below by `since`. Feeds the fraud rules.
    async fn list_recent_payments_by_customer_id(
        &self,
        customer_id: &str,
        since: PrimitiveDateTime,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError>;

    async fn list_flagged_payments(
        &self,
        limit: i64,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError>;

    async fn get_payment_stats(
        &self,
    ) -> CustomResult<storage::PaymentStats, errors::StorageError>;
}

#[derive(sqlx::FromRow)]
pub(super) struct PaymentDbRow {
    id: i64,
    payment_ref: String,
    order_id: i64,
    order_ref: String,
    merchant_id: String,
    amount: i64,
    currency: String,
    method: String,
    status: String,
    customer_id: Option<String>,
    vpa: Option<String>,
    card_last4: Option<String>,
    card_name: Option<String>,
    email: Option<String>,
    contact: Option<String>,
    is_flagged: bool,
    fraud_rule_hits: Vec<String>,
    error_code: Option<String>,
    error_reason: Option<String>,
    created_at: PrimitiveDateTime,
}

impl TryFrom<PaymentDbRow> for storage::Payment {
    type Error = error_stack::Report<errors::StorageError>;

    fn try_from(row: PaymentDbRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            payment_ref: row.payment_ref,
            order_id: row.order_id,
            order_ref: row.order_ref,
            merchant_id: row.merchant_id,
            amount: row.amount,
            currency: row
                .currency
                .parse_enum("Currency")
                .change_context(errors::StorageError::SerializationFailed)?,
            method: row
                .method
                .parse_enum("PaymentMethod")
                .change_context(errors::StorageError::SerializationFailed)?,
            status: row
                .status
                .parse_enum("PaymentStatus")
                .change_context(errors::StorageError::SerializationFailed)?,
            customer_id: row.customer_id,
            vpa: row.vpa.map(Into::into),
            card_last4: row.card_last4,
            card_name: row.card_name,
            email: row.email.map(Into::into),
            contact: row.contact.map(Into::into),
            is_flagged: row.is_flagged,
            fraud_rule_hits: row.fraud_rule_hits,
            error_code: row.error_code,
            error_reason: row.error_reason,
            created_at: row.created_at,
        })
    }
}

fn expected_states(allowed_from: &[PaymentStatus]) -> String {
    allowed_from
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait::async_trait]
impl PaymentInterface for Store {
    async fn insert_payment_attempt(
        &self,
        payment: storage::PaymentNew,
    ) -> CustomResult<(storage::Payment, storage::Order), errors::StorageError> {
        let mut tx = self.pool.begin().await.map_err(errors::StorageError::from)?;

        let order_row: OrderDbRow =
            sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
                .bind(payment.order_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(errors::StorageError::from)?
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "order {}",
                        payment.order_id
                    )))
                })?;
        let order: storage::Order = order_row.try_into()?;

        if order.status == OrderStatus::Paid {
            return Err(report!(errors::StorageError::InvalidTransition {
                entity: "order",
                current_state: order.status.to_string(),
                expected: "created, attempted".to_string(),
            }));
        }

        let active_payment: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM payments WHERE order_id = $1 AND status <> 'failed' LIMIT 1",
        )
        .bind(payment.order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(errors::StorageError::from)?;
        if active_payment.is_some() {
            return Err(report!(errors::StorageError::ActivePaymentExists));
        }

        let payment_row: PaymentDbRow = sqlx::query_as(
            "INSERT INTO payments \
             (payment_ref, order_id, order_ref, merchant_id, amount, currency, method, status, \
              customer_id, vpa, card_last4, card_name, email, contact, is_flagged, \
              fraud_rule_hits, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'created', $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16) \
             RETURNING *",
        )
        .bind(&payment.payment_ref)
        .bind(payment.order_id)
        .bind(&payment.order_ref)
        .bind(&payment.merchant_id)
        .bind(payment.amount)
        .bind(payment.currency.to_string())
        .bind(payment.method.to_string())
        .bind(&payment.customer_id)
        .bind(payment.vpa.as_ref().map(|vpa| vpa.peek().clone()))
        .bind(&payment.card_last4)
        .bind(&payment.card_name)
        .bind(payment.email.as_ref().map(|email| email.peek().clone()))
        .bind(payment.contact.as_ref().map(|contact| contact.peek().clone()))
        .bind(payment.is_flagged)
        .bind(&payment.fraud_rule_hits)
        .bind(date_time::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(errors::StorageError::from)?;
        let inserted: storage::Payment = payment_row.try_into()?;

        let order = if order.status == OrderStatus::Created {
            let order_row: OrderDbRow =
                sqlx::query_as("UPDATE orders SET status = 'attempted' WHERE id = $1 RETURNING *")
                    .bind(order.id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(errors::StorageError::from)?;
            order_row.try_into()?
        } else {
            order
        };

        tx.commit().await.map_err(errors::StorageError::from)?;
        Ok((inserted, order))
    }

    async fn process_payment_transition(
        &self,
        payment_id: i64,
        allowed_from: &[PaymentStatus],
        update: storage::PaymentUpdate,
        order_update: Option<storage::OrderUpdate>,
        events: Vec<storage::WebhookEventNew>,
    ) -> CustomResult<(storage::Payment, storage::Order), errors::StorageError> {
        let mut tx = self.pool.begin().await.map_err(errors::StorageError::from)?;

        let payment_row: PaymentDbRow =
            sqlx::query_as("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
                .bind(payment_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(errors::StorageError::from)?
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "payment {payment_id}"
                    )))
                })?;
        let payment: storage::Payment = payment_row.try_into()?;

        if !allowed_from.contains(&payment.status) {
            return Err(report!(errors::StorageError::InvalidTransition {
                entity: "payment",
                current_state: payment.status.to_string(),
                expected: expected_states(allowed_from),
            }));
        }

        let payment_row: PaymentDbRow = match &update {
            storage::PaymentUpdate::AuthorizationSucceeded { status } => sqlx::query_as(
                "UPDATE payments SET status = $2 WHERE id = $1 RETURNING *",
            )
            .bind(payment_id)
            .bind(status.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(errors::StorageError::from)?,
            storage::PaymentUpdate::AuthorizationFailed {
                error_code,
                error_reason,
            } => sqlx::query_as(
                "UPDATE payments SET status = 'failed', error_code = $2, error_reason = $3 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(payment_id)
            .bind(error_code)
            .bind(error_reason)
            .fetch_one(&mut *tx)
            .await
            .map_err(errors::StorageError::from)?,
            storage::PaymentUpdate::CaptureUpdate => sqlx::query_as(
                "UPDATE payments SET status = 'captured' WHERE id = $1 RETURNING *",
            )
            .bind(payment_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(errors::StorageError::from)?,
            storage::PaymentUpdate::RefundStatusUpdate { status } => sqlx::query_as(
                "UPDATE payments SET status = $2 WHERE id = $1 RETURNING *",
            )
            .bind(payment_id)
            .bind(status.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(errors::StorageError::from)?,
        };
        let payment: storage::Payment = payment_row.try_into()?;

        let order_row: OrderDbRow =
            sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
                .bind(payment.order_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(errors::StorageError::from)?;
        let mut order: storage::Order = order_row.try_into()?;

        if let Some(storage::OrderUpdate::StatusUpdate { status }) = order_update {
            let order_row: OrderDbRow =
                sqlx::query_as("UPDATE orders SET status = $2 WHERE id = $1 RETURNING *")
                    .bind(order.id)
                    .bind(status.to_string())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(errors::StorageError::from)?;
            order = order_row.try_into()?;
        }

        events::insert_webhook_events_tx(&mut tx, events).await?;

        tx.commit().await.map_err(errors::StorageError::from)?;
        Ok((payment, order))
    }

    async fn find_payment_by_payment_ref(
        &self,
        payment_ref: &str,
    ) -> CustomResult<storage::Payment, errors::StorageError> {
        let row: PaymentDbRow = sqlx::query_as("SELECT * FROM payments WHERE payment_ref = $1")
            .bind(payment_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(errors::StorageError::from)?
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "payment {payment_ref}"
                )))
            })?;

        row.try_into()
    }

    async fn list_payments_by_order_id(
        &self,
        order_id: i64,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError> {
        let rows: Vec<PaymentDbRow> =
            sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id")
                .bind(order_id)
                .fetch_all(&self.pool)
                .await
                .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_recent_payments_by_customer_id(
        &self,
        customer_id: &str,
        since: PrimitiveDateTime,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError> {
        let rows: Vec<PaymentDbRow> = sqlx::query_as(
            "SELECT * FROM payments WHERE customer_id = $1 AND created_at >= $2 ORDER BY id",
        )
        .bind(customer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_flagged_payments(
        &self,
        limit: i64,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError> {
        let rows: Vec<PaymentDbRow> =
            sqlx::query_as("SELECT * FROM payments WHERE is_flagged ORDER BY id DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_payment_stats(
        &self,
    ) -> CustomResult<storage::PaymentStats, errors::StorageError> {
        #[derive(sqlx::FromRow)]
        struct StatsDbRow {
            total_payments: i64,
            captured_payments: i64,
            failed_payments: i64,
            flagged_payments: i64,
            captured_volume: i64,
        }

        let row: StatsDbRow = sqlx::query_as(
            "SELECT COUNT(*) AS total_payments, \
             COUNT(*) FILTER (WHERE status IN ('captured', 'refunded', 'partially_refunded')) \
                 AS captured_payments, \
             COUNT(*) FILTER (WHERE status = 'failed') AS failed_payments, \
             COUNT(*) FILTER (WHERE is_flagged) AS flagged_payments, \
             COALESCE(SUM(amount) FILTER \
                 (WHERE status IN ('captured', 'refunded', 'partially_refunded')), 0)::BIGINT \
                 AS captured_volume \
             FROM payments",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        Ok(storage::PaymentStats {
            total_payments: row.total_payments.unsigned_abs(),
            captured_payments: row.captured_payments.unsigned_abs(),
            failed_payments: row.failed_payments.unsigned_abs(),
            flagged_payments: row.flagged_payments.unsigned_abs(),
            captured_volume: row.captured_volume,
        })
    }
}

#[async_trait::async_trait]
impl PaymentInterface for MockDb {
    async fn insert_payment_attempt(
        &self,
        payment: storage::PaymentNew,
    ) -> CustomResult<(storage::Payment, storage::Order), errors::StorageError> {
        let mut orders = self.orders.lock().await;
        let mut payments = self.payments.lock().await;

        let order = orders
            .iter_mut()
            .find(|order| order.id == payment.order_id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "order {}",
                    payment.order_id
                )))
            })?;

        if order.status == OrderStatus::Paid {
            return Err(report!(errors::StorageError::InvalidTransition {
                entity: "order",
                current_state: order.status.to_string(),
                expected: "created, attempted".to_string(),
            }));
        }
        if payments.iter().any(|existing| {
            existing.order_id == payment.order_id && existing.status.blocks_new_attempts()
        }) {
            return Err(report!(errors::StorageError::ActivePaymentExists));
        }

        let inserted = storage::Payment {
            id: self.next_id(),
            payment_ref: payment.payment_ref,
            order_id: payment.order_id,
            order_ref: payment.order_ref,
            merchant_id: payment.merchant_id,
            amount: payment.amount,
            currency: payment.currency,
            method: payment.method,
            status: PaymentStatus::Created,
            customer_id: payment.customer_id,
            vpa: payment.vpa,
            card_last4: payment.card_last4,
            card_name: payment.card_name,
            email: payment.email,
            contact: payment.contact,
            is_flagged: payment.is_flagged,
            fraud_rule_hits: payment.fraud_rule_hits,
            error_code: None,
            error_reason: None,
            created_at: date_time::now(),
        };
        payments.push(inserted.clone());

        if order.status == OrderStatus::Created {
            order.status = OrderStatus::Attempted;
        }

        Ok((inserted, order.clone()))
    }

    async fn process_payment_transition(
        &self,
        payment_id: i64,
        allowed_from: &[PaymentStatus],
        update: storage::PaymentUpdate,
        order_update: Option<storage::OrderUpdate>,
        events: Vec<storage::WebhookEventNew>,
    ) -> CustomResult<(storage::Payment, storage::Order), errors::StorageError> {
        let mut orders = self.orders.lock().await;
        let mut payments = self.payments.lock().await;

        let payment = payments
            .iter_mut()
            .find(|payment| payment.id == payment_id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "payment {payment_id}"
                )))
            })?;

        if !allowed_from.contains(&payment.status) {
            return Err(report!(errors::StorageError::InvalidTransition {
                entity: "payment",
                current_state: payment.status.to_string(),
                expected: expected_states(allowed_from),
            }));
        }

        *payment = update.apply(payment.clone());
        let payment = payment.clone();

        let order = orders
            .iter_mut()
            .find(|order| order.id == payment.order_id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "order {}",
                    payment.order_id
                )))
            })?;
        if let Some(update) = order_update {
            *order = update.apply(order.clone());
        }
        let order = order.clone();

        self.append_webhook_events(events).await;

        Ok((payment, order))
    }

    async fn find_payment_by_payment_ref(
        &self,
        payment_ref: &str,
    ) -> CustomResult<storage::Payment, errors::StorageError> {
        self.payments
            .lock()
            .await
            .iter()
            .find(|payment| payment.payment_ref == payment_ref)
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "payment {payment_ref}"
                )))
            })
    }

    async fn list_payments_by_order_id(
        &self,
        order_id: i64,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError> {
        Ok(self
            .payments
            .lock()
            .await
            .iter()
            .filter(|payment| payment.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_recent_payments_by_customer_id(
        &self,
        customer_id: &str,
        since: PrimitiveDateTime,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError> {
        Ok(self
            .payments
            .lock()
            .await
            .iter()
            .filter(|payment| {
                payment.customer_id.as_deref() == Some(customer_id)
                    && payment.created_at >= since
            })
            .cloned()
            .collect())
    }

    async fn list_flagged_payments(
        &self,
        limit: i64,
    ) -> CustomResult<Vec<storage::Payment>, errors::StorageError> {
        let payments = self.payments.lock().await;
        let mut flagged: Vec<_> = payments
            .iter()
            .filter(|payment| payment.is_flagged)
            .cloned()
            .collect();
        flagged.sort_by(|a, b| b.id.cmp(&a.id));
        flagged.truncate(limit.unsigned_abs() as usize);
        Ok(flagged)
    }

    async fn get_payment_stats(
        &self,
    ) -> CustomResult<storage::PaymentStats, errors::StorageError> {
        let payments = self.payments.lock().await;
        let mut stats = storage::PaymentStats {
            total_payments: payments.len() as u64,
            ..Default::default()
        };
        for payment in payments.iter() {
            if payment.status.is_post_capture() {
                stats.captured_payments += 1;
                stats.captured_volume += payment.amount;
            }
            if payment.status == PaymentStatus::Failed {
                stats.failed_payments += 1;
            }
            if payment.is_flagged {
                stats.flagged_payments += 1;
            }
        }
        Ok(stats)
    }
}
