use common_utils::{date_time, ext_traits::StringExt};
use error_stack::{report, ResultExt};
use time::PrimitiveDateTime;

use super::{MockDb, Store};
use crate::{
    core::errors::{self, CustomResult},
    types::storage,
};

#[async_trait::async_trait]
pub trait OrderInterface {
    /// Insert a fresh order in state `created`. A reused
    /// `(merchant_id, idempotency_key)` pair surfaces as a unique violation;
    /// the caller decides between replay and conflict.
    async fn insert_order(
        &self,
        order: storage::OrderNew,
    ) -> CustomResult<storage::Order, errors::StorageError>;

    async fn find_order_by_order_ref(
        &self,
        order_ref: &str,
    ) -> CustomResult<storage::Order, errors::StorageError>;

    async fn find_order_by_merchant_id_idempotency_key(
        &self,
        merchant_id: &str,
        idempotency_key: &str,
    ) -> CustomResult<storage::Order, errors::StorageError>;

    async fn list_orders_by_merchant_id(
        &self,
        merchant_id: &str,
        limit: i64,
        offset: i64,
    ) -> CustomResult<Vec<storage::Order>, errors::StorageError>;

    async fn count_orders(&self) -> CustomResult<u64, errors::StorageError>;
}

#[derive(sqlx::FromRow)]
pub(super) struct OrderDbRow {
    pub id: i64,
    pub order_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub auto_capture: bool,
    pub idempotency_key: String,
    pub created_at: PrimitiveDateTime,
}

impl TryFrom<OrderDbRow> for storage::Order {
    type Error = error_stack::Report<errors::StorageError>;

    fn try_from(row: OrderDbRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_ref: row.order_ref,
            merchant_id: row.merchant_id,
            amount: row.amount,
            currency: row
                .currency
                .parse_enum("Currency")
                .change_context(errors::StorageError::SerializationFailed)?,
            receipt: row.receipt,
            notes: row.notes,
            status: row
                .status
                .parse_enum("OrderStatus")
                .change_context(errors::StorageError::SerializationFailed)?,
            auto_capture: row.auto_capture,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
        })
    }
}

#[async_trait::async_trait]
impl OrderInterface for Store {
    async fn insert_order(
        &self,
        order: storage::OrderNew,
    ) -> CustomResult<storage::Order, errors::StorageError> {
        let row: OrderDbRow = sqlx::query_as(
            "INSERT INTO orders \
             (order_ref, merchant_id, amount, currency, receipt, notes, status, auto_capture, \
              idempotency_key, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'created', $7, $8, $9) RETURNING *",
        )
        .bind(&order.order_ref)
        .bind(&order.merchant_id)
        .bind(order.amount)
        .bind(order.currency.to_string())
        .bind(&order.receipt)
        .bind(&order.notes)
        .bind(order.auto_capture)
        .bind(&order.idempotency_key)
        .bind(date_time::now())
        .fetch_one(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        row.try_into()
    }

    async fn find_order_by_order_ref(
        &self,
        order_ref: &str,
    ) -> CustomResult<storage::Order, errors::StorageError> {
        let row: OrderDbRow = sqlx::query_as("SELECT * FROM orders WHERE order_ref = $1")
            .bind(order_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(errors::StorageError::from)?
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "order {order_ref}"
                )))
            })?;

        row.try_into()
    }

    async fn find_order_by_merchant_id_idempotency_key(
        &self,
        merchant_id: &str,
        idempotency_key: &str,
    ) -> CustomResult<storage::Order, errors::StorageError> {
        let row: OrderDbRow = sqlx::query_as(
            "SELECT * FROM orders WHERE merchant_id = $1 AND idempotency_key = $2",
        )
        .bind(merchant_id)
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(errors::StorageError::from)?
        .ok_or_else(|| {
            report!(errors::StorageError::ValueNotFound(format!(
                "order with idempotency key {idempotency_key}"
            )))
        })?;

        row.try_into()
    }

    async fn list_orders_by_merchant_id(
        &self,
        merchant_id: &str,
        limit: i64,
        offset: i64,
    ) -> CustomResult<Vec<storage::Order>, errors::StorageError> {
        let rows: Vec<OrderDbRow> = sqlx::query_as(
            "SELECT * FROM orders WHERE merchant_id = $1 \
             ORDER BY id DESC LIMIT $2 OFFSET $3",
        )
        .bind(merchant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_orders(&self) -> CustomResult<u64, errors::StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await
            .map_err(errors::StorageError::from)?;

        Ok(count.unsigned_abs())
    }
}

#[async_trait::async_trait]
impl OrderInterface for MockDb {
    async fn insert_order(
        &self,
        order: storage::OrderNew,
    ) -> CustomResult<storage::Order, errors::StorageError> {
        let mut orders = self.orders.lock().await;
        if orders.iter().any(|existing| {
            existing.merchant_id == order.merchant_id
                && existing.idempotency_key == order.idempotency_key
        }) {
            return Err(report!(errors::StorageError::DuplicateValue {
                entity: "order",
                key: Some(order.idempotency_key),
            }));
        }
        let order = storage::Order {
            id: self.next_id(),
            order_ref: order.order_ref,
            merchant_id: order.merchant_id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
            notes: order.notes,
            status: api_models::enums::OrderStatus::Created,
            auto_capture: order.auto_capture,
            idempotency_key: order.idempotency_key,
            created_at: date_time::now(),
        };
        orders.push(order.clone());
        Ok(order)
    }

    async fn find_order_by_order_ref(
        &self,
        order_ref: &str,
    ) -> CustomResult<storage::Order, errors::StorageError> {
        self.orders
            .lock()
            .await
            .iter()
            .find(|order| order.order_ref == order_ref)
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "order {order_ref}"
                )))
            })
    }

    async fn find_order_by_merchant_id_idempotency_key(
        &self,
        merchant_id: &str,
        idempotency_key: &str,
    ) -> CustomResult<storage::Order, errors::StorageError> {
        self.orders
            .lock()
            .await
            .iter()
            .find(|order| {
                order.merchant_id == merchant_id && order.idempotency_key == idempotency_key
            })
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "order with idempotency key {idempotency_key}"
                )))
            })
    }

    async fn list_orders_by_merchant_id(
        &self,
        merchant_id: &str,
        limit: i64,
        offset: i64,
    ) -> CustomResult<Vec<storage::Order>, errors::StorageError> {
        let orders = self.orders.lock().await;
        let mut matching: Vec<_> = orders
            .iter()
            .filter(|order| order.merchant_id == merchant_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(matching
            .into_iter()
            .skip(offset.unsigned_abs() as usize)
            .take(limit.unsigned_abs() as usize)
            .collect())
    }

    async fn count_orders(&self) -> CustomResult<u64, errors::StorageError> {
        Ok(self.orders.lock().await.len() as u64)
    }
}
