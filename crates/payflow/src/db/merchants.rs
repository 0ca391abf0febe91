use common_utils::date_time;
use error_stack::report;
use masking::PeekInterface;
use time::PrimitiveDateTime;

use super::{MockDb, Store};
use crate::{
    core::errors::{self, CustomResult},
    types::storage,
};

#[async_trait::async_trait]
pub trait MerchantInterface {
    async fn insert_merchant(
        &self,
        merchant: storage::MerchantNew,
    ) -> CustomResult<storage::Merchant, errors::StorageError>;

    async fn find_merchant_by_merchant_id(
        &self,
        merchant_id: &str,
    ) -> CustomResult<storage::Merchant, errors::StorageError>;

    async fn find_merchant_by_owner_user_id(
        &self,
        owner_user_id: i64,
    ) -> CustomResult<storage::Merchant, errors::StorageError>;

    async fn count_merchants(&self) -> CustomResult<u64, errors::StorageError>;
}

#[derive(sqlx::FromRow)]
struct MerchantDbRow {
    merchant_id: String,
    owner_user_id: i64,
    business_name: String,
    business_email: String,
    website: Option<String>,
    webhook_url: Option<String>,
    webhook_secret: String,
    created_at: PrimitiveDateTime,
}

impl From<MerchantDbRow> for storage::Merchant {
    fn from(row: MerchantDbRow) -> Self {
        Self {
            merchant_id: row.merchant_id,
            owner_user_id: row.owner_user_id,
            business_name: row.business_name,
            business_email: row.business_email,
            website: row.website,
            webhook_url: row.webhook_url,
            webhook_secret: row.webhook_secret.into(),
            created_at: row.created_at,
        }
    }
}

#[async_trait::async_trait]
impl MerchantInterface for Store {
    async fn insert_merchant(
        &self,
        merchant: storage::MerchantNew,
    ) -> CustomResult<storage::Merchant, errors::StorageError> {
        let row: MerchantDbRow = sqlx::query_as(
            "INSERT INTO merchants \
             (merchant_id, owner_user_id, business_name, business_email, website, webhook_url, \
              webhook_secret, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&merchant.merchant_id)
        .bind(merchant.owner_user_id)
        .bind(&merchant.business_name)
        .bind(&merchant.business_email)
        .bind(&merchant.website)
        .bind(&merchant.webhook_url)
        .bind(merchant.webhook_secret.peek())
        .bind(date_time::now())
        .fetch_one(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        Ok(row.into())
    }

    async fn find_merchant_by_merchant_id(
        &self,
        merchant_id: &str,
    ) -> CustomResult<storage::Merchant, errors::StorageError> {
        let row: MerchantDbRow = sqlx::query_as("SELECT * FROM merchants WHERE merchant_id = $1")
            .bind(merchant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(errors::StorageError::from)?
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "merchant {merchant_id}"
                )))
            })?;

        Ok(row.into())
    }

    async fn find_merchant_by_owner_user_id(
        &self,
        owner_user_id: i64,
    ) -> CustomResult<storage::Merchant, errors::StorageError> {
        let row: MerchantDbRow =
            sqlx::query_as("SELECT * FROM merchants WHERE owner_user_id = $1")
                .bind(owner_user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(errors::StorageError::from)?
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "merchant owned by user {owner_user_id}"
                    )))
                })?;

        Ok(row.into())
    }

    async fn count_merchants(&self) -> CustomResult<u64, errors::StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM merchants")
            .fetch_one(&self.pool)
            .await
            .map_err(errors::StorageError::from)?;

        Ok(count.unsigned_abs())
    }
}

#[async_trait::async_trait]
impl MerchantInterface for MockDb {
    async fn insert_merchant(
        &self,
        merchant: storage::MerchantNew,
    ) -> CustomResult<storage::Merchant, errors::StorageError> {
        let mut merchants = self.merchants.lock().await;
        if merchants
            .iter()
            .any(|existing| existing.owner_user_id == merchant.owner_user_id)
        {
            return Err(report!(errors::StorageError::DuplicateValue {
                entity: "merchant",
                key: Some(merchant.owner_user_id.to_string()),
            }));
        }
        let merchant = storage::Merchant {
            merchant_id: merchant.merchant_id,
            owner_user_id: merchant.owner_user_id,
            business_name: merchant.business_name,
            business_email: merchant.business_email,
            website: merchant.website,
            webhook_url: merchant.webhook_url,
            webhook_secret: merchant.webhook_secret,
            created_at: date_time::now(),
        };
        merchants.push(merchant.clone());
        Ok(merchant)
    }

    async fn find_merchant_by_merchant_id(
        &self,
        merchant_id: &str,
    ) -> CustomResult<storage::Merchant, errors::StorageError> {
        self.merchants
            .lock()
            .await
            .iter()
            .find(|merchant| merchant.merchant_id == merchant_id)
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "merchant {merchant_id}"
                )))
            })
    }

    async fn find_merchant_by_owner_user_id(
        &self,
        owner_user_id: i64,
    ) -> CustomResult<storage::Merchant, errors::StorageError> {
        self.merchants
            .lock()
            .await
            .iter()
            .find(|merchant| merchant.owner_user_id == owner_user_id)
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "merchant owned by user {owner_user_id}"
                )))
            })
    }

    async fn count_merchants(&self) -> CustomResult<u64, errors::StorageError> {
        Ok(self.merchants.lock().await.len() as u64)
    }
}
