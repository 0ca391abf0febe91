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
pub trait ApiKeyInterface {
    async fn insert_api_key(
        &self,
        api_key: storage::ApiKeyNew,
    ) -> CustomResult<storage::ApiKey, errors::StorageError>;

    async fn find_api_key_by_key_id(
        &self,
        key_id: &str,
    ) -> CustomResult<storage::ApiKey, errors::StorageError>;

    /// Returns whether a key was revoked. Revoking an already revoked key
    /// reports `false`.
    async fn revoke_api_key(
        &self,
        merchant_id: &str,
        key_id: &str,
    ) -> CustomResult<bool, errors::StorageError>;

    async fn update_api_key_last_used(
        &self,
        key_id: &str,
        last_used_at: PrimitiveDateTime,
    ) -> CustomResult<(), errors::StorageError>;
}

#[derive(sqlx::FromRow)]
struct ApiKeyDbRow {
    key_id: String,
    merchant_id: String,
    key_secret_hash: String,
    label: String,
    active: bool,
    created_at: PrimitiveDateTime,
    last_used_at: Option<PrimitiveDateTime>,
}

impl From<ApiKeyDbRow> for storage::ApiKey {
    fn from(row: ApiKeyDbRow) -> Self {
        Self {
            key_id: row.key_id,
            merchant_id: row.merchant_id,
            key_secret_hash: row.key_secret_hash.into(),
            label: row.label,
            active: row.active,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

#[async_trait::async_trait]
impl ApiKeyInterface for Store {
    async fn insert_api_key(
        &self,
        api_key: storage::ApiKeyNew,
    ) -> CustomResult<storage::ApiKey, errors::StorageError> {
        let row: ApiKeyDbRow = sqlx::query_as(
            "INSERT INTO api_keys (key_id, merchant_id, key_secret_hash, label, active, created_at) \
             VALUES ($1, $2, $3, $4, TRUE, $5) RETURNING *",
        )
        .bind(&api_key.key_id)
        .bind(&api_key.merchant_id)
        .bind(api_key.key_secret_hash.peek())
        .bind(&api_key.label)
        .bind(date_time::now())
        .fetch_one(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        Ok(row.into())
    }

    async fn find_api_key_by_key_id(
        &self,
        key_id: &str,
    ) -> CustomResult<storage::ApiKey, errors::StorageError> {
        let row: ApiKeyDbRow = sqlx::query_as("SELECT * FROM api_keys WHERE key_id = $1")
            .bind(key_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(errors::StorageError::from)?
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "api key {key_id}"
                )))
            })?;

        Ok(row.into())
    }

    async fn revoke_api_key(
        &self,
        merchant_id: &str,
        key_id: &str,
    ) -> CustomResult<bool, errors::StorageError> {
        let result = sqlx::query(
            "UPDATE api_keys SET active = FALSE \
             WHERE key_id = $1 AND merchant_id = $2 AND active",
        )
        .bind(key_id)
        .bind(merchant_id)
        .execute(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_api_key_last_used(
        &self,
        key_id: &str,
        last_used_at: PrimitiveDateTime,
    ) -> CustomResult<(), errors::StorageError> {
        sqlx::query("UPDATE api_keys SET last_used_at = $2 WHERE key_id = $1")
            .bind(key_id)
            .bind(last_used_at)
            .execute(&self.pool)
            .await
            .map_err(errors::StorageError::from)?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ApiKeyInterface for MockDb {
    async fn insert_api_key(
        &self,
        api_key: storage::ApiKeyNew,
    ) -> CustomResult<storage::ApiKey, errors::StorageError> {
        let api_key = storage::ApiKey {
            key_id: api_key.key_id,
            merchant_id: api_key.merchant_id,
            key_secret_hash: api_key.key_secret_hash,
            label: api_key.label,
            active: true,
            created_at: date_time::now(),
            last_used_at: None,
        };
        self.api_keys.lock().await.push(api_key.clone());
        Ok(api_key)
    }

    async fn find_api_key_by_key_id(
        &self,
        key_id: &str,
    ) -> CustomResult<storage::ApiKey, errors::StorageError> {
        self.api_keys
            .lock()
            .await
            .iter()
            .find(|api_key| api_key.key_id == key_id)
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "api key {key_id}"
                )))
            })
    }

    async fn revoke_api_key(
        &self,
        merchant_id: &str,
        key_id: &str,
    ) -> CustomResult<bool, errors::StorageError> {
        Ok(self
            .api_keys
            .lock()
            .await
            .iter_mut()
            .find(|api_key| {
                api_key.key_id == key_id && api_key.merchant_id == merchant_id && api_key.active
            })
            .map(|api_key| {
                api_key.active = false;
            })
            .is_some())
    }

    async fn update_api_key_last_used(
        &self,
        key_id: &str,
        last_used_at: PrimitiveDateTime,
    ) -> CustomResult<(), errors::StorageError> {
        if let Some(api_key) = self
            .api_keys
            .lock()
            .await
            .iter_mut()
            .find(|api_key| api_key.key_id == key_id)
        {
            api_key.last_used_at = Some(last_used_at);
        }
        Ok(())
    }
}
