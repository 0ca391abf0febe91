use common_utils::{date_time, ext_traits::StringExt};
use error_stack::{report, ResultExt};
use masking::{PeekInterface, Secret};
use time::PrimitiveDateTime;

use super::{MockDb, Store};
use crate::{
    core::errors::{self, CustomResult},
    types::storage,
};

#[async_trait::async_trait]
pub trait UserInterface {
    async fn insert_user(
        &self,
        user: storage::UserNew,
    ) -> CustomResult<storage::User, errors::StorageError>;

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> CustomResult<storage::User, errors::StorageError>;

    async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: Secret<String>,
    ) -> CustomResult<storage::User, errors::StorageError>;
}

#[derive(sqlx::FromRow)]
struct UserDbRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: PrimitiveDateTime,
}

impl TryFrom<UserDbRow> for storage::User {
    type Error = error_stack::Report<errors::StorageError>;

    fn try_from(row: UserDbRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash.into(),
            role: row
                .role
                .parse_enum("UserRole")
                .change_context(errors::StorageError::SerializationFailed)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserInterface for Store {
    async fn insert_user(
        &self,
        user: storage::UserNew,
    ) -> CustomResult<storage::User, errors::StorageError> {
        let row: UserDbRow = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.password_hash.peek())
        .bind(user.role.to_string())
        .bind(date_time::now())
        .fetch_one(&self.pool)
        .await
        .map_err(errors::StorageError::from)?;

        row.try_into()
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> CustomResult<storage::User, errors::StorageError> {
        let row: UserDbRow = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(errors::StorageError::from)?
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "user with email {email}"
                )))
            })?;

        row.try_into()
    }

    async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: Secret<String>,
    ) -> CustomResult<storage::User, errors::StorageError> {
        let row: UserDbRow =
            sqlx::query_as("UPDATE users SET password_hash = $2 WHERE id = $1 RETURNING *")
                .bind(user_id)
                .bind(password_hash.peek())
                .fetch_optional(&self.pool)
                .await
                .map_err(errors::StorageError::from)?
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "user with id {user_id}"
                    )))
                })?;

        row.try_into()
    }
}

#[async_trait::async_trait]
impl UserInterface for MockDb {
    async fn insert_user(
        &self,
        user: storage::UserNew,
    ) -> CustomResult<storage::User, errors::StorageError> {
        let mut users = self.users.lock().await;
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(report!(errors::StorageError::DuplicateValue {
                entity: "user",
                key: Some(user.email),
            }));
        }
        let user = storage::User {
            id: self.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: date_time::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> CustomResult<storage::User, errors::StorageError> {
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "user with email {email}"
                )))
            })
    }

    async fn update_user_password(
        &self,
        user_id: i64,
        password_hash: Secret<String>,
    ) -> CustomResult<storage::User, errors::StorageError> {
        self.users
            .lock()
            .await
            .iter_mut()
            .find(|user| user.id == user_id)
            .map(|user| {
                user.password_hash = password_hash;
                user.clone()
            })
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "user with id {user_id}"
                )))
            })
    }
}
