//! Error taxonomy of the gateway.
//!
//! `ApiErrorResponse` is the client-facing surface: every variant maps to an
//! HTTP status and a stable machine code, rendered as
//! `{"error": {"code", "message", "details"?}}`. `StorageError` is the
//! storage-layer surface; `StorageErrorExt` adapts between the two at the
//! core boundary.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};

pub use common_utils::errors::CustomResult;

use crate::services;

/// Result alias for core functions.
pub type RouterResult<T> = CustomResult<T, ApiErrorResponse>;

/// Result alias for core functions that terminate a request.
pub type RouterResponse<T> = CustomResult<services::ApplicationResponse<T>, ApiErrorResponse>;

/// Result alias for application startup.
pub type ApplicationResult<T> = CustomResult<T, ApplicationError>;

#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum ApiErrorResponse {
    #[error("missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("{message}")]
    InvalidRequestData { message: String },
    #[error("invalid credentials")]
    Unauthenticated,
    #[error("access to the requested resource is forbidden")]
    AccessForbidden,
    #[error("merchant profile does not exist")]
    MerchantNotFound,
    #[error("user does not exist")]
    UserNotFound,
    #[error("API key does not exist")]
    ApiKeyNotFound,
    #[error("order does not exist")]
    OrderNotFound,
    #[error("payment does not exist")]
    PaymentNotFound,
    #[error("refund does not exist")]
    RefundNotFound,
    #[error("a user with this email already exists")]
    DuplicateUser,
    #[error("a merchant profile already exists for this user")]
    DuplicateMerchant,
    #[error("order is in state {current_state}, which does not permit this operation")]
    OrderUnexpectedState { current_state: String },
    #[error("payment is in state {current_state}, which does not permit this operation")]
    PaymentUnexpectedState { current_state: String },
    #[error("an active payment already exists for this order")]
    ActivePaymentExists,
    #[error("this idempotency key was already used with a different request body")]
    IdempotencyPayloadMismatch,
    #[error("refund amount exceeds the refundable balance of the payment")]
    RefundAmountExceeded,
    #[error("too many requests")]
    RateLimited,
    #[error("something went wrong")]
    InternalServerError,
}

impl ApiErrorResponse {
    /// Stable machine-readable code of the error class.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRequiredField { .. } | Self::InvalidRequestData { .. } => "validation",
            Self::Unauthenticated => "unauthenticated",
            Self::AccessForbidden => "forbidden",
            Self::MerchantNotFound
            | Self::UserNotFound
            | Self::ApiKeyNotFound
            | Self::OrderNotFound
            | Self::PaymentNotFound
            | Self::RefundNotFound => "not_found",
            Self::DuplicateUser
            | Self::DuplicateMerchant
            | Self::OrderUnexpectedState { .. }
            | Self::PaymentUnexpectedState { .. }
            | Self::ActivePaymentExists
            | Self::IdempotencyPayloadMismatch
            | Self::RefundAmountExceeded => "conflict",
            Self::RateLimited => "rate_limited",
            Self::InternalServerError => "internal",
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    error: ErrorInner<'a>,
}

#[derive(serde::Serialize)]
struct ErrorInner<'a> {
    code: &'a str,
    message: String,
}

impl ResponseError for ApiErrorResponse {
    fn status_code(&self) -> StatusCode {
        match self.error_code() {
            "validation" => StatusCode::BAD_REQUEST,
            "unauthenticated" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: ErrorInner {
                code: self.error_code(),
                message: self.to_string(),
            },
        })
    }
}

/// Storage-layer failures. Composite transition operations surface
/// precondition violations here so the row lock and the check share one
/// transaction.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("value not found: {0}")]
    ValueNotFound(String),
    #[error("duplicate {entity}")]
    DuplicateValue {
        entity: &'static str,
        key: Option<String>,
    },
    #[error("{entity} is in state {current_state}, expected one of: {expected}")]
    InvalidTransition {
        entity: &'static str,
        current_state: String,
        expected: String,
    },
    #[error("an active payment already exists for this order")]
    ActivePaymentExists,
    #[error("refund amount exceeds the refundable balance")]
    RefundBalanceExceeded,
    #[error("database error")]
    DatabaseError,
    #[error("failed to de/serialize a stored value")]
    SerializationFailed,
}

impl StorageError {
    pub fn is_db_not_found(&self) -> bool {
        matches!(self, Self::ValueNotFound(_))
    }

    pub fn is_db_unique_violation(&self) -> bool {
        matches!(self, Self::DuplicateValue { .. })
    }

    /// Transient errors worth retrying within the same request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DatabaseError)
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::ValueNotFound("row not found".to_string()),
            sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23505") => {
                Self::DuplicateValue {
                    entity: "row",
                    key: db_error.constraint().map(ToOwned::to_owned),
                }
            }
            _ => Self::DatabaseError,
        }
    }
}

/// Adapters from storage errors to API errors, applied at the core boundary.
pub trait StorageErrorExt<T> {
    /// Map not-found onto the given API error, everything else onto 500.
    fn to_not_found_response(self, not_found_response: ApiErrorResponse) -> RouterResult<T>;
    /// Map unique-violation onto the given API error, everything else onto
    /// 500.
    fn to_duplicate_response(self, duplicate_response: ApiErrorResponse) -> RouterResult<T>;
}

impl<T> StorageErrorExt<T> for CustomResult<T, StorageError> {
    fn to_not_found_response(self, not_found_response: ApiErrorResponse) -> RouterResult<T> {
        self.map_err(|error| {
            if error.current_context().is_db_not_found() {
                error.change_context(not_found_response)
            } else {
                error.change_context(ApiErrorResponse::InternalServerError)
            }
        })
    }

    fn to_duplicate_response(self, duplicate_response: ApiErrorResponse) -> RouterResult<T> {
        self.map_err(|error| {
            if error.current_context().is_db_unique_violation() {
                error.change_context(duplicate_response)
            } else {
                error.change_context(ApiErrorResponse::InternalServerError)
            }
        })
    }
}

/// Failures during application startup: bad configuration or an unusable
/// database. The binary exits non-zero on any of these.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("invalid configuration value: {0}")]
    InvalidConfigurationValueError(String),
    #[error("failed to read configuration")]
    ConfigurationError,
    #[error("failed to connect to the database")]
    DatabaseConnectionError,
    #[error("failed to run database migrations")]
    MigrationError,
    #[error("failed to construct the outbound HTTP client")]
    ApiClientError,
    #[error("failed to start the HTTP server")]
    ServerError,
}
