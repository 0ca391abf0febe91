//! Authentication objects passed to [`server_wrap`](super::api::server_wrap).
//!
//! Each route group names one of these; the object resolves the request's
//! credentials to a typed principal. Basic credentials resolve to a merchant
//! through the key store, bearer tokens resolve to a dashboard user, and
//! role requirements are part of the object rather than scattered through
//! handlers.

use actix_web::http::header::{self, HeaderMap};
use api_models::enums::UserRole;
use base64::Engine;
use error_stack::{report, ResultExt};
use masking::StrongSecret;

use crate::{
    consts,
    core::{
        api_keys,
        errors::{self, RouterResult, StorageErrorExt},
    },
    routes::AppState,
    services::jwt,
    types::storage,
};

/// Principal attached by Basic (gateway) authentication.
#[derive(Clone, Debug)]
pub struct AuthenticationData {
    pub merchant: storage::Merchant,
}

/// Principal attached by bearer (dashboard) authentication.
#[derive(Clone, Debug)]
pub struct UserFromToken {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
}

/// How the request authenticated, recorded on the request span.
#[derive(Clone, Debug)]
pub enum AuthenticationType {
    ApiKey { merchant_id: String, key_id: String },
    MerchantJwt { user_id: i64 },
    UserJwt { user_id: i64 },
    AdminJwt { user_id: i64 },
    NoAuth,
}

impl AuthenticationType {
    pub fn merchant_id(&self) -> Option<&str> {
        match self {
            Self::ApiKey { merchant_id, .. } => Some(merchant_id),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
pub trait AuthenticateAndFetch<T>: Send + Sync {
    async fn authenticate_and_fetch(
        &self,
        request_headers: &HeaderMap,
        state: &AppState,
    ) -> RouterResult<(T, AuthenticationType)>;
}

/// Public routes: hosted checkout and health.
#[derive(Debug)]
pub struct NoAuth;

#[async_trait::async_trait]
impl AuthenticateAndFetch<()> for NoAuth {
    async fn authenticate_and_fetch(
        &self,
        _request_headers: &HeaderMap,
        _state: &AppState,
    ) -> RouterResult<((), AuthenticationType)> {
        Ok(((), AuthenticationType::NoAuth))
    }
}

/// `Authorization: Basic base64(key_id:key_secret)` on the `/v1/*` gateway
/// surface. Never consults cookies.
#[derive(Debug)]
pub struct ApiKeyAuth;

#[async_trait::async_trait]
impl AuthenticateAndFetch<AuthenticationData> for ApiKeyAuth {
    async fn authenticate_and_fetch(
        &self,
        request_headers: &HeaderMap,
        state: &AppState,
    ) -> RouterResult<(AuthenticationData, AuthenticationType)> {
        let (key_id, key_secret) = extract_basic_credentials(request_headers)?;
        let merchant = api_keys::resolve_api_key(state, &key_id, &key_secret).await?;

        let auth_type = AuthenticationType::ApiKey {
            merchant_id: merchant.merchant_id.clone(),
            key_id,
        };
        Ok((AuthenticationData { merchant }, auth_type))
    }
}

/// Any authenticated dashboard user, role unchecked.
#[derive(Debug)]
pub struct JWTAuth;

#[async_trait::async_trait]
impl AuthenticateAndFetch<UserFromToken> for JWTAuth {
    async fn authenticate_and_fetch(
        &self,
        request_headers: &HeaderMap,
        state: &AppState,
    ) -> RouterResult<(UserFromToken, AuthenticationType)> {
        let user = decode_bearer_token(request_headers, state)?;
        let auth_type = AuthenticationType::UserJwt {
            user_id: user.user_id,
        };
        Ok((user, auth_type))
    }
}

/// A dashboard user with the `merchant` role; used where the merchant row
/// may not exist yet (profile creation).
#[derive(Debug)]
pub struct MerchantJwtAuth;

#[async_trait::async_trait]
impl AuthenticateAndFetch<UserFromToken> for MerchantJwtAuth {
    async fn authenticate_and_fetch(
        &self,
        request_headers: &HeaderMap,
        state: &AppState,
    ) -> RouterResult<(UserFromToken, AuthenticationType)> {
        let user = decode_bearer_token(request_headers, state)?;
        if user.role != UserRole::Merchant {
            return Err(report!(errors::ApiErrorResponse::AccessForbidden));
        }
        let auth_type = AuthenticationType::MerchantJwt {
            user_id: user.user_id,
        };
        Ok((user, auth_type))
    }
}

/// A dashboard user with the `merchant` role plus the merchant row they
/// own; used by `/merchants/me/*`.
#[derive(Debug)]
pub struct MerchantAccountAuth;

#[async_trait::async_trait]
impl AuthenticateAndFetch<(UserFromToken, storage::Merchant)> for MerchantAccountAuth {
    async fn authenticate_and_fetch(
        &self,
        request_headers: &HeaderMap,
        state: &AppState,
    ) -> RouterResult<((UserFromToken, storage::Merchant), AuthenticationType)> {
        let user = decode_bearer_token(request_headers, state)?;
        if user.role != UserRole::Merchant {
            return Err(report!(errors::ApiErrorResponse::AccessForbidden));
        }
        let merchant = state
            .store
            .find_merchant_by_owner_user_id(user.user_id)
            .await
            .to_not_found_response(errors::ApiErrorResponse::MerchantNotFound)?;

        let auth_type = AuthenticationType::MerchantJwt {
            user_id: user.user_id,
        };
        Ok(((user, merchant), auth_type))
    }
}

/// A dashboard user with the `admin` role.
#[derive(Debug)]
pub struct AdminJwtAuth;

#[async_trait::async_trait]
impl AuthenticateAndFetch<UserFromToken> for AdminJwtAuth {
    async fn authenticate_and_fetch(
        &self,
        request_headers: &HeaderMap,
        state: &AppState,
    ) -> RouterResult<(UserFromToken, AuthenticationType)> {
        let user = decode_bearer_token(request_headers, state)?;
        if user.role != UserRole::Admin {
            return Err(report!(errors::ApiErrorResponse::AccessForbidden));
        }
        let auth_type = AuthenticationType::AdminJwt {
            user_id: user.user_id,
        };
        Ok((user, auth_type))
    }
}

fn extract_basic_credentials(
    request_headers: &HeaderMap,
) -> RouterResult<(String, StrongSecret<String>)> {
    let header_value = request_headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| report!(errors::ApiErrorResponse::Unauthenticated))?;

    let encoded = header_value
        .strip_prefix("Basic ")
        .ok_or_else(|| report!(errors::ApiErrorResponse::Unauthenticated))?;

    let decoded = consts::BASE64_ENGINE
        .decode(encoded)
        .change_context(errors::ApiErrorResponse::Unauthenticated)?;
    let decoded =
        String::from_utf8(decoded).change_context(errors::ApiErrorResponse::Unauthenticated)?;

    let (key_id, key_secret) = decoded
        .split_once(':')
        .ok_or_else(|| report!(errors::ApiErrorResponse::Unauthenticated))?;

    Ok((key_id.to_string(), key_secret.to_string().into()))
}

fn decode_bearer_token(
    request_headers: &HeaderMap,
    state: &AppState,
) -> RouterResult<UserFromToken> {
    let token = request_headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| report!(errors::ApiErrorResponse::Unauthenticated))?;

    let claims = jwt::decode_jwt(token, &state.conf)?;
    Ok(UserFromToken {
        user_id: claims.user_id,
        email: claims.sub,
        role: claims.role,
    })
}
