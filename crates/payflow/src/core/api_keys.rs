//! Merchant API credential issuance and resolution.
//!
//! The plaintext secret exists only in the issuance response; the row
//! stores an adaptive hash. Resolution deliberately collapses every failure
//! mode (unknown key id, revoked key, wrong secret) into one generic
//! authentication error, and burns equivalent verification work when the
//! lookup itself fails so timing does not distinguish them either.

use api_models::merchants;
use common_utils::date_time;
use error_stack::report;
use masking::{PeekInterface, StrongSecret};
use payflow_env::{instrument, logger, tracing};

use crate::{
    consts,
    core::errors::{self, RouterResponse, RouterResult},
    routes::AppState,
    services,
    types::storage,
    utils::password,
};

#[instrument(skip_all)]
pub async fn create_api_key(
    state: AppState,
    merchant: storage::Merchant,
    request: merchants::ApiKeyCreateRequest,
) -> RouterResponse<merchants::ApiKeyCreateResponse> {
    let key_id = common_utils::generate_id_with_default_len(consts::API_KEY_ID_PREFIX);
    let key_secret =
        common_utils::generate_id(consts::API_KEY_SECRET_LENGTH, consts::API_KEY_SECRET_PREFIX);
    let key_secret_hash = password::generate_hash(&key_secret)?;

    let api_key = state
        .store
        .insert_api_key(storage::ApiKeyNew {
            key_id,
            merchant_id: merchant.merchant_id,
            key_secret_hash: key_secret_hash.into(),
            label: request.label,
        })
        .await
        .map_err(|error| error.change_context(errors::ApiErrorResponse::InternalServerError))?;

    Ok(services::ApplicationResponse::Json(
        merchants::ApiKeyCreateResponse {
            key_id: api_key.key_id,
            key_secret: key_secret.into(),
            label: api_key.label,
            active: api_key.active,
            created_at: api_key.created_at,
        },
    ))
}

/// Resolve Basic credentials to the owning merchant.
#[instrument(skip_all)]
pub async fn resolve_api_key(
    state: &AppState,
    key_id: &str,
    key_secret: &StrongSecret<String>,
) -> RouterResult<storage::Merchant> {
    let api_key = match state.store.find_api_key_by_key_id(key_id).await {
        Ok(api_key) => api_key,
        Err(error) if error.current_context().is_db_not_found() => {
            password::burn_verification_time(key_secret);
            return Err(error.change_context(errors::ApiErrorResponse::Unauthenticated));
        }
        Err(error) => {
            return Err(error.change_context(errors::ApiErrorResponse::InternalServerError))
        }
    };

    // Verify before the active check so a revoked key costs the same time
    // as a wrong secret.
    let secret_matches = password::is_correct(key_secret, api_key.key_secret_hash.peek());
    if !secret_matches || !api_key.active {
        return Err(report!(errors::ApiErrorResponse::Unauthenticated));
    }

    // Best-effort; auth must not fail because this write did.
    if let Err(error) = state
        .store
        .update_api_key_last_used(&api_key.key_id, date_time::now())
        .await
    {
        logger::warn!(?error, key_id = %api_key.key_id, "failed to bump last_used_at");
    }

    state
        .store
        .find_merchant_by_merchant_id(&api_key.merchant_id)
        .await
        .map_err(|error| error.change_context(errors::ApiErrorResponse::InternalServerError))
}

#[instrument(skip_all)]
pub async fn revoke_api_key(
    state: AppState,
    merchant: storage::Merchant,
    key_id: String,
) -> RouterResponse<merchants::ApiKeyRevokeResponse> {
    let revoked = state
        .store
        .revoke_api_key(&merchant.merchant_id, &key_id)
        .await
        .map_err(|error| error.change_context(errors::ApiErrorResponse::InternalServerError))?;

    if !revoked {
        // Distinguish an unknown key from an idempotent re-revocation.
        let existing = state
            .store
            .find_api_key_by_key_id(&key_id)
            .await
            .map_err(|error| error.change_context(errors::ApiErrorResponse::ApiKeyNotFound))?;
        if existing.merchant_id != merchant.merchant_id {
            return Err(report!(errors::ApiErrorResponse::ApiKeyNotFound));
        }
    }

    Ok(services::ApplicationResponse::Json(
        merchants::ApiKeyRevokeResponse {
            key_id,
            revoked: true,
        },
    ))
}
