use api_models::users;
use common_utils::fp_utils::when;
use error_stack::{report, ResultExt};
use masking::{ExposeInterface, PeekInterface};
use payflow_env::{instrument, tracing};

use crate::{
    core::errors::{self, RouterResponse, StorageErrorExt},
    routes::AppState,
    services::{self, authentication::UserFromToken, jwt},
    types::{storage, transformers::ForeignInto},
    utils::password,
};

const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_email(email: &str) -> errors::RouterResult<()> {
    when(!email.contains('@') || email.len() < 3, || {
        Err(report!(errors::ApiErrorResponse::InvalidRequestData {
            message: "a valid email address is required".to_string(),
        }))
    })
}

#[instrument(skip_all)]
pub async fn user_signup(
    state: AppState,
    request: users::SignUpRequest,
) -> RouterResponse<users::UserResponse> {
    validate_email(&request.email)?;
    when(request.name.trim().is_empty(), || {
        Err(report!(errors::ApiErrorResponse::MissingRequiredField {
            field_name: "name",
        }))
    })?;
    when(request.password.peek().len() < MIN_PASSWORD_LENGTH, || {
        Err(report!(errors::ApiErrorResponse::InvalidRequestData {
            message: format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        }))
    })?;

    let password_hash = password::generate_hash(request.password.peek())?;
    let user = state
        .store
        .insert_user(storage::UserNew {
            name: request.name,
            email: request.email.to_lowercase(),
            password_hash: password_hash.into(),
            role: request.role.unwrap_or_default(),
        })
        .await
        .to_duplicate_response(errors::ApiErrorResponse::DuplicateUser)?;

    Ok(services::ApplicationResponse::Json(user.foreign_into()))
}

#[instrument(skip_all)]
pub async fn user_login(
    state: AppState,
    request: users::LoginRequest,
) -> RouterResponse<users::LoginResponse> {
    let candidate = request.password.expose().into();

    let user = match state
        .store
        .find_user_by_email(&request.email.to_lowercase())
        .await
    {
        Ok(user) => user,
        Err(error) if error.current_context().is_db_not_found() => {
            password::burn_verification_time(&candidate);
            return Err(error.change_context(errors::ApiErrorResponse::Unauthenticated));
        }
        Err(error) => {
            return Err(error.change_context(errors::ApiErrorResponse::InternalServerError))
        }
    };

    when(
        !password::is_correct(&candidate, user.password_hash.peek()),
        || Err(report!(errors::ApiErrorResponse::Unauthenticated)),
    )?;

    let access_token = jwt::generate_jwt(&user, &state.conf)?;
    Ok(services::ApplicationResponse::Json(users::LoginResponse {
        access_token: access_token.into(),
        token_type: "bearer".to_string(),
    }))
}

#[instrument(skip_all)]
pub async fn change_password(
    state: AppState,
    user_from_token: UserFromToken,
    request: users::ChangePasswordRequest,
) -> RouterResponse<()> {
    let user = state
        .store
        .find_user_by_email(&user_from_token.email)
        .await
        .to_not_found_response(errors::ApiErrorResponse::UserNotFound)?;

    let old_password = request.old_password.expose().into();
    when(
        !password::is_correct(&old_password, user.password_hash.peek()),
        || Err(report!(errors::ApiErrorResponse::Unauthenticated)),
    )?;
    when(request.new_password.peek().len() < MIN_PASSWORD_LENGTH, || {
        Err(report!(errors::ApiErrorResponse::InvalidRequestData {
            message: format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        }))
    })?;

    let new_hash = password::generate_hash(request.new_password.peek())?;
    state
        .store
        .update_user_password(user.id, new_hash.into())
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;

    Ok(services::ApplicationResponse::StatusOk)
}
