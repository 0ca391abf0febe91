#![allow(clippy::expect_used, clippy::unwrap_used)]

mod utils;

use api_models::enums::UserRole;
use masking::PeekInterface;
use payflow::{
    core::{api_keys, errors::ApiErrorResponse, users},
    services::jwt,
};

#[tokio::test]
async fn issued_key_resolves_to_its_merchant() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;

    let issued = utils::unwrap_json(
        api_keys::create_api_key(
            state.clone(),
            merchant.clone(),
            api_models::merchants::ApiKeyCreateRequest {
                label: "production backend".to_string(),
            },
        )
        .await
        .unwrap(),
    );
    assert!(issued.key_id.starts_with("pf_key_"));
    assert!(issued.key_secret.peek().starts_with("pf_sec_"));

    let resolved = api_keys::resolve_api_key(
        &state,
        &issued.key_id,
        &issued.key_secret.peek().clone().into(),
    )
    .await
    .unwrap();
    assert_eq!(resolved.merchant_id, merchant.merchant_id);

    let stored = state
        .store
        .find_api_key_by_key_id(&issued.key_id)
        .await
        .unwrap();
    assert!(stored.last_used_at.is_some());
}

#[tokio::test]
async fn wrong_secret_and_unknown_key_fail_the_same_way() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;

    let issued = utils::unwrap_json(
        api_keys::create_api_key(
            state.clone(),
            merchant,
            api_models::merchants::ApiKeyCreateRequest {
                label: "test".to_string(),
            },
        )
        .await
        .unwrap(),
    );

    let wrong_secret = api_keys::resolve_api_key(
        &state,
        &issued.key_id,
        &"pf_sec_wrong".to_string().into(),
    )
    .await
    .unwrap_err();
    assert_eq!(
        wrong_secret.current_context(),
        &ApiErrorResponse::Unauthenticated
    );

    let unknown_key = api_keys::resolve_api_key(
        &state,
        "pf_key_doesnotexist",
        &"pf_sec_whatever".to_string().into(),
    )
    .await
    .unwrap_err();
    assert_eq!(
        unknown_key.current_context(),
        &ApiErrorResponse::Unauthenticated
    );
}

#[tokio::test]
async fn revoked_key_fails_on_the_next_request() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;

    let issued = utils::unwrap_json(
        api_keys::create_api_key(
            state.clone(),
            merchant.clone(),
            api_models::merchants::ApiKeyCreateRequest {
                label: "short lived".to_string(),
            },
        )
        .await
        .unwrap(),
    );
    let secret = issued.key_secret.peek().clone();

    api_keys::resolve_api_key(&state, &issued.key_id, &secret.clone().into())
        .await
        .expect("key should resolve before revocation");

    utils::unwrap_json(
        api_keys::revoke_api_key(state.clone(), merchant, issued.key_id.clone())
            .await
            .unwrap(),
    );

    let error = api_keys::resolve_api_key(&state, &issued.key_id, &secret.into())
        .await
        .unwrap_err();
    assert_eq!(error.current_context(), &ApiErrorResponse::Unauthenticated);
}

#[tokio::test]
async fn signup_and_login_round_trip_issues_a_decodable_token() {
    let state = utils::app_state();

    let signed_up = utils::unwrap_json(
        users::user_signup(
            state.clone(),
            api_models::users::SignUpRequest {
                name: "Asha".to_string(),
                email: "Asha@Example.com".to_string(),
                password: "correct-horse-battery".to_string().into(),
                role: Some(UserRole::Merchant),
            },
        )
        .await
        .unwrap(),
    );
    assert_eq!(signed_up.email, "asha@example.com");

    let login = utils::unwrap_json(
        users::user_login(
            state.clone(),
            api_models::users::LoginRequest {
                email: "asha@example.com".to_string(),
                password: "correct-horse-battery".to_string().into(),
            },
        )
        .await
        .unwrap(),
    );

    let claims = jwt::decode_jwt(login.access_token.peek(), &state.conf).unwrap();
    assert_eq!(claims.sub, "asha@example.com");
    assert_eq!(claims.role, UserRole::Merchant);
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn login_with_a_wrong_password_is_rejected() {
    let state = utils::app_state();

    utils::unwrap_json(
        users::user_signup(
            state.clone(),
            api_models::users::SignUpRequest {
                name: "Sam".to_string(),
                email: "sam@example.com".to_string(),
                password: "a-long-password".to_string().into(),
                role: None,
            },
        )
        .await
        .unwrap(),
    );

    let error = users::user_login(
        state.clone(),
        api_models::users::LoginRequest {
            email: "sam@example.com".to_string(),
            password: "not-the-password".to_string().into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(error.current_context(), &ApiErrorResponse::Unauthenticated);
}

#[tokio::test]
async fn a_second_signup_with_the_same_email_conflicts() {
    let state = utils::app_state();
    let request = api_models::users::SignUpRequest {
        name: "Dup".to_string(),
        email: "dup@example.com".to_string(),
        password: "a-long-password".to_string().into(),
        role: None,
    };

    utils::unwrap_json(users::user_signup(state.clone(), request.clone()).await.unwrap());

    let error = users::user_signup(state, request).await.unwrap_err();
    assert_eq!(error.current_context(), &ApiErrorResponse::DuplicateUser);
}
