#![allow(clippy::expect_used, clippy::unwrap_used)]

mod utils;

use api_models::enums::{EventType, OrderStatus, PaymentStatus, RefundStatus};
use payflow::{
    core::{errors::ApiErrorResponse, orders, payments, refunds},
    services::ApplicationResponse,
};

#[tokio::test]
async fn upi_payment_captures_and_pays_the_order() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, Some("http://localhost:9/hooks")).await;
    let order = utils::create_order(&state, &merchant, 49_900).await;

    let payment = utils::submit_upi_payment(&state, &order.order_ref, "user@upi").await;
    assert_eq!(payment.status, PaymentStatus::Captured);
    assert!(!payment.is_flagged);
    assert_eq!(payment.amount, 49_900);

    let stored_order = state
        .store
        .find_order_by_order_ref(&order.order_ref)
        .await
        .unwrap();
    assert_eq!(stored_order.status, OrderStatus::Paid);

    let events = state
        .store
        .list_webhook_events_by_merchant_id(&merchant.merchant_id)
        .await
        .unwrap();
    let mut event_names: Vec<EventType> = events.iter().map(|event| event.event).collect();
    event_names.sort_by_key(|event| event.to_string());
    assert_eq!(
        event_names,
        vec![EventType::OrderPaid, EventType::PaymentCaptured]
    );
}

#[tokio::test]
async fn high_value_payment_is_flagged_but_still_captures() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 75_000).await;

    let payment = utils::submit_upi_payment(&state, &order.order_ref, "bigspender@upi").await;
    assert!(payment.is_flagged);
    assert_eq!(payment.status, PaymentStatus::Captured);

    let stored_payment = state
        .store
        .find_payment_by_payment_ref(&payment.payment_ref)
        .await
        .unwrap();
    assert!(stored_payment
        .fraud_rule_hits
        .contains(&"high_value".to_string()));

    let stored_order = state
        .store
        .find_order_by_order_ref(&order.order_ref)
        .await
        .unwrap();
    assert_eq!(stored_order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn duplicate_amount_within_window_flags_the_second_payment() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let first_order = utils::create_order(&state, &merchant, 1_000).await;
    let second_order = utils::create_order(&state, &merchant, 1_000).await;

    let first = utils::submit_upi_payment(&state, &first_order.order_ref, "repeat@upi").await;
    assert!(!first.is_flagged);

    let second = utils::submit_upi_payment(&state, &second_order.order_ref, "repeat@upi").await;
    assert!(second.is_flagged);
    let stored = state
        .store
        .find_payment_by_payment_ref(&second.payment_ref)
        .await
        .unwrap();
    assert!(stored
        .fraud_rule_hits
        .contains(&"duplicate_amount".to_string()));
}

#[tokio::test]
async fn invalid_vpa_is_flagged_and_still_authorized() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 500).await;

    let payment = utils::submit_upi_payment(&state, &order.order_ref, "not-a-vpa").await;
    assert!(payment.is_flagged);
    assert_eq!(payment.status, PaymentStatus::Captured);

    let stored = state
        .store
        .find_payment_by_payment_ref(&payment.payment_ref)
        .await
        .unwrap();
    assert_eq!(stored.fraud_rule_hits, vec!["invalid_vpa".to_string()]);
}

#[tokio::test]
async fn declined_payment_fails_and_the_order_stays_attempted() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 2_500).await;

    let payment = utils::submit_upi_payment(&state, &order.order_ref, "fail@okbank").await;
    assert_eq!(payment.status, PaymentStatus::Failed);

    let stored_payment = state
        .store
        .find_payment_by_payment_ref(&payment.payment_ref)
        .await
        .unwrap();
    assert!(stored_payment.error_code.is_some());

    let stored_order = state
        .store
        .find_order_by_order_ref(&order.order_ref)
        .await
        .unwrap();
    assert_eq!(stored_order.status, OrderStatus::Attempted);

    let events = state
        .store
        .list_webhook_events_by_merchant_id(&merchant.merchant_id)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, EventType::PaymentFailed);

    // A failed attempt does not block a retry.
    let retry = utils::submit_upi_payment(&state, &order.order_ref, "works@okbank").await;
    assert_eq!(retry.status, PaymentStatus::Captured);
}

#[tokio::test]
async fn an_active_payment_blocks_further_attempts() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 3_000).await;

    let first = utils::submit_upi_payment(&state, &order.order_ref, "one@upi").await;
    assert_eq!(first.status, PaymentStatus::Captured);

    let error = payments::payment_submit(
        state.clone(),
        order.order_ref.clone(),
        utils::upi_submit_request("two@upi"),
    )
    .await
    .unwrap_err();
    assert_eq!(error.current_context().error_code(), "conflict");
}

#[tokio::test]
async fn manual_capture_holds_authorization_until_requested() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order_with(&state, &merchant, 10_000, None, false).await;

    let payment = utils::submit_upi_payment(&state, &order.order_ref, "manual@upi").await;
    assert_eq!(payment.status, PaymentStatus::Authorized);

    let stored_order = state
        .store
        .find_order_by_order_ref(&order.order_ref)
        .await
        .unwrap();
    assert_eq!(stored_order.status, OrderStatus::Attempted);
    assert!(state
        .store
        .list_webhook_events_by_merchant_id(&merchant.merchant_id)
        .await
        .unwrap()
        .is_empty());

    let captured = utils::unwrap_json(
        payments::payment_capture(state.clone(), merchant.clone(), payment.payment_ref.clone())
            .await
            .unwrap(),
    );
    assert_eq!(captured.status, PaymentStatus::Captured);

    let stored_order = state
        .store
        .find_order_by_order_ref(&order.order_ref)
        .await
        .unwrap();
    assert_eq!(stored_order.status, OrderStatus::Paid);
    assert_eq!(
        state
            .store
            .list_webhook_events_by_merchant_id(&merchant.merchant_id)
            .await
            .unwrap()
            .len(),
        2
    );

    // Double capture is a no-op returning the same resource.
    let recaptured = utils::unwrap_json(
        payments::payment_capture(state.clone(), merchant.clone(), payment.payment_ref.clone())
            .await
            .unwrap(),
    );
    assert_eq!(recaptured.payment_ref, captured.payment_ref);
    assert_eq!(recaptured.status, PaymentStatus::Captured);
    assert_eq!(
        state
            .store
            .list_webhook_events_by_merchant_id(&merchant.merchant_id)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn partial_refunds_sum_to_at_most_the_payment_amount() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 20_000).await;
    let payment = utils::submit_upi_payment(&state, &order.order_ref, "refundme@upi").await;
    assert_eq!(payment.status, PaymentStatus::Captured);

    let refund_request = |amount: i64| api_models::refunds::RefundCreateRequest {
        amount: Some(amount),
        reason: None,
        notes: None,
        idempotency_key: None,
    };

    let first = utils::unwrap_json(
        refunds::refund_create(
            state.clone(),
            merchant.clone(),
            payment.payment_ref.clone(),
            refund_request(5_000),
        )
        .await
        .unwrap(),
    );
    assert_eq!(first.status, RefundStatus::Processed);
    let stored = state
        .store
        .find_payment_by_payment_ref(&payment.payment_ref)
        .await
        .unwrap();
    assert_eq!(stored.status, PaymentStatus::PartiallyRefunded);

    let second = utils::unwrap_json(
        refunds::refund_create(
            state.clone(),
            merchant.clone(),
            payment.payment_ref.clone(),
            refund_request(15_000),
        )
        .await
        .unwrap(),
    );
    assert_eq!(second.status, RefundStatus::Processed);
    let stored = state
        .store
        .find_payment_by_payment_ref(&payment.payment_ref)
        .await
        .unwrap();
    assert_eq!(stored.status, PaymentStatus::Refunded);

    // Fully refunded payments reject any further refund with a conflict.
    let error = refunds::refund_create(
        state.clone(),
        merchant.clone(),
        payment.payment_ref.clone(),
        refund_request(1),
    )
    .await
    .unwrap_err();
    assert_eq!(error.current_context().error_code(), "conflict");
}

#[tokio::test]
async fn refund_exceeding_balance_is_rejected() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 20_000).await;
    let payment = utils::submit_upi_payment(&state, &order.order_ref, "partial@upi").await;

    let refund = utils::unwrap_json(
        refunds::refund_create(
            state.clone(),
            merchant.clone(),
            payment.payment_ref.clone(),
            api_models::refunds::RefundCreateRequest {
                amount: Some(5_000),
                ..Default::default()
            },
        )
        .await
        .unwrap(),
    );
    assert_eq!(refund.status, RefundStatus::Processed);

    let error = refunds::refund_create(
        state.clone(),
        merchant.clone(),
        payment.payment_ref.clone(),
        api_models::refunds::RefundCreateRequest {
            amount: Some(16_000),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ApiErrorResponse::RefundAmountExceeded
    );
}

#[tokio::test]
async fn identical_refund_requests_with_a_key_sum_only_once() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 10_000).await;
    let payment = utils::submit_upi_payment(&state, &order.order_ref, "dedupe@upi").await;

    let request = api_models::refunds::RefundCreateRequest {
        amount: Some(4_000),
        reason: None,
        notes: None,
        idempotency_key: Some("rfnd-key-1".to_string()),
    };

    let first = utils::unwrap_json(
        refunds::refund_create(
            state.clone(),
            merchant.clone(),
            payment.payment_ref.clone(),
            request.clone(),
        )
        .await
        .unwrap(),
    );
    let second = utils::unwrap_json(
        refunds::refund_create(
            state.clone(),
            merchant.clone(),
            payment.payment_ref.clone(),
            request,
        )
        .await
        .unwrap(),
    );
    assert_eq!(first.refund_ref, second.refund_ref);

    let refunds_list = state
        .store
        .list_refunds_by_payment_id(
            state
                .store
                .find_payment_by_payment_ref(&payment.payment_ref)
                .await
                .unwrap()
                .id,
        )
        .await
        .unwrap();
    assert_eq!(refunds_list.len(), 1);
}

#[tokio::test]
async fn replaying_an_order_create_returns_the_original_row() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;

    let request = api_models::orders::OrderCreateRequest {
        amount: 5_000,
        currency: None,
        receipt: Some("receipt-42".to_string()),
        notes: None,
        idempotency_key: Some("abc".to_string()),
        auto_capture: None,
    };

    let first = utils::unwrap_json(
        orders::create_order(state.clone(), merchant.clone(), request.clone())
            .await
            .unwrap(),
    );

    let second = orders::create_order(state.clone(), merchant.clone(), request.clone())
        .await
        .unwrap();
    match second {
        ApplicationResponse::JsonWithHeaders((order, headers)) => {
            assert_eq!(order.order_ref, first.order_ref);
            assert!(headers
                .iter()
                .any(|(name, value)| name == "X-Idempotent-Replay" && value == "true"));
        }
        _ => panic!("expected an idempotent replay with headers"),
    }

    let stored = state
        .store
        .list_orders_by_merchant_id(&merchant.merchant_id, 100, 0)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn reusing_an_idempotency_key_with_a_different_body_conflicts() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;

    let mut request = api_models::orders::OrderCreateRequest {
        amount: 5_000,
        currency: None,
        receipt: None,
        notes: None,
        idempotency_key: Some("abc".to_string()),
        auto_capture: None,
    };
    utils::unwrap_json(
        orders::create_order(state.clone(), merchant.clone(), request.clone())
            .await
            .unwrap(),
    );

    request.amount = 6_000;
    let error = orders::create_order(state.clone(), merchant.clone(), request)
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ApiErrorResponse::IdempotencyPayloadMismatch
    );
}

#[tokio::test]
async fn cross_merchant_payment_access_is_forbidden() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;
    let other_merchant = utils::seed_merchant(&state, None).await;
    let order = utils::create_order(&state, &merchant, 1_200).await;
    let payment = utils::submit_upi_payment(&state, &order.order_ref, "mine@upi").await;

    let error =
        payments::retrieve_payment(state.clone(), other_merchant, payment.payment_ref.clone())
            .await
            .unwrap_err();
    assert_eq!(error.current_context(), &ApiErrorResponse::AccessForbidden);
}
