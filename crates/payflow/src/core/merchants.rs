use api_models::{checkout, merchants};
use common_utils::{crypto, fp_utils::when};
use error_stack::{report, ResultExt};
use payflow_env::{instrument, tracing};

use crate::{
    consts,
    core::errors::{self, RouterResponse, StorageErrorExt},
    routes::AppState,
    services::{self, authentication::UserFromToken},
    types::{storage, transformers},
};

fn validate_webhook_url(webhook_url: Option<&str>) -> errors::RouterResult<()> {
    if let Some(url) = webhook_url {
        when(
            !(url.starts_with("http://") || url.starts_with("https://")),
            || {
                Err(report!(errors::ApiErrorResponse::InvalidRequestData {
                    message: "webhook_url must be an http(s) URL".to_string(),
                }))
            },
        )?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_merchant(
    state: AppState,
    user: UserFromToken,
    request: merchants::MerchantCreateRequest,
) -> RouterResponse<merchants::MerchantResponse> {
    when(request.business_name.trim().is_empty(), || {
        Err(report!(errors::ApiErrorResponse::MissingRequiredField {
            field_name: "business_name",
        }))
    })?;
    when(!request.business_email.contains('@'), || {
        Err(report!(errors::ApiErrorResponse::InvalidRequestData {
            message: "business_email must be a valid email address".to_string(),
        }))
    })?;
    validate_webhook_url(request.webhook_url.as_deref())?;

    let webhook_secret = hex::encode(
        crypto::generate_cryptographically_secure_random_bytes::<
            { common_utils::consts::WEBHOOK_SECRET_LENGTH },
        >()
        .change_context(errors::ApiErrorResponse::InternalServerError)?,
    );

    let merchant = state
        .store
        .insert_merchant(storage::MerchantNew {
            merchant_id: common_utils::generate_id_with_default_len(consts::MERCHANT_ID_PREFIX),
            owner_user_id: user.user_id,
            business_name: request.business_name,
            business_email: request.business_email,
            website: request.website,
            webhook_url: request.webhook_url,
            webhook_secret: webhook_secret.into(),
        })
        .await
        .to_duplicate_response(errors::ApiErrorResponse::DuplicateMerchant)?;

    // The only response that reveals the webhook signing secret.
    Ok(services::ApplicationResponse::Json(
        transformers::merchant_response(merchant, true),
    ))
}

#[instrument(skip_all)]
pub async fn retrieve_merchant(
    _state: AppState,
    merchant: storage::Merchant,
) -> RouterResponse<merchants::MerchantResponse> {
    Ok(services::ApplicationResponse::Json(
        transformers::merchant_response(merchant, false),
    ))
}

/// PNG of the hosted-checkout URL for this merchant, scannable at a
/// point of sale.
#[instrument(skip_all)]
pub async fn merchant_qr_code(
    state: AppState,
    merchant: storage::Merchant,
) -> RouterResponse<()> {
    let checkout_url = format!(
        "{}/pay?merchant={}",
        state.conf.checkout.frontend_url.trim_end_matches('/'),
        merchant.merchant_id
    );

    let code = qrcode::QrCode::new(checkout_url.as_bytes())
        .change_context(errors::ApiErrorResponse::InternalServerError)
        .attach_printable("failed to encode checkout URL")?;
    let rendered = code.render::<image::Luma<u8>>().build();

    let mut png_bytes = Vec::new();
    image::DynamicImage::ImageLuma8(rendered)
        .write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )
        .change_context(errors::ApiErrorResponse::InternalServerError)
        .attach_printable("failed to render QR code PNG")?;

    Ok(services::ApplicationResponse::FileData((
        png_bytes,
        "image/png".to_string(),
    )))
}

/// Public display info consumed by the hosted checkout page.
#[instrument(skip_all)]
pub async fn checkout_display_info(
    state: AppState,
    order_ref: String,
) -> RouterResponse<checkout::CheckoutInfoResponse> {
    let order = state
        .store
        .find_order_by_order_ref(&order_ref)
        .await
        .to_not_found_response(errors::ApiErrorResponse::OrderNotFound)?;
    let merchant = state
        .store
        .find_merchant_by_merchant_id(&order.merchant_id)
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;

    Ok(services::ApplicationResponse::Json(
        checkout::CheckoutInfoResponse {
            business_name: merchant.business_name,
            website: merchant.website,
            order: checkout::CheckoutOrderSummary {
                order_ref: order.order_ref,
                amount: order.amount,
                currency: order.currency,
                status: order.status,
            },
        },
    ))
}
