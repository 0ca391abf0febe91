//! HS256 token mint and verification for the dashboard surface.

use api_models::enums::UserRole;
use common_utils::date_time;
use error_stack::ResultExt;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use masking::PeekInterface;

use crate::{
    configs::settings::Settings,
    consts,
    core::errors::{self, RouterResult},
    types::storage,
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    /// User email.
    pub sub: String,
    pub role: UserRole,
    pub iat: u64,
    pub exp: u64,
    pub user_id: i64,
}

pub fn generate_jwt(user: &storage::User, settings: &Settings) -> RouterResult<String> {
    let issued_at = date_time::now_unix_timestamp();
    let claims = Claims {
        sub: user.email.clone(),
        role: user.role,
        iat: issued_at.unsigned_abs(),
        exp: (issued_at + consts::JWT_VALIDITY_SECS).unsigned_abs(),
        user_id: user.id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secrets.secret_key.peek().as_bytes()),
    )
    .change_context(errors::ApiErrorResponse::InternalServerError)
    .attach_printable("failed to sign login token")
}

/// Rejects expired, malformed and mis-signed tokens alike with a generic
/// authentication error.
pub fn decode_jwt(token: &str, settings: &Settings) -> RouterResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secrets.secret_key.peek().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|token_data| token_data.claims)
    .change_context(errors::ApiErrorResponse::Unauthenticated)
}
