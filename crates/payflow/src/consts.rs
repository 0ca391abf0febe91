//! Crate-wide constants.

/// Prefixes of the opaque public references handed out by the API.
pub const MERCHANT_ID_PREFIX: &str = "pf_mer";
pub const ORDER_REF_PREFIX: &str = "pf_order";
pub const PAYMENT_REF_PREFIX: &str = "pf_pay";
pub const REFUND_REF_PREFIX: &str = "pf_rfnd";
pub const API_KEY_ID_PREFIX: &str = "pf_key";
pub const API_KEY_SECRET_PREFIX: &str = "pf_sec";

/// Characters of CSPRNG output in an API key secret, longer than regular
/// references since the secret is the credential itself.
pub const API_KEY_SECRET_LENGTH: usize = 48;

/// Base64 engine used when decoding HTTP Basic credentials.
pub const BASE64_ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Upper bound on the merchant-supplied `notes` field, in bytes.
pub const MAX_NOTES_LENGTH: usize = 4096;

/// Fraud rules look at this much trailing history per customer.
pub const FRAUD_HISTORY_WINDOW_SECS: i64 = 60;

/// Webhook delivery gives up for good after this many attempts.
pub const MAX_WEBHOOK_DELIVERY_ATTEMPTS: i32 = 8;

/// Outbound webhook POSTs are abandoned after this long.
pub const WEBHOOK_DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Exponential backoff between webhook attempts is capped here.
pub const WEBHOOK_MAX_BACKOFF_SECS: i64 = 600;

/// How long a claimed outbox row is invisible to other workers.
pub const WEBHOOK_CLAIM_LEASE_SECS: i64 = 30;

/// Stored webhook response bodies are truncated to this many bytes.
pub const WEBHOOK_RESPONSE_BODY_TRUNCATE: usize = 1024;

/// Login tokens expire after two days.
pub const JWT_VALIDITY_SECS: i64 = 60 * 60 * 24 * 2;

/// Transient storage failures are retried this many times per request.
pub const MAX_STORAGE_RETRY_ATTEMPTS: u32 = 3;

/// List endpoints return at most this many rows.
pub const LIST_MAX_LIMIT: i64 = 100;

/// Default page size for list endpoints.
pub const LIST_DEFAULT_LIMIT: i64 = 20;
