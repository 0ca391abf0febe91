use std::future::Future;

use payflow_env::logger;

use crate::{
    consts,
    core::errors::{self, CustomResult},
};

/// Credential hashing and verification. API-key secrets and user passwords
/// share the same adaptive hash.
pub mod password {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier,
            SaltString},
        Argon2,
    };
    use error_stack::ResultExt;
    use masking::PeekInterface;

    use crate::core::errors::{self, RouterResult};

    pub fn generate_hash(secret: &str) -> RouterResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .change_context(errors::ApiErrorResponse::InternalServerError)
            .attach_printable("failed to hash credential")
    }

    pub fn is_correct(candidate: &masking::StrongSecret<String>, stored_hash: &str) -> bool {
        PasswordHash::new(stored_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(candidate.peek().as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Burn the work of a real verification so lookups that found nothing
    /// take as long as ones that found a row with a wrong secret.
    pub fn burn_verification_time(candidate: &masking::StrongSecret<String>) {
        let salt = SaltString::generate(&mut OsRng);
        let _ = Argon2::default().hash_password(candidate.peek().as_bytes(), &salt);
    }
}

/// Run a storage operation, retrying transient failures a bounded number of
/// times within the same request.
pub async fn retry_transient<T, F, Fut>(mut operation: F) -> CustomResult<T, errors::StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CustomResult<T, errors::StorageError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(error)
                if error.current_context().is_transient()
                    && attempt < consts::MAX_STORAGE_RETRY_ATTEMPTS =>
            {
                logger::warn!(attempt, "transient storage failure, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}
