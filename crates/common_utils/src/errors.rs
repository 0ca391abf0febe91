//! Errors and error-related utilities shared across crates.

/// The alias for [`error_stack::Result`] used throughout the workspace.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Cryptographic operation failures.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Signing the message failed.
    #[error("failed to sign message")]
    MessageSigningFailed,
    /// The system CSPRNG failed to produce output.
    #[error("failed to generate cryptographically secure random bytes")]
    RandomBytesGenerationFailed,
}

/// Inbound data validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A required field was absent.
    #[error("missing required field: {field_name}")]
    MissingRequiredField {
        /// Name of the absent field.
        field_name: String,
    },
    /// A field carried a value outside its domain.
    #[error("invalid value provided for field {field_name}: {message}")]
    InvalidValue {
        /// Name of the offending field.
        field_name: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Failures while parsing values out of their wire representation.
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    /// A string did not match any variant of the target enum.
    #[error("failed to parse {0} enum from string")]
    EnumParseFailure(&'static str),
    /// A value could not be interpreted as the target structure.
    #[error("failed to parse {0}")]
    StructParseFailure(&'static str),
}
