//! Constants shared across crates.

/// Alphabet used for opaque reference generation, lowercase base36.
pub const ID_GENERATION_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Number of alphabet characters in a generated reference body.
pub const ID_GENERATION_LENGTH: usize = 24;

/// Length in bytes of a merchant webhook signing secret.
pub const WEBHOOK_SECRET_LENGTH: usize = 32;
