//! Utilities shared across `payflow` and other crates.

pub mod consts;
pub mod crypto;
pub mod custom_serde;
pub mod date_time;
pub mod errors;
pub mod ext_traits;
pub mod fp_utils;
pub mod pii;

use nanoid::nanoid;

/// Generate an opaque reference of the given length with the given prefix,
/// separated by an underscore. The body is drawn from a CSPRNG over a
/// lowercase base36 alphabet, so references are URL-safe.
pub fn generate_id(length: usize, prefix: &str) -> String {
    format!("{}_{}", prefix, nanoid!(length, &consts::ID_GENERATION_ALPHABET))
}

/// Generate an opaque reference of the default length.
pub fn generate_id_with_default_len(prefix: &str) -> String {
    generate_id(consts::ID_GENERATION_LENGTH, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_length() {
        let id = generate_id_with_default_len("pf_order");
        assert!(id.starts_with("pf_order_"));
        assert_eq!(id.len(), "pf_order_".len() + consts::ID_GENERATION_LENGTH);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_id_with_default_len("pf_pay");
        let b = generate_id_with_default_len("pf_pay");
        assert_ne!(a, b);
    }

    #[test]
    fn generated_ids_are_url_safe() {
        let id = generate_id(64, "pf_key");
        assert!(id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
    }
}
