//! Personally identifiable information wrappers.

use std::fmt;

use masking::Strategy;

/// Masking strategy for email addresses: keeps the domain, hides the local
/// part beyond its first character.
#[derive(Debug)]
pub enum EmailStrategy {}

impl<T> Strategy<T> for EmailStrategy
where
    T: AsRef<str>,
{
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match value.as_ref().split_once('@') {
            Some((local, domain)) => {
                let head = local.chars().next().unwrap_or('*');
                write!(f, "{head}***@{domain}")
            }
            None => f.write_str("***"),
        }
    }
}

/// An email address whose debug output is partially masked.
pub type Email = masking::Secret<String, EmailStrategy>;

/// Masking strategy for phone numbers: keeps the last two digits.
#[derive(Debug)]
pub enum PhoneNumberStrategy {}

impl<T> Strategy<T> for PhoneNumberStrategy
where
    T: AsRef<str>,
{
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = value.as_ref();
        let tail: String = value.chars().rev().take(2).collect::<Vec<_>>().into_iter().rev().collect();
        write!(f, "{}{tail}", "*".repeat(value.len().saturating_sub(2)))
    }
}

/// A phone number whose debug output is partially masked.
pub type PhoneNumber = masking::Secret<String, PhoneNumberStrategy>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_debug_hides_local_part() {
        let email: Email = "customer@example.com".to_string().into();
        assert_eq!(format!("{email:?}"), "c***@example.com");
    }

    #[test]
    fn phone_debug_keeps_last_two_digits() {
        let phone: PhoneNumber = "9876543210".to_string().into();
        assert_eq!(format!("{phone:?}"), "********10");
    }
}
