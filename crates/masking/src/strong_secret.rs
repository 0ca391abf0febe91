use std::{fmt, marker::PhantomData};

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{abs::ExposeInterface, strategy::Strategy, PeekInterface, WithType};

/// A secret that is zeroized on drop and compared in constant time.
///
/// Used for credentials that are matched against attacker-controlled input,
/// such as API-key secrets and webhook signatures.
pub struct StrongSecret<S: Zeroize, I = WithType>
where
    I: Strategy<S>,
{
    inner_secret: S,
    masking_strategy: PhantomData<I>,
}

impl<S: Zeroize, I> StrongSecret<S, I>
where
    I: Strategy<S>,
{
    /// Wrap a value.
    pub fn new(secret: S) -> Self {
        Self {
            inner_secret: secret,
            masking_strategy: PhantomData,
        }
    }
}

impl<S: Zeroize, I> PeekInterface<S> for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn peek(&self) -> &S {
        &self.inner_secret
    }
}

impl<S: Zeroize + Clone, I> ExposeInterface<S> for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn expose(self) -> S {
        self.inner_secret.clone()
    }
}

impl<S: Zeroize, I> From<S> for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn from(secret: S) -> Self {
        Self::new(secret)
    }
}

impl<S: Zeroize + Clone, I> Clone for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn clone(&self) -> Self {
        Self::new(self.inner_secret.clone())
    }
}

impl<S, I> PartialEq for StrongSecret<S, I>
where
    S: Zeroize + StrongEq,
    I: Strategy<S>,
{
    fn eq(&self, other: &Self) -> bool {
        self.peek().strong_eq(other.peek())
    }
}

impl<S, I> Eq for StrongSecret<S, I>
where
    S: Zeroize + StrongEq,
    I: Strategy<S>,
{
}

impl<S: Zeroize, I> fmt::Debug for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        I::fmt(&self.inner_secret, f)
    }
}

impl<S: Zeroize, I> Drop for StrongSecret<S, I>
where
    I: Strategy<S>,
{
    fn drop(&mut self) {
        self.inner_secret.zeroize();
    }
}

impl<S: Zeroize, I> serde::Serialize for StrongSecret<S, I>
where
    S: serde::Serialize,
    I: Strategy<S>,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: serde::Serializer,
    {
        self.peek().serialize(serializer)
    }
}

impl<'de, S: Zeroize, I> serde::Deserialize<'de> for StrongSecret<S, I>
where
    S: serde::Deserialize<'de>,
    I: Strategy<S>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        S::deserialize(deserializer).map(Self::new)
    }
}

/// Constant-time equality for the types we store as strong secrets.
pub trait StrongEq {
    /// Compare without early exit.
    fn strong_eq(&self, other: &Self) -> bool;
}

impl StrongEq for String {
    fn strong_eq(&self, other: &Self) -> bool {
        self.as_bytes().ct_eq(other.as_bytes()).into()
    }
}

impl StrongEq for Vec<u8> {
    fn strong_eq(&self, other: &Self) -> bool {
        self.as_slice().ct_eq(other.as_slice()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_matches_plain_equality() {
        let a: StrongSecret<String> = StrongSecret::new("pf_sec_abc".to_string());
        let b: StrongSecret<String> = StrongSecret::new("pf_sec_abc".to_string());
        let c: StrongSecret<String> = StrongSecret::new("pf_sec_xyz".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn debug_output_is_masked() {
        let secret: StrongSecret<Vec<u8>> = StrongSecret::new(vec![1, 2, 3]);
        assert!(!format!("{secret:?}").contains('1'));
    }
}
