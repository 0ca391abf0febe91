use std::{fmt, marker::PhantomData};

use crate::{abs::ExposeInterface, strategy::Strategy, PeekInterface, WithType};

/// A wrapper that masks its contents in `Debug` output.
///
/// The masking behaviour is controlled by the strategy type parameter,
/// [`WithType`] by default. Access to the inner value requires an explicit
/// [`peek`](PeekInterface::peek) or [`expose`](ExposeInterface::expose),
/// which keeps accidental logging greppable.
pub struct Secret<S, I = WithType>
where
    I: Strategy<S>,
{
    inner_secret: S,
    masking_strategy: PhantomData<I>,
}

impl<S, I> Secret<S, I>
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

impl<S, I> PeekInterface<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn peek(&self) -> &S {
        &self.inner_secret
    }
}

impl<S, I> ExposeInterface<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn expose(self) -> S {
        self.inner_secret
    }
}

impl<S, I> From<S> for Secret<S, I>
where
    I: Strategy<S>,
{
    fn from(secret: S) -> Self {
        Self::new(secret)
    }
}

impl<S, I> Clone for Secret<S, I>
where
    S: Clone,
    I: Strategy<S>,
{
    fn clone(&self) -> Self {
        Self::new(self.inner_secret.clone())
    }
}

impl<S, I> PartialEq for Secret<S, I>
where
    S: PartialEq,
    I: Strategy<S>,
{
    fn eq(&self, other: &Self) -> bool {
        self.peek() == other.peek()
    }
}

impl<S, I> Eq for Secret<S, I>
where
    S: Eq,
    I: Strategy<S>,
{
}

impl<S, I> fmt::Debug for Secret<S, I>
where
    I: Strategy<S>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        I::fmt(&self.inner_secret, f)
    }
}

impl<S, I> Default for Secret<S, I>
where
    S: Default,
    I: Strategy<S>,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S, I> serde::Serialize for Secret<S, I>
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

impl<'de, S, I> serde::Deserialize<'de> for Secret<S, I>
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_masked() {
        let secret: Secret<String> = Secret::new("pf_sec_supersecret".to_string());
        let out = format!("{secret:?}");
        assert!(!out.contains("supersecret"));
    }

    #[test]
    fn peek_and_expose_round_trip() {
        let secret: Secret<String> = Secret::new("value".to_string());
        assert_eq!(secret.peek(), "value");
        assert_eq!(secret.expose(), "value");
    }
}
