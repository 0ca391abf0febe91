//! Wrapper types and traits for secret handling.
//!
//! Values such as API-key secrets, card data and webhook signing keys must
//! not leak into logs or serialized debug output. [`Secret`] masks its
//! contents in `Debug`, and [`StrongSecret`] additionally guarantees
//! constant-time comparison and zeroization on drop.

#![warn(missing_docs)]

mod abs;
mod secret;
mod strategy;
mod strong_secret;

pub use abs::{ExposeInterface, PeekInterface};
pub use secret::Secret;
pub use strategy::{Strategy, WithType, WithoutType};
pub use strong_secret::StrongSecret;

/// Interface that consumers are expected to glob-import.
pub mod prelude {
    pub use super::{ExposeInterface, PeekInterface, Secret, StrongSecret};
}
