//! Sources of fresh token values

use std::error;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

use crate::AccessToken;

/// Number of random bytes behind each token
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token produced by [`OsTokenGenerator`]
pub const TOKEN_LEN: usize = 43;

/// A source of fresh, unguessable tokens
///
/// Implementations must report failure rather than fall back to a weaker
/// source of randomness.
pub trait TokenGenerator: Send + Sync {
    /// The error type returned in the event that generating a token fails
    type Error: error::Error + Send + Sync + 'static;

    /// Generates a new token
    fn generate(&self) -> Result<AccessToken, Self::Error>;
}

/// Generates tokens from the operating system's random number generator
///
/// Each token encodes [`TOKEN_BYTES`] random bytes as unpadded URL-safe
/// base64, yielding a string of [`TOKEN_LEN`] characters.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsTokenGenerator;

impl TokenGenerator for OsTokenGenerator {
    type Error = rand::Error;

    fn generate(&self) -> Result<AccessToken, Self::Error> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(AccessToken::new(URL_SAFE_NO_PAD.encode(bytes)))
    }
}
