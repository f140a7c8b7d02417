//! Mint errors

use std::error::Error as StdError;

use thiserror::Error;

use crate::{InvalidRequesterId, InvalidResourcePath};

/// A field of a mint request failed validation
#[derive(Debug, Error)]
pub enum InvalidField {
    /// The resource path is malformed
    #[error(transparent)]
    Resource(#[from] InvalidResourcePath),

    /// The requester identifier is malformed
    #[error(transparent)]
    Requester(#[from] InvalidRequesterId),
}

/// An error occurring while minting a token
#[derive(Debug, Error)]
pub enum MintError {
    /// A required field was empty
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A field did not have the expected shape
    #[error("invalid format for field '{field}'")]
    InvalidFormat {
        /// The name of the offending field
        field: &'static str,
        /// The reason the field was rejected
        #[source]
        source: InvalidField,
    },

    /// No token could be generated because the entropy source failed
    ///
    /// No token is ever issued from a degraded source.
    #[error("token generation unavailable")]
    EntropyUnavailable(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl MintError {
    /// The name of the rejected field, for validation failures
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) | Self::InvalidFormat { field, .. } => Some(*field),
            Self::EntropyUnavailable(_) => None,
        }
    }

    /// Whether the error is due to the caller's input rather than an internal fault
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !self.is_unavailable()
    }

    /// Whether the error is due to the entropy source being unavailable
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::EntropyUnavailable(_))
    }
}

impl From<InvalidResourcePath> for MintError {
    fn from(source: InvalidResourcePath) -> Self {
        Self::InvalidFormat {
            field: "resource",
            source: source.into(),
        }
    }
}

impl From<InvalidRequesterId> for MintError {
    fn from(source: InvalidRequesterId) -> Self {
        Self::InvalidFormat {
            field: "requester",
            source: source.into(),
        }
    }
}
