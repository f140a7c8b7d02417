use mediapass_clock::{DurationSecs, UnixTime};
use serde::Serialize;
use thiserror::Error;

/// The reason a redemption was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The token, resource, or requester was not supplied
    #[error("missing required parameters")]
    MissingParameters,

    /// The token is unknown, or was evicted after expiring
    #[error("token not found")]
    TokenNotFound,

    /// The token was found but has expired; it has now been evicted
    #[error("token expired at {expired_at}")]
    TokenExpired {
        /// When the token's binding expired
        expired_at: UnixTime,
    },

    /// The claimed resource or requester does not match the token's binding
    #[error("token not valid for this resource and requester")]
    BindingMismatch,
}

/// The authorization decision for a redemption attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
#[must_use]
pub enum AccessDecision {
    /// Access is granted
    Granted {
        /// How much longer the token remains valid
        remaining: DurationSecs,
    },
    /// Access is refused
    Rejected(RejectionReason),
}

impl AccessDecision {
    /// Whether access was granted
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// The reason access was refused, if it was
    #[inline]
    pub fn rejection(&self) -> Option<RejectionReason> {
        match *self {
            Self::Granted { .. } => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

impl From<RejectionReason> for AccessDecision {
    #[inline]
    fn from(reason: RejectionReason) -> Self {
        Self::Rejected(reason)
    }
}
