//! Short-lived access tokens for protected media
//!
//! An [`Authority`] mints opaque, high-entropy tokens that grant a single
//! requester access to a single media resource for a short, fixed time.
//! Each token is registered in a [`TokenStore`] along with its [`Binding`].
//! When the token is presented again, the authority checks that it exists,
//! has not expired, and is being used for exactly the resource and requester
//! it was minted for.
//!
//! ```
//! use mediapass::{AccessDecision, Authority, TokenStore};
//!
//! let store = TokenStore::new();
//! let authority = Authority::new(store);
//!
//! let minted = authority.mint("/videos/intro.mp4", "USER_001")?;
//! assert_eq!(minted.expires_in().0, 120);
//!
//! let decision = authority.redeem(minted.token().as_str(), "/videos/intro.mp4", "USER_001");
//! assert!(matches!(decision, AccessDecision::Granted { .. }));
//! # Ok::<(), mediapass::MintError>(())
//! ```
//!
//! Tokens are not signed. Their authority comes entirely from being
//! unguessable and present in the store, so the store must be shared by
//! every component that mints or redeems.
//!
//! # Expiry
//!
//! Expired entries are treated as absent by every read, whether or not they
//! have been physically removed yet. Removal happens when an expired token
//! is redeemed, after each mint (unless disabled through
//! [`AuthorityConfig::with_sweep_on_mint`]), and on a schedule when a
//! [`Sweeper`] is running.
//!
//! # Features
//!
//! * `tokio` (default): Provides the background [`Sweeper`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod authority;
mod binding;
mod braids;
mod config;
mod decision;
mod error;
pub mod generator;
pub mod store;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod sweeper;

pub use authority::{Authority, MintedToken};
pub use binding::Binding;
pub use braids::*;
pub use config::{AuthorityConfig, DEFAULT_TOKEN_TTL};
pub use decision::{AccessDecision, RejectionReason};
pub use error::{InvalidField, MintError};
pub use generator::{OsTokenGenerator, TokenGenerator};
pub use store::{Stats, TokenStore};
#[cfg(feature = "tokio")]
pub use sweeper::{SweepConfig, Sweeper};

pub use mediapass_clock as clock;
