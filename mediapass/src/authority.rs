use std::{error, fmt, sync::Arc};

use mediapass_clock::{Clock, DurationSecs, System, UnixTime};
use serde::Serialize;

use crate::{
    store::{Lookup, Stats},
    AccessDecision, AccessToken, AccessTokenRef, AuthorityConfig, Binding, MintError,
    OsTokenGenerator, RejectionReason, RequesterId, RequesterIdRef, ResourcePath,
    ResourcePathRef, TokenGenerator, TokenStore,
};

/// A freshly minted token and its validity window
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MintedToken {
    token: AccessToken,
    #[serde(rename = "issuedAt")]
    issued: UnixTime,
    #[serde(rename = "expiresAt")]
    expiry: UnixTime,
}

impl MintedToken {
    /// The token to hand to the requester
    #[inline]
    pub fn token(&self) -> &AccessTokenRef {
        &self.token
    }

    /// Consumes the result, yielding the token
    #[inline]
    pub fn into_token(self) -> AccessToken {
        self.token
    }

    /// Gets the time that the token was issued
    #[inline]
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// Gets the time after which the token will no longer be accepted
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Gets the token's full lifetime
    #[inline]
    pub fn expires_in(&self) -> DurationSecs {
        self.expiry - self.issued
    }
}

struct Inner<C, G> {
    store: TokenStore,
    config: AuthorityConfig<C>,
    generator: G,
}

impl<C: fmt::Debug, G: fmt::Debug> fmt::Debug for Inner<C, G> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Inner")
            .field("store_len", &self.store.physical_len())
            .field("config", &self.config)
            .field("generator", &self.generator)
            .finish()
    }
}

/// Mints tokens bound to a resource and requester, and redeems them
///
/// Cloning an authority produces another handle sharing the same store,
/// configuration, and token generator.
#[derive(Debug)]
#[must_use]
pub struct Authority<C = System, G = OsTokenGenerator> {
    inner: Arc<Inner<C, G>>,
}

impl<C, G> Clone for Authority<C, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Authority {
    /// Constructs an authority over `store` using the default configuration
    pub fn new(store: TokenStore) -> Self {
        Self::with_config(store, AuthorityConfig::default())
    }
}

impl<C: Clock> Authority<C> {
    /// Constructs an authority over `store` with a custom configuration
    pub fn with_config(store: TokenStore, config: AuthorityConfig<C>) -> Self {
        Self::from_parts(store, config, OsTokenGenerator)
    }
}

impl<C, G> Authority<C, G>
where
    C: Clock,
    G: TokenGenerator,
{
    /// Constructs an authority with a custom token generator
    pub fn from_parts(store: TokenStore, config: AuthorityConfig<C>, generator: G) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                generator,
            }),
        }
    }

    /// The store backing this authority
    #[inline]
    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    /// The configuration of this authority
    #[inline]
    pub fn config(&self) -> &AuthorityConfig<C> {
        &self.inner.config
    }

    /// Mints a new token binding `resource` to `requester`
    ///
    /// Fields are checked in order: `resource` present, `requester`
    /// present, `resource` well-formed, `requester` well-formed. The first
    /// failure is returned and the store is left untouched.
    pub fn mint(&self, resource: &str, requester: &str) -> Result<MintedToken, MintError> {
        let (resource, requester) = validate(resource, requester).map_err(|error| {
            tracing::debug!(field = error.field(), %error, "rejected mint request");
            error
        })?;

        let token = self.inner.generator.generate().map_err(|error| {
            tracing::warn!(
                error = (&error as &dyn error::Error),
                "entropy source unavailable, refusing to mint"
            );
            MintError::EntropyUnavailable(error.into())
        })?;

        let config = &self.inner.config;
        let now = config.clock().now();
        let binding = Binding::new(resource, requester, now, config.ttl());
        let expiry = binding.expiry();

        tracing::debug!(
            %token,
            resource = %binding.resource(),
            requester = %binding.requester(),
            expiry = expiry.0,
            "minted token"
        );
        self.inner.store.insert(token.clone(), binding);

        if config.sweep_on_mint() {
            let removed = self.inner.store.sweep_expired(now);
            if removed > 0 {
                tracing::debug!(removed, "swept expired tokens after mint");
            }
        }

        Ok(MintedToken {
            token,
            issued: now,
            expiry,
        })
    }

    /// Decides whether `token` grants `requester` access to `resource`
    ///
    /// An expired token is evicted from the store when it is seen. A token
    /// presented with the wrong resource or requester is left in place, as
    /// it may still be redeemed by its rightful holder.
    pub fn redeem(&self, token: &str, resource: &str, requester: &str) -> AccessDecision {
        if token.is_empty() || resource.is_empty() || requester.is_empty() {
            return rejected(RejectionReason::MissingParameters);
        }

        let token = AccessTokenRef::from_str(token);
        let now = self.inner.config.clock().now();

        match self.inner.store.lookup(token, now) {
            Lookup::Missing => rejected(RejectionReason::TokenNotFound),
            Lookup::Expired(binding) => {
                self.inner.store.evict_if_expired(token, now);
                rejected(RejectionReason::TokenExpired {
                    expired_at: binding.expiry(),
                })
            }
            Lookup::Active(binding) if !binding.matches(resource, requester) => {
                rejected(RejectionReason::BindingMismatch)
            }
            Lookup::Active(binding) => {
                let remaining = binding.until_expired_at(now);
                tracing::debug!(%token, remaining = remaining.0, "access granted");
                AccessDecision::Granted { remaining }
            }
        }
    }

    /// Issuance statistics as of the authority's current time
    pub fn stats(&self) -> Stats {
        self.inner.store.stats(self.inner.config.clock().now())
    }
}

fn validate(resource: &str, requester: &str) -> Result<(ResourcePath, RequesterId), MintError> {
    if resource.is_empty() {
        return Err(MintError::MissingField("resource"));
    }

    if requester.is_empty() {
        return Err(MintError::MissingField("requester"));
    }

    let resource = ResourcePathRef::from_str(resource)?.to_owned();
    let requester = RequesterIdRef::from_str(requester)?.to_owned();

    Ok((resource, requester))
}

fn rejected(reason: RejectionReason) -> AccessDecision {
    tracing::debug!(%reason, "access rejected");
    AccessDecision::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use std::io;

    use mediapass_clock::TestClock;
    use tracing_test::traced_test;

    use super::*;

    const START: UnixTime = UnixTime(1_700_000_000);

    fn authority() -> (Authority<TestClock>, TestClock) {
        let clock = TestClock::new(START);
        let config = AuthorityConfig::default().with_clock(clock.clone());
        (Authority::with_config(TokenStore::new(), config), clock)
    }

    #[derive(Debug)]
    struct BrokenEntropy;

    impl TokenGenerator for BrokenEntropy {
        type Error = io::Error;

        fn generate(&self) -> Result<AccessToken, Self::Error> {
            Err(io::Error::new(io::ErrorKind::Other, "entropy pool closed"))
        }
    }

    #[test]
    fn mint_reports_missing_resource_first() {
        let (authority, _) = authority();
        let err = authority.mint("", "").unwrap_err();
        assert!(matches!(err, MintError::MissingField("resource")));
    }

    #[test]
    fn mint_reports_missing_requester_before_format() {
        let (authority, _) = authority();
        let err = authority.mint("not-a-path", "").unwrap_err();
        assert!(matches!(err, MintError::MissingField("requester")));
    }

    #[test]
    fn mint_reports_resource_format_before_requester_format() {
        let (authority, _) = authority();
        let err = authority.mint("invalid-path", "x").unwrap_err();
        assert_eq!(err.field(), Some("resource"));
        assert!(err.is_validation());
    }

    #[test]
    fn mint_rejects_short_requester() {
        let (authority, _) = authority();
        let err = authority.mint("/videos/intro.mp4", "ab").unwrap_err();
        assert!(matches!(
            err,
            MintError::InvalidFormat {
                field: "requester",
                ..
            }
        ));
        assert_eq!(authority.store().physical_len(), 0);
        assert_eq!(authority.stats().total_issued, 0);
    }

    #[test]
    fn mint_sets_expiry_from_ttl() {
        let clock = TestClock::new(START);
        let config = AuthorityConfig::new(DurationSecs(30)).with_clock(clock);
        let authority = Authority::with_config(TokenStore::new(), config);

        let minted = authority.mint("/docs/guide.pdf", "reader").unwrap();
        assert_eq!(minted.issued(), START);
        assert_eq!(minted.expiry(), START + DurationSecs(30));
        assert_eq!(minted.expires_in(), DurationSecs(30));
    }

    #[test]
    fn mint_sweeps_expired_entries() {
        let (authority, clock) = authority();
        authority.mint("/videos/a.mp4", "user_a").unwrap();
        authority.mint("/videos/b.mp4", "user_b").unwrap();

        clock.advance(DurationSecs(121));
        authority.mint("/videos/c.mp4", "user_c").unwrap();

        assert_eq!(authority.store().physical_len(), 1);
        assert_eq!(authority.stats().total_issued, 3);
    }

    #[test]
    fn mint_without_sweep_leaves_expired_entries() {
        let clock = TestClock::new(START);
        let config = AuthorityConfig::default()
            .with_sweep_on_mint(false)
            .with_clock(clock.clone());
        let authority = Authority::with_config(TokenStore::new(), config);
        authority.mint("/videos/a.mp4", "user_a").unwrap();

        clock.advance(DurationSecs(121));
        authority.mint("/videos/b.mp4", "user_b").unwrap();

        assert_eq!(authority.store().physical_len(), 2);
        assert_eq!(authority.stats().active, 1);
    }

    #[test]
    fn mint_refuses_when_entropy_unavailable() {
        let clock = TestClock::new(START);
        let authority = Authority::from_parts(
            TokenStore::new(),
            AuthorityConfig::default().with_clock(clock),
            BrokenEntropy,
        );

        let err = authority.mint("/videos/intro.mp4", "USER_001").unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(err.field(), None);
        assert_eq!(authority.store().physical_len(), 0);
    }

    #[test]
    fn redeem_requires_all_parameters() {
        let (authority, _) = authority();
        let minted = authority.mint("/videos/intro.mp4", "USER_001").unwrap();
        let token = minted.token().as_str();

        for (t, r, u) in [
            ("", "/videos/intro.mp4", "USER_001"),
            (token, "", "USER_001"),
            (token, "/videos/intro.mp4", ""),
        ] {
            assert_eq!(
                authority.redeem(t, r, u),
                AccessDecision::Rejected(RejectionReason::MissingParameters)
            );
        }
    }

    #[test]
    fn redeem_grants_until_expiry_instant() {
        let (authority, clock) = authority();
        let minted = authority.mint("/videos/intro.mp4", "USER_001").unwrap();
        let token = minted.token().as_str();

        clock.advance(DurationSecs(45));
        assert_eq!(
            authority.redeem(token, "/videos/intro.mp4", "USER_001"),
            AccessDecision::Granted {
                remaining: DurationSecs(75)
            }
        );

        clock.set(minted.expiry());
        assert_eq!(
            authority.redeem(token, "/videos/intro.mp4", "USER_001"),
            AccessDecision::Granted {
                remaining: DurationSecs::ZERO
            }
        );
    }

    #[test]
    fn redeem_evicts_on_expiry() {
        let (authority, clock) = authority();
        let minted = authority.mint("/videos/intro.mp4", "USER_001").unwrap();
        let token = minted.token().as_str();

        clock.advance(DurationSecs(121));
        assert_eq!(
            authority.redeem(token, "/videos/intro.mp4", "USER_001"),
            AccessDecision::Rejected(RejectionReason::TokenExpired {
                expired_at: minted.expiry()
            })
        );
        assert_eq!(authority.store().physical_len(), 0);
    }

    #[test]
    fn expired_check_precedes_binding_check() {
        let (authority, clock) = authority();
        let minted = authority.mint("/videos/intro.mp4", "USER_001").unwrap();

        clock.advance(DurationSecs(500));
        let decision = authority.redeem(minted.token().as_str(), "/videos/other.mp4", "USER_001");
        assert!(matches!(
            decision.rejection(),
            Some(RejectionReason::TokenExpired { .. })
        ));
    }

    #[test]
    fn minted_token_serializes_for_transport() {
        let (authority, _) = authority();
        let minted = authority.mint("/images/cover.png", "USER_001").unwrap();

        let json = serde_json::to_value(&minted).unwrap();
        assert_eq!(json["token"], minted.token().as_str());
        assert_eq!(json["issuedAt"], START.0);
        assert_eq!(json["expiresAt"], START.0 + 120);
    }

    #[test]
    #[traced_test]
    fn logs_never_reveal_token() {
        let (authority, _) = authority();
        let minted = authority.mint("/videos/intro.mp4", "USER_001").unwrap();
        let token = minted.token().as_str();

        let _ = authority.redeem(token, "/videos/intro.mp4", "USER_001");
        let _ = authority.redeem(token, "/videos/intro.mp4", "USER_999");

        assert!(logs_contain("minted token"));
        assert!(logs_contain("token not valid for this resource and requester"));
        assert!(!logs_contain(token));
    }
}
