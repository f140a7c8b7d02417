use mediapass_clock::{Clock, DurationSecs, System};

/// Default lifetime of a minted token
pub const DEFAULT_TOKEN_TTL: DurationSecs = DurationSecs(120);

/// Configuration for how an [`Authority`][crate::Authority] issues tokens
#[derive(Clone, Debug)]
pub struct AuthorityConfig<C = System> {
    ttl: DurationSecs,
    sweep_on_mint: bool,
    clock: C,
}

impl Default for AuthorityConfig {
    /// Default authority configuration
    ///
    /// Issues tokens valid for 120 seconds, sweeps expired tokens after
    /// every mint, and uses the system clock.
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

impl AuthorityConfig {
    /// Constructs a new configuration issuing tokens valid for `ttl`
    pub fn new(ttl: DurationSecs) -> Self {
        Self {
            ttl,
            sweep_on_mint: true,
            clock: System,
        }
    }
}

impl<C> AuthorityConfig<C> {
    /// Sets whether expired tokens are swept from the store after each mint
    ///
    /// Disable this when a [`Sweeper`][crate::Sweeper] is running instead.
    pub fn with_sweep_on_mint(mut self, sweep_on_mint: bool) -> Self {
        self.sweep_on_mint = sweep_on_mint;
        self
    }

    /// Sets the lifetime of minted tokens
    pub fn with_ttl(mut self, ttl: DurationSecs) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets a custom clock to be used
    ///
    /// Useful for testing purposes
    pub fn with_clock<D: Clock>(self, clock: D) -> AuthorityConfig<D> {
        AuthorityConfig {
            ttl: self.ttl,
            sweep_on_mint: self.sweep_on_mint,
            clock,
        }
    }

    /// The lifetime of minted tokens
    #[inline]
    pub fn ttl(&self) -> DurationSecs {
        self.ttl
    }

    /// Whether expired tokens are swept after each mint
    #[inline]
    pub fn sweep_on_mint(&self) -> bool {
        self.sweep_on_mint
    }

    /// The clock used to timestamp and check tokens
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}
