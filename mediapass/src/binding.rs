use mediapass_clock::{DurationSecs, UnixTime};
use serde::Serialize;

use crate::{RequesterId, RequesterIdRef, ResourcePath, ResourcePathRef};

/// The resource and requester a token authorizes, along with its validity window
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Binding {
    resource: ResourcePath,
    requester: RequesterId,
    issued: UnixTime,
    expiry: UnixTime,
}

impl Binding {
    /// Binds `resource` to `requester`, valid for `lifetime` from `issued`
    pub fn new(
        resource: ResourcePath,
        requester: RequesterId,
        issued: UnixTime,
        lifetime: DurationSecs,
    ) -> Self {
        Self {
            resource,
            requester,
            issued,
            expiry: issued + lifetime,
        }
    }

    /// The protected resource
    #[inline]
    pub fn resource(&self) -> &ResourcePathRef {
        &self.resource
    }

    /// The party permitted to redeem the token
    #[inline]
    pub fn requester(&self) -> &RequesterIdRef {
        &self.requester
    }

    /// Gets the time that the binding was issued
    #[inline]
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// Gets the time after which the binding is no longer valid
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Gets the interval during which the binding is valid
    #[inline]
    pub fn valid_interval(&self) -> std::ops::RangeInclusive<UnixTime> {
        self.issued..=self.expiry
    }

    /// Whether the binding has expired as of `time`
    ///
    /// A binding is still valid at the exact instant of its expiry.
    #[inline]
    pub fn is_expired_at(&self, time: UnixTime) -> bool {
        time > self.expiry
    }

    /// Gets a duration for how much longer the binding would be valid as of
    /// the provided time
    #[inline]
    pub fn until_expired_at(&self, time: UnixTime) -> DurationSecs {
        self.expiry - time
    }

    /// Whether a claimed resource and requester are exactly those bound
    pub fn matches(&self, resource: &str, requester: &str) -> bool {
        self.resource.as_str() == resource && self.requester.as_str() == requester
    }
}
