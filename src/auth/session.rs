//! Session type holding the shop and its Admin API access token.

use std::fmt;

use crate::config::ShopDomain;

/// An authenticated connection to one shop.
///
/// The access token is masked in `Debug` output so sessions can be logged
/// with `tracing` without leaking credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// The shop this session is for.
    pub shop: ShopDomain,

    /// The access token sent as `X-Shopify-Access-Token`.
    pub access_token: String,
}

impl Session {
    /// Creates a new session.
    #[must_use]
    pub fn new(shop: ShopDomain, access_token: impl Into<String>) -> Self {
        Self {
            shop,
            access_token: access_token.into(),
        }
    }

    /// Returns `true` if the session carries an access token.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("shop", &self.shop.as_ref())
            .field("access_token", &"*****")
            .finish()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};
