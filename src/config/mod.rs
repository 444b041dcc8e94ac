//! Configuration types for the GraphQL execution engine.
//!
//! # Overview
//!
//! - [`ShopifyConfig`]: transport and retry settings shared by every executor
//! - [`ShopifyConfigBuilder`]: a validated builder for [`ShopifyConfig`]
//! - [`ShopDomain`]: a validated Shopify shop domain
//! - [`HostUrl`]: a validated API host override
//! - [`ApiVersion`]: the Admin API version to target
//!
//! # Environment
//!
//! [`ShopifyConfigBuilder::from_env`] seeds the retry ceiling and the global
//! page size from `SHOPIFY_MAX_RETRIES` and `SHOPIFY_GLOBAL_MAX_PAGE_SIZE`.
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql_executor::{ApiVersion, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .api_version(ApiVersion::latest())
//!     .max_retries(3)
//!     .global_max_page_size(100)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_retries(), 3);
//! ```

mod newtypes;
mod version;

use std::time::Duration;

pub use newtypes::{HostUrl, ShopDomain};
pub use version::ApiVersion;

use crate::error::ConfigError;

/// Default ceiling on retries for one logical call.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default upper bound for adaptive page sizes. This is the largest `first`
/// argument the Admin API accepts on a connection.
pub const DEFAULT_GLOBAL_MAX_PAGE_SIZE: u32 = 250;

/// Environment variable overriding [`DEFAULT_MAX_RETRIES`].
pub const MAX_RETRIES_ENV: &str = "SHOPIFY_MAX_RETRIES";

/// Environment variable overriding [`DEFAULT_GLOBAL_MAX_PAGE_SIZE`].
pub const GLOBAL_MAX_PAGE_SIZE_ENV: &str = "SHOPIFY_GLOBAL_MAX_PAGE_SIZE";

/// Configuration for GraphQL clients and request executors.
///
/// `ShopifyConfig` is `Clone`, `Send` and `Sync`; one value is typically
/// built at startup and shared by every sync run.
#[derive(Clone, Debug)]
pub struct ShopifyConfig {
    api_version: ApiVersion,
    host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
    max_retries: u32,
    global_max_page_size: u32,
    cache_ttl: Option<Duration>,
}

impl ShopifyConfig {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn builder() -> ShopifyConfigBuilder {
        ShopifyConfigBuilder::new()
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the API host override, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the ceiling on retries for one logical call.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the upper clamp applied when shrinking page sizes.
    #[must_use]
    pub const fn global_max_page_size(&self) -> u32 {
        self.global_max_page_size
    }

    /// Returns how long successful query responses stay cached, if caching
    /// is enabled.
    #[must_use]
    pub const fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            api_version: ApiVersion::latest(),
            host: None,
            user_agent_prefix: None,
            max_retries: DEFAULT_MAX_RETRIES,
            global_max_page_size: DEFAULT_GLOBAL_MAX_PAGE_SIZE,
            cache_ttl: None,
        }
    }
}

// Verify ShopifyConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyConfig>();
};

/// Builder for constructing [`ShopifyConfig`] instances.
///
/// # Defaults
///
/// - `api_version`: latest stable version
/// - `host`: `None` (requests go to the shop domain)
/// - `user_agent_prefix`: `None`
/// - `max_retries`: [`DEFAULT_MAX_RETRIES`]
/// - `global_max_page_size`: [`DEFAULT_GLOBAL_MAX_PAGE_SIZE`]
/// - `cache_ttl`: `None` (no response cache)
#[derive(Debug, Default)]
pub struct ShopifyConfigBuilder {
    api_version: Option<ApiVersion>,
    host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
    max_retries: Option<u32>,
    global_max_page_size: Option<u32>,
    cache_ttl: Option<Duration>,
}

impl ShopifyConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded from the process environment.
    ///
    /// Unset variables leave the corresponding default in place.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironmentValue`] if a variable is set
    /// but is not a non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates a builder from an arbitrary variable lookup.
    ///
    /// This is what [`from_env`](Self::from_env) uses; it is public so that
    /// callers with their own settings store can reuse the parsing rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironmentValue`] for unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let parse = |name: &'static str| -> Result<Option<u32>, ConfigError> {
            lookup(name)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| ConfigError::InvalidEnvironmentValue { name, value })
                })
                .transpose()
        };

        Ok(Self {
            max_retries: parse(MAX_RETRIES_ENV)?,
            global_max_page_size: parse(GLOBAL_MAX_PAGE_SIZE_ENV)?,
            ..Self::default()
        })
    }

    /// Sets the API version.
    #[must_use]
    pub const fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the API host override.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the ceiling on retries for one logical call.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the upper clamp applied when shrinking page sizes.
    #[must_use]
    pub const fn global_max_page_size(mut self, size: u32) -> Self {
        self.global_max_page_size = Some(size);
        self
    }

    /// Enables the in-memory response cache with the given time to live.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Builds the [`ShopifyConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPageSize`] if the global max page size
    /// is zero.
    pub fn build(self) -> Result<ShopifyConfig, ConfigError> {
        let global_max_page_size = self
            .global_max_page_size
            .unwrap_or(DEFAULT_GLOBAL_MAX_PAGE_SIZE);
        if global_max_page_size == 0 {
            return Err(ConfigError::InvalidPageSize {
                value: global_max_page_size,
            });
        }

        Ok(ShopifyConfig {
            api_version: self.api_version.unwrap_or_default(),
            host: self.host,
            user_agent_prefix: self.user_agent_prefix,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            global_max_page_size,
            cache_ttl: self.cache_ttl,
        })
    }
}
