//! Configuration error types.
//!
//! Every configuration constructor in this crate returns
//! `Result<T, ConfigError>` so that invalid settings are rejected before any
//! request reaches the Admin API.
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql_executor::{ConfigError, ShopDomain};
//!
//! let result = ShopDomain::new("");
//! assert!(matches!(result, Err(ConfigError::InvalidShopDomain { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while building or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2025-01') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://proxy.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// The global page size ceiling must allow at least one node per page.
    #[error("Invalid global max page size {value}. It must be at least 1.")]
    InvalidPageSize {
        /// The rejected page size.
        value: u32,
    },

    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value '{value}' for environment variable {name}. Expected a non-negative integer.")]
    InvalidEnvironmentValue {
        /// The environment variable name.
        name: &'static str,
        /// The raw value read from the environment.
        value: String,
    },
}
