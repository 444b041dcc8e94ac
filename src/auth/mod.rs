//! Credentials for Admin API calls.
//!
//! A [`Session`] pairs a shop with the access token the spreadsheet host
//! obtained for it. How that token was obtained (OAuth, custom app install,
//! client credentials) is outside this crate.
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql_executor::{Session, ShopDomain};
//!
//! let session = Session::new(ShopDomain::new("my-store").unwrap(), "shpat_123");
//! assert!(session.is_active());
//! ```

pub mod session;

pub use session::Session;
