//! # Shopify GraphQL Executor
//!
//! Cost-aware execution of Shopify Admin API GraphQL operations.
//!
//! ## Overview
//!
//! The Admin API charges every GraphQL call against a per-shop leaky bucket.
//! This crate sends operations and reads the cost report of each response.
//! It sleeps long enough to repay what was spent, waits out throttling and
//! shrinks page sizes when a single call is too expensive. Callers describe
//! an operation once and receive a typed result:
//!
//! - Type-safe configuration via [`ShopifyConfig`] and [`ShopifyConfigBuilder`]
//! - Validated newtypes for shop domains, host overrides and API versions
//! - [`Session`] credentials for authenticated calls
//! - [`RequestExecutor`] with a bounded retry loop and an event hook
//! - Pagination over connections via `RequestExecutor::execute_all`
//! - An optional TTL response cache on [`GraphqlClient`]
//!
//! ## Quick Start
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
//!
//! ## Executing Operations
//!
//! ```rust,ignore
//! use serde_json::{json, Value};
//! use shopify_graphql_executor::clients::graphql::OperationDescriptor;
//! use shopify_graphql_executor::{RequestExecutor, Session, ShopDomain, ShopifyConfigBuilder};
//!
//! let session = Session::new(ShopDomain::new("my-store")?, "access-token");
//! let config = ShopifyConfigBuilder::from_env()?.build()?;
//! let executor = RequestExecutor::for_session(&session, &config);
//!
//! let descriptor: OperationDescriptor<Vec<Value>> = OperationDescriptor::new(
//!     "query Orders($limit: Int!, $cursor: String) {
//!        orders(first: $limit, after: $cursor) {
//!          nodes { id name }
//!          pageInfo { hasNextPage endCursor }
//!        }
//!      }",
//!     json!({ "limit": 250 }),
//! )
//! .with_transform(|mut data| data["orders"]["nodes"].take());
//!
//! let orders = executor.execute_all(&descriptor).await?;
//! println!("{} orders, {} retries", orders.len(), orders.retries);
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **One call at a time**: an executor serializes the calls made through it
//! - **Async-first**: designed for the Tokio runtime

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;

// Re-export public types at crate root for convenience
pub use auth::Session;
pub use config::{ApiVersion, HostUrl, ShopDomain, ShopifyConfig, ShopifyConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError,
};

// Re-export the execution engine
pub use clients::graphql::{
    GraphqlClient, GraphqlError, OperationDescriptor, RequestExecutor, ResultEnvelope,
};
