//! Cost-aware GraphQL execution for the Shopify Admin API.
//!
//! The Admin API meters every call against a per-shop leaky bucket and
//! reports the bill in `extensions.cost`. This module sends operations,
//! reads that bill and keeps the integration inside its budget.
//!
//! # Overview
//!
//! - [`OperationDescriptor`]: document, variables, transform and response shape
//! - [`RequestExecutor`]: the retry loop; repays cost and retries on
//!   `THROTTLED` or `MAX_COST_EXCEEDED`
//! - [`ErrorClassifier`]: maps a response to exactly one [`ErrorClass`]
//! - [`CostRepayer`]: how long to sleep after a call
//! - [`AdaptiveBatchSizer`]: how far to shrink `limit` after a cost rejection
//! - [`ResultEnvelope`]: the shaped result plus cost and `pageInfo`
//! - [`GraphqlClient`]: the HTTP transport, with an optional response cache
//!
//! # Example
//!
//! ```rust,ignore
//! use serde::Deserialize;
//! use serde_json::json;
//! use shopify_graphql_executor::clients::graphql::{OperationDescriptor, RequestExecutor};
//! use shopify_graphql_executor::{Session, ShopDomain, ShopifyConfig};
//!
//! #[derive(Deserialize)]
//! struct Product {
//!     id: String,
//!     title: String,
//! }
//!
//! let session = Session::new(ShopDomain::new("my-store")?, "access-token");
//! let config = ShopifyConfig::builder().max_retries(3).build()?;
//! let executor = RequestExecutor::for_session(&session, &config);
//!
//! let descriptor: OperationDescriptor<Vec<Product>> = OperationDescriptor::new(
//!     "query Products($limit: Int!, $cursor: String) {
//!        products(first: $limit, after: $cursor) {
//!          nodes { id title }
//!          pageInfo { hasNextPage endCursor }
//!        }
//!      }",
//!     json!({ "limit": 250 }),
//! )
//! .with_transform(|mut data| data["products"]["nodes"].take());
//!
//! let page = executor.execute(&descriptor).await?;
//! println!("{} products, next page: {}", page.len(), page.has_next_page());
//! ```

mod batch;
mod cache;
mod classify;
mod client;
mod cost;
mod envelope;
mod errors;
mod executor;
mod operation;
mod pagination;
mod transport;

pub use batch::{AdaptiveBatchSizer, DIMINISHING_FACTOR};
pub use cache::{ResponseCache, DEFAULT_CACHE_CAPACITY};
pub use classify::{bulleted, ErrorClass, ErrorClassifier, UserError, MAX_COST_EXCEEDED, THROTTLED};
pub use client::GraphqlClient;
pub use cost::{CostRepayer, RequestCost, ThrottleStatus};
pub use envelope::ResultEnvelope;
pub use errors::GraphqlError;
pub use executor::{EventHook, ExecutorEvent, RequestExecutor};
pub use operation::{OperationDescriptor, OperationVariables, PageInfo, ResponseShape, Transform};
pub use transport::{GraphqlTransport, TransportResponse};
