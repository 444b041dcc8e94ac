//! HTTP and GraphQL client types.
//!
//! # Overview
//!
//! - [`HttpClient`]: sends one authenticated request per call
//! - [`HttpRequest`] / [`HttpResponse`]: the request and parsed response
//! - [`HttpMethod`] and [`DataType`]: method and body content type
//! - [`graphql`]: the cost-aware GraphQL execution engine built on top
//!
//! The HTTP layer never retries. Throttling on the Admin API GraphQL
//! endpoint is reported in the response body, so retry policy lives in
//! [`graphql::RequestExecutor`].
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_graphql_executor::{Session, ShopDomain};
//! use shopify_graphql_executor::clients::{DataType, HttpClient, HttpMethod, HttpRequest};
//! use serde_json::json;
//!
//! let session = Session::new(ShopDomain::new("my-store").unwrap(), "access-token");
//! let client = HttpClient::new("/admin/api/2025-10", &session, None);
//!
//! let request = HttpRequest::builder(HttpMethod::Post, "graphql.json")
//!     .body(json!({ "query": "{ shop { name } }" }))
//!     .body_type(DataType::Json)
//!     .build()
//!     .unwrap();
//!
//! let response = client.request(request).await?;
//! ```

mod errors;
pub mod graphql;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;

pub use graphql::{GraphqlClient, GraphqlError, RequestExecutor};
