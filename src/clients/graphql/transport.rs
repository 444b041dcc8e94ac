//! The seam between the executor and the wire.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::clients::HttpError;

/// A raw GraphQL response as seen by the executor.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    /// The full response body (`data`, `errors`, `extensions`).
    pub body: Value,
    /// Whether the body was served from a response cache.
    pub from_cache: bool,
}

impl TransportResponse {
    /// Wraps a body that came over the network.
    #[must_use]
    pub const fn fresh(body: Value) -> Self {
        Self {
            body,
            from_cache: false,
        }
    }

    /// Wraps a body served from a cache.
    #[must_use]
    pub const fn cached(body: Value) -> Self {
        Self {
            body,
            from_cache: true,
        }
    }
}

/// Sends one GraphQL document and returns the raw response body.
///
/// Implementations perform exactly one attempt per call. HTTP-level failures
/// are returned as [`HttpError`] and are never retried by the executor.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Sends `document` with `variables`.
    async fn send(&self, document: &str, variables: &Value)
        -> Result<TransportResponse, HttpError>;
}

#[async_trait]
impl<T: GraphqlTransport + ?Sized> GraphqlTransport for Arc<T> {
    async fn send(
        &self,
        document: &str,
        variables: &Value,
    ) -> Result<TransportResponse, HttpError> {
        (**self).send(document, variables).await
    }
}
