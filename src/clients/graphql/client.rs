//! GraphQL client for the Shopify Admin API.
//!
//! [`GraphqlClient`] posts documents to `graphql.json` and is the default
//! [`GraphqlTransport`] behind the
//! [`RequestExecutor`](crate::clients::graphql::RequestExecutor).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::Session;
use crate::clients::graphql::cache::ResponseCache;
use crate::clients::graphql::transport::{GraphqlTransport, TransportResponse};
use crate::clients::graphql::GraphqlError;
use crate::clients::{DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
use crate::config::{ApiVersion, ShopifyConfig};

/// GraphQL API client for the Shopify Admin API.
///
/// GraphQL-level errors arrive with HTTP 200 and stay in the response body;
/// only HTTP-level failures are returned as errors.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_graphql_executor::{GraphqlClient, Session, ShopDomain};
/// use serde_json::json;
///
/// let session = Session::new(ShopDomain::new("my-store").unwrap(), "access-token");
/// let client = GraphqlClient::new(&session, None);
///
/// let response = client.query(
///     "query GetProduct($id: ID!) { product(id: $id) { title } }",
///     Some(json!({ "id": "gid://shopify/Product/123" })),
///     None,
/// ).await?;
/// println!("{}", response.body["data"]["product"]["title"]);
/// ```
#[derive(Debug)]
pub struct GraphqlClient {
    http_client: HttpClient,
    api_version: ApiVersion,
    cache: Option<ResponseCache>,
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient {
    /// Creates a client using the configured API version (or the latest
    /// stable one) and the configured cache TTL, if any.
    #[must_use]
    pub fn new(session: &Session, config: Option<&ShopifyConfig>) -> Self {
        let api_version = config.map_or_else(ApiVersion::latest, |c| *c.api_version());
        Self::create_client(session, config, api_version)
    }

    /// Creates a client pinned to `version`, ignoring the configured one.
    #[must_use]
    pub fn with_version(
        session: &Session,
        config: Option<&ShopifyConfig>,
        version: ApiVersion,
    ) -> Self {
        if let Some(cfg_version) = config.map(ShopifyConfig::api_version) {
            if &version == cfg_version {
                tracing::debug!(
                    "GraphQL client has a redundant API version override to the default {}",
                    cfg_version
                );
            } else {
                tracing::debug!(
                    "GraphQL client overriding default API version {} with {}",
                    cfg_version,
                    version
                );
            }
        }

        Self::create_client(session, config, version)
    }

    fn create_client(
        session: &Session,
        config: Option<&ShopifyConfig>,
        api_version: ApiVersion,
    ) -> Self {
        let base_path = format!("/admin/api/{api_version}");
        let http_client = HttpClient::new(base_path, session, config);
        let cache = config
            .and_then(ShopifyConfig::cache_ttl)
            .map(ResponseCache::new);

        Self {
            http_client,
            api_version,
            cache,
        }
    }

    /// Enables response caching with the given TTL, replacing any existing
    /// cache.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Some(ResponseCache::new(ttl));
        self
    }

    /// Returns the API version being used by this client.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the response cache, if caching is enabled.
    #[must_use]
    pub const fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Sends a GraphQL document to the Admin API.
    ///
    /// The response cache is not consulted; use the client through
    /// [`GraphqlTransport`] for cached sends.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::Http`] for network errors and non-2xx
    /// responses.
    pub async fn query(
        &self,
        query: &str,
        variables: Option<Value>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, GraphqlError> {
        Ok(self.execute_query(query, variables, headers, false).await?)
    }

    /// Same as [`query`](Self::query), with `?debug=true` appended so the
    /// `extensions` object carries extra cost detail.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::Http`] for HTTP-level errors.
    pub async fn query_with_debug(
        &self,
        query: &str,
        variables: Option<Value>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, GraphqlError> {
        Ok(self.execute_query(query, variables, headers, true).await?)
    }

    async fn execute_query(
        &self,
        query: &str,
        variables: Option<Value>,
        headers: Option<HashMap<String, String>>,
        debug: bool,
    ) -> Result<HttpResponse, HttpError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables
        });

        let mut builder = HttpRequest::builder(HttpMethod::Post, "graphql.json")
            .body(body)
            .body_type(DataType::Json);

        if debug {
            builder = builder.query_param("debug", "true");
        }
        if let Some(extra_headers) = headers {
            builder = builder.extra_headers(extra_headers);
        }

        let request = builder.build()?;
        self.http_client.request(request).await
    }
}

#[async_trait]
impl GraphqlTransport for GraphqlClient {
    async fn send(
        &self,
        document: &str,
        variables: &Value,
    ) -> Result<TransportResponse, HttpError> {
        if let Some(body) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(document, variables))
        {
            tracing::debug!("serving GraphQL response from cache");
            return Ok(TransportResponse::cached(body));
        }

        let variables_param = (!variables.is_null()).then(|| variables.clone());
        let response = self
            .execute_query(document, variables_param, None, false)
            .await?;

        if let Some(cache) = &self.cache {
            cache.insert(document, variables, &response.body);
        }
        Ok(TransportResponse::fresh(response.body))
    }
}
