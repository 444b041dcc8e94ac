//! HTTP client for Admin API communication.
//!
//! [`HttpClient`] sends exactly one request per call. Capacity-related
//! retries belong to the GraphQL execution engine, which reads them from the
//! response body rather than from HTTP status codes.

use std::collections::HashMap;

use crate::auth::Session;
use crate::clients::errors::{HttpError, HttpResponseError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::ShopifyConfig;

/// Crate version from Cargo.toml, reported in the `User-Agent` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client bound to one shop.
///
/// The client handles:
/// - base URI construction from the session shop or the configured host
/// - default headers (`User-Agent`, `Accept`, access token)
/// - body parsing and error serialization for non-2xx responses
///
/// # Example
///
/// ```rust
/// use shopify_graphql_executor::{Session, ShopDomain};
/// use shopify_graphql_executor::clients::HttpClient;
///
/// let session = Session::new(ShopDomain::new("my-store").unwrap(), "token");
/// let client = HttpClient::new("/admin/api/2025-10", &session, None);
///
/// assert_eq!(client.base_uri(), "https://my-store.myshopify.com");
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_uri: String,
    base_path: String,
    default_headers: HashMap<String, String>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client for the given session.
    ///
    /// When the configuration carries a host override, requests go to that
    /// origin and the shop domain is sent in the `Host` header.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created, which only
    /// happens when TLS initialization fails.
    #[must_use]
    pub fn new(
        base_path: impl Into<String>,
        session: &Session,
        config: Option<&ShopifyConfig>,
    ) -> Self {
        let api_host = config.and_then(ShopifyConfig::host);
        let base_uri = api_host.map_or_else(
            || format!("https://{}", session.shop.as_ref()),
            |host| host.origin().to_string(),
        );

        let user_agent_prefix = config
            .and_then(ShopifyConfig::user_agent_prefix)
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}Shopify GraphQL Executor v{SDK_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        if api_host.is_some() {
            default_headers.insert("Host".to_string(), session.shop.as_ref().to_string());
        }

        if session.is_active() {
            default_headers.insert(
                "X-Shopify-Access-Token".to_string(),
                session.access_token.clone(),
            );
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_uri,
            base_path: base_path.into(),
            default_headers,
        }
    }

    /// Returns the base URI for this client.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the base path for this client.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Sends an HTTP request.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - request validation fails (`InvalidRequest`)
    /// - a network error occurs (`Network`)
    /// - the response status is not 2xx (`Response`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = format!("{}{}/{}", self.base_uri, self.base_path, request.path);

        let mut req_builder = match request.http_method {
            HttpMethod::Post => self.client.post(&url),
        };

        for (key, value) in &self.default_headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(body_type) = &request.body_type {
            req_builder = req_builder.header("Content-Type", body_type.as_content_type());
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                req_builder = req_builder.header(key, value);
            }
        }
        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }
        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.to_string());
        }

        tracing::debug!(path = %request.path, "sending Admin API request");
        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await?;
        let body = Self::parse_body(code, &body_text);

        let response = HttpResponse::new(code, headers, body);

        if let Some(reason) = response.deprecation_reason() {
            tracing::warn!(
                "Deprecated request to Shopify API at {}, received reason: {}",
                request.path,
                reason
            );
        }

        if response.is_ok() {
            return Ok(response);
        }

        Err(HttpError::Response(HttpResponseError {
            code,
            message: Self::serialize_error(&response),
            error_reference: response.request_id().map(String::from),
        }))
    }

    fn parse_body(code: u16, body_text: &str) -> serde_json::Value {
        if body_text.is_empty() {
            return serde_json::json!({});
        }
        serde_json::from_str(body_text).unwrap_or_else(|_| {
            if code >= 500 {
                serde_json::json!({ "raw_body": body_text })
            } else {
                serde_json::json!({})
            }
        })
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let value = value.to_str().unwrap_or_default().to_string();
            result
                .entry(name.as_str().to_lowercase())
                .or_default()
                .push(value);
        }
        result
    }

    fn serialize_error(response: &HttpResponse) -> String {
        let mut error_body = serde_json::Map::new();

        for key in ["errors", "error", "raw_body"] {
            if let Some(value) = response.body.get(key) {
                error_body.insert(key.to_string(), value.clone());
            }
        }
        if response.body.get("error").is_some() {
            if let Some(desc) = response.body.get("error_description") {
                error_body.insert("error_description".to_string(), desc.clone());
            }
        }

        if let Some(request_id) = response.request_id() {
            error_body.insert(
                "error_reference".to_string(),
                serde_json::json!(format!(
                    "If you report this error, please include this id: {request_id}."
                )),
            );
        }

        serde_json::Value::Object(error_body).to_string()
    }
}
