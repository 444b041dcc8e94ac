//! Error classification of GraphQL responses.
//!
//! A response is classified into at most one [`ErrorClass`]. Business-rule
//! `userErrors` take precedence over everything, because a mutation can
//! succeed at the GraphQL level (`errors: null`) and still be rejected.
//! Among GraphQL-level errors the order is max-cost, then throttled, then
//! generic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::graphql::cost::RequestCost;
use crate::clients::graphql::operation::ResponseShape;

/// Extension code of a call whose requested cost exceeds the per-call maximum.
pub const MAX_COST_EXCEEDED: &str = "MAX_COST_EXCEEDED";

/// Extension code of a call rejected because the bucket is empty.
pub const THROTTLED: &str = "THROTTLED";

/// A business-rule violation reported in a mutation payload's `userErrors`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Machine-readable code, when the payload type provides one.
    #[serde(default)]
    pub code: Option<String>,
    /// Path to the offending input field.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl UserError {
    /// Reads a `userErrors` entry, keeping its raw JSON as the message when
    /// the entry has an unexpected shape.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| Self {
            message: value.to_string(),
            ..Self::default()
        })
    }
}

/// The single failure class of a response.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorClass {
    /// Business-rule violations. Never retried.
    User(Vec<UserError>),
    /// The bucket could not cover the call.
    Throttled {
        /// Cost block of the rejected response.
        cost: RequestCost,
    },
    /// The call's requested cost exceeds the per-call maximum.
    MaxCostExceeded {
        /// Cost the server computed for the call.
        cost: f64,
        /// Maximum cost a single call may have.
        max_cost: f64,
    },
    /// Any other GraphQL error, with bulleted, deduplicated messages.
    Generic {
        /// The formatted message list.
        message: String,
    },
}

/// Classifies raw GraphQL responses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classifies a response body, returning `None` for a clean response.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    /// use shopify_graphql_executor::clients::graphql::{
    ///     ErrorClass, ErrorClassifier, RequestCost, ResponseShape,
    /// };
    ///
    /// let body = json!({
    ///     "data": null,
    ///     "errors": [{ "message": "Throttled", "extensions": { "code": "THROTTLED" } }]
    /// });
    /// let cost = RequestCost::from_response(&body);
    ///
    /// let class = ErrorClassifier::classify(&body, &ResponseShape::Scan, &cost);
    /// assert!(matches!(class, Some(ErrorClass::Throttled { .. })));
    /// ```
    #[must_use]
    pub fn classify(body: &Value, shape: &ResponseShape, cost: &RequestCost) -> Option<ErrorClass> {
        if let Some(data) = body.get("data") {
            let user_errors = shape.user_errors(data);
            if !user_errors.is_empty() {
                return Some(ErrorClass::User(user_errors));
            }
        }

        let errors = body
            .get("errors")
            .and_then(Value::as_array)
            .filter(|errors| !errors.is_empty())?;

        if let Some(error) = errors.iter().find(|e| error_code(e) == Some(MAX_COST_EXCEEDED)) {
            let extensions = error.get("extensions");
            let requested = extensions
                .and_then(|ext| ext.get("cost"))
                .and_then(Value::as_f64)
                .unwrap_or_else(|| f64::from(cost.requested_query_cost));
            let max_cost = extensions
                .and_then(|ext| ext.get("maxCost"))
                .and_then(Value::as_f64)
                .unwrap_or(cost.throttle_status.maximum_available);
            return Some(ErrorClass::MaxCostExceeded {
                cost: requested,
                max_cost,
            });
        }

        if errors.iter().any(|e| error_code(e) == Some(THROTTLED)) {
            return Some(ErrorClass::Throttled { cost: *cost });
        }

        let message = bulleted(errors.iter().map(|error| {
            error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), ToString::to_string)
        }));
        Some(ErrorClass::Generic { message })
    }
}

fn error_code(error: &Value) -> Option<&str> {
    error.pointer("/extensions/code").and_then(Value::as_str)
}

/// Formats messages as a bulleted list, one per line, dropping exact
/// duplicates while keeping first-seen order.
pub fn bulleted<I, S>(messages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    for message in messages {
        let message = message.as_ref();
        if !seen.iter().any(|m| m == message) {
            seen.push(message.to_string());
        }
    }
    seen.iter()
        .map(|m| format!("• {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}
