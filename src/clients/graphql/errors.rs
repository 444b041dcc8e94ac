//! Errors surfaced by GraphQL execution.
//!
//! HTTP failures are wrapped unchanged. Everything else is derived from the
//! response body by the [`ErrorClassifier`](super::ErrorClassifier): user
//! errors and generic GraphQL errors are terminal, while throttling and
//! max-cost rejections only surface once the retry budget is spent.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_graphql_executor::clients::graphql::GraphqlError;
//!
//! match executor.execute(&descriptor).await {
//!     Ok(envelope) => println!("{:?}", envelope.body),
//!     Err(GraphqlError::UserErrors { errors }) => {
//!         for error in errors {
//!             println!("rejected: {}", error.message);
//!         }
//!     }
//!     Err(GraphqlError::RetryLimitExceeded { retries, .. }) => {
//!         println!("gave up after {retries} retries");
//!     }
//!     Err(other) => println!("{other}"),
//! }
//! ```

use crate::clients::graphql::classify::{bulleted, UserError};
use crate::clients::HttpError;
use thiserror::Error;

/// Error type for GraphQL execution.
///
/// # Example
///
/// ```rust
/// use shopify_graphql_executor::clients::graphql::GraphqlError;
/// use shopify_graphql_executor::clients::{HttpError, HttpResponseError};
///
/// let http_error = HttpError::Response(HttpResponseError {
///     code: 401,
///     message: r#"{"error":"Unauthorized"}"#.to_string(),
///     error_reference: None,
/// });
/// let graphql_error: GraphqlError = http_error.into();
/// assert!(graphql_error.to_string().contains("Unauthorized"));
/// ```
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// The request never produced a GraphQL response body.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The mutation payload reported business-rule violations.
    #[error("{}", bulleted(.errors.iter().map(|e| e.message.as_str())))]
    UserErrors {
        /// Every `userErrors` entry found in the response.
        errors: Vec<UserError>,
    },

    /// The response carried GraphQL errors that are not capacity related.
    #[error("{message}")]
    Graphql {
        /// Bulleted, deduplicated error messages.
        message: String,
    },

    /// Throttling or max-cost rejections continued past the retry budget.
    #[error("Exceeded maximum retry count of {max_retries}. Retried {retries} times.")]
    RetryLimitExceeded {
        /// Retries attempted before giving up.
        retries: u32,
        /// The configured retry budget.
        max_retries: u32,
    },

    /// The operation cannot be executed as described.
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// What is wrong with the operation.
        reason: String,
    },

    /// The shaped `data` did not match the requested result type.
    #[error("Failed to deserialize GraphQL data: {0}")]
    Deserialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpResponseError;

    #[test]
    fn test_http_error_is_transparent() {
        let graphql_error: GraphqlError = HttpError::Response(HttpResponseError {
            code: 404,
            message: r#"{"error":"Not Found"}"#.to_string(),
            error_reference: Some("abc-123".to_string()),
        })
        .into();

        assert!(matches!(graphql_error, GraphqlError::Http(_)));
        assert_eq!(graphql_error.to_string(), r#"{"error":"Not Found"}"#);
    }

    #[test]
    fn test_user_errors_display_as_bulleted_list() {
        let error = GraphqlError::UserErrors {
            errors: vec![
                UserError {
                    message: "Title can't be blank".to_string(),
                    ..UserError::default()
                },
                UserError {
                    message: "Price must be positive".to_string(),
                    ..UserError::default()
                },
            ],
        };

        assert_eq!(
            error.to_string(),
            "• Title can't be blank\n• Price must be positive"
        );
    }

    #[test]
    fn test_retry_limit_message() {
        let error = GraphqlError::RetryLimitExceeded {
            retries: 5,
            max_retries: 5,
        };

        assert_eq!(
            error.to_string(),
            "Exceeded maximum retry count of 5. Retried 5 times."
        );
    }

    #[test]
    fn test_all_error_variants_implement_std_error() {
        let error: &dyn std::error::Error = &GraphqlError::InvalidOperation {
            reason: "no limit".to_string(),
        };
        assert!(error.to_string().contains("no limit"));
    }
}
