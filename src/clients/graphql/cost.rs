//! Query cost metadata and cost repayment.
//!
//! Every Admin API response carries an `extensions.cost` object describing
//! what the call cost and the state of the shop's leaky bucket afterwards.
//! [`CostRepayer`] turns that into a pause so the bucket has refilled by the
//! time the next call goes out.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The leaky-bucket state reported by the server.
///
/// `restore_rate` is in points per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    /// Bucket capacity.
    #[serde(default)]
    pub maximum_available: f64,
    /// Points left in the bucket after this call.
    #[serde(default)]
    pub currently_available: f64,
    /// Points restored per second.
    #[serde(default)]
    pub restore_rate: f64,
}

/// The cost block of a single response.
///
/// A response without cost extensions (or with an unreadable one) yields the
/// all-zero default, which never causes a wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCost {
    /// Cost estimated from the query before execution.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub requested_query_cost: u32,
    /// Cost actually charged. The server sends `null` for rejected calls.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub actual_query_cost: u32,
    /// Bucket state after the call.
    #[serde(default)]
    pub throttle_status: ThrottleStatus,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

impl RequestCost {
    /// Reads `extensions.cost` from a raw GraphQL response body.
    #[must_use]
    pub fn from_response(body: &Value) -> Self {
        let Some(cost) = body.pointer("/extensions/cost") else {
            return Self::default();
        };
        serde_json::from_value(cost.clone()).unwrap_or_else(|error| {
            tracing::warn!(%error, "ignoring unreadable cost extensions");
            Self::default()
        })
    }

    /// Returns `true` if the response carried usable bucket information.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.throttle_status.restore_rate > 0.0
    }
}

/// Computes and performs the pause that repays a call's cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct CostRepayer;

impl CostRepayer {
    /// Returns how long to wait before the next call.
    ///
    /// After a successful call the wait covers the points just spent. After
    /// a throttled call it covers the whole gap between what is available
    /// and the bucket's capacity, so the retry starts from a full bucket.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use shopify_graphql_executor::clients::graphql::{CostRepayer, RequestCost, ThrottleStatus};
    ///
    /// let cost = RequestCost {
    ///     requested_query_cost: 100,
    ///     actual_query_cost: 100,
    ///     throttle_status: ThrottleStatus {
    ///         maximum_available: 2000.0,
    ///         currently_available: 500.0,
    ///         restore_rate: 50.0,
    ///     },
    /// };
    ///
    /// assert_eq!(CostRepayer::wait_duration(&cost, false), Duration::from_secs(2));
    /// assert_eq!(CostRepayer::wait_duration(&cost, true), Duration::from_secs(30));
    /// ```
    #[must_use]
    pub fn wait_duration(cost: &RequestCost, throttled: bool) -> Duration {
        let status = &cost.throttle_status;
        if status.restore_rate <= 0.0 {
            return Duration::ZERO;
        }

        let points = if throttled {
            status.maximum_available - status.currently_available
        } else {
            f64::from(cost.actual_query_cost)
        };

        let seconds = points / status.restore_rate;
        if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds)
        } else {
            Duration::ZERO
        }
    }

    /// Sleeps for [`wait_duration`](Self::wait_duration) and returns the
    /// duration waited. A zero duration returns immediately.
    pub async fn repay(cost: &RequestCost, throttled: bool) -> Duration {
        let wait = Self::wait_duration(cost, throttled);
        if !wait.is_zero() {
            tracing::debug!(
                wait_ms = wait.as_millis(),
                throttled,
                "repaying query cost"
            );
            tokio::time::sleep(wait).await;
        }
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cost(actual: u32, maximum: f64, available: f64, rate: f64) -> RequestCost {
        RequestCost {
            requested_query_cost: actual,
            actual_query_cost: actual,
            throttle_status: ThrottleStatus {
                maximum_available: maximum,
                currently_available: available,
                restore_rate: rate,
            },
        }
    }

    #[test]
    fn test_from_response_reads_cost_extensions() {
        let body = json!({
            "data": {},
            "extensions": { "cost": {
                "requestedQueryCost": 52,
                "actualQueryCost": 12,
                "throttleStatus": {
                    "maximumAvailable": 2000.0,
                    "currentlyAvailable": 1988,
                    "restoreRate": 100.0
                }
            }}
        });

        let cost = RequestCost::from_response(&body);
        assert_eq!(cost.requested_query_cost, 52);
        assert_eq!(cost.actual_query_cost, 12);
        assert!((cost.throttle_status.currently_available - 1988.0).abs() < f64::EPSILON);
        assert!(cost.is_known());
    }

    #[test]
    fn test_from_response_treats_null_actual_cost_as_zero() {
        let body = json!({
            "extensions": { "cost": {
                "requestedQueryCost": 752,
                "actualQueryCost": null,
                "throttleStatus": {
                    "maximumAvailable": 1000.0,
                    "currentlyAvailable": 50.0,
                    "restoreRate": 50.0
                }
            }}
        });

        let cost = RequestCost::from_response(&body);
        assert_eq!(cost.requested_query_cost, 752);
        assert_eq!(cost.actual_query_cost, 0);
    }

    #[test]
    fn test_from_response_without_extensions_is_default() {
        let cost = RequestCost::from_response(&json!({"data": {"shop": {}}}));
        assert_eq!(cost, RequestCost::default());
        assert!(!cost.is_known());
    }

    #[test]
    fn test_non_throttled_wait_covers_actual_cost() {
        let cost = cost(100, 1000.0, 900.0, 50.0);
        assert_eq!(
            CostRepayer::wait_duration(&cost, false),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_throttled_wait_restores_full_bucket() {
        let cost = cost(0, 2000.0, 500.0, 500.0);
        assert_eq!(
            CostRepayer::wait_duration(&cost, true),
            Duration::from_millis(3000)
        );
    }

    #[test]
    fn test_fractional_wait() {
        let cost = cost(40, 1000.0, 1000.0, 100.0);
        assert_eq!(
            CostRepayer::wait_duration(&cost, false),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn test_no_wait_without_positive_inputs() {
        assert!(CostRepayer::wait_duration(&cost(0, 1000.0, 1000.0, 50.0), false).is_zero());
        assert!(CostRepayer::wait_duration(&cost(10, 1000.0, 1000.0, 0.0), false).is_zero());
        assert!(CostRepayer::wait_duration(&cost(10, 1000.0, 1000.0, 50.0), true).is_zero());
        assert!(CostRepayer::wait_duration(&RequestCost::default(), true).is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repay_sleeps_for_the_computed_wait() {
        let start = tokio::time::Instant::now();
        let waited = CostRepayer::repay(&cost(100, 1000.0, 900.0, 50.0), false).await;

        assert_eq!(waited, Duration::from_secs(2));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
