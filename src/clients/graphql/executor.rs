//! Cost-aware execution of GraphQL operations.
//!
//! [`RequestExecutor`] sends an [`OperationDescriptor`] through a
//! [`GraphqlTransport`] and keeps going until the call succeeds, fails for a
//! reason retrying cannot fix, or the retry budget runs out:
//!
//! - a clean response repays its cost (sleeping `actualQueryCost /
//!   restoreRate`) and is shaped into a [`ResultEnvelope`]
//! - `THROTTLED` waits for the bucket to refill completely, then retries
//! - `MAX_COST_EXCEEDED` shrinks the `limit` variable, then retries
//! - user errors and other GraphQL errors fail immediately
//!
//! Both retry paths share one budget per call. Once more than
//! `max_retries` consecutive retryable failures have been seen the call
//! fails with [`GraphqlError::RetryLimitExceeded`] without sending again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::auth::Session;
use crate::clients::graphql::batch::AdaptiveBatchSizer;
use crate::clients::graphql::classify::{ErrorClass, ErrorClassifier};
use crate::clients::graphql::cost::{CostRepayer, RequestCost};
use crate::clients::graphql::envelope::ResultEnvelope;
use crate::clients::graphql::errors::GraphqlError;
use crate::clients::graphql::operation::{OperationDescriptor, OperationVariables};
use crate::clients::graphql::transport::GraphqlTransport;
use crate::clients::graphql::GraphqlClient;
use crate::config::ShopifyConfig;

/// A step of an execution, reported to the event hook.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutorEvent<'a> {
    /// A request is about to be sent.
    Request {
        /// The GraphQL document.
        document: &'a str,
        /// The serialized variables of this attempt.
        variables: &'a Value,
        /// Retries spent so far.
        retries: u32,
    },
    /// A response body arrived.
    Response {
        /// Its cost block.
        cost: &'a RequestCost,
        /// Whether it came from the response cache.
        from_cache: bool,
    },
    /// The call was throttled and will be retried.
    Throttled {
        /// Cost block of the rejected call.
        cost: &'a RequestCost,
        /// Retries spent before this one.
        retries: u32,
    },
    /// The call was too expensive; the page size was reduced.
    LimitReduced {
        /// Maximum cost of a single call.
        max_cost: f64,
        /// Cost of the rejected call.
        cost: f64,
        /// Page size of the rejected call.
        previous: u32,
        /// Page size of the retry.
        reduced: u32,
        /// Retries spent before this one.
        retries: u32,
    },
    /// The executor slept to repay query cost.
    Repaid {
        /// How long it slept.
        wait: Duration,
        /// Whether this was the full-restore wait after throttling.
        throttled: bool,
    },
}

/// Callback receiving every [`ExecutorEvent`].
pub type EventHook = Arc<dyn Fn(&ExecutorEvent<'_>) + Send + Sync>;

/// Executes GraphQL operations while respecting the shop's cost budget.
///
/// One executor serializes every call made through it: concurrent
/// `execute` calls on the same instance run one after another. Separate
/// instances do not coordinate, even against the same shop.
///
/// # Example
///
/// ```rust,ignore
/// use serde_json::json;
/// use shopify_graphql_executor::clients::graphql::{OperationDescriptor, RequestExecutor};
/// use shopify_graphql_executor::{Session, ShopDomain, ShopifyConfig};
///
/// let session = Session::new(ShopDomain::new("my-store")?, "access-token");
/// let config = ShopifyConfig::default();
/// let executor = RequestExecutor::for_session(&session, &config);
///
/// let descriptor: OperationDescriptor<serde_json::Value> =
///     OperationDescriptor::new("query { shop { name } }", json!({}))
///         .with_transform(|mut data| data["shop"]["name"].take());
///
/// let envelope = executor.execute(&descriptor).await?;
/// println!("{} (cost {})", envelope.body, envelope.cost.actual_query_cost);
/// ```
pub struct RequestExecutor<C = GraphqlClient> {
    transport: C,
    max_retries: u32,
    batch_sizer: AdaptiveBatchSizer,
    hook: Option<EventHook>,
    gate: Mutex<()>,
}

impl RequestExecutor<GraphqlClient> {
    /// Creates an executor backed by a [`GraphqlClient`] for `session`.
    #[must_use]
    pub fn for_session(session: &Session, config: &ShopifyConfig) -> Self {
        Self::new(GraphqlClient::new(session, Some(config)), config)
    }
}

impl<C: GraphqlTransport> RequestExecutor<C> {
    /// Creates an executor using the retry budget and page size cap from
    /// `config`.
    #[must_use]
    pub fn new(transport: C, config: &ShopifyConfig) -> Self {
        Self::with_limits(
            transport,
            config.max_retries(),
            config.global_max_page_size(),
        )
    }

    /// Creates an executor with explicit limits.
    #[must_use]
    pub fn with_limits(transport: C, max_retries: u32, global_max_page_size: u32) -> Self {
        Self {
            transport,
            max_retries,
            batch_sizer: AdaptiveBatchSizer::new(global_max_page_size),
            hook: None,
            gate: Mutex::new(()),
        }
    }

    /// Registers a callback invoked for every [`ExecutorEvent`].
    #[must_use]
    pub fn with_event_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExecutorEvent<'_>) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &C {
        &self.transport
    }

    /// Returns the retry budget of a single call.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the page sizer.
    #[must_use]
    pub const fn batch_sizer(&self) -> &AdaptiveBatchSizer {
        &self.batch_sizer
    }

    fn emit(&self, event: &ExecutorEvent<'_>) {
        if let Some(hook) = &self.hook {
            hook(event);
        }
    }

    /// Executes `descriptor` and returns its shaped result.
    ///
    /// # Errors
    ///
    /// - [`GraphqlError::Http`] when the transport fails; never retried
    /// - [`GraphqlError::UserErrors`] when the payload reports `userErrors`
    /// - [`GraphqlError::Graphql`] for any other GraphQL error
    /// - [`GraphqlError::InvalidOperation`] when a cost rejection hits an
    ///   operation without a `limit` variable
    /// - [`GraphqlError::RetryLimitExceeded`] when the retry budget is spent
    /// - [`GraphqlError::Deserialize`] when the shaped data is not a `T`
    pub async fn execute<T, V>(
        &self,
        descriptor: &OperationDescriptor<T, V>,
    ) -> Result<ResultEnvelope<T>, GraphqlError>
    where
        T: DeserializeOwned,
        V: OperationVariables,
    {
        let (envelope, _) = self.run(descriptor, descriptor.variables().clone()).await?;
        Ok(envelope)
    }

    /// Runs the retry loop starting from `variables` and returns the
    /// envelope together with the variables of the successful attempt.
    pub(crate) async fn run<T, V>(
        &self,
        descriptor: &OperationDescriptor<T, V>,
        mut variables: V,
    ) -> Result<(ResultEnvelope<T>, V), GraphqlError>
    where
        T: DeserializeOwned,
        V: OperationVariables,
    {
        let _gate = self.gate.lock().await;
        let mut retries: u32 = 0;

        loop {
            self.check_retry_budget(retries)?;

            let wire_variables =
                serde_json::to_value(&variables).map_err(|error| GraphqlError::InvalidOperation {
                    reason: format!("variables could not be serialized: {error}"),
                })?;
            self.emit(&ExecutorEvent::Request {
                document: descriptor.document(),
                variables: &wire_variables,
                retries,
            });

            let response = self
                .transport
                .send(descriptor.document(), &wire_variables)
                .await?;
            let mut body = response.body;
            let from_cache = response.from_cache;
            let cost = RequestCost::from_response(&body);
            self.emit(&ExecutorEvent::Response {
                cost: &cost,
                from_cache,
            });

            match ErrorClassifier::classify(&body, descriptor.shape(), &cost) {
                None => {}
                Some(ErrorClass::User(errors)) => {
                    return Err(GraphqlError::UserErrors { errors });
                }
                Some(ErrorClass::Generic { message }) => {
                    return Err(GraphqlError::Graphql { message });
                }
                Some(ErrorClass::Throttled { cost }) => {
                    self.recover_throttled(&cost, retries).await;
                    retries += 1;
                    continue;
                }
                Some(ErrorClass::MaxCostExceeded { cost, max_cost }) => {
                    self.recover_max_cost(&mut variables, max_cost, cost, retries)?;
                    retries += 1;
                    continue;
                }
            }

            let data = body.get_mut("data").map(Value::take).unwrap_or_default();
            let page_info = descriptor.shape().page_info(&data);

            if !from_cache {
                self.repay(&cost).await;
            }

            let body = serde_json::from_value(descriptor.shape_result(data))?;
            let envelope = ResultEnvelope {
                body,
                cost,
                page_info,
                retries,
                from_cache,
            };
            return Ok((envelope, variables));
        }
    }

    fn check_retry_budget(&self, retries: u32) -> Result<(), GraphqlError> {
        if retries == 0 {
            return Ok(());
        }
        tracing::debug!(retries, max_retries = self.max_retries, "retrying GraphQL call");
        if retries > self.max_retries {
            tracing::warn!(
                max_retries = self.max_retries,
                "giving up on GraphQL call after exhausting retries"
            );
            return Err(GraphqlError::RetryLimitExceeded {
                retries: retries - 1,
                max_retries: self.max_retries,
            });
        }
        Ok(())
    }

    /// Waits for the bucket to refill completely after a throttled call.
    async fn recover_throttled(&self, cost: &RequestCost, retries: u32) {
        tracing::warn!(
            retries,
            currently_available = cost.throttle_status.currently_available,
            "GraphQL call throttled"
        );
        self.emit(&ExecutorEvent::Throttled { cost, retries });
        let wait = CostRepayer::repay(cost, true).await;
        self.emit(&ExecutorEvent::Repaid {
            wait,
            throttled: true,
        });
    }

    /// Shrinks the `limit` of `variables` after a max-cost rejection.
    fn recover_max_cost<V: OperationVariables>(
        &self,
        variables: &mut V,
        max_cost: f64,
        cost: f64,
        retries: u32,
    ) -> Result<(), GraphqlError> {
        let (previous, reduced) = self.batch_sizer.shrink(variables, max_cost, cost)?;
        tracing::warn!(
            cost,
            max_cost,
            previous,
            reduced,
            "GraphQL call exceeded max cost, reducing page size"
        );
        self.emit(&ExecutorEvent::LimitReduced {
            max_cost,
            cost,
            previous,
            reduced,
            retries,
        });
        Ok(())
    }

    async fn repay(&self, cost: &RequestCost) {
        if !cost.is_known() {
            tracing::warn!("GraphQL response carried no cost information");
        }
        let wait = CostRepayer::repay(cost, false).await;
        self.emit(&ExecutorEvent::Repaid {
            wait,
            throttled: false,
        });
    }
}

impl<C: fmt::Debug> fmt::Debug for RequestExecutor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("transport", &self.transport)
            .field("max_retries", &self.max_retries)
            .field("batch_sizer", &self.batch_sizer)
            .field("hook", &self.hook.as_ref().map(|_| "<fn>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::graphql::transport::TransportResponse;
    use crate::clients::HttpError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    struct Scripted {
        responses: StdMutex<Vec<Value>>,
        calls: StdMutex<u32>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Value>) -> Self {
            responses.reverse();
            Self {
                responses: StdMutex::new(responses),
                calls: StdMutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl GraphqlTransport for Scripted {
        async fn send(
            &self,
            _document: &str,
            _variables: &Value,
        ) -> Result<TransportResponse, HttpError> {
            *self.calls.lock().unwrap() += 1;
            let body = self.responses.lock().unwrap().pop().unwrap_or_default();
            Ok(TransportResponse::fresh(body))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_response_is_shaped() {
        let executor = RequestExecutor::with_limits(
            Scripted::new(vec![json!({ "data": { "shop": { "name": "Demo" } } })]),
            5,
            250,
        );
        let descriptor: OperationDescriptor<String, ()> =
            OperationDescriptor::new("{ shop { name } }", ())
                .with_transform(|mut data| data["shop"]["name"].take());

        let envelope = executor.execute(&descriptor).await.unwrap();

        assert_eq!(envelope.body, "Demo");
        assert_eq!(envelope.retries, 0);
        assert!(envelope.page_info.is_none());
        assert_eq!(executor.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_error_is_not_retried() {
        let executor = RequestExecutor::with_limits(
            Scripted::new(vec![json!({ "errors": [{ "message": "Parse error" }] })]),
            5,
            250,
        );
        let descriptor: OperationDescriptor<Value, ()> = OperationDescriptor::new("{ shop", ());

        let error = executor.execute(&descriptor).await.unwrap_err();

        assert_eq!(error.to_string(), "• Parse error");
        assert_eq!(executor.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retry_budget_fails_after_first_throttle() {
        let throttled = json!({
            "errors": [{ "message": "Throttled", "extensions": { "code": "THROTTLED" } }]
        });
        let executor =
            RequestExecutor::with_limits(Scripted::new(vec![throttled.clone(), throttled]), 0, 250);
        let descriptor: OperationDescriptor<Value, ()> = OperationDescriptor::new("{ shop }", ());

        let error = executor.execute(&descriptor).await.unwrap_err();

        assert!(matches!(
            error,
            GraphqlError::RetryLimitExceeded {
                retries: 0,
                max_retries: 0
            }
        ));
        assert_eq!(executor.transport().calls(), 1);
    }

    fn recording_executor(events: &Arc<StdMutex<Vec<String>>>) -> RequestExecutor<Scripted> {
        let events = Arc::clone(events);
        RequestExecutor::with_limits(Scripted::new(Vec::new()), 5, 100).with_event_hook(
            move |event| {
                let line = match event {
                    ExecutorEvent::Throttled { retries, .. } => format!("throttled {retries}"),
                    ExecutorEvent::LimitReduced {
                        previous, reduced, ..
                    } => format!("limit {previous}->{reduced}"),
                    ExecutorEvent::Repaid { wait, throttled } => {
                        format!("repaid {}ms {throttled}", wait.as_millis())
                    }
                    _ => return,
                };
                events.lock().unwrap().push(line);
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_throttled_waits_for_a_full_bucket() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let executor = recording_executor(&events);
        let cost = RequestCost::from_response(&json!({ "extensions": { "cost": {
            "requestedQueryCost": 400,
            "actualQueryCost": null,
            "throttleStatus": {
                "maximumAvailable": 1000.0,
                "currentlyAvailable": 0.0,
                "restoreRate": 50.0
            }
        }}}));

        let start = tokio::time::Instant::now();
        executor.recover_throttled(&cost, 2).await;

        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert_eq!(
            *events.lock().unwrap(),
            ["throttled 2", "repaid 20000ms true"]
        );
    }

    #[test]
    fn test_recover_max_cost_shrinks_limit_and_reports() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let executor = recording_executor(&events);
        let mut variables = json!({ "limit": 100 });

        executor
            .recover_max_cost(&mut variables, 1000.0, 4000.0, 0)
            .unwrap();

        assert_eq!(variables["limit"], 18);
        assert_eq!(*events.lock().unwrap(), ["limit 100->18"]);
    }

    #[test]
    fn test_recover_max_cost_without_limit_is_invalid() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let executor = recording_executor(&events);
        let mut variables = json!({ "id": "1" });

        let error = executor
            .recover_max_cost(&mut variables, 1000.0, 4000.0, 0)
            .unwrap_err();

        assert!(matches!(error, GraphqlError::InvalidOperation { .. }));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_retry_budget_allows_exactly_max_retries() {
        let executor = RequestExecutor::with_limits(Scripted::new(Vec::new()), 2, 100);

        assert!(executor.check_retry_budget(0).is_ok());
        assert!(executor.check_retry_budget(2).is_ok());
        assert!(matches!(
            executor.check_retry_budget(3),
            Err(GraphqlError::RetryLimitExceeded {
                retries: 2,
                max_retries: 2
            })
        ));
    }

    #[test]
    fn test_debug_hides_hook() {
        let executor = RequestExecutor::with_limits(
            GraphqlClient::new(
                &Session::new(crate::config::ShopDomain::new("demo").unwrap(), "t"),
                None,
            ),
            5,
            250,
        )
        .with_event_hook(|_| {});

        let debug = format!("{executor:?}");
        assert!(debug.contains("<fn>"));
        assert!(debug.contains("max_retries: 5"));
    }
}
