//! Fetching every page of a connection.

use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::clients::graphql::envelope::ResultEnvelope;
use crate::clients::graphql::errors::GraphqlError;
use crate::clients::graphql::executor::RequestExecutor;
use crate::clients::graphql::operation::{OperationDescriptor, OperationVariables};
use crate::clients::graphql::transport::GraphqlTransport;

impl<C: GraphqlTransport> RequestExecutor<C> {
    /// Executes a list operation page by page and concatenates the results.
    ///
    /// Each page goes through [`execute`](Self::execute) semantics with its
    /// own retry budget. After a page, the `cursor` variable is set to
    /// `pageInfo.endCursor` until `hasNextPage` is false or no cursor is
    /// returned. A page size reduced after a cost rejection stays reduced
    /// for the remaining pages.
    ///
    /// The returned envelope carries the cost and `pageInfo` of the last
    /// page, the total retries across pages, and `from_cache` only when
    /// every page was served from cache.
    ///
    /// # Errors
    ///
    /// Any error of a single page ends the walk. Additionally returns
    /// [`GraphqlError::InvalidOperation`] if the server repeats a cursor or
    /// the variables cannot carry one.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let descriptor: OperationDescriptor<Vec<Product>> = OperationDescriptor::new(
    ///     "query Products($limit: Int!, $cursor: String) {
    ///        products(first: $limit, after: $cursor) {
    ///          nodes { id title }
    ///          pageInfo { hasNextPage endCursor }
    ///        }
    ///      }",
    ///     json!({ "limit": 250 }),
    /// )
    /// .with_transform(|mut data| data["products"]["nodes"].take());
    ///
    /// let all = executor.execute_all(&descriptor).await?;
    /// println!("{} products", all.len());
    /// ```
    pub async fn execute_all<I, V>(
        &self,
        descriptor: &OperationDescriptor<Vec<I>, V>,
    ) -> Result<ResultEnvelope<Vec<I>>, GraphqlError>
    where
        I: DeserializeOwned,
        V: OperationVariables,
    {
        let mut variables = descriptor.variables().clone();
        let mut items = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut retries = 0;
        let mut all_cached = true;
        let mut pages: u32 = 0;

        loop {
            let (page, used) = self.run(descriptor, variables).await?;
            variables = used;
            pages += 1;

            let ResultEnvelope {
                body,
                cost,
                page_info,
                retries: page_retries,
                from_cache,
            } = page;
            items.extend(body);
            retries += page_retries;
            all_cached &= from_cache;

            let next_cursor = page_info
                .as_ref()
                .filter(|info| info.has_next_page)
                .and_then(|info| info.end_cursor.clone());

            let Some(cursor) = next_cursor else {
                tracing::debug!(pages, items = items.len(), "fetched all pages");
                return Ok(ResultEnvelope {
                    body: items,
                    cost,
                    page_info,
                    retries,
                    from_cache: all_cached,
                });
            };

            if !seen_cursors.insert(cursor.clone()) {
                return Err(GraphqlError::InvalidOperation {
                    reason: format!("pagination cursor {cursor} was returned twice"),
                });
            }
            if !variables.set_cursor(Some(cursor)) {
                return Err(GraphqlError::InvalidOperation {
                    reason: "operation has further pages but its variables take no cursor"
                        .to_string(),
                });
            }
            tracing::debug!(pages, "fetching next page");
        }
    }
}
