//! The value returned by a successful execution.

use std::ops::Deref;

use crate::clients::graphql::cost::RequestCost;
use crate::clients::graphql::operation::PageInfo;

/// A shaped result together with the metadata of the call that produced it.
///
/// Derefs to the body, so callers that only care about the data can use the
/// envelope directly.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultEnvelope<T> {
    /// The transformed `data` object.
    pub body: T,
    /// Cost of the final, successful call.
    pub cost: RequestCost,
    /// Pagination state, if the response contained a connection.
    pub page_info: Option<PageInfo>,
    /// Retries spent before the call succeeded.
    pub retries: u32,
    /// Whether the response came from the response cache.
    pub from_cache: bool,
}

impl<T> ResultEnvelope<T> {
    /// Consumes the envelope, returning the body.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.body
    }

    /// Returns `true` if the response reported another page.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.page_info.as_ref().is_some_and(|info| info.has_next_page)
    }

    /// Returns the cursor of the last node on this page.
    #[must_use]
    pub fn end_cursor(&self) -> Option<&str> {
        self.page_info
            .as_ref()
            .and_then(|info| info.end_cursor.as_deref())
    }

    /// Maps the body, keeping the metadata.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ResultEnvelope<U> {
        ResultEnvelope {
            body: f(self.body),
            cost: self.cost,
            page_info: self.page_info,
            retries: self.retries,
            from_cache: self.from_cache,
        }
    }
}

impl<T> Deref for ResultEnvelope<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(page_info: Option<PageInfo>) -> ResultEnvelope<Vec<u32>> {
        ResultEnvelope {
            body: vec![1, 2, 3],
            cost: RequestCost::default(),
            page_info,
            retries: 0,
            from_cache: false,
        }
    }

    #[test]
    fn test_deref_exposes_body() {
        let envelope = envelope(None);
        assert_eq!(envelope.len(), 3);
        assert_eq!(envelope.into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_info_accessors() {
        let paged = envelope(Some(PageInfo {
            has_next_page: true,
            end_cursor: Some("eyJsYXN0X2lkIjo0Mn0".to_string()),
        }));
        assert!(paged.has_next_page());
        assert_eq!(paged.end_cursor(), Some("eyJsYXN0X2lkIjo0Mn0"));

        let single = envelope(None);
        assert!(!single.has_next_page());
        assert_eq!(single.end_cursor(), None);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let mut original = envelope(None);
        original.retries = 2;
        let mapped = original.map(|body| body.len());

        assert_eq!(mapped.body, 3);
        assert_eq!(mapped.retries, 2);
    }
}
