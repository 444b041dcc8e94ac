//! Adaptive page sizing after max-cost rejections.

use crate::clients::graphql::errors::GraphqlError;
use crate::clients::graphql::operation::OperationVariables;

/// Extra reduction applied on top of the proportional shrink, so the retried
/// call lands comfortably below the limit instead of right at it.
pub const DIMINISHING_FACTOR: f64 = 0.75;

/// Shrinks the `limit` variable of paged operations whose requested cost
/// exceeds the per-call maximum.
///
/// # Example
///
/// ```rust
/// use shopify_graphql_executor::clients::graphql::AdaptiveBatchSizer;
///
/// let sizer = AdaptiveBatchSizer::new(250);
/// assert_eq!(sizer.reduced_limit(250, 1000.0, 5000.0), 37);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptiveBatchSizer {
    global_max_page_size: u32,
}

impl AdaptiveBatchSizer {
    /// Creates a sizer capped at `global_max_page_size` (at least 1).
    #[must_use]
    pub fn new(global_max_page_size: u32) -> Self {
        Self {
            global_max_page_size: global_max_page_size.max(1),
        }
    }

    /// Returns the page size cap.
    #[must_use]
    pub const fn global_max_page_size(&self) -> u32 {
        self.global_max_page_size
    }

    /// Computes `floor(max_cost / cost * old_limit * 0.75)`, clamped to
    /// `1..=global_max_page_size`. A non-positive `cost` applies only the
    /// diminishing factor.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn reduced_limit(&self, old_limit: u32, max_cost: f64, cost: f64) -> u32 {
        let ratio = if cost > 0.0 { max_cost / cost } else { 1.0 };
        let reduced = (ratio * f64::from(old_limit) * DIMINISHING_FACTOR).floor();

        if !reduced.is_finite() || reduced < 1.0 {
            return 1;
        }
        if reduced >= f64::from(self.global_max_page_size) {
            return self.global_max_page_size;
        }
        reduced as u32
    }

    /// Rewrites the `limit` of `variables` in place and returns
    /// `(previous, reduced)`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::InvalidOperation`] if the variables carry no
    /// `limit`; such an operation cannot be made cheaper by retrying.
    pub fn shrink<V: OperationVariables>(
        &self,
        variables: &mut V,
        max_cost: f64,
        cost: f64,
    ) -> Result<(u32, u32), GraphqlError> {
        let previous = variables.limit().ok_or_else(|| GraphqlError::InvalidOperation {
            reason: format!(
                "query cost {cost} exceeds the maximum of {max_cost} and the operation has no limit variable to reduce"
            ),
        })?;

        let reduced = self.reduced_limit(previous, max_cost, cost);
        variables.set_limit(reduced);
        Ok((previous, reduced))
    }
}

impl Default for AdaptiveBatchSizer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_GLOBAL_MAX_PAGE_SIZE)
    }
}
