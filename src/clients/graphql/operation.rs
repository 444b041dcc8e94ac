//! Operation descriptors: what to send and how to read the answer.
//!
//! Resource-specific code builds an [`OperationDescriptor`] holding the
//! GraphQL document, typed variables, an optional transform over the raw
//! `data` object and a [`ResponseShape`] naming where `pageInfo` and
//! `userErrors` live. The executor needs nothing else.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::graphql::classify::UserError;

/// Variables accepted by the executor.
///
/// Paged list operations expose their page size through [`limit`](Self::limit)
/// so a cost rejection can be answered with a smaller page, and accept a
/// cursor through [`set_cursor`](Self::set_cursor) for pagination. Other
/// operations keep the defaults.
pub trait OperationVariables: Serialize + Clone + Send + Sync {
    /// Returns the current page size, if this operation is paged.
    fn limit(&self) -> Option<u32> {
        None
    }

    /// Replaces the page size. Only called when [`limit`](Self::limit)
    /// returned `Some`.
    fn set_limit(&mut self, _limit: u32) {}

    /// Sets the pagination cursor. Returns `false` if the operation does not
    /// take one.
    fn set_cursor(&mut self, _cursor: Option<String>) -> bool {
        false
    }
}

/// Untyped variables use the `limit` and `cursor` keys.
impl OperationVariables for Value {
    fn limit(&self) -> Option<u32> {
        self.get("limit")
            .and_then(Value::as_u64)
            .and_then(|limit| u32::try_from(limit).ok())
    }

    fn set_limit(&mut self, limit: u32) {
        if let Some(object) = self.as_object_mut() {
            object.insert("limit".to_string(), Value::from(limit));
        }
    }

    fn set_cursor(&mut self, cursor: Option<String>) -> bool {
        if self.is_null() {
            *self = Value::Object(serde_json::Map::new());
        }
        self.as_object_mut().map_or(false, |object| {
            object.insert("cursor".to_string(), cursor.map_or(Value::Null, Value::String));
            true
        })
    }
}

impl OperationVariables for () {}

/// `pageInfo` of a connection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page follows.
    #[serde(default)]
    pub has_next_page: bool,
    /// Cursor of the last node on this page.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// Where in `data` the executor looks for `pageInfo` and `userErrors`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ResponseShape {
    /// Probe every top-level field. `userErrors` are collected from all of
    /// them; the first field (in response order) carrying a `pageInfo` wins.
    #[default]
    Scan,
    /// Only the named top-level field is inspected.
    Field(String),
}

impl ResponseShape {
    /// Shape for an operation whose payload lives under `name`.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    fn candidates<'a>(&'a self, data: &'a Value) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
        match (self, data.as_object()) {
            (_, None) => Box::new(std::iter::empty()),
            (Self::Scan, Some(object)) => Box::new(object.values()),
            (Self::Field(name), Some(object)) => Box::new(object.get(name).into_iter()),
        }
    }

    /// Extracts `pageInfo` from the `data` object.
    #[must_use]
    pub fn page_info(&self, data: &Value) -> Option<PageInfo> {
        self.candidates(data)
            .find_map(|field| field.get("pageInfo"))
            .and_then(|page_info| serde_json::from_value(page_info.clone()).ok())
    }

    /// Collects every `userErrors` entry from the `data` object.
    #[must_use]
    pub fn user_errors(&self, data: &Value) -> Vec<UserError> {
        self.candidates(data)
            .filter_map(|field| field.get("userErrors").and_then(Value::as_array))
            .flatten()
            .map(UserError::from_value)
            .collect()
    }
}

/// A response transform applied to the raw `data` object.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A GraphQL operation ready for the executor.
///
/// `T` is the type the (transformed) `data` object deserializes into; `V`
/// is the variables type.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use serde_json::{json, Value};
/// use shopify_graphql_executor::clients::graphql::{OperationDescriptor, ResponseShape};
///
/// #[derive(Deserialize)]
/// struct Product {
///     id: String,
///     title: String,
/// }
///
/// let descriptor: OperationDescriptor<Vec<Product>> = OperationDescriptor::new(
///     "query Products($limit: Int!, $cursor: String) {
///        products(first: $limit, after: $cursor) {
///          nodes { id title }
///          pageInfo { hasNextPage endCursor }
///        }
///      }",
///     json!({ "limit": 50 }),
/// )
/// .with_shape(ResponseShape::field("products"))
/// .with_transform(|mut data| data["products"]["nodes"].take());
///
/// assert_eq!(descriptor.variables()["limit"], 50);
/// ```
pub struct OperationDescriptor<T, V = Value> {
    document: String,
    variables: V,
    transform: Option<Transform>,
    shape: ResponseShape,
    result: PhantomData<fn() -> T>,
}

impl<T, V> OperationDescriptor<T, V> {
    /// Creates a descriptor with the default [`ResponseShape::Scan`] and no
    /// transform.
    #[must_use]
    pub fn new(document: impl Into<String>, variables: V) -> Self {
        Self {
            document: document.into(),
            variables,
            transform: None,
            shape: ResponseShape::Scan,
            result: PhantomData,
        }
    }

    /// Sets the transform applied to `data` before deserialization.
    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Sets the response shape.
    #[must_use]
    pub fn with_shape(mut self, shape: ResponseShape) -> Self {
        self.shape = shape;
        self
    }

    /// Returns the GraphQL document.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Returns the variables.
    #[must_use]
    pub const fn variables(&self) -> &V {
        &self.variables
    }

    /// Returns the response shape.
    #[must_use]
    pub const fn shape(&self) -> &ResponseShape {
        &self.shape
    }

    /// Applies the transform, if any, then drops falsy entries when the
    /// result is an array.
    #[must_use]
    pub fn shape_result(&self, data: Value) -> Value {
        let Some(transform) = &self.transform else {
            return data;
        };
        match transform(data) {
            Value::Array(items) => {
                Value::Array(items.into_iter().filter(|item| !is_falsy(item)).collect())
            }
            other => other,
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl<T, V: Clone> Clone for OperationDescriptor<T, V> {
    fn clone(&self) -> Self {
        Self {
            document: self.document.clone(),
            variables: self.variables.clone(),
            transform: self.transform.clone(),
            shape: self.shape.clone(),
            result: PhantomData,
        }
    }
}

impl<T, V: fmt::Debug> fmt::Debug for OperationDescriptor<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("document", &self.document)
            .field("variables", &self.variables)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .field("shape", &self.shape)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_variables_expose_limit() {
        let mut variables = json!({ "limit": 250, "query": "status:active" });
        assert_eq!(variables.limit(), Some(250));

        variables.set_limit(37);
        assert_eq!(variables["limit"], 37);
        assert_eq!(variables["query"], "status:active");

        assert_eq!(json!({ "id": "gid://shopify/Product/1" }).limit(), None);
        assert_eq!(json!({ "limit": "ten" }).limit(), None);
    }

    #[test]
    fn test_value_variables_accept_cursor() {
        let mut variables = Value::Null;
        assert!(variables.set_cursor(Some("abc".to_string())));
        assert_eq!(variables, json!({ "cursor": "abc" }));

        assert!(variables.set_cursor(None));
        assert_eq!(variables, json!({ "cursor": null }));

        let mut scalar = json!(5);
        assert!(!scalar.set_cursor(Some("abc".to_string())));
    }

    #[test]
    fn test_unit_variables_are_not_paged() {
        let mut variables = ();
        assert_eq!(variables.limit(), None);
        assert!(!variables.set_cursor(Some("abc".to_string())));
    }

    #[test]
    fn test_scan_finds_single_page_info() {
        let data = json!({
            "shop": { "name": "Demo" },
            "products": {
                "nodes": [],
                "pageInfo": { "hasNextPage": true, "endCursor": "c1" }
            }
        });

        assert_eq!(
            ResponseShape::Scan.page_info(&data),
            Some(PageInfo {
                has_next_page: true,
                end_cursor: Some("c1".to_string()),
            })
        );
    }

    #[test]
    fn test_scan_without_page_info() {
        let data = json!({ "product": { "id": "gid://shopify/Product/1" } });
        assert_eq!(ResponseShape::Scan.page_info(&data), None);
        assert_eq!(ResponseShape::Scan.page_info(&Value::Null), None);
    }

    #[test]
    fn test_scan_takes_first_page_info_in_response_order() {
        let data = json!({
            "collections": { "pageInfo": { "hasNextPage": false, "endCursor": "first" } },
            "products": { "pageInfo": { "hasNextPage": true, "endCursor": "second" } }
        });

        let page_info = ResponseShape::Scan.page_info(&data).unwrap();
        assert_eq!(page_info.end_cursor.as_deref(), Some("first"));

        let named = ResponseShape::field("products").page_info(&data).unwrap();
        assert_eq!(named.end_cursor.as_deref(), Some("second"));
    }

    #[test]
    fn test_user_errors_across_fields_and_named_field() {
        let data = json!({
            "metafieldsSet": {
                "metafields": null,
                "userErrors": [{ "field": ["metafields", "0", "namespace"], "message": "Namespace is too long", "code": "TOO_LONG" }]
            },
            "tagsAdd": { "userErrors": [{ "message": "Tag is invalid" }] },
            "shop": { "name": "Demo" }
        });

        let all = ResponseShape::Scan.user_errors(&data);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code.as_deref(), Some("TOO_LONG"));

        let named = ResponseShape::field("tagsAdd").user_errors(&data);
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].message, "Tag is invalid");

        assert!(ResponseShape::field("missing").user_errors(&data).is_empty());
    }

    #[test]
    fn test_shape_result_filters_falsy_entries() {
        let descriptor: OperationDescriptor<Vec<Value>> =
            OperationDescriptor::new("{ x }", Value::Null)
                .with_transform(|data| data["items"].clone());

        let shaped = descriptor.shape_result(json!({
            "items": [{ "id": 1 }, null, false, 0, "", "kept", { "id": 2 }]
        }));

        assert_eq!(shaped, json!([{ "id": 1 }, "kept", { "id": 2 }]));
    }

    #[test]
    fn test_shape_result_without_transform_is_identity() {
        let descriptor: OperationDescriptor<Value, ()> = OperationDescriptor::new("{ x }", ());
        let data = json!({ "items": [null] });
        assert_eq!(descriptor.shape_result(data.clone()), data);
    }

    #[test]
    fn test_descriptor_clone_shares_transform() {
        let descriptor: OperationDescriptor<Value> = OperationDescriptor::new("{ x }", json!({}))
            .with_transform(|data| data["x"].clone());
        let cloned = descriptor.clone();

        assert_eq!(cloned.shape_result(json!({ "x": 3 })), json!(3));
        assert!(format!("{cloned:?}").contains("<fn>"));
    }
}
