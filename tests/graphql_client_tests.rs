//! Integration tests for the GraphQL client and the executor over HTTP.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use shopify_graphql_executor::clients::graphql::{
    GraphqlTransport, OperationDescriptor, ResponseShape,
};
use shopify_graphql_executor::{
    GraphqlClient, GraphqlError, HostUrl, HttpError, RequestExecutor, Session, ShopDomain,
    ShopifyConfig,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRAPHQL_PATH: &str = "/admin/api/2025-10/graphql.json";

fn config_for(server: &MockServer) -> ShopifyConfig {
    ShopifyConfig::builder()
        .host(HostUrl::new(server.uri()).unwrap())
        .api_version("2025-10".parse().unwrap())
        .build()
        .unwrap()
}

fn session() -> Session {
    Session::new(ShopDomain::new("graphql-shop").unwrap(), "shpat_graphql")
}

fn cost(actual: u32) -> Value {
    json!({ "cost": {
        "requestedQueryCost": actual,
        "actualQueryCost": actual,
        "throttleStatus": {
            "maximumAvailable": 2000.0,
            "currentlyAvailable": 1990.0,
            "restoreRate": 1000.0
        }
    }})
}

#[derive(Debug, Deserialize, PartialEq)]
struct Product {
    id: String,
    title: String,
}

#[tokio::test]
async fn test_query_posts_document_and_variables() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({
            "query": "query Product($id: ID!) { product(id: $id) { title } }",
            "variables": { "id": "gid://shopify/Product/1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "product": { "title": "Hat" } },
            "extensions": cost(1)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&session(), Some(&config_for(&server)));
    let response = client
        .query(
            "query Product($id: ID!) { product(id: $id) { title } }",
            Some(json!({ "id": "gid://shopify/Product/1" })),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.body["data"]["product"]["title"], "Hat");
}

#[tokio::test]
async fn test_query_with_debug_adds_query_param() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(query_param("debug", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&session(), Some(&config_for(&server)));
    let response = client
        .query_with_debug("{ shop { id } }", None, None)
        .await
        .unwrap();

    assert_eq!(response.code, 200);
}

#[tokio::test]
async fn test_graphql_errors_arrive_with_status_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Field 'nope' doesn't exist on type 'Shop'" }]
        })))
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&session(), Some(&config_for(&server)));
    let response = client.query("{ shop { nope } }", None, None).await.unwrap();

    assert!(response.body["errors"].is_array());
}

#[tokio::test]
async fn test_cached_transport_sends_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "shop": { "name": "Demo" } },
            "extensions": cost(1)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&session(), Some(&config_for(&server)))
        .with_cache_ttl(Duration::from_secs(60));

    let first = client.send("{ shop { name } }", &json!({})).await.unwrap();
    let second = client.send("{ shop { name } }", &json!({})).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_mutations_are_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "tagsAdd": { "userErrors": [] } }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&session(), Some(&config_for(&server)))
        .with_cache_ttl(Duration::from_secs(60));
    let document = "mutation { tagsAdd(id: \"gid://shopify/Product/1\", tags: [\"a\"]) { userErrors { message } } }";

    assert!(!client.send(document, &Value::Null).await.unwrap().from_cache);
    assert!(!client.send(document, &Value::Null).await.unwrap().from_cache);
}

#[tokio::test]
async fn test_executor_pages_through_connection() {
    let server = MockServer::start().await;
    let document = "query Products($limit: Int!, $cursor: String) { products(first: $limit, after: $cursor) { nodes { id title } pageInfo { hasNextPage endCursor } } }";

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "limit": 2, "cursor": "c2" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "products": {
                "nodes": [{ "id": "3", "title": "Scarf" }],
                "pageInfo": { "hasNextPage": false, "endCursor": "c3" }
            }},
            "extensions": cost(2)
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "limit": 2 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "products": {
                "nodes": [{ "id": "1", "title": "Hat" }, { "id": "2", "title": "Glove" }],
                "pageInfo": { "hasNextPage": true, "endCursor": "c2" }
            }},
            "extensions": cost(4)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = RequestExecutor::for_session(&session(), &config_for(&server));
    let descriptor: OperationDescriptor<Vec<Product>> =
        OperationDescriptor::new(document, json!({ "limit": 2 }))
            .with_shape(ResponseShape::field("products"))
            .with_transform(|mut data| data["products"]["nodes"].take());

    let all = executor.execute_all(&descriptor).await.unwrap();

    let titles: Vec<&str> = all.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Hat", "Glove", "Scarf"]);
    assert!(!all.has_next_page());
    assert_eq!(all.retries, 0);
    assert_eq!(all.body[0].id, "1");
}

#[tokio::test]
async fn test_executor_propagates_http_failure_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "errors": "Unavailable" })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = RequestExecutor::for_session(&session(), &config_for(&server));
    let descriptor: OperationDescriptor<Value> = OperationDescriptor::new("{ shop { id } }", json!({}));

    let error = executor.execute(&descriptor).await.unwrap_err();

    match error {
        GraphqlError::Http(HttpError::Response(e)) => assert_eq!(e.code, 503),
        other => panic!("expected an HTTP error, got {other:?}"),
    }
}
