//! End-to-end tests of `ReqwestTransport` against a local HTTP server.

use hypermedia_http::{ClientRuntime, HypermediaError, ReqwestTransport, ResourceContext};
use serde_json::json;

fn hal_context() -> ResourceContext {
    ResourceContext::hal(ClientRuntime::new(ReqwestTransport::new()))
}

#[tokio::test]
async fn test_get_hal_resource_with_embedded() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let body = json!({
        "_links": {"self": {"href": format!("{}/orders/1", base)}},
        "_embedded": {
            "customer": {"_links": {"self": {"href": format!("{}/customers/7", base)}}, "name": "John"}
        },
        "total": 30
    });
    let mock = server
        .mock("GET", "/orders/1")
        .match_header("accept", "application/hal+json")
        .with_status(200)
        .with_header("content-type", "application/hal+json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let context = hal_context();
    let order = context.get(&format!("{}/orders/1", base), None).unwrap();
    order.load(None).await.unwrap();

    mock.assert_async().await;
    assert_eq!(order.value("total"), Some(json!(30)));
    let customer = context.get(&format!("{}/customers/7", base), None).unwrap();
    assert!(customer.is_synced());
    assert_eq!(customer.get_str("name").as_deref(), Some("John"));
}

#[tokio::test]
async fn test_link_header_and_profile_parameter() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _mock = server
        .mock("GET", "/people/john")
        .with_status(200)
        .with_header(
            "content-type",
            "application/json; profile=\"http://example.com/profiles/person\"",
        )
        .with_header("link", "</people/jane>; rel=\"friend\"; title=\"Jane\"")
        .with_body(r#"{"name": "John"}"#)
        .create_async()
        .await;

    let context = ResourceContext::new(ClientRuntime::new(ReqwestTransport::new()));
    let john = context.get(&format!("{}/people/john", base), None).unwrap();
    john.get().await.unwrap();

    let friend = john.link("friend").unwrap();
    assert_eq!(friend.first().unwrap().href, "/people/jane");
    assert_eq!(friend.first().unwrap().extra["title"], "Jane");
    assert_eq!(
        john.profile().unwrap().first().map(String::as_str),
        Some("http://example.com/profiles/person")
    );
}

#[tokio::test]
async fn test_patch_sends_merge_patch() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let mock = server
        .mock("PATCH", "/orders/1")
        .match_header("content-type", "application/merge-patch+json")
        .match_body(mockito::Matcher::Json(json!({"state": "shipped"})))
        .with_status(204)
        .create_async()
        .await;

    let context = hal_context();
    let order = context.get(&format!("{}/orders/1", base), None).unwrap();
    order.set("state", "open");
    order.patch(json!({"state": "shipped"})).await.unwrap();

    mock.assert_async().await;
    assert_eq!(order.get_str("state").as_deref(), Some("shipped"));
}

#[tokio::test]
async fn test_vnd_error_response() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _mock = server
        .mock("DELETE", "/orders/1")
        .with_status(409)
        .with_header("content-type", "application/vnd.error+json")
        .with_body(r#"{"message": "Order already shipped"}"#)
        .create_async()
        .await;

    let context = hal_context();
    let order = context.get(&format!("{}/orders/1", base), None).unwrap();
    let err = order.delete().await.unwrap_err();

    assert!(matches!(err, HypermediaError::Response(_)));
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.response().unwrap().error.message, "Order already shipped");
    assert!(context.contains(&format!("{}/orders/1", base)));
    assert_eq!(context.busy_requests(), 0);
}
