//! Integration tests for `ApiClient` and `ProductCache` against a local
//! `wiremock` server. No real network traffic is made.

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopfront_client::{ApiClient, ApiError, ProductCache, ProductQuery, Session, SessionEvent};
use shopfront_core::{CreateOrderRequest, EntityId, RegisterRequest};

fn anonymous_client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(&server.uri(), Session::new()).expect("failed to build test client")
}

fn signed_in_client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(&server.uri(), Session::with_token("tok-123"))
        .expect("failed to build test client")
}

fn product_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Linen Shirt",
        "price": "199000.00",
        "stock": 12,
        "category": { "id": 2, "name": "Shirts" },
        "image_url": "shirt.jpg"
    })
}

fn cart_json(quantity: u32) -> serde_json::Value {
    json!({
        "items": [{
            "id": 5,
            "variant": { "id": 51, "product_id": 7, "color": "Navy", "size": "L", "price": 199000, "stock": 4 },
            "quantity": quantity,
            "line_total": 199000 * quantity
        }],
        "total": 199000 * quantity + 30000
    })
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_products_sends_default_query_and_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(query_param("limit", "5"))
        .and(query_param("sort", "-createdAt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "items": [product_json(1), product_json(2)] } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let products = anonymous_client(&server)
        .list_products(&ProductQuery::default())
        .await
        .expect("list_products should succeed");

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price, Decimal::new(19_900_000, 2));
    assert_eq!(products[0].category, "Shirts");
}

#[tokio::test]
async fn get_without_session_has_no_auth_or_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(9)))
        .mount(&server)
        .await;

    let product = anonymous_client(&server)
        .get_product(&EntityId::from(9u64))
        .await
        .expect("get_product should succeed");
    assert_eq!(product.id, EntityId::from(9u64));

    let requests = server.received_requests().await.expect("recording enabled");
    let request = &requests[0];
    assert!(request.headers.get("authorization").is_none());
    assert!(request.headers.get("content-type").is_none());
    assert_eq!(
        request.headers.get("accept").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
}

#[tokio::test]
async fn variants_fall_back_to_flat_resource() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/7/variants"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not found" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/product-variants"))
        .and(query_param("product_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": 71, "color": { "name": "Navy" }, "size": "L", "stock": 4 },
                { "id": 72, "color": "Navy", "size": "XL", "stock": "0" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let variants = anonymous_client(&server)
        .get_variants(&EntityId::from(7u64))
        .await
        .expect("fallback should succeed");

    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].color.as_deref(), Some("Navy"));
    assert_eq!(variants[1].stock, Some(0));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_error_carries_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Product not found" })),
        )
        .mount(&server)
        .await;

    let err = anonymous_client(&server)
        .get_product(&EntityId::from(404u64))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(
        matches!(err, ApiError::Status { ref message, .. } if message == "Product not found"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn unauthorized_clears_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/cart"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let mut events = client.session().subscribe();
    let err = client.get_cart().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { ref message, .. } if message == "token expired"));
    assert!(!client.session().is_authenticated());
    assert_eq!(events.try_recv().ok(), Some(SessionEvent::SignedOut));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/colors"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["Red"]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::with_options(
        &server.uri(),
        "/api",
        Duration::from_millis(200),
        "shopfront-test/0.1",
        Session::new(),
    )
    .expect("failed to build test client");

    let err = client.list_colors().await.unwrap_err();
    assert!(
        matches!(err, ApiError::Timeout { timeout_ms: 200, .. }),
        "expected timeout, got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cart_requests_require_a_session() {
    let server = MockServer::start().await;

    let err = anonymous_client(&server).get_cart().await.unwrap_err();

    assert!(matches!(err, ApiError::NotAuthenticated));
    assert!(server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn orders_and_profile_require_a_session() {
    let server = MockServer::start().await;
    let client = anonymous_client(&server);

    assert!(matches!(client.my_orders().await, Err(ApiError::NotAuthenticated)));
    assert!(matches!(
        client.get_order(&EntityId::from(501u64)).await,
        Err(ApiError::NotAuthenticated)
    ));
    assert!(matches!(
        client.create_order(&CreateOrderRequest::new(1)).await,
        Err(ApiError::NotAuthenticated)
    ));
    assert!(matches!(client.current_user().await, Err(ApiError::NotAuthenticated)));
    assert!(server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn update_line_reloads_cart_after_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/cart/5"))
        .and(body_json(json!({ "quantity": 3 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": cart_json(3) })))
        .expect(1)
        .mount(&server)
        .await;

    let cart = signed_in_client(&server)
        .update_cart_line(&EntityId::from(5u64), 3)
        .await
        .expect("update should succeed");

    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.total, Decimal::from(627_000));
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_order_falls_through_to_next_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/orders"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/orders/checkout"))
        .and(body_json(json!({ "method": 1 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "order_id": 88, "order_code": "SF-0088", "total_amount": "229000" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let receipt = signed_in_client(&server)
        .create_order(&CreateOrderRequest::new(1))
        .await
        .expect("second endpoint should accept the order");

    assert_eq!(receipt.id, Some(EntityId::from(88u64)));
    assert_eq!(receipt.reference(), "SF-0088");
    assert_eq!(receipt.total, Some(Decimal::from(229_000)));
}

#[tokio::test]
async fn create_order_reports_every_endpoint_failing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = signed_in_client(&server)
        .create_order(&CreateOrderRequest::new(1))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ApiError::AllCandidatesFailed { attempts: 3, .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn my_orders_is_empty_when_no_endpoint_answers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let orders = signed_in_client(&server)
        .my_orders()
        .await
        .expect("missing endpoints should not be an error");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn my_orders_stops_on_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let err = client.my_orders().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(server.received_requests().await.expect("recording enabled").len(), 1);
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_stores_credentials_and_logout_clears_them() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({ "email": "an@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "token": "fresh-token", "user": { "role": "Customer" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let credentials = client
        .login(" An@Example.com ", "secret")
        .await
        .expect("login should succeed");

    assert_eq!(credentials.token, "fresh-token");
    assert_eq!(credentials.role, "customer");
    assert_eq!(client.session().token().as_deref(), Some("fresh-token"));

    client.logout().await.expect("logout ignores server errors");
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn login_without_token_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let err = client.login("an@example.com", "secret").await.unwrap_err();

    assert!(matches!(err, ApiError::MissingToken));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn register_sends_normalized_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .and(body_json(json!({
            "name": "Lan",
            "email": "lan@example.com",
            "password": "secret",
            "phone": "0900000000"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "created" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = RegisterRequest::new(" Lan ", " Lan@Example.COM", "secret");
    request.phone = Some("0900000000".to_owned());
    anonymous_client(&server)
        .register(&request)
        .await
        .expect("register should succeed");
}

#[tokio::test]
async fn user_by_id_reads_loosely_typed_profile() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 8,
                "fullName": "Lan",
                "phone": 912_345_678,
                "addresses": [
                    { "street": "1 A St", "isDefault": 0 },
                    { "address": "2 B St", "street": "2B", "city": "Hue", "isDefault": 1 }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = signed_in_client(&server)
        .user_by_id(&EntityId::from(8u64))
        .await
        .expect("user_by_id should succeed");

    assert_eq!(user.name.as_deref(), Some("Lan"));
    assert_eq!(user.phone.as_deref(), Some("912345678"));
    let address = user.default_address().expect("profile has addresses");
    assert_eq!(address.display_line(), "2 B St, Hue");
    assert_eq!(address.phone.as_deref(), Some("912345678"));
}

#[tokio::test]
async fn current_user_unwraps_profile_and_tolerates_bad_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "_id": "u-1", "name": "Minh", "address": "9 C St", "province": "Can Tho" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": ["not", "a", "profile"] })))
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let user = client
        .current_user()
        .await
        .expect("current_user should succeed")
        .expect("profile present");
    assert_eq!(user.id, EntityId::from("u-1"));
    assert_eq!(
        user.default_address().map(|a| a.display_line()).as_deref(),
        Some("9 C St, Can Tho")
    );

    let unreadable = client.current_user().await.expect("decode failures are not fatal");
    assert!(unreadable.is_none());
}

// ---------------------------------------------------------------------------
// Product cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cache_coalesces_concurrent_lookups_into_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(product_json(7))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = ProductCache::new(anonymous_client(&server));
    let id = EntityId::from(7u64);

    let (a, b, c) = tokio::join!(cache.get(&id), cache.get(&id), cache.get(&id));
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    // Served from memory afterwards.
    cache.get(&id).await.expect("cached product");
    assert_eq!(cache.len(), 1);
}
