use super::*;

fn test_client(base_url: &str, prefix: &str) -> ApiClient {
    ApiClient::with_options(
        base_url,
        prefix,
        Duration::from_secs(5),
        "shopfront-test/0.1",
        Session::new(),
    )
    .expect("client construction should not fail")
}

#[test]
fn build_url_applies_prefix_and_path() {
    let client = test_client("https://shop.example.com", "/api");
    let url = client.build_url(&ApiPath::new("/v1/products/42"), &[]).unwrap();
    assert_eq!(url.as_str(), "https://shop.example.com/api/v1/products/42");
}

#[test]
fn build_url_strips_trailing_slash() {
    let client = test_client("https://shop.example.com/", "api/");
    let url = client.build_url(&ApiPath::new("v1/cart"), &[]).unwrap();
    assert_eq!(url.as_str(), "https://shop.example.com/api/v1/cart");
}

#[test]
fn build_url_keeps_base_path() {
    let client = test_client("https://shop.example.com/store", "/api");
    let url = client.build_url(&ApiPath::new("/v1/colors"), &[]).unwrap();
    assert_eq!(url.as_str(), "https://shop.example.com/store/api/v1/colors");
}

#[test]
fn build_url_with_empty_prefix() {
    let client = test_client("http://localhost:8080", "");
    let url = client.build_url(&ApiPath::new("/v1/sizes"), &[]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/v1/sizes");
}

#[test]
fn build_url_constructs_query_string() {
    let client = test_client("https://shop.example.com", "/api");
    let url = client
        .build_url(&ApiPath::new("/v1/products"), &[("limit", "5"), ("sort", "-createdAt")])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://shop.example.com/api/v1/products?limit=5&sort=-createdAt"
    );
}

#[test]
fn build_url_merges_inline_query() {
    let client = test_client("https://shop.example.com", "/api");
    let url = client
        .build_url(&ApiPath::new("/v1/orders?mine=true"), &[("page", "2")])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://shop.example.com/api/v1/orders?mine=true&page=2"
    );
}

#[test]
fn build_url_encodes_special_characters() {
    let client = test_client("https://shop.example.com", "/api");
    let url = client
        .build_url(&ApiPath::new("/v1/cart/a b"), &[("q", "áo & quần")])
        .unwrap();
    assert!(
        url.as_str().contains("/v1/cart/a%20b"),
        "path segment should be percent-encoded: {url}"
    );
    assert!(
        !url.as_str().contains(' ') && !url.as_str().contains("& "),
        "query should be percent-encoded: {url}"
    );
}

#[test]
fn ids_are_pushed_as_single_segments() {
    let client = test_client("https://shop.example.com", "/api");
    let path = ApiPath::new("/v1/cart").id(&EntityId::new("a/b?c=1"));
    let url = client.build_url(&path, &[]).unwrap();
    assert_eq!(
        url.as_str(),
        "https://shop.example.com/api/v1/cart/a%2Fb%3Fc=1"
    );
    assert!(url.query().is_none());

    let path = ApiPath::new("/v1/products").id(&EntityId::from(7u64)).then("variants");
    let url = client.build_url(&path, &[]).unwrap();
    assert_eq!(url.path(), "/api/v1/products/7/variants");
}

#[test]
fn rejects_invalid_base_url() {
    let result = ApiClient::with_base_url("not a url", Session::new());
    assert!(
        matches!(result, Err(ApiError::InvalidBaseUrl { .. })),
        "expected InvalidBaseUrl"
    );

    let result = ApiClient::with_base_url("ftp://shop.example.com", Session::new());
    assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));
}

#[test]
fn order_endpoints_default_and_override() {
    let client = test_client("https://shop.example.com", "/api");
    assert_eq!(
        &*client.order_create_endpoints,
        &["/v1/orders", "/v1/orders/checkout", "/v1/order"]
    );

    let client = client.with_order_create_endpoints(vec!["/v2/orders".to_owned()]);
    assert_eq!(&*client.order_create_endpoints, &["/v2/orders"]);

    let client = client.with_order_create_endpoints(Vec::new());
    assert_eq!(&*client.order_create_endpoints, &["/v2/orders"]);
}

#[tokio::test]
async fn blank_id_is_rejected_before_any_request() {
    // Nothing listens on the discard port; a request would fail differently.
    let client = test_client("http://127.0.0.1:9", "/api");
    let err = client.get_product(&EntityId::new("  ")).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Validation(ValidationError::MissingId("product"))
    ));
}
