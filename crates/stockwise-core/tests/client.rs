use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use stockwise_core::api::{ApiRequest, ClientError, ExportFormat, ExportTarget, OrderFilter};
use stockwise_core::auth::{MemorySessionStore, Navigator, Role, SessionData, SessionStore};
use stockwise_core::models::{CategoryForm, OrderStatus};
use stockwise_core::{ApiClient, ApiConfig};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

struct Harness {
    server: MockServer,
    client: ApiClient,
    store: Arc<MemorySessionStore>,
    navigator: Arc<RecordingNavigator>,
}

async fn harness_with(token: Option<&str>, timeout: Duration) -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(match token {
        Some(t) => MemorySessionStore::with_token(t),
        None => MemorySessionStore::new(),
    });
    let navigator = Arc::new(RecordingNavigator::default());
    let config = ApiConfig::new(server.uri()).with_timeout(timeout);
    let client = ApiClient::new(config, store.clone(), navigator.clone()).unwrap();
    Harness {
        server,
        client,
        store,
        navigator,
    }
}

async fn harness(token: Option<&str>) -> Harness {
    harness_with(token, Duration::from_secs(5)).await
}

#[tokio::test]
async fn login_then_list_products_attaches_token() {
    let h = harness(None).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"username": "ana", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"ok": true, "data": {"token": "jwt-1", "role": "admin", "id": 7}}),
        ))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "data": [
                {"id": 2, "name": "Saw", "price": "12.00", "stock": 3, "category_id": 1, "category_name": "Tools"},
                {"id": 1, "name": "Nail", "price": 0.05, "stock": 900, "category_id": 1}
            ]
        })))
        .expect(2)
        .mount(&h.server)
        .await;

    let outcome = h.client.login("ana", "s3cret").await.unwrap();
    assert_eq!(outcome.role, Some(Role::Admin));
    assert_eq!(outcome.user_id, Some(7));

    let stored = h.store.load().unwrap();
    assert_eq!(stored.token, "jwt-1");
    assert_eq!(stored.role.as_deref(), Some("admin"));

    let products = h.client.list_products().await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Saw");
    assert_eq!(products[0].price, 12.0);

    let raw: Value = h.client.get("/products").await.unwrap();
    assert!(raw.is_array());
}

#[tokio::test]
async fn delete_order_not_found_surfaces_envelope_error() {
    let h = harness(Some("tok")).await;

    Mock::given(method("DELETE"))
        .and(path("/orders/5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            json!({"ok": false, "error": "not found", "code": "NOT_FOUND"}),
        ))
        .expect(1)
        .mount(&h.server)
        .await;

    let pending = h.client.delete_order(5);
    assert_eq!(pending.prompt(), "Delete order #5?");

    let err = pending.confirm(&h.client).await.unwrap_err();
    let api = err.api().expect("expected an API error");
    assert_eq!(api.status, 404);
    assert_eq!(api.message, "not found");
    assert_eq!(api.code.as_deref(), Some("NOT_FOUND"));

    // A 404 does not touch the session
    assert_eq!(h.store.token().as_deref(), Some("tok"));
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn dropped_pending_delete_sends_nothing() {
    let h = harness(Some("tok")).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let pending = h.client.delete_category(3);
    drop(pending);
}

#[tokio::test]
async fn unauthorized_clears_token_and_redirects_once() {
    let h = harness(Some("expired")).await;

    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"ok": false, "error": "Token has expired", "code": "AUTH_ERROR"}),
        ))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.client.list_categories().await.unwrap_err();
    assert!(err.is_handled());
    assert!(matches!(err, ClientError::SessionExpired { ref redirected_to } if redirected_to == "/security/login"));

    assert_eq!(h.store.token(), None);
    assert_eq!(h.navigator.routes(), vec!["/security/login".to_string()]);
}

#[tokio::test]
async fn unauthorized_with_opt_out_rejects_without_redirect() {
    let h = harness(Some("expired")).await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "Missing JWT"})))
        .mount(&h.server)
        .await;

    let request = ApiRequest::get("/users").without_login_redirect();
    let err = h.client.send(request).await.unwrap_err();
    let api = err.api().expect("expected an API error");
    assert_eq!(api.status, 401);
    assert_eq!(api.message, "401 Unauthorized");

    assert_eq!(h.store.token(), None);
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn bad_credentials_do_not_redirect() {
    let h = harness(None).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"ok": false, "error": "Credenciales inválidas", "code": "AUTH_ERROR"}),
        ))
        .mount(&h.server)
        .await;

    let err = h.client.login("ana", "wrong").await.unwrap_err();
    let api = err.api().unwrap();
    assert!(api.is_unauthorized());
    assert_eq!(api.message, "Credenciales inválidas");
    assert!(h.navigator.routes().is_empty());
    assert!(h.store.load().is_none());
}

#[tokio::test]
async fn login_without_token_is_invalid_response() {
    let h = harness(None).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": {"role": "user"}})))
        .mount(&h.server)
        .await;

    let err = h.client.login("ana", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
    assert!(h.store.load().is_none());
}

#[tokio::test]
async fn no_content_resolves_to_null() {
    let h = harness(Some("tok")).await;

    Mock::given(method("PUT"))
        .and(path("/categories/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let value: Value = h.client.put("/categories/4", &json!({"name": "Paint"})).await.unwrap();
    assert_eq!(value, Value::Null);

    h.client
        .update_category(4, &CategoryForm { name: "Paint".to_string() })
        .await
        .unwrap();
}

#[tokio::test]
async fn garbage_body_follows_status() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/dashboard/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/suppliers"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Traceback (most recent call last)"))
        .mount(&h.server)
        .await;

    let value: Value = h.client.get("/dashboard/metrics").await.unwrap();
    assert_eq!(value, Value::Null);

    let err = h.client.get::<Value>("/suppliers").await.unwrap_err();
    let api = err.api().unwrap();
    assert_eq!(api.status, 500);
    assert_eq!(api.message, "500 Internal Server Error");
    assert_eq!(api.code, None);
}

#[tokio::test]
async fn envelope_shapes_over_the_wire() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"ok": true, "data": 1}])))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scalar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": 42})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "role": "user"})))
        .mount(&h.server)
        .await;

    let bare: Value = h.client.get("/bare").await.unwrap();
    assert_eq!(bare, json!([{"ok": true, "data": 1}]));

    let scalar: i64 = h.client.get("/scalar").await.unwrap();
    assert_eq!(scalar, 42);

    let plain: Value = h.client.get("/plain").await.unwrap();
    assert_eq!(plain, json!({"id": 1, "role": "user"}));
}

#[tokio::test]
async fn payload_of_wrong_shape_is_decode_error() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": {"unexpected": true}})))
        .mount(&h.server)
        .await;

    let err = h.client.list_categories().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn slow_backend_times_out_first() {
    let h = harness_with(Some("tok"), Duration::from_millis(200)).await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&h.server)
        .await;

    let started = Instant::now();
    let err = h.client.get::<Value>("/products").await.unwrap_err();
    assert!(err.is_timeout());
    assert!(err.is_network());
    assert!(started.elapsed() < Duration::from_secs(2));
    // Timeouts leave the session alone
    assert_eq!(h.store.token().as_deref(), Some("tok"));
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let store = Arc::new(MemorySessionStore::new());
    let config = ApiConfig::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(5));
    let client = ApiClient::new(config, store, Arc::new(RecordingNavigator::default())).unwrap();

    let err = client.get::<Value>("/products").await.unwrap_err();
    assert!(err.is_network());
    assert!(matches!(err, ClientError::Network(_)));
}

#[tokio::test]
async fn requests_without_body_or_token_send_neither_header() {
    let h = harness(None).await;

    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    let categories = h.client.list_categories().await.unwrap();
    assert!(categories.is_empty());

    let received = h.server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("authorization"));
    assert!(!received[0].headers.contains_key("content-type"));
}

#[tokio::test]
async fn post_with_empty_body_sends_empty_object() {
    let h = harness(Some("tok")).await;

    Mock::given(method("POST"))
        .and(path("/ping"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true, "data": {"id": 1}})))
        .expect(1)
        .mount(&h.server)
        .await;

    let value: Value = h.client.post("/ping", &Value::Null).await.unwrap();
    assert_eq!(value, json!({"id": 1}));
}

#[tokio::test]
async fn capability_reads_role_and_degrades_quietly() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/auth/validate"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": {"id": 3, "role": "admin"}})))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;

    let capability = h.client.session_capability().await;
    assert!(capability.is_admin());
    assert_eq!(capability.user_id, Some(3));
    assert_eq!(h.store.load().unwrap().role.as_deref(), Some("admin"));

    // Second call hits no mock: wiremock answers 404
    let capability = h.client.session_capability().await;
    assert!(!capability.is_admin());
    assert!(!capability.is_authenticated());
}

#[tokio::test]
async fn capability_on_expired_token_neither_fails_nor_redirects() {
    let h = harness(Some("old")).await;

    Mock::given(method("GET"))
        .and(path("/auth/validate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let capability = h.client.session_capability().await;
    assert!(!capability.is_admin());
    assert!(h.navigator.routes().is_empty());
    assert_eq!(h.store.token(), None);
}

#[tokio::test]
async fn capability_without_token_skips_request() {
    let h = harness(None).await;
    let capability = h.client.session_capability().await;
    assert!(!capability.is_authenticated());
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn require_admin_rejects_plain_users() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/auth/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": {"id": 9, "role": "user"}})))
        .mount(&h.server)
        .await;

    let err = h.client.require_admin().await.unwrap_err();
    assert!(err.api().unwrap().is_forbidden());
}

#[tokio::test]
async fn blob_download_and_401_teardown() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/products/export/csv"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id,name\n1,Saw\n".to_vec()))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out").join("products.csv");
    let written = h.client.download_to("/products/export/csv", &dest).await.unwrap();
    assert_eq!(written, 14);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "id,name\n1,Saw\n");

    Mock::given(method("GET"))
        .and(path("/categories/export/pdf"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let err = h.client.get_blob("/categories/export/pdf").await.unwrap_err();
    assert!(err.is_handled());
    assert_eq!(h.store.token(), None);
    assert_eq!(h.navigator.routes().len(), 1);
}

#[tokio::test]
async fn blob_failure_reports_status_line() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/categories/export/pdf"))
        .respond_with(ResponseTemplate::new(501).set_body_json(
            json!({"ok": false, "error": "xhtml2pdf is not installed"}),
        ))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/suppliers/export/pdf"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&h.server)
        .await;

    let err = h.client.get_blob("/categories/export/pdf").await.unwrap_err();
    assert_eq!(err.status(), Some(501));
    assert_eq!(err.api().unwrap().message, "xhtml2pdf is not installed");

    let err = h.client.get_blob("/suppliers/export/pdf").await.unwrap_err();
    assert_eq!(err.api().unwrap().message, "502 Bad Gateway");
}

#[tokio::test]
async fn orders_filter_reaches_backend() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(query_param("status", "pending"))
        .and(query_param("product_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": [
            {"id": 10, "product_id": 2, "product_name": "Saw", "quantity": 4, "status": "pending",
             "order_date": "Mon, 13 Oct 2025 09:00:00 GMT", "receipt_date": null, "user_id": 1}
        ]})))
        .expect(1)
        .mount(&h.server)
        .await;

    let filter = OrderFilter {
        status: Some(OrderStatus::Pending),
        product_id: Some(2),
        ..Default::default()
    };
    let orders = h.client.list_orders(&filter).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].quantity, 4);
}

#[tokio::test]
async fn low_stock_falls_back_to_products() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/reports/low-stock"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            json!({"ok": false, "code": "NOT_FOUND", "error": "Recurso no encontrado"}),
        ))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": [
            {"id": 1, "name": "Saw", "price": 10, "stock": 2, "category_id": 1, "category_name": "Tools"},
            {"id": 2, "name": "Nail", "price": 0.1, "stock": 500, "category_id": 1, "category_name": "Tools"},
            {"id": 3, "name": "Glue", "price": 3, "stock": 5, "category_id": 4}
        ]})))
        .mount(&h.server)
        .await;

    let items = h.client.low_stock(5).await.unwrap();
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Saw", "Glue"]);
    assert_eq!(items[1].category.as_deref(), Some("4"));
}

#[tokio::test]
async fn low_stock_export_writes_csv_locally() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/reports/low-stock"))
        .and(query_param("threshold", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": [
            {"id": 1, "name": "Saw \"XL\"", "stock": 2, "category": "Tools"}
        ]})))
        .expect(1)
        .mount(&h.server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out").join("low_stock.csv");
    let written = h
        .client
        .export(ExportTarget::LowStock, ExportFormat::Csv, 3, &dest)
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&dest).unwrap();
    assert_eq!(contents, "id,name,category,stock\n\"1\",\"Saw \"\"XL\"\"\",\"Tools\",\"2\"");
    assert_eq!(written, contents.len());

    // No PDF flavor, and nothing is requested for it
    let err = h
        .client
        .export(ExportTarget::LowStock, ExportFormat::Pdf, 3, &dest)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn preload_substitutes_defaults_for_failed_parts() {
    let h = harness(Some("tok")).await;

    Mock::given(method("GET"))
        .and(path("/dashboard/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": {
            "products": 12, "categories": 3, "suppliers": 2, "orders_today": 1, "low_stock": 4
        }})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/stock-by-category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": [
            {"category": "Tools", "total_stock": "40"}
        ]})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/orders-history"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"ok": false, "error": "db down"})))
        .mount(&h.server)
        .await;

    let snapshot = h.client.preload_dashboard().await;
    assert_eq!(snapshot.metrics.products, 12);
    assert_eq!(snapshot.stock_by_category.len(), 1);
    assert_eq!(snapshot.stock_by_category[0].total_stock, 40);
    assert!(snapshot.orders_history.is_empty());
}

#[tokio::test]
async fn stale_unauthorized_keeps_newer_login() {
    let h = harness(Some("old")).await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .mount(&h.server)
        .await;

    let client = h.client.clone();
    let pending = tokio::spawn(async move { client.get::<Value>("/products").await });

    // A fresh login lands while the old request is still in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.store.save(&SessionData::new("new")).unwrap();

    // No redirect away from the fresh session; the old call just fails
    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(h.navigator.routes().is_empty());
    assert_eq!(h.store.token().as_deref(), Some("new"));
}

#[tokio::test]
async fn anonymous_unauthorized_keeps_login_saved_meanwhile() {
    let h = harness(None).await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .mount(&h.server)
        .await;

    let client = h.client.clone();
    let pending = tokio::spawn(async move { client.get::<Value>("/products").await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    h.store.save(&SessionData::new("new")).unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(h.navigator.routes().is_empty());
    assert_eq!(h.store.token().as_deref(), Some("new"));
}

#[tokio::test]
async fn concurrent_unauthorized_redirects_once() {
    let h = harness(Some("expired")).await;

    for route in ["/dashboard/metrics", "/reports/stock-by-category", "/reports/orders-history"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"ok": false, "error": "Token expired"})),
            )
            .expect(1)
            .mount(&h.server)
            .await;
    }

    let (metrics, stock, history) = tokio::join!(
        h.client.dashboard_metrics(),
        h.client.stock_by_category(),
        h.client.orders_history(),
    );

    assert!(metrics.unwrap_err().is_handled());
    assert!(stock.unwrap_err().is_handled());
    assert!(history.unwrap_err().is_handled());
    assert_eq!(h.navigator.routes(), vec!["/security/login".to_string()]);
    assert!(!h.client.has_token());
}

#[tokio::test]
async fn logout_and_ensure_authenticated() {
    let h = harness(Some("tok")).await;
    assert!(h.client.ensure_authenticated());

    h.client.logout().unwrap();
    assert!(!h.client.has_token());
    assert!(!h.client.ensure_authenticated());
    assert_eq!(h.navigator.routes(), vec!["/security/login".to_string()]);
}
