use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::Path, routing::get};

use reqwest::StatusCode;
use serde_json::{Value, json};

use stockline_api::app::services::{AppServices, Backends};
use stockline_core::UserId;
use stockline_infra::AppConfig;
use stockline_infra::lookup::StaticCountryLookup;
use stockline_infra::notify::RecordingDispatcher;
use stockline_infra::store::InMemoryUserDirectory;
use stockline_users::{Address, User};

const TOKEN: &str = "test-token";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    notifications: Arc<RecordingDispatcher>,
    handle: tokio::task::JoinHandle<()>,
}

async fn serve(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), handle)
}

impl TestServer {
    async fn spawn() -> Self {
        let notifications = Arc::new(RecordingDispatcher::new());
        let lookup = StaticCountryLookup::new().with("Kenya", "https://flags.test/ke.png");
        let mut backends = Backends::in_memory(notifications.clone(), Arc::new(lookup));
        backends.users = Arc::new(InMemoryUserDirectory::with_users([
            user("u-1", Some("Kenya")),
            user("u-2", Some("Kenya")),
            user("u-3", Some("France")),
            user("u-4", None),
        ]));
        let services = AppServices::from_backends(backends, &AppConfig::default());

        // Same router as prod, bound to an ephemeral port.
        let (base_url, handle) = serve(stockline_api::app::build_app(Arc::new(services))).await;

        Self {
            base_url,
            client: reqwest::Client::new(),
            notifications,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(TOKEN)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(TOKEN)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn patch(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(TOKEN)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn create_product(&self, name: &str, price: u64, stock: u32) -> String {
        let res = self
            .post(
                "/products",
                json!({ "name": name, "price": price, "stock": stock }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn stock_of(&self, product_id: &str) -> u64 {
        let body: Value = self
            .get(&format!("/products/{product_id}"))
            .await
            .json()
            .await
            .unwrap();
        body["stock"].as_u64().unwrap()
    }

    /// Notifications are sent off the request path; poll briefly.
    async fn notifications_eventually(&self, expected: usize) -> usize {
        for _ in 0..50 {
            let sent = self.notifications.sent().len();
            if sent >= expected {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.notifications.sent().len()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn user(id: &str, country: Option<&str>) -> User {
    User {
        id: UserId::from_raw(id),
        email: format!("{id}@example.com"),
        address: Address {
            country: country.map(str::to_string),
        },
    }
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_bearer_token() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/orders")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = client
        .get(server.url("/dashboard"))
        .header("Authorization", "Bearer  ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.get("/orders").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn placing_an_order_takes_stock_and_alerts_on_low_stock() {
    let server = TestServer::spawn().await;
    let product_id = server.create_product("Desk Lamp", 1000, 20).await;

    let res = server
        .post(
            "/orders",
            json!({ "userId": "u-1", "productId": product_id, "quantity": 6 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["totalAmount"], 6000);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["quantity"], 6);
    let order_id = order["orderId"].as_str().unwrap();
    assert!(order_id.starts_with("ORD-"));

    assert_eq!(server.stock_of(&product_id).await, 14);
    assert_eq!(server.notifications_eventually(1).await, 1);
    let sent = server.notifications.sent();
    assert_eq!(sent[0].product_stock, 14);
    assert_eq!(sent[0].product_name, "Desk Lamp");

    let res = server.get(&format!("/orders/{order_id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn insufficient_stock_is_a_400_and_changes_nothing() {
    let server = TestServer::spawn().await;
    let product_id = server.create_product("Chair", 2500, 3).await;

    let res = server
        .post(
            "/orders",
            json!({ "userId": "u-1", "productId": product_id, "quantity": 5 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    assert_eq!(server.stock_of(&product_id).await, 3);
    let page: Value = server.get("/orders").await.json().await.unwrap();
    assert_eq!(page["totalMatching"], 0);
}

#[tokio::test]
async fn unknown_ids_are_404() {
    let server = TestServer::spawn().await;

    let res = server
        .post(
            "/orders",
            json!({ "userId": "u-1", "productId": "missing", "quantity": 1 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get("/orders/ORD-NOPE").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .patch("/orders/ORD-NOPE", json!({ "status": "Shipped" }))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get("/products/missing").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_order_id_is_a_conflict() {
    let server = TestServer::spawn().await;
    let product_id = server.create_product("Rug", 4000, 50).await;
    let body = json!({
        "orderId": "ORD-FIXED",
        "userId": "u-1",
        "productId": product_id,
        "quantity": 2,
    });

    assert_eq!(server.post("/orders", body.clone()).await.status(), StatusCode::CREATED);
    assert_eq!(server.post("/orders", body).await.status(), StatusCode::CONFLICT);
    assert_eq!(server.stock_of(&product_id).await, 48);
}

#[tokio::test]
async fn order_updates_change_status_but_never_stock() {
    let server = TestServer::spawn().await;
    let product_id = server.create_product("Shelf", 1500, 40).await;
    let order: Value = server
        .post(
            "/orders",
            json!({ "userId": "u-2", "productId": product_id, "quantity": 4 }),
        )
        .await
        .json()
        .await
        .unwrap();
    let path = format!("/orders/{}", order["orderId"].as_str().unwrap());

    let res = server
        .patch(&path, json!({ "status": "Cancelled", "deliveryDate": "2024-06-01" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["status"], "Cancelled");
    assert_eq!(updated["deliveryDate"], "2024-06-01");
    assert_eq!(server.stock_of(&product_id).await, 36);

    let res = server.patch(&path, json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let cancelled: Value = server.get("/orders/status/cancelled").await.json().await.unwrap();
    assert_eq!(cancelled.as_array().unwrap().len(), 1);

    let res = server.get("/orders/status/lost").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn filtered_pagination_counts_the_whole_filtered_set() {
    let server = TestServer::spawn().await;
    let product_id = server.create_product("Pen", 100, 1000).await;

    for i in 0..25u32 {
        let family = if i % 3 == 0 { "B2" } else { "A1" };
        let order_id = format!("ORD-{family}{i:02}");
        let res = server
            .post(
                "/orders",
                json!({
                    "orderId": order_id,
                    "userId": "u-1",
                    "productId": product_id,
                    "quantity": 1,
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        if i % 2 == 0 {
            let res = server
                .patch(&format!("/orders/{order_id}"), json!({ "status": "Shipped" }))
                .await;
            assert_eq!(res.status(), StatusCode::OK);
        }
    }

    let page: Value = server
        .get("/orders?status=pending&search=a1&page=1&pageSize=10")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalMatching"], 8);
    assert_eq!(page["items"].as_array().unwrap().len(), 8);
    assert_eq!(page["hasMore"], false);
    assert_eq!(page["totalPages"], 1);

    let page: Value = server
        .get("/orders?status=pending&search=a1&page=2&pageSize=5")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalMatching"], 8);
    assert_eq!(page["items"].as_array().unwrap().len(), 3);

    let res = server.get("/orders?page=0").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_listing_and_direct_edits() {
    let server = TestServer::spawn().await;
    let lamp = server.create_product("Desk Lamp", 1000, 20).await;
    server.create_product("Floor Lamp", 3000, 80).await;
    server.create_product("Chair", 2500, 30).await;

    let page: Value = server.get("/products?search=lamp").await.json().await.unwrap();
    assert_eq!(page["totalMatching"], 2);

    let res = server
        .client
        .put(server.url(&format!("/products/{lamp}")))
        .bearer_auth(TOKEN)
        .json(&json!({ "stock": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.stock_of(&lamp).await, 9);
    assert_eq!(server.notifications_eventually(1).await, 1);
}

#[tokio::test]
async fn dashboard_aggregates_history_and_enriches_countries() {
    let server = TestServer::spawn().await;
    let widget = server.create_product("Widget", 500, 100).await;

    let mut cancelled = None;
    for quantity in [5, 3, 2] {
        let order: Value = server
            .post(
                "/orders",
                json!({ "userId": "u-1", "productId": widget, "quantity": quantity }),
            )
            .await
            .json()
            .await
            .unwrap();
        if quantity == 3 {
            cancelled = order["orderId"].as_str().map(str::to_string);
        }
    }
    let cancelled = cancelled.unwrap();
    let res = server
        .patch(&format!("/orders/{cancelled}"), json!({ "status": "Cancelled" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.get("/dashboard").await;
    assert_eq!(res.status(), StatusCode::OK);
    let view: Value = res.json().await.unwrap();

    assert_eq!(view["summary"]["totalOrders"], 3);
    assert_eq!(view["summary"]["totalUsers"], 4);
    assert_eq!(view["summary"]["totalProducts"], 1);
    assert_eq!(view["topByQuantity"][0]["name"], "Widget");
    assert_eq!(view["topByQuantity"][0]["value"], 7);
    assert_eq!(view["statusDistribution"].as_array().unwrap().len(), 5);

    let countries = view["countries"].as_array().unwrap();
    assert_eq!(countries.len(), 2);
    assert_eq!(countries[0]["country"], "Kenya");
    assert_eq!(countries[0]["users"], 2);

    let flags = view["countryFlags"].as_array().unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0]["flagUrl"], "https://flags.test/ke.png");
}

#[tokio::test]
async fn malformed_order_bodies_are_json_validation_errors() {
    let server = TestServer::spawn().await;
    let product_id = server.create_product("Desk Lamp", 1000, 20).await;

    let res = server
        .post(
            "/orders",
            json!({ "userId": "u-1", "productId": product_id, "quantity": -3 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = server
        .post("/orders", json!({ "productId": product_id, "quantity": 2 }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("userId"));

    let res = server.get("/orders?page=abc").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    assert_eq!(server.stock_of(&product_id).await, 20);
    let page: Value = server.get("/orders").await.json().await.unwrap();
    assert_eq!(page["totalMatching"], 0);
}

#[tokio::test]
async fn prices_are_integer_minor_units() {
    let server = TestServer::spawn().await;

    let res = server
        .post("/products", json!({ "name": "Mug", "price": 19.99, "stock": 5 }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let mug = server.create_product("Mug", 1999, 5).await;
    let order: Value = server
        .post(
            "/orders",
            json!({ "userId": "u-1", "productId": mug, "quantity": 2 }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(order["totalAmount"], 3998);
}

#[tokio::test]
async fn configured_user_service_feeds_the_dashboard() {
    let upstream = Router::new()
        .route(
            "/api/users",
            get(|| async {
                Json(json!([
                    { "_id": "a1", "name": "Ada", "email": "ada@example.com", "address": { "country": "Peru" } },
                    { "_id": "b2", "name": "Bo", "email": "bo@example.com", "address": { "country": "Peru" } },
                    { "_id": "c3", "name": "Cy", "email": "cy@example.com" }
                ]))
            }),
        )
        .route(
            "/name/:country",
            get(|Path(country): Path<String>| async move {
                Json(json!([{ "flags": { "png": format!("https://flags.test/{country}.png") } }]))
            }),
        );
    let (upstream_url, upstream_handle) = serve(upstream).await;

    let config = AppConfig {
        users_url: Some(format!("{upstream_url}/api/users")),
        country_lookup_url: upstream_url,
        http_timeout: Duration::from_secs(2),
        ..AppConfig::default()
    };
    let services = stockline_api::app::services::build_services(&config)
        .await
        .unwrap();
    let (base_url, handle) = serve(stockline_api::app::build_app(Arc::new(services))).await;

    let view: Value = reqwest::Client::new()
        .get(format!("{base_url}/dashboard"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["summary"]["totalUsers"], 3);
    assert_eq!(view["countries"][0]["country"], "Peru");
    assert_eq!(view["countries"][0]["users"], 2);
    assert_eq!(view["countryFlags"][0]["flagUrl"], "https://flags.test/Peru.png");

    handle.abort();
    upstream_handle.abort();
}
