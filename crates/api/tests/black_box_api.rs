use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use stocksmart_api::app::{router, AppServices};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory storage, bound to an ephemeral port.
        let app = router(Arc::new(AppServices::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, body).await
    }

    async fn create_product(&self, sku: &str, stock: i64) -> String {
        let (status, body) = self
            .post(
                "/products",
                json!({
                    "sku": sku,
                    "name": format!("Product {sku}"),
                    "unit_price": "10.00",
                    "initial_stock": stock,
                    "min_stock_level": 5
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_order(&self, product_id: &str, quantity: i64) -> Value {
        let (status, body) = self
            .post(
                "/orders",
                json!({
                    "customer_name": "Acme Traders",
                    "customer_email": "orders@acme.test",
                    "requested_by": "front desk",
                    "items": [{ "product_id": product_id, "quantity": quantity, "unit_price": 10 }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_reports_storage_backend() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "in_memory");
}

#[tokio::test]
async fn order_flow_decrements_stock_and_escalates_oversell() {
    let srv = TestServer::spawn().await;
    let pid = srv.create_product("P1", 100).await;

    let first = srv.create_order(&pid, 30).await;
    assert_eq!(first["status"], "pending");
    assert_eq!(first["approval_status"], "not_required");
    assert!(first["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(first["items"].as_array().unwrap().len(), 1);

    let (_, product) = srv.get(&format!("/products/{pid}")).await;
    assert_eq!(product["stock_total"], 100);
    assert_eq!(product["stock_used"], 30);
    assert_eq!(product["stock_available"], 70);

    let second = srv.create_order(&pid, 90).await;
    assert_eq!(second["status"], "needs_approval");
    assert_eq!(second["approval_requested_by"], "front desk");

    let (_, product) = srv.get(&format!("/products/{pid}")).await;
    assert_eq!(product["stock_used"], 120);
    assert_eq!(product["stock_available"], -20);

    let (status, movements) = srv.get(&format!("/products/{pid}/movements?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    let latest = &movements.as_array().unwrap()[0];
    assert_eq!(latest["action"], "use");
    assert_eq!(latest["quantity"], -90);
    assert_eq!(latest["previous_stock"], 70);
    assert_eq!(latest["new_stock"], -20);
    assert_eq!(latest["order_id"], second["id"]);

    let (_, pending) = srv.get("/orders?status=needs_approval").await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], second["id"]);
    assert_eq!(pending[0]["item_count"], 1);
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/products", json!({ "name": "No sku" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"][0]["field"], "sku");

    let (status, body) = srv.get("/products/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let pid = srv.create_product("SKU-1", 3).await;
    let (status, body) = srv
        .post("/products", json!({ "sku": "SKU-1", "name": "Again" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = srv
        .post(
            "/orders",
            json!({ "items": [{ "product_id": uuid::Uuid::now_v7().to_string(), "quantity": 1, "unit_price": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let order = srv.create_order(&pid, 1).await;
    let order_id = order["id"].as_str().unwrap();
    let (status, _) = srv
        .send(
            reqwest::Method::PATCH,
            &format!("/orders/{order_id}/status"),
            json!({ "status": "cancelled" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = srv
        .send(
            reqwest::Method::PATCH,
            &format!("/orders/{order_id}/status"),
            json!({ "status": "shipped" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");
}

#[tokio::test]
async fn grn_submission_and_approval() {
    let srv = TestServer::spawn().await;
    let pid = srv.create_product("P1", 5).await;
    let order = srv.create_order(&pid, 8).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, grn) = srv.get(&format!("/orders/{order_id}/grn")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(grn.is_null());

    let submit = |count: usize| {
        json!({
            "requested_by": "store manager",
            "grn": {
                "vendor_name": "Northwind Supply",
                "bill_date": "2024-03-15",
                "items": (0..count)
                    .map(|i| json!({ "description": format!("line {i}"), "quantity_received": 2 }))
                    .collect::<Vec<_>>()
            }
        })
    };

    let (status, first) = srv
        .post(&format!("/orders/{order_id}/request-approval"), submit(3))
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["grn"]["items"].as_array().unwrap().len(), 3);
    assert_eq!(first["grn"]["bill_date"], "2024-03-15");

    let (status, second) = srv
        .post(&format!("/orders/{order_id}/request-approval"), submit(2))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["grn"]["id"], first["grn"]["id"]);
    assert_eq!(second["approval_requested_by"], "store manager");

    let (_, stored) = srv.get(&format!("/orders/{order_id}/grn")).await;
    assert_eq!(stored["items"].as_array().unwrap().len(), 2);

    let (status, body) = srv
        .post(&format!("/orders/{order_id}/approve"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "approved_by");

    let (status, approved) = srv
        .post(&format!("/orders/{order_id}/approve"), json!({ "approved_by": "alice" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (_, again) = srv
        .post(
            &format!("/orders/{order_id}/approve"),
            json!({ "approved_by": "bob", "notes": "second look" }),
        )
        .await;
    assert_eq!(again["approved_by"], "bob");
    assert_eq!(again["approval_notes"], "second look");
}

#[tokio::test]
async fn warehouse_stock_and_transfer() {
    let srv = TestServer::spawn().await;
    let pid = srv.create_product("P1", 30).await;

    let (status, north) = srv.post("/warehouses", json!({ "name": "North" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, south) = srv.post("/warehouses", json!({ "name": "South" })).await;
    let north = north["id"].as_str().unwrap().to_string();
    let south = south["id"].as_str().unwrap().to_string();

    let (status, row) = srv
        .send(
            reqwest::Method::PUT,
            &format!("/warehouses/{north}/stock/{pid}"),
            json!({ "quantity": 12, "aisle": "A", "bin": "3" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{row}");
    assert_eq!(row["location"]["aisle"], "A");

    let (status, update) = srv
        .post(
            &format!("/products/{pid}/stock"),
            json!({ "action": "transfer", "quantity": 5, "warehouse_id": north, "to_warehouse_id": south }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{update}");
    assert_eq!(update["product"]["stock_available"], 30);
    assert_eq!(update["movement"]["action"], "transfer");

    let (_, south_stock) = srv.get(&format!("/warehouses/{south}/stock")).await;
    assert_eq!(south_stock[0]["quantity"], 5);
    let (_, north_stock) = srv.get(&format!("/warehouses/{north}/stock")).await;
    assert_eq!(north_stock[0]["quantity"], 7);

    let (status, update) = srv
        .post(
            &format!("/products/{pid}/stock"),
            json!({ "action": "add", "quantity": 10, "reason": "delivery" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["product"]["stock_total"], 40);
    assert_eq!(update["movement"]["quantity"], 10);

    let (_, usage) = srv.get(&format!("/products/{pid}/usage")).await;
    assert_eq!(usage["warehouse_stock"].as_array().unwrap().len(), 2);
    assert_eq!(usage["movements"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn archived_products_leave_the_default_list() {
    let srv = TestServer::spawn().await;
    let keep = srv.create_product("KEEP", 50).await;
    let gone = srv.create_product("GONE", 1).await;

    let (_, low) = srv.get("/products/low-stock").await;
    let low = low.as_array().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["id"].as_str().unwrap(), gone);

    let (status, archived) = srv
        .send(reqwest::Method::DELETE, &format!("/products/{gone}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["status"], "archived");

    let (_, active) = srv.get("/products").await;
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"].as_str().unwrap(), keep);

    let (_, all) = srv.get("/products?include_archived=true").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, customers) = srv.get("/customers?search=acme").await;
    assert!(customers.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn vendor_directory_lifecycle() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/vendors", json!({ "city": "Pune" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "name");

    let (status, vendor) = srv
        .post(
            "/vendors",
            json!({
                "name": "Shakti Wires",
                "main_category": "Electrical/Electronics",
                "city": "Pune",
                "contact_number": "98220 00000"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(vendor["status"], "pending");
    assert_eq!(vendor["main_category"], "electrical_electronics");
    let id = vendor["id"].as_str().unwrap().to_string();

    let (status, body) = srv
        .send(reqwest::Method::PATCH, &format!("/vendors/{id}/status"), json!({ "status": "active" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");

    let (status, body) = srv
        .send(reqwest::Method::PATCH, &format!("/vendors/{id}/status"), json!({ "status": "pending" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");

    let (status, body) = srv
        .send(reqwest::Method::PATCH, &format!("/vendors/{id}"), json!({ "city": "Nashik" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Nashik");

    let (status, body) = srv.get("/vendors?status=active&category=electrical/electronics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = srv.get("/vendors?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "status");

    let (status, _) = srv.get(&format!("/vendors/{}", uuid::Uuid::now_v7())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
