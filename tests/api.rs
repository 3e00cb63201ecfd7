//! HTTP integration tests.
//!
//! Starts the router on an ephemeral port over temp CSV files and drives it with reqwest.

use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use csv_storefront::api::{self, AppState};
use csv_storefront::config::Config;
use csv_storefront::payments::{CheckoutGateway, CheckoutRequest, CheckoutSession};
use serde_json::{json, Value};
use tempfile::TempDir;

const CATALOG: &str = "ProductID,Category,Name,Price,Description,Quantity,ImageURL\n\
101,Tools,Hammer,12.50,\"Steel head, claw back\",10,http://img/hammer.png\n\
102,Garden,Hose,20.00,Fifty feet,3,\n\
103,Garden,Rake,9.99,Wide,0,\n";

#[derive(Default)]
struct FakeCheckout {
    seen: Mutex<Vec<CheckoutRequest>>,
}

#[async_trait]
impl CheckoutGateway for FakeCheckout {
    async fn create_session(&self, request: &CheckoutRequest) -> csv_storefront::Result<CheckoutSession> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(CheckoutSession { id: "cs_test_1".into(), url: Some("https://checkout.test/cs_test_1".into()) })
    }
}

struct Shop {
    base: String,
    client: reqwest::Client,
    checkout: Arc<FakeCheckout>,
    dir: TempDir,
}

impl Shop {
    fn catalog_text(&self) -> String { fs::read_to_string(self.dir.path().join("product_list.csv")).unwrap() }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(format!("{}{path}", self.base)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self.client.post(format!("{}{path}", self.base)).json(&body).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }
}

/// Bind to port 0 and return the running shop.
async fn start_shop() -> Shop {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("product_list.csv"), CATALOG).unwrap();
    let config = Config {
        product_csv: dir.path().join("product_list.csv"),
        discount_csv: dir.path().join("discount_codes.csv"),
        ..Config::default()
    };
    let checkout = Arc::new(FakeCheckout::default());
    let state = AppState::new(&config, checkout.clone());
    state.discounts.initialize().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::router(state)).await.unwrap();
    });
    Shop { base: format!("http://{addr}"), client: reqwest::Client::new(), checkout, dir }
}

#[tokio::test]
async fn health_check() {
    let shop = start_shop().await;
    let (status, body) = shop.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn lists_products_with_catalog_keys() {
    let shop = start_shop().await;
    let (status, body) = shop.get("/products").await;
    assert_eq!(status, 200);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["ProductID"], "101");
    assert_eq!(products[0]["Price"], "12.50");
    assert_eq!(products[0]["Description"], "Steel head, claw back");
    assert_eq!(products[2]["inStock"], false);

    let (status, body) = shop.get("/products/404").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn update_quantities_decrements_stock() {
    let shop = start_shop().await;
    let (status, body) = shop.post("/update-quantities", json!({
        "items": [{ "productId": 101, "quantity": 4 }, { "productId": "102", "quantity": 9 }, { "productId": "555", "quantity": 1 }]
    })).await;
    assert_eq!(status, 200);
    assert_eq!(body["updated"][0], json!({ "id": "101", "name": "Hammer", "oldQuantity": 10, "newQuantity": 6 }));
    assert_eq!(body["updated"][1]["newQuantity"], 0);
    assert_eq!(body["missing"], json!(["555"]));

    let text = shop.catalog_text();
    assert!(text.contains("101,Tools,Hammer,12.50,\"Steel head, claw back\",6,http://img/hammer.png"));
    assert!(text.contains("102,Garden,Hose,20.00,Fifty feet,0,"));
}

#[tokio::test]
async fn update_quantities_rejects_bad_requests() {
    let shop = start_shop().await;
    let (status, body) = shop.post("/update-quantities", json!({ "items": [{ "productId": "999", "quantity": 1 }] })).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = shop.post("/update-quantities", json!({ "items": [{ "productId": "101", "quantity": 0 }] })).await;
    assert_eq!(status, 400);
    assert_eq!(shop.catalog_text(), CATALOG);
}

#[tokio::test]
async fn discount_code_management() {
    let shop = start_shop().await;
    let (_, body) = shop.get("/discount-codes").await;
    assert_eq!(body["discountCodes"].as_array().unwrap().len(), 5);

    let (status, body) = shop.post("/discount-codes", json!({ "code": "summer", "discount": 15 })).await;
    assert_eq!(status, 201);
    let codes = body["discountCodes"].as_array().unwrap();
    assert_eq!(codes[5], json!({ "id": "6", "code": "SUMMER", "discount": 15, "isActive": true }));

    let (status, _) = shop.post("/discount-codes", json!({ "code": "free5", "discount": 10 })).await;
    assert_eq!(status, 409);
    let (status, _) = shop.post("/discount-codes", json!({ "code": "HUGE", "discount": 150 })).await;
    assert_eq!(status, 400);

    let resp = shop.client.patch(format!("{}/discount-codes/6", shop.base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["discountCodes"][5]["isActive"], false);

    let (_, body) = shop.post("/verify-discount", json!({ "code": "Summer" })).await;
    assert_eq!(body["valid"], false);

    let resp = shop.client.patch(format!("{}/discount-codes/6", shop.base))
        .json(&json!({ "isActive": true, "discount": 20 })).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let (_, body) = shop.post("/verify-discount", json!({ "code": "summer" })).await;
    assert_eq!(body, json!({ "success": true, "valid": true, "code": "SUMMER", "discount": 20 }));

    let resp = shop.client.delete(format!("{}/discount-codes/6", shop.base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = shop.client.delete(format!("{}/discount-codes/6", shop.base)).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn add_and_update_products() {
    let shop = start_shop().await;
    let (status, body) = shop.post("/add-product", json!({ "newProduct": {
        "ProductID": "", "Category": "Tools", "Name": "Chisel", "Price": "7.25",
        "Description": "Sharp, \"bevelled\" edge", "Quantity": "100", "ImageURL": ""
    }})).await;
    assert_eq!(status, 201);
    assert_eq!(body["product"]["ProductID"], "104");

    let (status, body) = shop.post("/update-product", json!({ "productId": "104", "updatedProduct": {
        "ProductID": "104", "Category": "Tools", "Name": "Wood chisel", "Price": 8, "Description": "Sharp", "Quantity": 50, "ImageURL": "http://img/c.png"
    }})).await;
    assert_eq!(status, 200);
    assert_eq!(body["product"]["Name"], "Wood chisel");

    let (_, body) = shop.get("/products/104").await;
    assert_eq!(body["product"]["Quantity"], 50);
    assert_eq!(body["product"]["ImageURL"], "http://img/c.png");

    let (status, _) = shop.post("/update-product", json!({ "productId": "101", "updatedProduct": {
        "Name": "Hammer", "Price": "free", "Quantity": "1"
    }})).await;
    assert_eq!(status, 400);
    let (status, _) = shop.post("/update-product", json!({ "productId": "900", "updatedProduct": {
        "Name": "Ghost", "Price": "1", "Quantity": "1"
    }})).await;
    assert_eq!(status, 404);
    let (status, _) = shop.post("/add-product", json!({ "newProduct": {
        "ProductID": "101", "Name": "Dup", "Price": "1", "Quantity": "1"
    }})).await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn quote_applies_tax_and_discount() {
    let shop = start_shop().await;
    let (status, body) = shop.post("/cart/quote", json!({
        "items": [{ "productId": "102", "quantity": 1 }, { "productId": "102", "quantity": 1 }],
        "discountCode": "free25"
    })).await;
    assert_eq!(status, 200);
    assert_eq!(body["quote"]["itemCount"], 2);
    assert_eq!(body["quote"]["subtotal"], "40.00");
    assert_eq!(body["quote"]["tax"], "3.30");
    assert_eq!(body["quote"]["discount"], "10.00");
    assert_eq!(body["quote"]["total"], "33.30");
}

#[tokio::test]
async fn checkout_prices_from_catalog() {
    let shop = start_shop().await;
    let (status, body) = shop.post("/create-checkout-session", json!({
        "items": [{ "productId": "101", "quantity": 2 }],
        "discountCode": "FREE50"
    })).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], "cs_test_1");

    let seen = shop.checkout.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].lines[0].name, "Hammer");
    assert_eq!(seen[0].lines[0].unit_amount, 625);
    assert_eq!(seen[0].lines[0].image_url.as_deref(), Some("http://img/hammer.png"));
    assert_eq!(seen[0].lines[1].unit_amount, 206);
}

#[tokio::test]
async fn checkout_rejects_unavailable_carts() {
    let shop = start_shop().await;
    let (status, _) = shop.post("/create-checkout-session", json!({ "items": [{ "productId": "103", "quantity": 1 }] })).await;
    assert_eq!(status, 409);
    let (status, _) = shop.post("/create-checkout-session", json!({ "items": [{ "productId": "42", "quantity": 1 }] })).await;
    assert_eq!(status, 404);
    let (status, body) = shop.post("/create-checkout-session", json!({ "items": [{ "productId": "101", "quantity": 1 }], "discountCode": "NOPE" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(shop.checkout.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_row_does_not_block_the_shop() {
    let shop = start_shop().await;
    fs::write(shop.dir.path().join("product_list.csv"), format!("{CATALOG}104,Tools,Level,TBD,Spirit level,6,\n")).unwrap();

    let (status, body) = shop.get("/products").await;
    assert_eq!(status, 200);
    assert_eq!(body["products"].as_array().unwrap().len(), 3);

    let (status, body) = shop.post("/cart/quote", json!({ "items": [{ "productId": "101", "quantity": 3 }], "discountCode": "FREE25" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["quote"]["total"], "31.23");

    let (status, _) = shop.post("/create-checkout-session", json!({ "items": [{ "productId": "101", "quantity": 3 }], "discountCode": "FREE25" })).await;
    assert_eq!(status, 200);
    assert_eq!(shop.checkout.seen.lock().unwrap()[0].total(), 3123);

    let (status, body) = shop.post("/update-quantities", json!({ "items": [{ "productId": "104", "quantity": 1 }] })).await;
    assert_eq!(status, 200);
    assert_eq!(body["updated"][0]["newQuantity"], 5);
    assert!(shop.catalog_text().contains("104,Tools,Level,TBD,Spirit level,5,"));
}
