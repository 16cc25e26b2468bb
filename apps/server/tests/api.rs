//! End-to-end HTTP tests: the full router against an in-memory database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rxpos_db::{Database, DbConfig};
use rxpos_server::{build_app, AppState, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ServerConfig::from_builder(ServerConfig::defaults().unwrap()).unwrap();
    (build_app(AppState::new(db.clone(), config)), db)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_product(app: &Router, name: &str, stock: i64, sell: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/products",
        Some(json!({
            "name": name,
            "buy_price_cents": sell / 2,
            "sell_price_cents": sell,
            "stock": stock,
            "category": "Analgesics",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn stock_of(app: &Router, id: &str) -> i64 {
    let (status, body) = send(app, "GET", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["stock"].as_i64().unwrap()
}

fn sale(lines: Value, payment_method: &str) -> Value {
    json!({ "items": lines, "payment_method": payment_method })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_and_banner() {
    let (app, db) = app().await;

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].is_string());

    let (status, body) = send(&app, "GET", "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["sales"], "/api/sales");

    db.close().await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unknown_api_path_is_404_envelope() {
    let (app, _db) = app().await;

    let (status, body) = send(&app, "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("/api/nope"));
}

// =============================================================================
// Recording sales
// =============================================================================

#[tokio::test]
async fn test_record_sale_returns_201_and_decrements_stock() {
    let (app, _db) = app().await;
    let para = create_product(&app, "Paracetamol 500mg", 10, 250).await;
    let ibu = create_product(&app, "Ibuprofen 400mg", 5, 400).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/sales",
        Some(json!({
            "items": [
                { "product_id": para, "quantity": 2 },
                { "product_id": ibu, "quantity": 1 },
            ],
            "payment_method": "CARD",
            "customer_name": "Ana",
            "tax_cents": 90,
            "discount_cents": 50,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let data = &body["data"];
    assert_eq!(data["subtotal_cents"], 900);
    assert_eq!(data["final_total_cents"], 940);
    assert_eq!(data["payment_method"], "card");
    assert_eq!(data["items"].as_array().unwrap().len(), 2);
    assert_eq!(data["items"][0]["product_name"], "Paracetamol 500mg");
    assert_eq!(data["items"][0]["total_price_cents"], 500);

    assert_eq!(stock_of(&app, &para).await, 8);
    assert_eq!(stock_of(&app, &ibu).await, 4);

    let id = data["id"].as_str().unwrap();
    let (status, stored) = send(&app, "GET", &format!("/api/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["data"]["id"], data["id"]);
    assert_eq!(stored["data"]["final_total_cents"], 940);
    assert_eq!(stored["data"]["items"][1]["product_id"], ibu.as_str());
}

#[tokio::test]
async fn test_insufficient_stock_is_400_and_changes_nothing() {
    let (app, db) = app().await;
    let para = create_product(&app, "Paracetamol 500mg", 10, 250).await;
    let amox = create_product(&app, "Amoxicillin 500mg", 1, 900).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/sales",
        Some(sale(
            json!([
                { "product_id": para, "quantity": 3 },
                { "product_id": amox, "quantity": 2 },
            ]),
            "cash",
        )),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Amoxicillin"));

    assert_eq!(stock_of(&app, &para).await, 10);
    assert_eq!(stock_of(&app, &amox).await, 1);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let (app, db) = app().await;
    let para = create_product(&app, "Paracetamol 500mg", 10, 250).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/sales",
        Some(sale(
            json!([
                { "product_id": para, "quantity": 1 },
                { "product_id": "no-such-product", "quantity": 1 },
            ]),
            "cash",
        )),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no-such-product"));
    assert_eq!(stock_of(&app, &para).await, 10);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_sale_requests_are_400() {
    let (app, db) = app().await;
    let para = create_product(&app, "Paracetamol 500mg", 10, 250).await;

    let bad_bodies = [
        sale(json!([{ "product_id": para, "quantity": 0 }]), "cash"),
        sale(json!([{ "product_id": para, "quantity": -2 }]), "cash"),
        sale(json!([{ "product_id": para, "quantity": 1.5 }]), "cash"),
        sale(json!([{ "product_id": para, "quantity": "two" }]), "cash"),
        sale(json!([{ "product_id": para, "quantity": 1 }]), "bitcoin"),
        sale(json!([]), "cash"),
        sale(json!([{ "quantity": 1 }]), "cash"),
    ];

    for body in bad_bodies {
        let (status, response) = send(&app, "POST", "/api/sales", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {response}");
        assert_eq!(response["success"], false);
    }

    assert_eq!(stock_of(&app, &para).await, 10);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_400_envelope() {
    let (app, _db) = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/sales")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

// =============================================================================
// Sales history
// =============================================================================

#[tokio::test]
async fn test_list_sales_is_paginated_newest_first() {
    let (app, _db) = app().await;
    let para = create_product(&app, "Paracetamol 500mg", 50, 100).await;

    let mut ids = Vec::new();
    for qty in 1..=3 {
        let (_, body) = send(
            &app,
            "POST",
            "/api/sales",
            Some(sale(json!([{ "product_id": para, "quantity": qty }]), "cash")),
        )
        .await;
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (status, body) = send(&app, "GET", "/api/sales?page=1&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["pagination"],
        json!({ "page": 1, "limit": 2, "total": 3, "totalPages": 2 })
    );
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"], ids[2].as_str());
    assert_eq!(data[1]["id"], ids[1].as_str());

    let (_, body) = send(&app, "GET", "/api/sales?page=2&limit=2", None).await;
    assert_eq!(body["data"][0]["id"], ids[0].as_str());

    let (_, body) = send(&app, "GET", "/api/sales", None).await;
    assert_eq!(body["pagination"]["limit"], 50);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    for uri in ["/api/sales?limit=0", "/api/sales?limit=101", "/api/sales?page=0", "/api/sales?page=x"] {
        let (status, _) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_today_and_range_reports() {
    let (app, _db) = app().await;
    let para = create_product(&app, "Paracetamol 500mg", 50, 100).await;
    send(
        &app,
        "POST",
        "/api/sales",
        Some(sale(json!([{ "product_id": para, "quantity": 4 }]), "transfer")),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/sales/today", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["summary"],
        json!({ "sale_count": 1, "item_count": 4, "revenue_cents": 400 })
    );

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/sales/range?start_date={today}&end_date={today}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sales"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "GET",
        "/api/sales/range?start_date=2001-01-01&end_date=2001-01-31",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["sale_count"], 0);

    for uri in [
        "/api/sales/range?start_date=2024-02-10&end_date=2024-02-01",
        "/api/sales/range?start_date=2024-13-01&end_date=2024-12-31",
        "/api/sales/range?start_date=2024-01-01",
        "/api/sales/range",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_missing_sale_is_404() {
    let (app, _db) = app().await;
    let (status, body) = send(&app, "GET", "/api/sales/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Sale not found: does-not-exist");
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_product_crud() {
    let (app, _db) = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/products",
        Some(json!({
            "name": "Cetirizine 10mg",
            "buy_price_cents": 200,
            "sell_price_cents": 350,
            "stock": 12,
            "category": "Antihistamines",
            "barcode": "8991234567890",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/products/barcode/8991234567890", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/products/{id}"),
        Some(json!({ "sell_price_cents": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sell_price_cents"], 400);
    assert_eq!(body["data"]["name"], "Cetirizine 10mg");

    // Below the buy price.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/products/{id}"),
        Some(json!({ "sell_price_cents": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", &format!("/api/products/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/products/{id}/stock"),
        Some(json!({ "stock": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/products/{id}/stock"),
        Some(json!({ "stock": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock_of(&app, &id).await, 40);

    let (status, body) = send(&app, "GET", "/api/products/with-margin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["margin_cents"], 200);

    let (status, _) = send(&app, "DELETE", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_validation_and_conflicts() {
    let (app, _db) = app().await;

    let product = |barcode: &str, buy: i64, sell: i64, stock: i64| {
        json!({
            "name": "Omeprazole 20mg",
            "buy_price_cents": buy,
            "sell_price_cents": sell,
            "stock": stock,
            "category": "Digestive",
            "barcode": barcode,
        })
    };

    let (status, _) = send(&app, "POST", "/api/products", Some(product("111111", 500, 700, 5))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        send(&app, "POST", "/api/products", Some(product("111111", 500, 700, 5))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("111111"));

    let (status, _) = send(&app, "POST", "/api/products", Some(product("222222", 800, 700, 5))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&app, "POST", "/api/products", Some(product("333333", 500, 700, -1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sold_product_delete_is_409() {
    let (app, _db) = app().await;
    let para = create_product(&app, "Paracetamol 500mg", 10, 250).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/sales",
        Some(sale(json!([{ "product_id": para, "quantity": 1 }]), "cash")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "DELETE", &format!("/api/products/{para}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(stock_of(&app, &para).await, 9);
}

#[tokio::test]
async fn test_catalog_queries() {
    let (app, _db) = app().await;
    create_product(&app, "Paracetamol 500mg", 3, 250).await;
    create_product(&app, "Aspirin 100mg", 40, 300).await;

    let (status, body) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Aspirin 100mg", "Paracetamol 500mg"]);

    let (_, body) = send(&app, "GET", "/api/products?page=2&limit=1", None).await;
    assert_eq!(body["data"][0]["name"], "Paracetamol 500mg");
    assert_eq!(body["pagination"]["totalPages"], 2);

    let (status, body) = send(&app, "GET", "/api/products/search?q=para", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/api/products/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/products/low-stock", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Paracetamol 500mg");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/products/low-stock?threshold=100", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/products/categories", None).await;
    assert_eq!(body["data"], json!(["Analgesics"]));

    let (status, _) = send(&app, "GET", "/api/products/barcode/000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Customers
// =============================================================================

#[tokio::test]
async fn test_customers() {
    let (app, _db) = app().await;

    let customer = json!({ "name": "Budi Santoso", "phone": "0812-3456-789" });
    let (status, body) = send(&app, "POST", "/api/customers", Some(customer.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Budi Santoso");

    let (status, _) = send(&app, "POST", "/api/customers", Some(customer)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/customers",
        Some(json!({ "name": "X", "phone": "12" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/customers/phone/0812-3456-789", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Budi Santoso");

    let (status, _) = send(&app, "GET", "/api/customers/phone/000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/api/customers", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
