//! Router-level tests against the in-memory store

use axum::Router;
use axum::body::Body;
use catalog_cloud::{AppState, api};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::in_memory();
        Self {
            router: api::create_router(state.clone()),
            state,
        }
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    async fn send(&self, method: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.call(request).await
    }

    async fn create_client(&self, name: &str) -> Value {
        let (status, body) = self.send("POST", "/api/clients", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "catalog-cloud");
}

#[tokio::test]
async fn test_client_lifecycle() {
    let app = TestApp::new();
    let client = app.create_client("Empório Natural").await;
    assert_eq!(client["slug"], "emporio-natural");
    let id = client["id"].as_str().unwrap();

    let (status, body) = app.send("POST", "/api/clients", json!({ "name": "Empório Natural" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1002);

    let (status, body) = app.get("/api/clients/by-slug/emporio-natural").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, body) = app
        .send("PUT", &format!("/api/clients/{id}"), json!({ "name": "Empório Natural Ltda" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "emporio-natural");

    let (status, body) = app.send("POST", &format!("/api/clients/{id}/visit"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["views"], 1);

    let (status, _) = app.get("/api/clients/by-slug/nao-existe").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upsert_links_to_global_parent() {
    let app = TestApp::new();
    let global = app.state.global.resolve(app.state.store()).await.unwrap();

    let (status, parent) = app
        .send(
            "POST",
            &format!("/api/clients/{}/products", global.0),
            json!({ "name": "Arroz Integral", "category": "Grãos", "price": 10.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{parent}");
    assert_eq!(parent["slug"], "arroz-integral");

    let client = app.create_client("Loja B").await;
    let client_id = client["id"].as_str().unwrap();
    let (status, local) = app
        .send(
            "POST",
            &format!("/api/clients/{client_id}/products"),
            json!({
                "name": "Arroz Integral",
                "parent_product_id": parent["id"],
                "price": 12.50,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{local}");
    assert_eq!(local["category"], "Grãos");
    assert_eq!(local["price"], 12.5);
    assert_eq!(local["parent_product_id"], parent["id"]);

    let (_, categories) = app.get(&format!("/api/clients/{client_id}/categories")).await;
    assert_eq!(categories[0]["name"], "Grãos");
    assert_eq!(categories[0]["emoji"], "🌾");
    assert_eq!(categories[0]["products_count"], 1);

    let (_, by_slug) = app.get("/api/clients/by-slug/loja-b/products").await;
    assert_eq!(by_slug.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_global_product_propagates() {
    let app = TestApp::new();
    let client = app.create_client("Loja B").await;
    let client_id = client["id"].as_str().unwrap();

    let (_, local) = app
        .send(
            "POST",
            &format!("/api/clients/{client_id}/products"),
            json!({ "name": "Granola", "price": 22.0 }),
        )
        .await;

    // Creating the local product mirrored it into the global catalog
    let (_, global_client) = app.get("/api/clients/by-slug/global-catalog/products").await;
    let mirror = &global_client[0];
    assert_eq!(mirror["slug"], "granola");

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/products/{}", mirror["id"].as_str().unwrap()),
            json!({ "emoji": "🥣", "price": 30.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, local) = app
        .get(&format!("/api/products/{}", local["id"].as_str().unwrap()))
        .await;
    assert_eq!(local["emoji"], "🥣");
    assert_eq!(local["price"], 22.0);
}

#[tokio::test]
async fn test_product_validation_and_not_found() {
    let app = TestApp::new();
    let client = app.create_client("Loja B").await;
    let client_id = client["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/clients/{client_id}/products"),
            json!({ "name": "  ", "price": 1.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2002);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = app.get(&format!("/api/products/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 2001);

    let (status, _) = app
        .send("DELETE", &format!("/api/products/{missing}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_interactions() {
    let app = TestApp::new();
    let client = app.create_client("Loja B").await;
    let client_id = client["id"].as_str().unwrap();
    let (_, product) = app
        .send(
            "POST",
            &format!("/api/clients/{client_id}/products"),
            json!({ "name": "Chia", "price": 9.0 }),
        )
        .await;
    let path = format!("/api/products/{}/interactions", product["id"].as_str().unwrap());

    let request = Request::post(&path)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .header("user-agent", "vitrine/1.0")
        .body(Body::from(json!({ "type": "view" }).to_string()))
        .unwrap();
    let (status, row) = app.call(request).await;
    assert_eq!(status, StatusCode::OK, "{row}");
    assert_eq!(row["type"], "view");
    assert_eq!(row["ip_address"], "203.0.113.7");
    assert_eq!(row["user_agent"], "vitrine/1.0");

    let (status, body) = app.send("POST", &path, json!({ "type": "like" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4001);
    assert!(body["message"].as_str().unwrap().contains("like"));

    let (status, body) = app.send("POST", &path, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4001);

    let (_, stats) = app.get(&path).await;
    assert_eq!(stats, json!([
        { "type": "view", "count": 1 },
        { "type": "favorite", "count": 0 },
        { "type": "nutrition", "count": 0 },
    ]));

    let (_, product) = app
        .get(&format!("/api/products/{}", product["id"].as_str().unwrap()))
        .await;
    assert_eq!(product["views"], 1);
}

#[tokio::test]
async fn test_bulk_import_and_listing() {
    let app = TestApp::new();
    let (status, results) = app
        .send(
            "POST",
            "/api/clients/bulk",
            json!([
                { "name": "Loja A", "products": [{ "name": "Chá Verde", "category": "Chás", "price": 8.0 }] },
                { "name": "" },
            ]),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[0]["products"], 1);
    assert_eq!(results[1]["status"], "error");
    assert!(results[1]["error"].is_string());

    let (_, clients) = app.get("/api/clients").await;
    let slugs: Vec<_> = clients
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (c["slug"].as_str().unwrap(), c["product_count"].as_i64().unwrap()))
        .collect();
    assert_eq!(slugs, [("global-catalog", 1), ("loja-a", 1)]);
}

#[tokio::test]
async fn test_categories_and_maintenance() {
    let app = TestApp::new();
    let client = app.create_client("Loja A").await;
    let client_id = client["id"].as_str().unwrap();

    let (status, category) = app
        .send(
            "POST",
            &format!("/api/clients/{client_id}/categories"),
            json!({ "name": "Temperos", "emoji": "📦" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/clients/{client_id}/categories"),
            json!({ "name": "Temperos" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 3002);

    let (_, repaired) = app.send("POST", "/api/maintenance/emojis/repair", json!({})).await;
    assert_eq!(repaired["updated"], 1);

    let (_, resynced) = app.send("POST", "/api/maintenance/emojis/resync", json!({})).await;
    assert_eq!(resynced["updated"], 0);

    app.send(
        "POST",
        &format!("/api/clients/{client_id}/products"),
        json!({ "name": "Camomila", "category": "Chás", "price": 6.0 }),
    )
    .await;
    let (status, summary) = app.send("POST", "/api/maintenance/reconcile", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["failed"], 0);

    let (status, synced) = app
        .send("POST", &format!("/api/clients/{client_id}/categories/sync"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(synced["created"], 0);

    let category_path = format!("/api/categories/{}", category["id"].as_str().unwrap());
    let (status, updated) = app.send("PUT", &category_path, json!({ "emoji": "🧂" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["emoji"], "🧂");

    let (status, _) = app.send("DELETE", &category_path, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("DELETE", &category_path, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
