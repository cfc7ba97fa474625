use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use storekeep_api::app::{AppServices, build_app};
use storekeep_api::app::services::AppStore;
use storekeep_infra::CsvRecordStore;

const ADMIN_PASSWORD: &str = "NHRC@26";

fn app() -> Router {
    let services = AppServices::in_memory(ADMIN_PASSWORD, 2).expect("services");
    build_app(Arc::new(services))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn create_item(app: &Router, token: &str, name: &str, quantity: u32, reorder_level: u32) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/items",
        Some(token),
        Some(json!({
            "name": name,
            "category": "Lab",
            "unit": "Boxes",
            "quantity": quantity,
            "reorder_level": reorder_level,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["item_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_session() {
    let app = app();
    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/items", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/items", Some(&uuid::Uuid::now_v7().to_string()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_whoami_logout() {
    let app = app();
    let (status, body) = call(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, me) = call(&app, "GET", "/whoami", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");
    assert_eq!(me["role"], "admin");
    assert!(me["permissions"].as_array().unwrap().contains(&json!("users.manage")));

    let (status, _) = send(&app, "POST", "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/whoami", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn receive_issue_and_insufficient_stock() {
    let app = app();
    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let id = create_item(&app, &token, "Nitrile gloves", 0, 10).await;

    let (status, receipt) = call(
        &app,
        "POST",
        &format!("/items/{id}/receive"),
        Some(&token),
        Some(json!({ "quantity": 50, "unit_cost": "2.00", "supplier": "MedSupply" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{receipt}");
    assert_eq!(receipt["total_value"], "100.00");
    assert_eq!(receipt["received_by"], "System Administrator");

    let (status, err) = call(
        &app,
        "POST",
        &format!("/items/{id}/issue"),
        Some(&token),
        Some(json!({ "quantity": 60, "department": "Virology" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "insufficient_stock");

    let (status, _) = call(
        &app,
        "POST",
        &format!("/items/{id}/issue"),
        Some(&token),
        Some(json!({ "quantity": 50, "department": "Virology" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, item) = call(&app, "GET", &format!("/items/{id}"), Some(&token), None).await;
    assert_eq!(item["quantity"], 0);

    let (_, critical) = call(&app, "GET", "/reports/critical", Some(&token), None).await;
    assert_eq!(critical.as_array().unwrap().len(), 1);

    let (_, summary) = call(&app, "GET", "/reports/summary", Some(&token), None).await;
    assert_eq!(summary["metrics"]["critical_count"], 1);
    assert_eq!(summary["metrics"]["total_receipt_value"], "100.00");
}

#[tokio::test]
async fn validation_and_not_found_map_to_4xx() {
    let app = app();
    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = call(
        &app,
        "POST",
        "/items",
        Some(&token),
        Some(json!({ "name": "Tape", "reorder_level": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = call(&app, "GET", "/items/NOPE-1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let id = create_item(&app, &token, "Tape", 5, 2).await;
    let (status, _) = call(
        &app,
        "POST",
        &format!("/items/{id}/receive"),
        Some(&token),
        Some(json!({ "quantity": 0, "unit_cost": "1.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "GET", "/items?stock_status=plenty", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn edit_filter_delete_and_history() {
    let app = app();
    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let gloves = create_item(&app, &token, "Nitrile gloves", 20, 5).await;
    create_item(&app, &token, "Swabs", 3, 5).await;

    let (status, edited) = call(
        &app,
        "PATCH",
        &format!("/items/{gloves}"),
        Some(&token),
        Some(json!({ "storage_location": "Shelf B", "expiry_date": "2026-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["storage_location"], "Shelf B");

    let (_, low) = call(&app, "GET", "/items?stock_status=low", Some(&token), None).await;
    assert_eq!(low[0]["item_name"], "Swabs");

    let (_, found) = call(&app, "GET", "/items?search=GLOVE", Some(&token), None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (_, expired) = call(
        &app,
        "GET",
        "/items?expiry_status=expired&date=2026-06-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(expired[0]["item_id"], gloves.as_str());

    let (_, report) = call(&app, "GET", "/reports/expiry?date=2025-12-15", Some(&token), None).await;
    assert_eq!(report["due_30"][0]["days_to_expiry"], 17);

    call(
        &app,
        "POST",
        &format!("/items/{gloves}/issue"),
        Some(&token),
        Some(json!({ "quantity": 2, "department": "Parasitology" })),
    )
    .await;

    let (status, tombstone) = call(&app, "DELETE", &format!("/items/{gloves}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tombstone["deleted_by"], "admin");

    let (status, history) = call(&app, "GET", &format!("/items/{gloves}/history"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["deleted"]["item_name"], "Nitrile gloves");
    assert_eq!(history["issues"][0]["item_deleted"], true);
    assert_eq!(history["issues"][0]["quantity"], 2);

    let (_, issues) = call(&app, "GET", "/issues", Some(&token), None).await;
    assert_eq!(issues.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn csv_exports_have_headers() {
    let app = app();
    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, bytes) = send(&app, "GET", "/exports/receipts.csv", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("receipt_id,date,item_id,item_name,quantity,unit_cost,total_value"));

    create_item(&app, &token, "Gauze, sterile", 1, 1).await;
    let (_, bytes) = send(&app, "GET", "/exports/items.csv", Some(&token), None).await;
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("\"Gauze, sterile\""));

    let (status, _) = send(&app, "GET", "/exports/secrets.csv", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = app();
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let new_user = json!({
        "username": "kofi",
        "password": "pa55",
        "full_name": "Kofi Boateng",
        "role": "manager",
    });
    let (status, created) = call(&app, "POST", "/users", Some(&admin), Some(new_user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("password").is_none());

    let (status, body) = call(&app, "POST", "/users", Some(&admin), Some(new_user)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate");

    let kofi = login(&app, "kofi", "pa55").await;
    let (status, _) = call(&app, "GET", "/users", Some(&kofi), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, "GET", "/items", Some(&kofi), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "DELETE", "/users/admin", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "DELETE", "/users/kofi", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", "/items", Some(&kofi), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, users) = call(&app, "GET", "/users", Some(&admin), None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn csv_backed_services_persist_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let open = || {
        let store = AppStore::Csv(CsvRecordStore::open(dir.path()).unwrap());
        build_app(Arc::new(AppServices::open(store, ADMIN_PASSWORD, 2).unwrap()))
    };

    let id = {
        let app = open();
        let token = login(&app, "admin", ADMIN_PASSWORD).await;
        let id = create_item(&app, &token, "Ethanol", 0, 2).await;
        call(
            &app,
            "POST",
            &format!("/items/{id}/receive"),
            Some(&token),
            Some(json!({ "quantity": 12, "unit_cost": "3.50" })),
        )
        .await;
        id
    };

    let app = open();
    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (_, item) = call(&app, "GET", &format!("/items/{id}"), Some(&token), None).await;
    assert_eq!(item["quantity"], 12);
    let (_, receipts) = call(&app, "GET", "/receipts", Some(&token), None).await;
    assert_eq!(receipts[0]["total_value"], "42.00");
}
