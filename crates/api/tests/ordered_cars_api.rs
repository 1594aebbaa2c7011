//! HTTP tests for pending arrivals.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;

#[tokio::test]
async fn create_and_list_pending_orders() {
    let app = common::build_test_app().await;

    let response = post_json(
        app.app(),
        "/api/v1/ordered-cars",
        json!({
            "vin": "ord100",
            "model": "Model Y",
            "color": "Blue",
            "category": "SUV",
            "client_name": "Jordan"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["vin"], "ORD100");
    assert!(created["data"]["received_at"].is_null());

    let json = body_json(get(app.app(), "/api/v1/ordered-cars").await).await;
    let pending = json["data"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["client_name"], "Jordan");

    app.shutdown().await;
}

#[tokio::test]
async fn receive_creates_car_on_destination() {
    let app = common::build_test_app().await;
    let order = app.backend.seed_order("ORD200", "Model X");

    let response = post_json(
        app.app(),
        &format!("/api/v1/ordered-cars/{}/receive", order.id),
        json!({ "destination_floor": "CAR_INVENTORY" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let car = body_json(response).await;
    assert_eq!(car["data"]["vin"], "ORD200");
    assert_eq!(car["data"]["current_floor"], "CAR_INVENTORY");

    let inventory = body_json(get(app.app(), "/api/v1/floors/CAR_INVENTORY/cars?refresh=true").await).await;
    assert_eq!(inventory["data"]["cars"][0]["vin"], "ORD200");

    let pending = body_json(get(app.app(), "/api/v1/ordered-cars").await).await;
    assert!(pending["data"].as_array().unwrap().is_empty());

    app.shutdown().await;
}

#[tokio::test]
async fn receive_onto_schedule_is_rejected() {
    let app = common::build_test_app().await;
    let order = app.backend.seed_order("ORD300", "Model 3");

    let response = post_json(
        app.app(),
        &format!("/api/v1/ordered-cars/{}/receive", order.id),
        json!({ "destination_floor": "SCHEDULE" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.backend.write_calls(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn receiving_twice_returns_409() {
    let app = common::build_test_app().await;
    let order = app.backend.seed_order("ORD400", "Model S");
    let uri = format!("/api/v1/ordered-cars/{}/receive", order.id);

    let first = post_json(app.app(), &uri, json!({ "destination_floor": "SHOWROOM_1" })).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app.app(), &uri, json!({ "destination_floor": "SHOWROOM_2" })).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    app.shutdown().await;
}

#[tokio::test]
async fn receiving_unknown_order_returns_404() {
    let app = common::build_test_app().await;

    let response = post_json(
        app.app(),
        "/api/v1/ordered-cars/777/receive",
        json!({ "destination_floor": "GARAGE_INVENTORY" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.shutdown().await;
}
