#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use dealer_events::{ChangeFeed, EventBus, EventSink, FeedStatus, RealtimeFanout, ReconnectConfig};
use dealer_inventory::memory::InMemoryInventory;
use http_body_util::BodyExt;
use tower::ServiceExt;

use dealer_api::config::ServerConfig;
use dealer_api::router::build_app_router;
use dealer_api::state::AppState;
use dealer_api::ws::WsManager;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        realtime_initial_delay_ms: 10,
        realtime_max_delay_secs: 1,
    }
}

/// The router plus the pieces tests poke at directly.
pub struct TestApp {
    pub router: Router,
    pub backend: Arc<InMemoryInventory>,
    pub state: AppState,
    pub fanout: RealtimeFanout,
}

impl TestApp {
    /// A fresh router to send one request through.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub async fn shutdown(mut self) {
        self.fanout.stop().await;
        self.state.board.shutdown().await;
    }
}

/// Build the full application over an in-memory backend, with the realtime
/// fan-out running against the backend's own change feed.
pub async fn build_test_app() -> TestApp {
    let config = test_config();
    let backend = Arc::new(InMemoryInventory::new());
    let event_bus = Arc::new(EventBus::default());

    let mut fanout = RealtimeFanout::new(
        Arc::clone(&backend) as Arc<dyn ChangeFeed>,
        Arc::clone(&event_bus) as Arc<dyn EventSink>,
        config.reconnect(),
    );
    fanout.start().unwrap();
    fanout
        .status()
        .wait_for(|s| *s == FeedStatus::Connected)
        .await
        .unwrap();

    let state = AppState::new(
        backend.clone(),
        event_bus,
        fanout.status(),
        Arc::new(WsManager::new()),
        config.clone(),
    );
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        backend,
        state,
        fanout,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
