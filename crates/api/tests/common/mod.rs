//! Shared harness for HTTP-level integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use clubstay_api::auth::jwt::{generate_access_token, JwtConfig};
use clubstay_api::config::ServerConfig;
use clubstay_api::router::build_app_router;
use clubstay_api::state::AppState;
use clubstay_core::booking::BookingType;
use clubstay_core::roles::{ROLE_ADMIN, ROLE_MEMBER};
use clubstay_db::models::resource::{CreateResource, Resource};
use clubstay_db::repositories::ResourceRepo;
use clubstay_events::{BookingNotifier, Notification, NotificationDispatch, NotifyError};

pub const ADMIN_ID: i64 = 1;
pub const MEMBER_ID: i64 = 42;
pub const OTHER_MEMBER_ID: i64 = 43;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 1,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

// ---------------------------------------------------------------------------
// Recording notifier
// ---------------------------------------------------------------------------

/// Captures every delivered notification for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// `(event_type, booking_id)` of everything delivered so far.
    pub fn events(&self) -> Vec<(&'static str, i64)> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|n| (n.kind.event_type(), n.booking.booking_id))
            .collect()
    }

    /// Wait until at least `count` notifications arrived (deliveries are spawned).
    pub async fn wait_for(&self, count: usize) -> Vec<(&'static str, i64)> {
        for _ in 0..100 {
            if self.delivered.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.events()
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub notifier: Arc<RecordingNotifier>,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn token(&self, user_id: i64, role: &str) -> String {
        generate_access_token(user_id, role, &self.config.jwt).unwrap()
    }

    pub fn admin(&self) -> String {
        self.token(ADMIN_ID, ROLE_ADMIN)
    }

    pub fn member(&self) -> String {
        self.token(MEMBER_ID, ROLE_MEMBER)
    }
}

/// Build the full application router with all middleware layers and a
/// recording notifier.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        notifications: NotificationDispatch::new(notifier.clone()),
    };
    TestApp {
        router: build_app_router(state, &config),
        pool,
        notifier,
        config,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_room(pool: &PgPool, label: &str, category: &str, rates: (i64, i64)) -> Resource {
    ResourceRepo::create(
        pool,
        &CreateResource {
            kind: BookingType::Room,
            label: label.to_string(),
            category: category.to_string(),
            site: "SPORTI-1".to_string(),
            floor: Some("First Floor".to_string()),
            capacity: None,
            self_rate: rates.0,
            guest_rate: rates.1,
            facilities: Some(vec!["AC".to_string()]),
            description: None,
        },
    )
    .await
    .unwrap()
}

pub async fn create_service(pool: &PgPool, label: &str, capacity: i32) -> Resource {
    ResourceRepo::create(
        pool,
        &CreateResource {
            kind: BookingType::Service,
            label: label.to_string(),
            category: "Conference Room".to_string(),
            site: "SPORTI-1".to_string(),
            floor: None,
            capacity: Some(capacity),
            self_rate: 5000,
            guest_rate: 7000,
            facilities: None,
            description: None,
        },
    )
    .await
    .unwrap()
}

pub fn occupant() -> Value {
    json!({
        "name": "Asha Rao",
        "phone": "9876543210",
        "gender": "Female",
        "location": "Pune",
        "email": "asha@example.org"
    })
}

pub fn sponsor() -> Value {
    json!({
        "name": "Col. Mehta",
        "phone": "9123456780",
        "designation": "Commandant",
        "gender": "Male",
        "email": "mehta@example.org"
    })
}

/// Room booking body for the Standard category at SPORTI-1.
pub fn room_request(
    resource_id: Option<i64>,
    check_in: &str,
    check_out: &str,
    category: &str,
    relation: &str,
) -> Value {
    json!({
        "resource_id": resource_id,
        "site": "SPORTI-1",
        "category": "Standard",
        "check_in": check_in,
        "check_out": check_out,
        "occupant_category": category,
        "relation": relation,
        "occupant": occupant(),
        "sponsor": sponsor()
    })
}

pub async fn occupancy(pool: &PgPool, resource_id: i64) -> Resource {
    ResourceRepo::find_by_id(pool, resource_id).await.unwrap().unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, "GET", uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "GET", uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, "POST", uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, "POST", uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "POST", uri, Some(token), None).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, "PUT", uri, Some(token), Some(body)).await
}

pub async fn put_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, "PUT", uri, Some(token), None).await
}

/// Assert the status and return the `data` member of the envelope.
pub async fn expect_data(response: Response<Body>, status: StatusCode) -> Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json["data"].clone()
}

/// Assert the status and return the error `code`.
pub async fn expect_error(response: Response<Body>, status: StatusCode) -> String {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json["code"].as_str().unwrap_or_default().to_string()
}
