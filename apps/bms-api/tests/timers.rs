mod common;

use axum::http::StatusCode;
use bms_protocol::mock::MockDevice;
use common::{IP, spawn_app};
use domain::Role;
use serde_json::{Value, json};

fn timer_body(hours: Value, target_at: &str) -> Value {
    json!({
        "chillerName": "CH-1",
        "chillerIp": IP,
        "mode": "on",
        "hours": hours,
        "targetAt": target_at
    })
}

#[tokio::test]
async fn create_then_read_back_by_either_query_name() {
    let app = spawn_app(MockDevice::new());
    let manager = app.token(Role::Manager);
    let viewer = app.token(Role::Viewer);

    let (status, body) = app
        .post("/api/timers", Some(&manager), timer_body(json!(1.5), "2030-01-01T08:00"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["item"]["targetAt"], "2030-01-01T08:00:00.000Z");
    assert_eq!(body["item"]["mode"], "on");
    assert_eq!(body["item"]["hours"], 1.5);
    assert_eq!(body["item"]["active"], true);
    let id = body["item"]["id"].clone();

    let (status, body) = app
        .get(&format!("/api/timers?chillerIp={IP}"), Some(&viewer))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["id"], id);

    let (_, body) = app.get(&format!("/timers?ip={IP}"), Some(&viewer)).await;
    assert_eq!(body["item"]["id"], id);
    assert_eq!(body["item"]["chillerName"], "CH-1");
}

#[tokio::test]
async fn no_active_timer_is_null() {
    let app = spawn_app(MockDevice::new());
    let token = app.token(Role::Viewer);

    let (status, body) = app.get("/api/timers?chillerIp=10.9.9.9", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "item": null }));

    let (status, body) = app.get("/api/timers", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn invalid_timer_requests() {
    let app = spawn_app(MockDevice::new());
    let token = app.token(Role::Admin);

    let (status, body) = app
        .post("/api/timers", Some(&token), timer_body(json!(0), "2030-01-01T08:00"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_hours");

    let (_, body) = app
        .post("/api/timers", Some(&token), timer_body(json!(-2), "2030-01-01T08:00"))
        .await;
    assert_eq!(body["error"], "invalid_hours");

    let (status, body) = app
        .post("/api/timers", Some(&token), timer_body(json!(1), "after lunch"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_target");

    let (status, body) = app
        .post("/api/timers", Some(&token), timer_body(json!("2"), "2030-01-01T08:00"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (_, body) = app.get(&format!("/api/timers?chillerIp={IP}"), Some(&token)).await;
    assert_eq!(body["item"], Value::Null);
}

#[tokio::test]
async fn viewer_cannot_schedule_or_cancel() {
    let app = spawn_app(MockDevice::new());
    let viewer = app.token(Role::Viewer);

    let (status, _) = app
        .post("/api/timers", Some(&viewer), timer_body(json!(1), "2030-01-01T08:00"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .delete(&format!("/api/timers?chillerIp={IP}"), Some(&viewer))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/api/timers?chillerIp={IP}"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_cancels_active_timer() {
    let app = spawn_app(MockDevice::new());
    let token = app.token(Role::Manager);
    app.post("/api/timers", Some(&token), timer_body(json!(2), "2030-01-01T08:00:00Z"))
        .await;

    let (status, body) = app
        .delete(&format!("/api/timers?chillerIp={IP}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (_, body) = app.get(&format!("/api/timers?chillerIp={IP}"), Some(&token)).await;
    assert_eq!(body["item"], Value::Null);
    assert_eq!(app.mock.request_count(), 0);
}
