mod common;

use axum::http::StatusCode;
use bms_protocol::mock::MockDevice;
use bms_storage::{NewPowerLog, PowerLogStore};
use chrono::{Duration, Utc};
use common::spawn_app;
use domain::{PowerAction, Role};
use serde_json::json;

#[tokio::test]
async fn viewer_cannot_read_or_append() {
    let app = spawn_app(MockDevice::new());
    let viewer = app.token(Role::Viewer);

    let (status, _) = app.get("/api/power-log", Some(&viewer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post("/api/power-log", Some(&viewer), json!({ "unitName": "CH-1", "action": "on" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/power-log/sessions", Some(&viewer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn appended_entries_are_listed_newest_first() {
    let app = spawn_app(MockDevice::new());
    let token = app.token(Role::Manager);

    let (status, body) = app
        .post("/api/power-log", Some(&token), json!({ "unitName": "CH-1", "action": "stop" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    app.post(
        "/api/power-log",
        Some(&token),
        json!({ "unitName": "CH-1", "action": "on", "user": "manager" }),
    )
    .await;

    let (status, body) = app.get("/api/power-log", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["action"], "on");
    assert_eq!(items[0]["user"], "manager");
    assert_eq!(items[1]["action"], "off");
    assert!(items[1].get("user").is_none());

    let (status, body) = app
        .post("/api/power-log", Some(&token), json!({ "unitName": "CH-1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn sessions_are_derived_from_the_log() {
    let app = spawn_app(MockDevice::new());
    let now = Utc::now();
    for (action, hours_ago) in [(PowerAction::On, 3), (PowerAction::Off, 1)] {
        app.store
            .append_power_log(NewPowerLog {
                unit_name: "CH-1".to_string(),
                action,
                at: now - Duration::hours(hours_ago),
                user: None,
            })
            .await
            .unwrap();
    }

    let (status, body) = app
        .get("/api/power-log/sessions", Some(&app.token(Role::Admin)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["state"], "off");
    assert_eq!(items[0]["endAt"], serde_json::Value::Null);
    assert!(items[0]["durationMs"].as_i64().unwrap() >= 3_600_000);

    assert_eq!(items[1]["state"], "on");
    assert_eq!(items[1]["unitName"], "CH-1");
    assert_eq!(items[1]["durationMs"], 7_200_000);
}
