#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use bms_api::{AppState, create_app};
use bms_auth::{AuthService, SessionManager};
use bms_config::{ChillerSeed, VarsConfig};
use bms_control::ChillerAdapter;
use bms_protocol::mock::{MockDevice, MockTransport};
use bms_protocol::{ClientConfig, VarTableClient};
use bms_scheduler::{SchedulerConfig, TimerScheduler};
use bms_storage::InMemoryStore;
use domain::{Role, SessionContext};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const IP: &str = "10.0.0.5";
pub const OFFLINE_IP: &str = "10.0.0.99";

pub struct TestApp {
    pub app: Router,
    pub mock: Arc<MockTransport>,
    pub store: Arc<InMemoryStore>,
    pub auth: Arc<AuthService>,
}

pub fn spawn_app(device: MockDevice) -> TestApp {
    spawn_app_with_seeds(device, Vec::new())
}

pub fn spawn_app_with_seeds(device: MockDevice, seeds: Vec<ChillerSeed>) -> TestApp {
    let mock = Arc::new(
        MockTransport::new()
            .with_device(IP, device)
            .with_device(OFFLINE_IP, MockDevice::new().unreachable()),
    );
    let store = Arc::new(InMemoryStore::new());
    let auth = Arc::new(AuthService::new(
        store.clone(),
        SessionManager::new("test-secret".to_string(), 3600),
    ));
    let client = Arc::new(VarTableClient::new(mock.clone(), ClientConfig::default()));
    let controller = Arc::new(ChillerAdapter::new(client));
    let vars = Arc::new(VarsConfig::default());
    let scheduler = Arc::new(TimerScheduler::new(
        store.clone(),
        store.clone(),
        controller.clone(),
        vars.clone(),
        SchedulerConfig::default(),
    ));
    let state = AppState {
        auth: auth.clone(),
        chillers: store.clone(),
        power_logs: store.clone(),
        scheduler,
        controller,
        vars,
        chiller_seeds: Arc::new(seeds),
    };
    TestApp {
        app: create_app(state),
        mock,
        store,
        auth,
    }
}

impl TestApp {
    pub fn token(&self, role: Role) -> String {
        let ctx = SessionContext::new(role.as_str(), role);
        self.auth.sessions().issue(&ctx).unwrap().token
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let (status, _, body) = self.send("GET", uri, token, None).await;
        (status, body)
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send("POST", uri, token, Some(body.to_string())).await;
        (status, body)
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send("PUT", uri, token, Some(body.to_string())).await;
        (status, body)
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let (status, _, body) = self.send("DELETE", uri, token, None).await;
        (status, body)
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }
}
