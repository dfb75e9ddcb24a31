use api_contract::{
    ChillerControlRequest, ChillerStatusResponse, CreateTimerRequest, LoginResponse, TimerQuery,
};
use serde_json::Value;

#[test]
fn login_response_is_camel_case() {
    let response = LoginResponse {
        ok: true,
        role: "admin".to_string(),
        token: "token".to_string(),
        expires_at: 1_700_000_000_000,
    };
    let value = serde_json::to_value(response).expect("serialize");
    assert!(value.get("expiresAt").is_some());
    assert!(value.get("expires_at").is_none());
}

#[test]
fn status_response_is_camel_case() {
    let response = ChillerStatusResponse {
        ok: true,
        power: true,
        temp_current: Some(12.5),
        temp_return: None,
        setpoint: Some(21.0),
        fan_speed: 40.0,
        alarm_active: false,
        mode: Some("comfort".to_string()),
    };
    let value = serde_json::to_value(response).expect("serialize");
    assert_eq!(value["tempCurrent"], Value::from(12.5));
    assert_eq!(value["tempReturn"], Value::Null);
    assert!(value.get("fanSpeed").is_some());
    assert!(value.get("alarmActive").is_some());
}

#[test]
fn control_request_keeps_raw_values() {
    let payload = r#"{"ip":"10.0.0.5","kind":"setpoint","value":"21.5"}"#;
    let req: ChillerControlRequest = serde_json::from_str(payload).expect("parse");
    assert_eq!(req.kind.as_deref(), Some("setpoint"));
    assert_eq!(req.value, Some(Value::from("21.5")));
    assert!(req.target.is_none());
}

#[test]
fn create_timer_request_rejects_string_hours() {
    let payload = r#"{"chillerName":"CH-1","chillerIp":"10.0.0.5","mode":"on","hours":"2","targetAt":"2024-01-01T00:00:00Z"}"#;
    assert!(serde_json::from_str::<CreateTimerRequest>(payload).is_err());
}

#[test]
fn timer_query_accepts_ip_alias() {
    let query = TimerQuery {
        chiller_ip: None,
        ip: Some(" 10.0.0.5 ".to_string()),
    };
    assert_eq!(query.resolved_ip(), Some("10.0.0.5"));
    assert_eq!(TimerQuery::default().resolved_ip(), None);
}
