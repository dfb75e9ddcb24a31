use api_contract::{ErrorResponse, OkResponse, ReachabilityResponse};

#[test]
fn ok_response_shape() {
    let value = serde_json::to_value(OkResponse::new()).expect("serialize");
    assert_eq!(value, serde_json::json!({ "ok": true }));
}

#[test]
fn error_response_shape() {
    let value = serde_json::to_value(ErrorResponse::new("forbidden")).expect("serialize");
    assert_eq!(value, serde_json::json!({ "ok": false, "error": "forbidden" }));
}

#[test]
fn reachability_omits_missing_error() {
    let value = serde_json::to_value(ReachabilityResponse {
        reachable: true,
        error: None,
    })
    .expect("serialize");
    assert_eq!(value, serde_json::json!({ "reachable": true }));
}
