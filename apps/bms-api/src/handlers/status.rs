//! 可达性探测：`GET /chiller-status?ip=`，无需认证。

use crate::AppState;
use api_contract::{ReachabilityQuery, ReachabilityResponse};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::utils::validation::normalize_required;

pub async fn chiller_status(
    State(state): State<AppState>,
    Query(query): Query<ReachabilityQuery>,
) -> Response {
    let Some(ip) = normalize_required(query.ip.as_deref()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ReachabilityResponse {
                reachable: false,
                error: Some("missing_ip".to_string()),
            }),
        )
            .into_response();
    };
    let reachable = state.controller.probe(&ip).await;
    Json(ReachabilityResponse {
        reachable,
        error: None,
    })
    .into_response()
}
