//! 机组控制：`POST /chiller-control`
//!
//! 处理顺序固定：先鉴权（admin / manager），再校验请求体，最后才访问设备。
//!
//! | kind       | 取值                               | 成功                    | 失败                  |
//! |------------|------------------------------------|-------------------------|-----------------------|
//! | `power`    | `target`（真假按前端约定）         | `{ok:true}`             | 502 `write_failed`    |
//! | `mode`     | `mode`                             | `{ok:true}`             | 502 `write_failed`    |
//! | `setpoint` | `value`，兼容 `temp` / `setpoint`  | `{ok:true, actual}`     | 400 `bad_value` / 502 `write_failed` |
//! | `status`   | -                                  | 状态快照                | 502 `unreachable`     |

use crate::AppState;
use crate::middleware::require_control;
use crate::utils::response::{bad_request_error, device_error};
use crate::utils::validation::{json_truthy, normalize_required, setpoint_value};
use api_contract::{ChillerControlRequest, ChillerStatusResponse, OkResponse, SetpointResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use tracing::info;

pub async fn chiller_control(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChillerControlRequest>, JsonRejection>,
) -> Response {
    let ctx = match require_control(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Ok(Json(req)) = body else {
        return bad_request_error("bad_request");
    };
    let (Some(ip), Some(kind)) = (
        normalize_required(req.ip.as_deref()),
        normalize_required(req.kind.as_deref()),
    ) else {
        return bad_request_error("missing_fields");
    };
    let vars = state.vars.as_ref();

    match kind.as_str() {
        "power" => {
            let on = json_truthy(req.target.as_ref());
            let ok = state.controller.set_power(&ip, vars, on).await;
            info!(target: "bms.api", ip = %ip, on, ok, username = %ctx.username, "power_command");
            written(ok)
        }
        "mode" => {
            let mode = req.mode.as_deref().unwrap_or_default();
            let ok = state.controller.set_mode(&ip, vars, mode).await;
            info!(target: "bms.api", ip = %ip, mode, ok, username = %ctx.username, "mode_command");
            written(ok)
        }
        "setpoint" => {
            let Some(value) = setpoint_value(&req) else {
                return bad_request_error("bad_value");
            };
            let outcome = state.controller.apply_setpoint(&ip, vars, value).await;
            info!(
                target: "bms.api",
                ip = %ip,
                requested = value,
                ok = outcome.ok,
                actual = ?outcome.actual,
                username = %ctx.username,
                "setpoint_command"
            );
            if !outcome.ok {
                return device_error("write_failed");
            }
            Json(SetpointResponse {
                ok: true,
                actual: outcome.actual,
            })
            .into_response()
        }
        "status" => {
            let status = state.controller.read_status(&ip, vars).await;
            if !status.ok {
                return device_error("unreachable");
            }
            Json(ChillerStatusResponse {
                ok: true,
                power: status.power,
                temp_current: status.temp_current,
                temp_return: status.temp_return,
                setpoint: status.setpoint,
                fan_speed: status.fan_speed,
                alarm_active: status.alarm_active,
                mode: status.mode,
            })
            .into_response()
        }
        _ => bad_request_error("unsupported_kind"),
    }
}

fn written(ok: bool) -> Response {
    if ok {
        Json(OkResponse::new()).into_response()
    } else {
        device_error("write_failed")
    }
}
