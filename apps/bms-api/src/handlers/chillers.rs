//! 机组清单 handlers
//!
//! - `GET /chillers`：任意已登录角色，仅返回启用的机组；清单中没有启用的机组时，
//!   先用 dashboard 配置中的机组初始化
//! - `GET /chillers/:id`：任意已登录角色，包括已停用的机组
//! - `POST /chillers`、`PUT /chillers/:id`、`DELETE /chillers/:id`：仅 admin，删除为软删除

use crate::AppState;
use crate::middleware::{require_admin, require_session};
use crate::utils::response::{bad_request_error, chiller_to_dto, not_found_error, storage_error};
use api_contract::{
    ChillerItemResponse, ChillerListResponse, CreateChillerRequest, UpdateChillerRequest,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bms_config::ChillerSeed;
use bms_storage::{ChillerRecord, ChillerUpdate, NewChiller, StorageError};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub async fn list_chillers(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let items = match active_or_seeded(&state).await {
        Ok(items) => items,
        Err(err) => return storage_error(err),
    };
    Json(ChillerListResponse {
        items: items.into_iter().map(chiller_to_dto).collect(),
    })
    .into_response()
}

/// 启用的机组；为空时写入配置种子后重新读取。
async fn active_or_seeded(state: &AppState) -> Result<Vec<ChillerRecord>, StorageError> {
    let active = state.chillers.list_chillers(false).await?;
    if !active.is_empty() || state.chiller_seeds.is_empty() {
        return Ok(active);
    }
    seed_chillers(state).await?;
    state.chillers.list_chillers(false).await
}

async fn seed_chillers(state: &AppState) -> Result<(), StorageError> {
    let now = Utc::now();
    let mut inserted = 0usize;
    for (idx, seed) in state.chiller_seeds.iter().enumerate() {
        let id = seed_id(seed, idx);
        // 已写入过的种子（包括被停用的）保持原样。
        if state.chillers.find_chiller(&id).await?.is_some() {
            continue;
        }
        state
            .chillers
            .upsert_chiller(ChillerRecord {
                id,
                name: seed.name.clone(),
                ip: seed.ip.clone(),
                active: seed.active,
                created_at: Some(now),
                updated_at: Some(now),
            })
            .await?;
        inserted += 1;
    }
    if inserted > 0 {
        info!(target: "bms.api", count = inserted, "chillers_seeded");
    }
    Ok(())
}

/// 配置中没有 id 的种子按名称、IP 与位置生成稳定 id，重复初始化时命中同一条记录。
fn seed_id(seed: &ChillerSeed, idx: usize) -> String {
    if let Some(id) = &seed.id {
        return id.clone();
    }
    let name = format!("{}|{}|{idx}", seed.name, seed.ip);
    format!(
        "{}_{idx}",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).simple()
    )
}

pub async fn get_chiller(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    match state.chillers.find_chiller(&id).await {
        Ok(Some(record)) => Json(serde_json::json!({ "item": chiller_to_dto(record) })).into_response(),
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

pub async fn create_chiller(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateChillerRequest>, JsonRejection>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let Ok(Json(req)) = body else {
        return bad_request_error("bad_request");
    };
    let new = NewChiller {
        name: req.name,
        ip: req.ip,
        active: req.active,
    };
    match state.chillers.create_chiller(new).await {
        Ok(record) => {
            info!(target: "bms.api", chiller_id = %record.id, ip = %record.ip, "chiller_created");
            item_response(record)
        }
        Err(err) => storage_error(err),
    }
}

pub async fn update_chiller(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateChillerRequest>, JsonRejection>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let Ok(Json(req)) = body else {
        return bad_request_error("bad_request");
    };
    let update = ChillerUpdate {
        name: req.name,
        ip: req.ip,
        active: req.active,
    };
    match state.chillers.update_chiller(&id, update).await {
        Ok(Some(record)) => {
            info!(target: "bms.api", chiller_id = %record.id, "chiller_updated");
            item_response(record)
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

pub async fn delete_chiller(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    match state.chillers.deactivate_chiller(&id).await {
        Ok(Some(record)) => {
            info!(target: "bms.api", chiller_id = %record.id, "chiller_deactivated");
            item_response(record)
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

fn item_response(record: ChillerRecord) -> Response {
    Json(ChillerItemResponse {
        ok: true,
        item: chiller_to_dto(record),
    })
    .into_response()
}
