use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::routine::RoutineEntry;
use crate::routines::scoring::compute_solver_score;
use crate::routines::validation::{parse_create_request, require_user_id_param};
use crate::state::AppState;

/// 200 response carrying the CORS headers the dashboard relies on.
fn ok_json<T: Serialize>(payload: T) -> Response {
    (
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
        ],
        Json(payload),
    )
        .into_response()
}

/// POST /routines
pub async fn handle_create_routine(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let req = parse_create_request(&body)?;
    let solver_score = compute_solver_score(req.mood, req.productivity, req.duration)?;

    let now = state.clock.now();
    let entry = RoutineEntry {
        user_id: req.user_id,
        timestamp: now.timestamp(),
        routine_id: Uuid::new_v4().to_string(),
        date: req
            .date
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
        duration: req.duration,
        mood: req.mood,
        productivity: req.productivity,
        activities: req.activities,
        solver_score,
    };

    state.store.put(&entry).await?;
    info!(
        user_id = %entry.user_id,
        routine_id = %entry.routine_id,
        solver_score,
        "Routine recorded"
    );

    Ok(ok_json(entry))
}

/// GET /routines?userId=...
pub async fn handle_list_routines(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let user_id = require_user_id_param(params.get("userId"))?;
    let entries = state.store.query_by_user(user_id, true).await?;
    info!(user_id, count = entries.len(), "Routines listed");
    Ok(ok_json(entries))
}
