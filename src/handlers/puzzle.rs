use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::Quota;
use crate::error::AppError;
use crate::handlers::ClientId;
use crate::metrics::{RATE_LIMITED, REQUEST_LATENCY, REQUEST_TOTAL, SOLVES_RECORDED, STARS_RECORDED};
use crate::models::{SolveRequest, StarRequest, SuccessResponse};
use crate::state::AppState;
use crate::stats::PuzzleStats;

// Rate limit check for one endpoint, keyed on the client alone
fn check_rate_limit(
    state: &AppState,
    client: &ClientId,
    endpoint: &'static str,
    quota: Quota,
) -> Result<(), AppError> {
    REQUEST_TOTAL.with_label_values(&[endpoint]).inc();

    if !state
        .rate_limiter
        .admit(&client.0, quota.max_requests, quota.window)
    {
        RATE_LIMITED.with_label_values(&[endpoint]).inc();
        debug!(client = %client.0, endpoint, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(())
}

// A missing, unreadable or empty JSON body is "no data"
fn read_body<T: DeserializeOwned>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = payload.map_err(|_| AppError::NoData)?;

    match &value {
        Value::Object(fields) if !fields.is_empty() => {}
        _ => return Err(AppError::NoData),
    }
    serde_json::from_value(value).map_err(|_| AppError::NoData)
}

// latency covers every outcome, errors included
fn observe<T>(start_time: Instant, result: Result<T, AppError>) -> Result<Json<T>, AppError> {
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    result.map(Json)
}

pub async fn solve_handler(
    State(state): State<Arc<AppState>>,
    client: ClientId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let start_time = Instant::now();
    observe(start_time, submit_solve(&state, &client, payload))
}

fn submit_solve(
    state: &AppState,
    client: &ClientId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<SuccessResponse, AppError> {
    check_rate_limit(state, client, "solve", state.limits.solve)?;

    let request: SolveRequest = read_body(payload)?;
    debug!(code = ?request.code, user_id = ?request.user_id, "Solve submitted");

    state
        .stats
        .submit_solve(request.code(), request.time.as_ref())?;

    SOLVES_RECORDED.inc();
    Ok(SuccessResponse::ok())
}

pub async fn star_handler(
    State(state): State<Arc<AppState>>,
    client: ClientId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let start_time = Instant::now();
    observe(start_time, submit_star(&state, &client, payload))
}

fn submit_star(
    state: &AppState,
    client: &ClientId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<SuccessResponse, AppError> {
    check_rate_limit(state, client, "star", state.limits.star)?;

    let request: StarRequest = read_body(payload)?;
    debug!(code = ?request.code, user_id = ?request.user_id, "Star submitted");

    state.stats.submit_star(request.code())?;

    STARS_RECORDED.inc();
    Ok(SuccessResponse::ok())
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    client: ClientId,
    Path(code): Path<String>,
) -> Result<Json<PuzzleStats>, AppError> {
    let start_time = Instant::now();
    let result = check_rate_limit(&state, &client, "stats", state.limits.stats)
        .and_then(|()| state.stats.get_stats(&code).map_err(AppError::from));
    observe(start_time, result)
}
