use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use turnover_core::{CoreError, PredictionOutcome};
use turnover_domain::PredictionRecord;

use super::security::RequestId;
use super::state::AppState;
use crate::errors::ApiError;

/// Ejecuta trabajo bloqueante (Diesel, scoring) fuera del runtime async.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
    where F: FnOnce() -> Result<T, CoreError> + Send + 'static,
          T: Send + 'static
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "alive": true }))
}

pub async fn ready(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let svc = state.service.clone();
    let readiness = blocking(move || Ok(svc.readiness())).await?;
    let model = state.service.model();
    let body = json!({
        "ready": readiness.is_ready(),
        "database": readiness.database,
        "model": readiness.model,
        "model_version": model.map(|m| m.version().to_string()),
        "artifact_digest": model.and_then(|m| m.digest().map(str::to_string)),
    });
    let status = if readiness.is_ready() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    Ok((status, Json(body)))
}

pub async fn predict_by_id(State(state): State<Arc<AppState>>,
                           Extension(RequestId(request_id)): Extension<RequestId>,
                           employee_id: Result<Path<i64>, PathRejection>)
                           -> Result<Json<PredictionOutcome>, ApiError> {
    let Path(employee_id) = employee_id?;
    tracing::debug!(%request_id, employee_id, "predict by id");
    let svc = state.service.clone();
    let outcome = blocking(move || svc.predict_by_id(employee_id)).await?;
    Ok(Json(outcome))
}

pub async fn predict_by_features(State(state): State<Arc<AppState>>,
                                 Extension(RequestId(request_id)): Extension<RequestId>,
                                 body: Result<Json<Map<String, Value>>, JsonRejection>)
                                 -> Result<Json<PredictionOutcome>, ApiError> {
    let Json(features) = body?;
    tracing::debug!(%request_id, n_features = features.len(), "predict by features");
    let svc = state.service.clone();
    let outcome = blocking(move || svc.predict_by_features(&features)).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct LatestParams {
    pub limit: Option<i64>,
}

pub async fn latest_predictions(State(state): State<Arc<AppState>>,
                                params: Result<Query<LatestParams>, QueryRejection>)
                                -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    let Query(params) = params?;
    // negativos y 0 se llevan al mínimo (1) dentro del servicio
    let limit = params.limit.map(|l| usize::try_from(l.max(0)).unwrap_or(usize::MAX));
    let svc = state.service.clone();
    let records = blocking(move || svc.latest(limit)).await?;
    Ok(Json(records))
}
