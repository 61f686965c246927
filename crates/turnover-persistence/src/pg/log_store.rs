use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use serde_json::Value;
use turnover_core::{PredictionLog, StoreError};
use turnover_domain::{NewPrediction, NewPredictionRequest, PredictedClass, Prediction, PredictionRecord,
                      PredictionRequest};

use super::{ping, with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{prediction_requests, predictions};

#[derive(Insertable, Debug)]
#[diesel(table_name = prediction_requests)]
struct NewRequestRow<'a> {
    employee_id: Option<i64>,
    payload_json: &'a Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = predictions)]
struct NewPredictionRow<'a> {
    request_id: i64,
    model_version: &'a str,
    predicted_class: i32,
    predicted_proba: f64,
    threshold_used: f64,
    latency_ms: Option<i32>,
}

#[derive(Queryable, Debug)]
struct RequestRow {
    id: i64,
    employee_id: Option<i64>,
    payload_json: Value,
    created_at: DateTime<Utc>,
}

#[derive(Queryable, Debug)]
struct PredictionRow {
    id: i64,
    request_id: i64,
    model_version: String,
    predicted_class: i32,
    predicted_proba: f64,
    threshold_used: f64,
    latency_ms: Option<i32>,
    created_at: DateTime<Utc>,
}

impl From<RequestRow> for PredictionRequest {
    fn from(r: RequestRow) -> Self {
        PredictionRequest { id: r.id, employee_id: r.employee_id, payload: r.payload_json, created_at: r.created_at }
    }
}

impl TryFrom<PredictionRow> for Prediction {
    type Error = StoreError;

    fn try_from(r: PredictionRow) -> Result<Self, Self::Error> {
        let predicted_class = PredictedClass::try_from(r.predicted_class)
            .map_err(|e| StoreError::Internal(format!("prediction {}: {e}", r.id)))?;
        Ok(Prediction { id: r.id,
                        request_id: r.request_id,
                        model_version: r.model_version,
                        predicted_class,
                        predicted_probability: r.predicted_proba,
                        threshold_used: r.threshold_used,
                        latency_ms: r.latency_ms,
                        created_at: r.created_at })
    }
}

const REQUEST_COLUMNS: (prediction_requests::id,
                        prediction_requests::employee_id,
                        prediction_requests::payload_json,
                        prediction_requests::created_at) = (prediction_requests::id,
                                                            prediction_requests::employee_id,
                                                            prediction_requests::payload_json,
                                                            prediction_requests::created_at);

const PREDICTION_COLUMNS: (predictions::id,
                           predictions::request_id,
                           predictions::model_version,
                           predictions::predicted_class,
                           predictions::predicted_proba,
                           predictions::threshold_used,
                           predictions::latency_ms,
                           predictions::created_at) = (predictions::id,
                                                       predictions::request_id,
                                                       predictions::model_version,
                                                       predictions::predicted_class,
                                                       predictions::predicted_proba,
                                                       predictions::threshold_used,
                                                       predictions::latency_ms,
                                                       predictions::created_at);

/// Log de predicciones sobre `app.prediction_requests` / `app.predictions`.
pub struct PgPredictionLog<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgPredictionLog<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> PredictionLog for PgPredictionLog<P> {
    fn record(&self, request: NewPredictionRequest, prediction: NewPrediction)
              -> Result<(PredictionRequest, Prediction), StoreError> {
        // Ambas inserciones en la misma transacción: o se escriben las dos filas o ninguna.
        let (req, pred): (RequestRow, PredictionRow) = with_retry("record", || {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    let req: RequestRow = diesel::insert_into(prediction_requests::table)
                        .values(NewRequestRow { employee_id: request.employee_id, payload_json: &request.payload })
                        .returning(REQUEST_COLUMNS)
                        .get_result(tx)?;
                    let pred: PredictionRow = diesel::insert_into(predictions::table)
                        .values(NewPredictionRow { request_id: req.id,
                                                   model_version: &prediction.model_version,
                                                   predicted_class: prediction.predicted_class.as_i32(),
                                                   predicted_proba: prediction.predicted_probability,
                                                   threshold_used: prediction.threshold_used,
                                                   latency_ms: prediction.latency_ms })
                        .returning(PREDICTION_COLUMNS)
                        .get_result(tx)?;
                    Ok::<_, diesel::result::Error>((req, pred))
                })
                .map_err(PersistenceError::from)
        })?;
        debug!("record:done request_id={} prediction_id={}", req.id, pred.id);
        Ok((req.into(), pred.try_into()?))
    }

    fn latest(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<(PredictionRow, RequestRow)> = with_retry("latest", || {
            let mut conn = self.provider.connection()?;
            predictions::table.inner_join(prediction_requests::table)
                              .order((predictions::created_at.desc(), predictions::id.desc()))
                              .limit(limit)
                              .select((PREDICTION_COLUMNS, REQUEST_COLUMNS))
                              .load(&mut conn)
                              .map_err(PersistenceError::from)
        })?;
        rows.into_iter()
            .map(|(p, r)| {
                let prediction = Prediction::try_from(p)?;
                let request = PredictionRequest::from(r);
                Ok(PredictionRecord::from_parts(&prediction, &request))
            })
            .collect()
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(ping(&self.provider, "SELECT 1")?)
    }
}
