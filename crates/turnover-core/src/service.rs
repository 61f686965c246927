//! Servicio de predicción: adquiere features, puntúa y registra.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use turnover_domain::{NewPrediction, NewPredictionRequest, PredictedClass, PredictionRecord, RequestPayload};

use crate::errors::CoreError;
use crate::model::TurnoverModel;
use crate::store::{FeatureStore, PredictionLog};

pub const DEFAULT_LATEST_LIMIT: usize = 20;
pub const MAX_LATEST_LIMIT: usize = 500;

/// Limita `limit` a `1..=MAX_LATEST_LIMIT`; `None` → `DEFAULT_LATEST_LIMIT`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LATEST_LIMIT).clamp(1, MAX_LATEST_LIMIT)
}

/// Resultado devuelto al cliente tras una predicción registrada.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub predicted_class: PredictedClass,
    pub predicted_probability: f64,
    pub model_version: String,
    pub latency_ms: i32,
    pub employee_id: Option<i64>,
    pub threshold_used: f64,
    pub request_id: i64,
    pub prediction_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub database: bool,
    pub model: bool,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.database && self.model
    }
}

#[derive(Clone)]
pub struct PredictionService {
    features: Arc<dyn FeatureStore>,
    log: Arc<dyn PredictionLog>,
    model: Option<Arc<TurnoverModel>>,
}

impl PredictionService {
    /// `model = None` arranca el servicio en modo degradado: las predicciones
    /// devuelven `Unavailable` y la readiness queda en falso.
    pub fn new(features: Arc<dyn FeatureStore>, log: Arc<dyn PredictionLog>, model: Option<Arc<TurnoverModel>>) -> Self {
        Self { features, log, model }
    }

    pub fn model(&self) -> Option<&Arc<TurnoverModel>> {
        self.model.as_ref()
    }

    fn loaded_model(&self) -> Result<&TurnoverModel, CoreError> {
        self.model.as_deref().ok_or_else(|| CoreError::Unavailable("modelo no cargado".into()))
    }

    /// Predicción a partir de la última fila de features preparadas del empleado.
    pub fn predict_by_id(&self, employee_id: i64) -> Result<PredictionOutcome, CoreError> {
        let model = self.loaded_model()?;
        let started = Instant::now();

        if self.features.find_employee(employee_id)?.is_none() {
            return Err(CoreError::NotFound(format!("employee {employee_id}")));
        }
        let row = self.features
                      .latest_features(employee_id, model.schema())?
                      .ok_or_else(|| CoreError::NotFound(format!("sin features preparadas para employee {employee_id}")))?;
        let features = model.schema().validate(&row).map_err(|e| {
                           CoreError::Internal(format!("features almacenadas de employee {employee_id} no cumplen el contrato: {e}"))
                       })?;

        self.score_and_record(model, RequestPayload::ByEmployeeId { employee_id, features }, started)
    }

    /// Predicción a partir de un objeto JSON de features enviado por el cliente.
    pub fn predict_by_features(&self, input: &Map<String, Value>) -> Result<PredictionOutcome, CoreError> {
        let model = self.loaded_model()?;
        let started = Instant::now();
        let payload = model.validate_payload(input)?;
        self.score_and_record(model, RequestPayload::ByFeatures { payload }, started)
    }

    fn score_and_record(&self,
                        model: &TurnoverModel,
                        payload: RequestPayload,
                        started: Instant)
                        -> Result<PredictionOutcome, CoreError> {
        let score = model.score(payload.features())?;
        // latencia = adquisición de features + scoring; excluye la escritura del log
        let latency_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);

        let request = NewPredictionRequest::from_payload(&payload)?;
        let prediction = NewPrediction { model_version: model.version().to_string(),
                                         predicted_class: score.predicted_class,
                                         predicted_probability: score.predicted_probability,
                                         threshold_used: score.threshold_used,
                                         latency_ms: Some(latency_ms) };
        let (req, pred) = self.log.record(request, prediction)?;
        info!("prediction {} (request {}) class={} p={:.4} latency={}ms",
              pred.id,
              req.id,
              pred.predicted_class.as_i32(),
              pred.predicted_probability,
              latency_ms);

        Ok(PredictionOutcome { predicted_class: pred.predicted_class,
                               predicted_probability: pred.predicted_probability,
                               model_version: pred.model_version,
                               latency_ms,
                               employee_id: req.employee_id,
                               threshold_used: pred.threshold_used,
                               request_id: req.id,
                               prediction_id: pred.id })
    }

    pub fn latest(&self, limit: Option<usize>) -> Result<Vec<PredictionRecord>, CoreError> {
        let limit = clamp_limit(limit);
        debug!("latest predictions limit={limit}");
        Ok(self.log.latest(limit)?)
    }

    /// La base de datos se considera lista sólo si responden el log y la tabla
    /// de features preparadas.
    pub fn readiness(&self) -> Readiness {
        let log_ok = self.log.ping().map_err(|e| warn!("readiness: log de predicciones: {e}")).is_ok();
        let features_ok = self.features.ping().map_err(|e| warn!("readiness: features: {e}")).is_ok();
        Readiness { database: log_ok && features_ok, model: self.model.is_some() }
    }
}
