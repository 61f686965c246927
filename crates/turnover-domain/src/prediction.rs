//! Registros del log de predicciones.
//!
//! Cada llamada de predicción produce exactamente un `PredictionRequest` y un
//! `Prediction` enlazados por `request_id`. Ambos son inmutables una vez
//! escritos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::DomainError;
use crate::feature::FeatureVector;

/// Clase binaria predicha: 1 = salida prevista, 0 = permanencia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictedClass {
    Stays,
    Leaves,
}

impl PredictedClass {
    pub fn as_i32(self) -> i32 {
        match self {
            PredictedClass::Stays => 0,
            PredictedClass::Leaves => 1,
        }
    }
}

impl TryFrom<i32> for PredictedClass {
    type Error = DomainError;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(PredictedClass::Stays),
            1 => Ok(PredictedClass::Leaves),
            other => Err(DomainError::Validation(format!("clase binaria inválida: {other}"))),
        }
    }
}

impl Serialize for PredictedClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for PredictedClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i32::deserialize(deserializer)?;
        PredictedClass::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Umbral de decisión en `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(DomainError::Validation(format!("umbral fuera de [0, 1]: {value}")));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// clase = 1 sii probabilidad >= umbral.
    pub fn classify(self, probability: f64) -> PredictedClass {
        if probability >= self.0 {
            PredictedClass::Leaves
        } else {
            PredictedClass::Stays
        }
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Threshold::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Contenido persistido en `payload_json` de cada request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RequestPayload {
    ByEmployeeId { employee_id: i64, features: FeatureVector },
    ByFeatures { payload: FeatureVector },
}

impl RequestPayload {
    pub fn employee_id(&self) -> Option<i64> {
        match self {
            RequestPayload::ByEmployeeId { employee_id, .. } => Some(*employee_id),
            RequestPayload::ByFeatures { .. } => None,
        }
    }

    pub fn features(&self) -> &FeatureVector {
        match self {
            RequestPayload::ByEmployeeId { features, .. } => features,
            RequestPayload::ByFeatures { payload } => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPredictionRequest {
    pub employee_id: Option<i64>,
    pub payload: Value,
}

impl NewPredictionRequest {
    pub fn from_payload(payload: &RequestPayload) -> Result<Self, DomainError> {
        Ok(Self { employee_id: payload.employee_id(), payload: serde_json::to_value(payload)? })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub id: i64,
    pub employee_id: Option<i64>,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub model_version: String,
    pub predicted_class: PredictedClass,
    pub predicted_probability: f64,
    pub threshold_used: f64,
    pub latency_ms: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    pub request_id: i64,
    pub model_version: String,
    pub predicted_class: PredictedClass,
    pub predicted_probability: f64,
    pub threshold_used: f64,
    pub latency_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Vista unida prediction + request expuesta por `/predictions/latest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub prediction_id: i64,
    pub request_id: i64,
    pub employee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub predicted_class: PredictedClass,
    pub predicted_probability: f64,
    pub threshold_used: f64,
    pub model_version: String,
    pub latency_ms: Option<i32>,
    pub payload: Value,
}

impl PredictionRecord {
    pub fn from_parts(prediction: &Prediction, request: &PredictionRequest) -> Self {
        Self { prediction_id: prediction.id,
               request_id: request.id,
               employee_id: request.employee_id,
               created_at: prediction.created_at,
               predicted_class: prediction.predicted_class,
               // 4 decimales, igual que el listado histórico del dashboard
               predicted_probability: (prediction.predicted_probability * 10_000.0).round() / 10_000.0,
               threshold_used: prediction.threshold_used,
               model_version: prediction.model_version.clone(),
               latency_ms: prediction.latency_ms,
               payload: request.payload.clone() }
    }
}
