//! Puertos de almacenamiento: lectura de features preparadas y log de
//! predicciones. Las implementaciones Postgres viven en `turnover-persistence`.
mod memory;

use serde_json::{Map, Value};
use turnover_domain::{Employee, FeatureSchema, NewPrediction, NewPredictionRequest, Prediction, PredictionRecord,
                      PredictionRequest};

use crate::errors::StoreError;

pub use memory::{InMemoryFeatureStore, InMemoryPredictionLog};

/// Lectura de datos de referencia y de la tabla de features preparadas.
pub trait FeatureStore: Send + Sync {
    fn find_employee(&self, employee_id: i64) -> Result<Option<Employee>, StoreError>;

    /// Última fila de features del empleado (mayor `created_at`), proyectada
    /// sobre las columnas del schema. `None` si no hay filas.
    fn latest_features(&self, employee_id: i64, schema: &FeatureSchema)
                       -> Result<Option<Map<String, Value>>, StoreError>;

    /// Sonda de readiness.
    fn ping(&self) -> Result<(), StoreError>;
}

/// Log append-only de requests y predicciones.
pub trait PredictionLog: Send + Sync {
    /// Inserta request y prediction en una única transacción; la prediction
    /// queda enlazada al id asignado a la request.
    fn record(&self, request: NewPredictionRequest, prediction: NewPrediction)
              -> Result<(PredictionRequest, Prediction), StoreError>;

    /// Registros más recientes primero (`created_at DESC, id DESC`).
    fn latest(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError>;

    fn ping(&self) -> Result<(), StoreError>;
}
