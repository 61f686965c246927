//! turnover-domain
//!
//! Tipos de dominio compartidos por el core, la persistencia y la API:
//! - `feature`: contrato tipado de features (`FeatureSchema`, `FeatureVector`).
//! - `prediction`: registros inmutables del log (request + prediction).
//! - `employee`: datos de referencia del empleado.
pub mod employee;
pub mod error;
pub mod feature;
pub mod prediction;

pub use employee::Employee;
pub use error::DomainError;
pub use feature::{FeatureKind, FeatureSchema, FeatureSpec, FeatureValue, FeatureVector};
pub use prediction::{NewPrediction, NewPredictionRequest, PredictedClass, Prediction, PredictionRecord,
                     PredictionRequest, RequestPayload, Threshold};
