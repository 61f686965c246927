//! turnover-core
//!
//! Lógica del servicio independiente del transporte y de la base de datos:
//! - `model`: contrato de features + clasificador + umbral.
//! - `store`: puertos `FeatureStore` / `PredictionLog` y sus versiones en memoria.
//! - `service`: orquestación de una llamada de predicción.
pub mod errors;
pub mod model;
pub mod service;
pub mod store;

pub use errors::{CoreError, ModelError, StoreError};
pub use model::{ArtifactPaths, Classifier, LogisticModel, Score, TurnoverModel};
pub use service::{clamp_limit, PredictionOutcome, PredictionService, Readiness};
pub use store::{FeatureStore, InMemoryFeatureStore, InMemoryPredictionLog, PredictionLog};
