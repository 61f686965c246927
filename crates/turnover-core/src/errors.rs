//! Errores del core: servicio de predicción, stores y modelo.

use std::path::PathBuf;

use thiserror::Error;
use turnover_domain::DomainError;

/// Error devuelto por las implementaciones de `FeatureStore` / `PredictionLog`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store no disponible: {0}")] Unavailable(String),
    #[error("error de store: {0}")] Internal(String),
}

/// Errores de carga del artefacto o de scoring.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no se pudo leer el artefacto {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("artefacto inválido: {0}")]
    Format(String),
    #[error("scoring: {0}")]
    Scoring(String),
}

/// Taxonomía de errores del servicio; la API la traduce a códigos HTTP.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("validation: {0}")] Validation(String),
    #[error("not found: {0}")] NotFound(String),
    #[error("dependency unavailable: {0}")] Unavailable(String),
    #[error("internal: {0}")] Internal(String),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => CoreError::Unavailable(msg),
            StoreError::Internal(msg) => CoreError::Internal(msg),
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => CoreError::Validation(msg),
            DomainError::NotFound(msg) => CoreError::NotFound(msg),
            DomainError::Generic(msg) => CoreError::Internal(msg),
        }
    }
}

impl From<ModelError> for CoreError {
    fn from(e: ModelError) -> Self {
        CoreError::Internal(e.to_string())
    }
}
