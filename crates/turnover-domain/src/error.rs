use thiserror::Error;

/// Errores del dominio de predicción.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validación fallida: {0}")]
    Validation(String),
    #[error("Entidad no encontrada: {0}")]
    NotFound(String),
    #[error("Error genérico de dominio: {0}")]
    Generic(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Generic(format!("serialización: {e}"))
    }
}
