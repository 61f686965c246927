use thiserror::Error;
use turnover_persistence::PersistenceError;

/// Errores fatales de arranque del servidor o de la CLI.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
}
