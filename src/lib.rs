//! Turnover API
//!
//! Servidor HTTP de predicción de rotación de empleados:
//! - `api`: router axum, middlewares de seguridad y handlers.
//! - `config`: configuración del servidor desde entorno/.env.
//! - `errors`: error HTTP (`ApiError`) y errores de arranque.
//!
//! La lógica vive en `turnover-core`; la persistencia en `turnover-persistence`.

pub mod api;
pub mod config;
pub mod errors;

pub use api::{create_router, AppState};
pub use config::AppConfig;
