//! Configuración del servidor HTTP.
//! Carga variables de entorno (.env) una sola vez y expone `AppConfig`. La
//! configuración del pool vive en `turnover_persistence::DbConfig`.

use std::env;
use std::path::PathBuf;

use turnover_core::model::{ArtifactPaths, DEFAULT_MODEL_FILE, DEFAULT_THRESHOLD_FILE};
use turnover_persistence::config::{env_parse, init_dotenv};

use crate::errors::StartupError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Clave esperada en `X-API-Key`. `None` → toda petición responde 500.
    pub api_key: Option<String>,
    pub model_dir: PathBuf,
    pub model_file: String,
    pub threshold_file: String,
    /// Reemplaza la versión declarada en el artefacto.
    pub model_version: Option<String>,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, StartupError> {
        init_dotenv();
        Ok(Self { host: non_empty("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                  port: env_parse("API_PORT", 8000).map_err(|e| StartupError::Config(e.to_string()))?,
                  api_key: non_empty("API_KEY"),
                  model_dir: non_empty("MODEL_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("artifacts")),
                  model_file: non_empty("MODEL_FILE").unwrap_or_else(|| DEFAULT_MODEL_FILE.to_string()),
                  threshold_file: non_empty("THRESHOLD_FILE").unwrap_or_else(|| DEFAULT_THRESHOLD_FILE.to_string()),
                  model_version: non_empty("MODEL_VERSION") })
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.model_dir, &self.model_file, &self.threshold_file)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_join_model_dir() {
        let cfg = AppConfig { host: "127.0.0.1".into(),
                              port: 8000,
                              api_key: None,
                              model_dir: PathBuf::from("/srv/models"),
                              model_file: "model.json".into(),
                              threshold_file: "threshold.json".into(),
                              model_version: None };
        let paths = cfg.artifact_paths();
        assert_eq!(paths.model, PathBuf::from("/srv/models/model.json"));
        assert_eq!(paths.threshold, PathBuf::from("/srv/models/threshold.json"));
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8000");
    }
}
