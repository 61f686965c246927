//! Carga del artefacto (`model.json`) y del umbral (`threshold.json`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use turnover_domain::{FeatureSchema, Threshold};

use super::logistic::{LogisticModel, Term};
use super::TurnoverModel;
use crate::errors::ModelError;

pub const DEFAULT_MODEL_FILE: &str = "model.json";
pub const DEFAULT_THRESHOLD_FILE: &str = "threshold.json";

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    model_version: String,
    features: FeatureSchema,
    intercept: f64,
    terms: Vec<Term>,
}

#[derive(Debug, Deserialize)]
struct ThresholdFile {
    threshold: Threshold,
}

/// Ubicación de los ficheros del modelo en disco.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub threshold: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>, model_file: &str, threshold_file: &str) -> Self {
        let dir = dir.as_ref();
        Self { model: dir.join(model_file), threshold: dir.join(threshold_file) }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ModelError> {
    fs::read(path).map_err(|source| ModelError::Io { path: path.to_path_buf(), source })
}

/// Hex SHA-256 de los bytes del artefacto.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

/// Construye el modelo a partir de los bytes de ambos ficheros.
pub fn from_bytes(model_bytes: &[u8],
                  threshold_bytes: &[u8],
                  version_override: Option<&str>)
                  -> Result<TurnoverModel, ModelError> {
    let artifact: ModelArtifact =
        serde_json::from_slice(model_bytes).map_err(|e| ModelError::Format(format!("model: {e}")))?;
    let threshold: ThresholdFile =
        serde_json::from_slice(threshold_bytes).map_err(|e| ModelError::Format(format!("threshold: {e}")))?;

    let classifier = LogisticModel::new(&artifact.features, artifact.intercept, artifact.terms)?;
    let version = match version_override.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => artifact.model_version,
    };
    if version.is_empty() || version.len() > 50 {
        return Err(ModelError::Format(format!("model_version inválida: '{version}'")));
    }

    Ok(TurnoverModel::new(Box::new(classifier), artifact.features, threshold.threshold, version)
        .with_digest(sha256_hex(model_bytes)))
}

/// Lee y valida el artefacto desde disco. Se llama una sola vez al arrancar.
pub fn load(paths: &ArtifactPaths, version_override: Option<&str>) -> Result<TurnoverModel, ModelError> {
    let model_bytes = read(&paths.model)?;
    let threshold_bytes = read(&paths.threshold)?;
    let model = from_bytes(&model_bytes, &threshold_bytes, version_override)?;
    log::info!("modelo {} cargado desde {} ({} features, umbral {})",
               model.version(),
               paths.model.display(),
               model.schema().len(),
               model.threshold().value());
    Ok(model)
}
