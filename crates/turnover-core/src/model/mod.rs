//! Envoltorio del modelo: contrato de features, umbral y clasificador.

pub mod artifact;
pub mod logistic;

use serde::Serialize;
use serde_json::{Map, Value};
use turnover_domain::{FeatureSchema, FeatureVector, PredictedClass, Threshold};

use crate::errors::{CoreError, ModelError};

pub use artifact::{ArtifactPaths, DEFAULT_MODEL_FILE, DEFAULT_THRESHOLD_FILE};
pub use logistic::{LogisticModel, Term, TermKind};

/// Artefacto opaco capaz de estimar P(salida).
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub predicted_class: PredictedClass,
    pub predicted_probability: f64,
    pub threshold_used: f64,
}

/// Modelo cargado una vez por proceso y compartido en un `Arc`.
pub struct TurnoverModel {
    classifier: Box<dyn Classifier>,
    schema: FeatureSchema,
    threshold: Threshold,
    version: String,
    digest: Option<String>,
}

impl std::fmt::Debug for TurnoverModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnoverModel")
         .field("version", &self.version)
         .field("threshold", &self.threshold)
         .field("features", &self.schema.len())
         .field("digest", &self.digest)
         .finish()
    }
}

impl TurnoverModel {
    pub fn new(classifier: Box<dyn Classifier>,
               schema: FeatureSchema,
               threshold: Threshold,
               version: impl Into<String>)
               -> Self {
        Self { classifier, schema, threshold, version: version.into(), digest: None }
    }

    pub fn with_digest(mut self, digest: String) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn load(paths: &ArtifactPaths, version_override: Option<&str>) -> Result<Self, ModelError> {
        artifact::load(paths, version_override)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Valida un objeto JSON de entrada contra el contrato del modelo.
    pub fn validate_payload(&self, input: &Map<String, Value>) -> Result<FeatureVector, CoreError> {
        Ok(self.schema.validate(input)?)
    }

    /// Puntúa un vector ya validado. Determinista y sin reintentos.
    pub fn score(&self, features: &FeatureVector) -> Result<Score, CoreError> {
        self.schema.conforms(features)?;
        let p = self.classifier.predict_proba(features)?;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(CoreError::Internal(format!("probabilidad fuera de rango: {p}")));
        }
        Ok(Score { predicted_class: self.threshold.classify(p),
                   predicted_probability: p,
                   threshold_used: self.threshold.value() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use turnover_domain::{FeatureSpec, FeatureValue};

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn predict_proba(&self, _: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    fn two_floats() -> FeatureSchema {
        FeatureSchema::new(vec![FeatureSpec::float("feature_1"), FeatureSpec::float("feature_2")]).unwrap()
    }

    #[test]
    fn score_applies_threshold() {
        let model = TurnoverModel::new(Box::new(Fixed(0.8)), two_floats(), Threshold::new(0.5).unwrap(), "test_v1");
        let v = model.validate_payload(json!({"feature_1": 1.2, "feature_2": 0.8}).as_object().unwrap())
                     .unwrap();
        let score = model.score(&v).unwrap();
        assert_eq!(score.predicted_class, PredictedClass::Leaves);
        assert_eq!(score.predicted_probability, 0.8);
        assert_eq!(score.threshold_used, 0.5);
    }

    #[test]
    fn score_rejects_vector_out_of_contract() {
        let model = TurnoverModel::new(Box::new(Fixed(0.3)), two_floats(), Threshold::new(0.5).unwrap(), "test_v1");
        let v = FeatureVector::from_pairs(vec![("feature_2", FeatureValue::Float(1.0)),
                                               ("feature_1", FeatureValue::Float(1.0))]);
        assert!(matches!(model.score(&v), Err(CoreError::Validation(_))));
    }

    #[test]
    fn out_of_range_probability_is_internal() {
        let v = FeatureVector::from_pairs(vec![("feature_1", FeatureValue::Float(1.0)),
                                               ("feature_2", FeatureValue::Float(1.0))]);
        for bad in [f64::NAN, 1.5, -0.1] {
            let model = TurnoverModel::new(Box::new(Fixed(bad)), two_floats(), Threshold::new(0.5).unwrap(), "x");
            assert!(matches!(model.score(&v), Err(CoreError::Internal(_))));
        }
    }

    #[test]
    fn missing_and_unexpected_features_are_validation_errors() {
        let model = TurnoverModel::new(Box::new(Fixed(0.3)), two_floats(), Threshold::new(0.5).unwrap(), "x");
        let err = model.validate_payload(json!({"feature_1": 1.0, "extra": 2}).as_object().unwrap())
                       .unwrap_err();
        match err {
            CoreError::Validation(msg) => {
                assert!(msg.contains("feature_2"));
                assert!(msg.contains("extra"));
            }
            other => panic!("esperado Validation, obtenido {other:?}"),
        }
    }
}
