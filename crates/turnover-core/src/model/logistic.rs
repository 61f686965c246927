//! Clasificador logístico serializado en el artefacto del modelo.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use turnover_domain::{FeatureKind, FeatureSchema, FeatureVector};

use super::Classifier;
use crate::errors::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    /// `weight * (x - mean) / std`
    Numeric { mean: f64, std: f64, weight: f64 },
    /// One-hot: peso de la categoría observada, `default` para categorías no vistas.
    Categorical {
        weights: HashMap<String, f64>,
        #[serde(default)]
        default: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub feature: String,
    #[serde(flatten)]
    pub kind: TermKind,
}

#[derive(Debug, Clone)]
pub struct LogisticModel {
    intercept: f64,
    terms: Vec<Term>,
}

impl LogisticModel {
    /// Construye el modelo exigiendo un término por feature, en el orden del
    /// schema y con tipo compatible.
    pub fn new(schema: &FeatureSchema, intercept: f64, terms: Vec<Term>) -> Result<Self, ModelError> {
        if !intercept.is_finite() {
            return Err(ModelError::Format("intercept no finito".into()));
        }
        if terms.len() != schema.len() {
            return Err(ModelError::Format(format!("{} términos para {} features", terms.len(), schema.len())));
        }
        for (spec, term) in schema.specs().iter().zip(&terms) {
            if spec.name != term.feature {
                return Err(ModelError::Format(format!("término '{}' no alineado con la feature '{}'",
                                                      term.feature, spec.name)));
            }
            match (&term.kind, spec.kind) {
                (TermKind::Numeric { mean, std, weight }, FeatureKind::Integer | FeatureKind::Float) => {
                    if *std <= 0.0 || !std.is_finite() {
                        return Err(ModelError::Format(format!("{}: std debe ser > 0", spec.name)));
                    }
                    if !mean.is_finite() || !weight.is_finite() {
                        return Err(ModelError::Format(format!("{}: coeficientes no finitos", spec.name)));
                    }
                }
                (TermKind::Categorical { weights, default }, FeatureKind::Categorical) => {
                    if !default.is_finite() || weights.values().any(|w| !w.is_finite()) {
                        return Err(ModelError::Format(format!("{}: pesos no finitos", spec.name)));
                    }
                }
                _ => {
                    return Err(ModelError::Format(format!("{}: término incompatible con el tipo {}",
                                                          spec.name, spec.kind)))
                }
            }
        }
        Ok(Self { intercept, terms })
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    fn logit(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let mut z = self.intercept;
        for term in &self.terms {
            let value = features.get(&term.feature)
                                .ok_or_else(|| ModelError::Scoring(format!("falta la feature '{}'", term.feature)))?;
            z += match &term.kind {
                TermKind::Numeric { mean, std, weight } => {
                    let x = value.as_f64()
                                 .ok_or_else(|| ModelError::Scoring(format!("'{}' no es numérica", term.feature)))?;
                    weight * (x - mean) / std
                }
                TermKind::Categorical { weights, default } => {
                    let cat = value.as_category()
                                   .ok_or_else(|| ModelError::Scoring(format!("'{}' no es categórica", term.feature)))?;
                    weights.get(cat).copied().unwrap_or(*default)
                }
            };
        }
        Ok(z)
    }
}

/// Función logística estable para |z| grande.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(sigmoid(self.logit(features)?))
    }
}
