//! Contrato de features del modelo.
//!
//! `FeatureSchema` es la lista ordenada de features que espera el modelo
//! (nombre, tipo y restricciones). Todo payload externo pasa por
//! `FeatureSchema::validate` antes de llegar al modelo: el resultado es un
//! `FeatureVector` tipado y en el orden exacto del schema.
//!
//! Los nombres de feature se usan también como nombres de columna en la tabla
//! de features preparadas, por eso se restringen a identificadores simples.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// Tipo declarado de una feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Integer,
    Float,
    Categorical,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureKind::Integer => "integer",
            FeatureKind::Float => "float",
            FeatureKind::Categorical => "categorical",
        };
        f.write_str(s)
    }
}

/// Declaración de una feature: nombre, tipo y dominio permitido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

impl FeatureSpec {
    pub fn integer(name: &str) -> Self {
        Self { name: name.to_string(), kind: FeatureKind::Integer, min: None, max: None, choices: None }
    }

    pub fn float(name: &str) -> Self {
        Self { name: name.to_string(), kind: FeatureKind::Float, min: None, max: None, choices: None }
    }

    pub fn categorical(name: &str) -> Self {
        Self { name: name.to_string(), kind: FeatureKind::Categorical, min: None, max: None, choices: None }
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Convierte un valor JSON en `FeatureValue` respetando tipo y dominio.
    fn parse(&self, raw: &Value) -> Result<FeatureValue, String> {
        let value = match (self.kind, raw) {
            (_, Value::Null) => return Err(format!("{}: no puede ser null", self.name)),
            (FeatureKind::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    FeatureValue::Integer(i)
                } else {
                    // 3.0 se acepta como entero; 3.5 no.
                    match n.as_f64() {
                        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                            FeatureValue::Integer(f as i64)
                        }
                        _ => return Err(format!("{}: se esperaba un entero, recibido {n}", self.name)),
                    }
                }
            }
            (FeatureKind::Float, Value::Number(n)) => match n.as_f64() {
                Some(f) if f.is_finite() => FeatureValue::Float(f),
                _ => return Err(format!("{}: número no representable", self.name)),
            },
            (FeatureKind::Categorical, Value::String(s)) => {
                if s.trim().is_empty() {
                    return Err(format!("{}: no puede ser vacío", self.name));
                }
                FeatureValue::Categorical(s.clone())
            }
            (kind, other) => {
                return Err(format!("{}: se esperaba {kind}, recibido {}", self.name, json_type_name(other)));
            }
        };
        self.check_domain(&value)?;
        Ok(value)
    }

    fn check_domain(&self, value: &FeatureValue) -> Result<(), String> {
        if let Some(x) = value.as_f64() {
            if let Some(min) = self.min {
                if x < min {
                    return Err(format!("{}: {x} es menor que el mínimo {min}", self.name));
                }
            }
            if let Some(max) = self.max {
                if x > max {
                    return Err(format!("{}: {x} es mayor que el máximo {max}", self.name));
                }
            }
        }
        if let (Some(choices), FeatureValue::Categorical(s)) = (&self.choices, value) {
            if !choices.iter().any(|c| c == s) {
                return Err(format!("{}: valor '{s}' fuera de {choices:?}", self.name));
            }
        }
        Ok(())
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Un nombre de feature es también un nombre de columna SQL.
pub fn is_valid_feature_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Valor tipado de una feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Integer(_) => FeatureKind::Integer,
            FeatureValue::Float(_) => FeatureKind::Float,
            FeatureValue::Categorical(_) => FeatureKind::Categorical,
        }
    }

    /// Valor numérico (enteros incluidos); `None` para categóricas.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Integer(i) => Some(*i as f64),
            FeatureValue::Float(f) => Some(*f),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Categorical(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FeatureValue::Integer(i) => Value::from(*i),
            FeatureValue::Float(f) => Value::from(*f),
            FeatureValue::Categorical(s) => Value::from(s.clone()),
        }
    }
}

/// Vector de features validado, en el orden del schema que lo produjo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: IndexMap<String, FeatureValue>,
}

impl FeatureVector {
    /// Construye un vector sin validar (p.ej. desde código o tests). El modelo
    /// vuelve a comprobar la forma con `FeatureSchema::conforms`.
    pub fn from_pairs<I, S>(pairs: I) -> Self
        where I: IntoIterator<Item = (S, FeatureValue)>,
              S: Into<String>
    {
        Self { values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Representación JSON (objeto) para persistir en el log de requests.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self.values.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
        Value::Object(map)
    }
}

/// Lista ordenada de features que espera el modelo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureSpec>", into = "Vec<FeatureSpec>")]
pub struct FeatureSchema {
    specs: Vec<FeatureSpec>,
}

impl TryFrom<Vec<FeatureSpec>> for FeatureSchema {
    type Error = DomainError;

    fn try_from(specs: Vec<FeatureSpec>) -> Result<Self, Self::Error> {
        Self::new(specs)
    }
}

impl From<FeatureSchema> for Vec<FeatureSpec> {
    fn from(schema: FeatureSchema) -> Self {
        schema.specs
    }
}

impl FeatureSchema {
    /// Crea un schema verificando nombres únicos y restricciones coherentes.
    pub fn new(specs: Vec<FeatureSpec>) -> Result<Self, DomainError> {
        if specs.is_empty() {
            return Err(DomainError::Validation("el schema no declara features".into()));
        }
        let mut seen = HashSet::new();
        for spec in &specs {
            if !is_valid_feature_name(&spec.name) {
                return Err(DomainError::Validation(format!("nombre de feature inválido: '{}'", spec.name)));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(DomainError::Validation(format!("feature duplicada: {}", spec.name)));
            }
            if let (Some(min), Some(max)) = (spec.min, spec.max) {
                if min > max {
                    return Err(DomainError::Validation(format!("{}: min {min} > max {max}", spec.name)));
                }
            }
            if spec.kind == FeatureKind::Categorical && (spec.min.is_some() || spec.max.is_some()) {
                return Err(DomainError::Validation(format!("{}: una categórica no admite rango", spec.name)));
            }
            if spec.kind != FeatureKind::Categorical && spec.choices.is_some() {
                return Err(DomainError::Validation(format!("{}: choices solo aplica a categóricas", spec.name)));
            }
        }
        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Valida un objeto JSON arbitrario contra el schema.
    ///
    /// Rechaza features ausentes, features no declaradas, tipos JSON
    /// incorrectos y valores fuera de dominio. Todos los problemas se reportan
    /// juntos en un único `DomainError::Validation`.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<FeatureVector, DomainError> {
        let missing: Vec<&str> = self.names().filter(|n| !input.contains_key(*n)).collect();
        let mut unexpected: Vec<&str> = input.keys()
                                             .map(String::as_str)
                                             .filter(|k| !self.specs.iter().any(|s| s.name == *k))
                                             .collect();
        unexpected.sort_unstable();

        let mut problems = Vec::new();
        if !missing.is_empty() {
            problems.push(format!("features ausentes: {missing:?}"));
        }
        if !unexpected.is_empty() {
            problems.push(format!("features inesperadas: {unexpected:?}"));
        }

        let mut values = IndexMap::with_capacity(self.specs.len());
        for spec in &self.specs {
            let Some(raw) = input.get(&spec.name) else { continue };
            match spec.parse(raw) {
                Ok(v) => {
                    values.insert(spec.name.clone(), v);
                }
                Err(msg) => problems.push(msg),
            }
        }

        if problems.is_empty() {
            Ok(FeatureVector { values })
        } else {
            Err(DomainError::Validation(problems.join("; ")))
        }
    }

    /// Comprueba que un vector ya construido tenga exactamente la forma del
    /// schema: mismos nombres, mismo orden y tipos compatibles.
    pub fn conforms(&self, vector: &FeatureVector) -> Result<(), DomainError> {
        if vector.len() != self.specs.len() {
            return Err(DomainError::Validation(format!("se esperaban {} features, recibidas {}",
                                                       self.specs.len(),
                                                       vector.len())));
        }
        for (spec, (name, value)) in self.specs.iter().zip(vector.iter()) {
            if spec.name != name {
                return Err(DomainError::Validation(format!("orden de features inválido: se esperaba '{}', recibido '{name}'",
                                                           spec.name)));
            }
            if spec.kind != value.kind() {
                return Err(DomainError::Validation(format!("{name}: se esperaba {}, recibido {}",
                                                           spec.kind,
                                                           value.kind())));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![FeatureSpec::integer("age").with_range(Some(16.0), Some(80.0)),
                                FeatureSpec::float("satisfaction_moyenne"),
                                FeatureSpec::categorical("departement").with_choices(&["commercial", "rh"]),]).unwrap()
    }

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn validate_orders_by_schema() {
        let input = obj(json!({"departement": "rh", "satisfaction_moyenne": 2.5, "age": 41}));
        let v = schema().validate(&input).unwrap();
        let names: Vec<&str> = v.names().collect();
        assert_eq!(names, vec!["age", "satisfaction_moyenne", "departement"]);
        assert_eq!(v.get("age"), Some(&FeatureValue::Integer(41)));
    }

    #[test]
    fn integral_float_is_accepted_as_integer() {
        let input = obj(json!({"departement": "rh", "satisfaction_moyenne": 2, "age": 41.0}));
        let v = schema().validate(&input).unwrap();
        assert_eq!(v.get("age"), Some(&FeatureValue::Integer(41)));
        assert_eq!(v.get("satisfaction_moyenne"), Some(&FeatureValue::Float(2.0)));
    }

    #[test]
    fn missing_and_unexpected_reported_together() {
        let input = obj(json!({"age": 30, "foo": 1}));
        let err = schema().validate(&input).unwrap_err().to_string();
        assert!(err.contains("features ausentes"), "{err}");
        assert!(err.contains("satisfaction_moyenne"), "{err}");
        assert!(err.contains("features inesperadas"), "{err}");
        assert!(err.contains("foo"), "{err}");
    }

    #[test]
    fn wrong_types_and_domain_rejected() {
        let cases = vec![json!({"age": 12, "satisfaction_moyenne": 1.0, "departement": "rh"}),
                         json!({"age": 30.5, "satisfaction_moyenne": 1.0, "departement": "rh"}),
                         json!({"age": 30, "satisfaction_moyenne": "alta", "departement": "rh"}),
                         json!({"age": 30, "satisfaction_moyenne": 1.0, "departement": "finanzas"}),
                         json!({"age": true, "satisfaction_moyenne": 1.0, "departement": "rh"}),
                         json!({"age": null, "satisfaction_moyenne": 1.0, "departement": "rh"}),];
        for case in cases {
            let res = schema().validate(&obj(case.clone()));
            assert!(matches!(res, Err(DomainError::Validation(_))), "debería fallar: {case}");
        }
    }

    #[test]
    fn schema_rejects_bad_declarations() {
        assert!(FeatureSchema::new(vec![]).is_err());
        assert!(FeatureSchema::new(vec![FeatureSpec::float("a"), FeatureSpec::float("a")]).is_err());
        assert!(FeatureSchema::new(vec![FeatureSpec::float("drop table")]).is_err());
        assert!(FeatureSchema::new(vec![FeatureSpec::float("x").with_range(Some(2.0), Some(1.0))]).is_err());
        assert!(FeatureSchema::new(vec![FeatureSpec::integer("x").with_choices(&["a"])]).is_err());
    }

    #[test]
    fn conforms_checks_order_and_kind() {
        let s = schema();
        let ok = FeatureVector::from_pairs(vec![("age", FeatureValue::Integer(30)),
                                                ("satisfaction_moyenne", FeatureValue::Float(1.0)),
                                                ("departement", FeatureValue::Categorical("rh".into())),]);
        assert!(s.conforms(&ok).is_ok());

        let swapped = FeatureVector::from_pairs(vec![("satisfaction_moyenne", FeatureValue::Float(1.0)),
                                                     ("age", FeatureValue::Integer(30)),
                                                     ("departement", FeatureValue::Categorical("rh".into())),]);
        assert!(s.conforms(&swapped).is_err());

        let wrong_kind = FeatureVector::from_pairs(vec![("age", FeatureValue::Float(30.0)),
                                                        ("satisfaction_moyenne", FeatureValue::Float(1.0)),
                                                        ("departement", FeatureValue::Categorical("rh".into())),]);
        assert!(s.conforms(&wrong_kind).is_err());
    }

    #[test]
    fn feature_names_are_sql_identifiers() {
        assert!(is_valid_feature_name("annees_dans_l_entreprise"));
        assert!(is_valid_feature_name("feature_1"));
        assert!(!is_valid_feature_name("1feature"));
        assert!(!is_valid_feature_name("Age"));
        assert!(!is_valid_feature_name("a;b"));
    }
}
