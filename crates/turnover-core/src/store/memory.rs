use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use turnover_domain::{Employee, FeatureSchema, NewPrediction, NewPredictionRequest, Prediction, PredictionRecord,
                      PredictionRequest};

use super::{FeatureStore, PredictionLog};
use crate::errors::StoreError;

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock().map_err(|_| StoreError::Internal("mutex envenenado".into()))
}

fn check(available: &AtomicBool) -> Result<(), StoreError> {
    if available.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(StoreError::Unavailable("store en memoria marcado como caído".into()))
    }
}

#[derive(Default)]
struct FeatureTables {
    employees: HashMap<i64, Employee>,
    rows: HashMap<i64, Vec<(DateTime<Utc>, Map<String, Value>)>>,
}

/// Store de features para tests y desarrollo local.
pub struct InMemoryFeatureStore {
    inner: Mutex<FeatureTables>,
    available: AtomicBool,
}

impl Default for InMemoryFeatureStore {
    fn default() -> Self {
        Self { inner: Mutex::new(FeatureTables::default()), available: AtomicBool::new(true) }
    }
}

impl InMemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_employee(&self, employee: Employee) -> Result<(), StoreError> {
        lock(&self.inner)?.employees.insert(employee.id, employee);
        Ok(())
    }

    /// Añade una fila de features con `created_at = now`; la última añadida gana.
    pub fn push_features(&self, employee_id: i64, row: Map<String, Value>) -> Result<(), StoreError> {
        self.push_features_at(employee_id, Utc::now(), row)
    }

    pub fn push_features_at(&self,
                            employee_id: i64,
                            created_at: DateTime<Utc>,
                            row: Map<String, Value>)
                            -> Result<(), StoreError> {
        lock(&self.inner)?.rows.entry(employee_id).or_default().push((created_at, row));
        Ok(())
    }

    /// Simula una base de datos inalcanzable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl FeatureStore for InMemoryFeatureStore {
    fn find_employee(&self, employee_id: i64) -> Result<Option<Employee>, StoreError> {
        check(&self.available)?;
        Ok(lock(&self.inner)?.employees.get(&employee_id).cloned())
    }

    fn latest_features(&self, employee_id: i64, schema: &FeatureSchema)
                       -> Result<Option<Map<String, Value>>, StoreError> {
        check(&self.available)?;
        let tables = lock(&self.inner)?;
        let Some(rows) = tables.rows.get(&employee_id) else { return Ok(None) };
        // max_by_key devuelve el último en empates: la fila añadida después gana
        let Some((_, row)) = rows.iter().max_by_key(|(ts, _)| *ts) else { return Ok(None) };
        let projected: Map<String, Value> =
            schema.names().filter_map(|n| row.get(n).map(|v| (n.to_string(), v.clone()))).collect();
        Ok(Some(projected))
    }

    fn ping(&self) -> Result<(), StoreError> {
        check(&self.available)
    }
}

#[derive(Default)]
struct LogTables {
    requests: Vec<PredictionRequest>,
    predictions: Vec<Prediction>,
}

/// Log de predicciones en memoria. Un único `Mutex` hace atómicas las dos
/// inserciones de `record`.
pub struct InMemoryPredictionLog {
    inner: Mutex<LogTables>,
    available: AtomicBool,
}

impl Default for InMemoryPredictionLog {
    fn default() -> Self {
        Self { inner: Mutex::new(LogTables::default()), available: AtomicBool::new(true) }
    }
}

impl InMemoryPredictionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// (requests, predictions) almacenadas.
    pub fn counts(&self) -> Result<(usize, usize), StoreError> {
        let t = lock(&self.inner)?;
        Ok((t.requests.len(), t.predictions.len()))
    }

    pub fn requests(&self) -> Result<Vec<PredictionRequest>, StoreError> {
        Ok(lock(&self.inner)?.requests.clone())
    }
}

impl PredictionLog for InMemoryPredictionLog {
    fn record(&self, request: NewPredictionRequest, prediction: NewPrediction)
              -> Result<(PredictionRequest, Prediction), StoreError> {
        check(&self.available)?;
        let mut t = lock(&self.inner)?;
        let now = Utc::now();
        let req = PredictionRequest { id: t.requests.len() as i64 + 1,
                                      employee_id: request.employee_id,
                                      payload: request.payload,
                                      created_at: now };
        let pred = Prediction { id: t.predictions.len() as i64 + 1,
                                request_id: req.id,
                                model_version: prediction.model_version,
                                predicted_class: prediction.predicted_class,
                                predicted_probability: prediction.predicted_probability,
                                threshold_used: prediction.threshold_used,
                                latency_ms: prediction.latency_ms,
                                created_at: now };
        t.requests.push(req.clone());
        t.predictions.push(pred.clone());
        Ok((req, pred))
    }

    fn latest(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        check(&self.available)?;
        let t = lock(&self.inner)?;
        let mut preds: Vec<&Prediction> = t.predictions.iter().collect();
        preds.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let mut out = Vec::with_capacity(limit.min(preds.len()));
        for p in preds.into_iter().take(limit) {
            let req = t.requests
                       .iter()
                       .find(|r| r.id == p.request_id)
                       .ok_or_else(|| StoreError::Internal(format!("prediction {} sin request {}", p.id, p.request_id)))?;
            out.push(PredictionRecord::from_parts(p, req));
        }
        Ok(out)
    }

    fn ping(&self) -> Result<(), StoreError> {
        check(&self.available)
    }
}
