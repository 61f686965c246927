//! Pruebas de integración Postgres (requieren DATABASE_URL; se omiten si no existe).

mod test_support;

use serde_json::json;
use test_support::{insert_employee, insert_features, with_pool};
use turnover_core::{FeatureStore, PredictionLog, StoreError};
use turnover_domain::{FeatureSchema, FeatureSpec, FeatureValue, NewPrediction, NewPredictionRequest, PredictedClass};
use turnover_persistence::{PgFeatureStore, PgPredictionLog, PoolProvider};

fn schema() -> FeatureSchema {
    FeatureSchema::new(vec![FeatureSpec::integer("age").with_range(Some(16.0), Some(80.0)),
                            FeatureSpec::float("satisfaction_moyenne"),
                            FeatureSpec::categorical("statut_marital"),]).unwrap()
}

fn prediction(p: f64) -> NewPrediction {
    NewPrediction { model_version: "logreg_v1".into(),
                    predicted_class: if p >= 0.5 { PredictedClass::Leaves } else { PredictedClass::Stays },
                    predicted_probability: p,
                    threshold_used: 0.5,
                    latency_ms: Some(3) }
}

#[test]
fn feature_store_reads_latest_row() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let mut conn = pool.get().expect("conn");
        let id = insert_employee(&mut conn, "Commercial");
        insert_features(&mut conn, id, 30, 2.5, "Marie");
        insert_features(&mut conn, id, 31, 2.75, "Celibataire");
        drop(conn);

        let store = PgFeatureStore::new(PoolProvider { pool: pool.clone() });
        let employee = store.find_employee(id).expect("find").expect("existe");
        assert_eq!(employee.department.as_deref(), Some("Commercial"));
        assert!(store.find_employee(-1).expect("find").is_none());

        let row = store.latest_features(id, &schema()).expect("features").expect("fila");
        assert_eq!(row.len(), 3);
        let vector = schema().validate(&row).expect("cumple el contrato");
        assert_eq!(vector.get("age"), Some(&FeatureValue::Integer(31)));
        assert_eq!(vector.get("satisfaction_moyenne"), Some(&FeatureValue::Float(2.75)));
        assert_eq!(vector.get("statut_marital"), Some(&FeatureValue::Categorical("Celibataire".into())));
        store.ping().expect("ping");
    });
}

#[test]
fn feature_store_without_rows_returns_none() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let mut conn = pool.get().expect("conn");
        let id = insert_employee(&mut conn, "RH");
        drop(conn);
        let store = PgFeatureStore::new(PoolProvider { pool: pool.clone() });
        assert!(store.latest_features(id, &schema()).expect("query").is_none());
    });
}

#[test]
fn unknown_column_is_internal_error() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let mut conn = pool.get().expect("conn");
        let id = insert_employee(&mut conn, "RH");
        insert_features(&mut conn, id, 40, 3.0, "Marie");
        drop(conn);
        let store = PgFeatureStore::new(PoolProvider { pool: pool.clone() });
        let bad = FeatureSchema::new(vec![FeatureSpec::float("columna_inexistente")]).unwrap();
        assert!(matches!(store.latest_features(id, &bad), Err(StoreError::Internal(_))));
    });
}

#[test]
fn record_writes_linked_rows_and_latest_reads_them_back() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let mut conn = pool.get().expect("conn");
        let employee_id = insert_employee(&mut conn, "Commercial");
        drop(conn);

        let log = PgPredictionLog::new(PoolProvider { pool: pool.clone() });
        let payload = json!({"mode": "by_employee_id", "employee_id": employee_id, "features": {"age": 31}});
        let (req, pred) = log.record(NewPredictionRequest { employee_id: Some(employee_id), payload: payload.clone() },
                                     prediction(0.876_54))
                             .expect("record");
        assert_eq!(pred.request_id, req.id);
        assert_eq!(req.payload, payload);

        let (req2, pred2) = log.record(NewPredictionRequest { employee_id: None, payload: json!({"mode": "by_features"}) },
                                       prediction(0.12))
                               .expect("record 2");

        let recent = log.latest(500).expect("latest");
        let first = recent.iter().position(|r| r.prediction_id == pred2.id).expect("pred2 presente");
        let second = recent.iter().position(|r| r.prediction_id == pred.id).expect("pred presente");
        assert!(first < second, "más reciente primero");
        let rec = &recent[second];
        assert_eq!(rec.request_id, req.id);
        assert_eq!(rec.employee_id, Some(employee_id));
        assert_eq!(rec.predicted_probability, 0.8765);
        assert_eq!(recent[first].request_id, req2.id);

        assert_eq!(log.latest(1).expect("latest 1").len(), 1);
        log.ping().expect("ping");
    });
}

#[test]
fn failed_record_leaves_no_orphan_request() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    with_pool(|pool| {
        let log = PgPredictionLog::new(PoolProvider { pool: pool.clone() });
        let marker = format!("orphan-check-{}", chrono::Utc::now().timestamp_micros());
        // umbral fuera de rango: el CHECK de app.predictions falla y la transacción revierte
        let mut bad = prediction(0.4);
        bad.threshold_used = 1.5;
        let err = log.record(NewPredictionRequest { employee_id: None, payload: json!({"marker": marker}) }, bad)
                     .unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));

        use diesel::prelude::*;
        use diesel::sql_types::{BigInt, Text};
        #[derive(QueryableByName)]
        struct Count {
            #[diesel(sql_type = BigInt)]
            n: i64,
        }
        let mut conn = pool.get().expect("conn");
        let count = diesel::sql_query("SELECT count(*) AS n FROM app.prediction_requests WHERE payload_json->>'marker' = $1")
            .bind::<Text, _>(marker.as_str())
            .get_result::<Count>(&mut conn)
            .expect("count");
        assert_eq!(count.n, 0);
    });
}
