use serde_json::json;
use turnover_domain::{FeatureKind, FeatureSchema, FeatureValue, PredictedClass, Threshold};

#[test]
fn schema_deserializes_from_artifact_json() {
    let raw = json!([
        {"name": "note_evaluation_actuelle", "kind": "integer", "min": 1, "max": 5},
        {"name": "heures_supplementaires", "kind": "integer", "min": 0, "max": 1},
        {"name": "statut_marital", "kind": "categorical"},
        {"name": "risque_global", "kind": "float"}
    ]);
    let schema: FeatureSchema = serde_json::from_value(raw).expect("schema");
    assert_eq!(schema.len(), 4);
    assert_eq!(schema.specs()[2].kind, FeatureKind::Categorical);
    assert_eq!(schema.specs()[0].max, Some(5.0));
}

#[test]
fn schema_deserialization_runs_declaration_checks() {
    let dup = json!([
        {"name": "age", "kind": "integer"},
        {"name": "age", "kind": "float"}
    ]);
    assert!(serde_json::from_value::<FeatureSchema>(dup).is_err());
}

#[test]
fn two_float_payload_validates_and_classifies() {
    let schema: FeatureSchema = serde_json::from_value(json!([
        {"name": "feature_1", "kind": "float"},
        {"name": "feature_2", "kind": "float"}
    ])).unwrap();
    let payload = json!({"feature_1": 1.2, "feature_2": 0.8});
    let vector = schema.validate(payload.as_object().unwrap()).expect("payload válido");
    assert_eq!(vector.get("feature_1"), Some(&FeatureValue::Float(1.2)));
    assert!(schema.conforms(&vector).is_ok());

    let threshold = Threshold::new(0.5).unwrap();
    assert_eq!(threshold.classify(0.8), PredictedClass::Leaves);
}

#[test]
fn classification_matches_threshold_over_grid() {
    for t in [0.0, 0.1, 0.35, 0.5, 0.9, 1.0] {
        let threshold = Threshold::new(t).unwrap();
        for step in 0..=100 {
            let p = step as f64 / 100.0;
            let class = threshold.classify(p);
            assert_eq!(class == PredictedClass::Leaves, p >= t, "p={p} t={t}");
        }
    }
}
