//! Esquema Diesel (escrito a mano). Sólo declara las tablas que se consultan
//! con el query builder; `clean.ml_features_employees` se lee con SQL dinámico
//! porque sus columnas las define el contrato del modelo.

diesel::table! {
    raw.employees (id) {
        id -> BigInt,
        employee_external_id -> Integer,
        departement -> Nullable<Varchar>,
        poste -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    app.prediction_requests (id) {
        id -> BigInt,
        employee_id -> Nullable<BigInt>,
        payload_json -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    app.predictions (id) {
        id -> BigInt,
        request_id -> BigInt,
        model_version -> Varchar,
        predicted_class -> Integer,
        predicted_proba -> Double,
        threshold_used -> Double,
        latency_ms -> Nullable<Integer>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(predictions -> prediction_requests (request_id));
diesel::joinable!(prediction_requests -> employees (employee_id));

diesel::allow_tables_to_appear_in_same_query!(employees, prediction_requests, predictions,);
