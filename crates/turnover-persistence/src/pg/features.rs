use diesel::prelude::*;
use diesel::sql_types::{BigInt, Jsonb};
use log::debug;
use serde_json::{Map, Value};
use turnover_core::{FeatureStore, StoreError};
use turnover_domain::{Employee, FeatureSchema};

use super::{ping, with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::employees;

#[derive(Queryable, Debug)]
struct EmployeeRow {
    id: i64,
    employee_external_id: i32,
    departement: Option<String>,
    poste: Option<String>,
}

impl From<EmployeeRow> for Employee {
    fn from(r: EmployeeRow) -> Self {
        Employee { id: r.id, external_id: r.employee_external_id, department: r.departement, role: r.poste }
    }
}

#[derive(QueryableByName, Debug)]
struct FeatureRow {
    #[diesel(sql_type = Jsonb)]
    features: Value,
}

/// SQL de la última fila de features, proyectada sobre las columnas del
/// schema. Los nombres ya pasaron `is_valid_feature_name`, se citan igualmente.
fn latest_features_sql(schema: &FeatureSchema) -> String {
    let cols = schema.names().map(|n| format!("\"{n}\"")).collect::<Vec<_>>().join(", ");
    format!("SELECT row_to_json(t)::jsonb AS features FROM (\
               SELECT {cols} FROM clean.ml_features_employees \
               WHERE employee_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1) t")
}

/// Lectura de `raw.employees` y `clean.ml_features_employees`.
pub struct PgFeatureStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgFeatureStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> FeatureStore for PgFeatureStore<P> {
    fn find_employee(&self, employee_id: i64) -> Result<Option<Employee>, StoreError> {
        let row: Option<EmployeeRow> = with_retry("find_employee", || {
            let mut conn = self.provider.connection()?;
            employees::table.find(employee_id)
                            .select((employees::id, employees::employee_external_id, employees::departement, employees::poste))
                            .first::<EmployeeRow>(&mut conn)
                            .optional()
                            .map_err(PersistenceError::from)
        })?;
        Ok(row.map(Employee::from))
    }

    fn latest_features(&self, employee_id: i64, schema: &FeatureSchema)
                       -> Result<Option<Map<String, Value>>, StoreError> {
        let sql = latest_features_sql(schema);
        let row: Option<FeatureRow> = with_retry("latest_features", || {
            let mut conn = self.provider.connection()?;
            diesel::sql_query(sql.as_str()).bind::<BigInt, _>(employee_id)
                                           .get_result::<FeatureRow>(&mut conn)
                                           .optional()
                                           .map_err(PersistenceError::from)
        })?;
        debug!("latest_features employee_id={employee_id} found={}", row.is_some());
        match row.map(|r| r.features) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(StoreError::Internal(format!("fila de features no es un objeto: {other}"))),
        }
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(ping(&self.provider, "SELECT 1 FROM clean.ml_features_employees LIMIT 1")?)
    }
}
