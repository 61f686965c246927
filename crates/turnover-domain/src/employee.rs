use serde::{Deserialize, Serialize};

/// Empleado de referencia (tabla `raw.employees`), de solo lectura para la API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    /// Identificador estable del SIRH.
    pub external_id: i32,
    pub department: Option<String>,
    pub role: Option<String>,
}
