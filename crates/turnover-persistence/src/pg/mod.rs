//! Implementaciones Postgres (Diesel) de los puertos del core.
//!
//! - `PgFeatureStore`: lectura de `raw.employees` y de la última fila de
//!   `clean.ml_features_employees`.
//! - `PgPredictionLog`: inserción atómica request + prediction en `app.*` y
//!   lectura del log unido.
//!
//! Ambas comparten un `ConnectionProvider` (normalmente `PoolProvider`) y el
//! mismo retry con backoff corto para errores transitorios.

mod features;
mod log_store;

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::warn;

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;

pub use features::PgFeatureStore;
pub use log_store::PgPredictionLog;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Contrato: devuelve una conexión válida o `PersistenceError::TransientIo`
/// si el pool no puede entregarla.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
pub(crate) fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        // Algunos errores de conexión llegan como Unknown con texto.
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("terminating connection due to administrator command")
            || m.contains("connection closed")
            || m.contains("connection refused")
        }
        _ => false,
    }
}

/// Retry con backoff lineal corto (hasta 3 reintentos: 15ms, 30ms, 45ms).
pub(crate) fn with_retry<F, T>(op: &str, mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("{op}: error reintentable (intento {}): {e} -> esperando {delay_ms}ms", attempts + 1);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Construye un pool Postgres r2d2 a partir de URL y aplica migraciones.
///
/// Si `min_size > max_size` se usa `min_size = max_size`; tamaños 0 se
/// elevan a 1.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    build_pool_with(&DbConfig { url: database_url.to_string(),
                                min_connections: min_size,
                                max_connections: max_size,
                                connect_timeout: std::time::Duration::from_secs(5),
                                run_migrations: true })
}

/// Igual que `build_pool` pero con timeout y migraciones según configuración.
pub fn build_pool_with(cfg: &DbConfig) -> Result<PgPool, PersistenceError> {
    let validated_min = cfg.min_connections.max(1);
    let validated_max = cfg.max_connections.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let manager = ConnectionManager::<PgConnection>::new(cfg.url.as_str());
    let pool = r2d2::Pool::builder().min_idle(Some(validated_min.min(validated_max)))
                                    .max_size(validated_max)
                                    .connection_timeout(cfg.connect_timeout)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    if cfg.run_migrations {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee `DbConfig` y construye el pool.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = DbConfig::from_env()?;
    build_pool_with(&cfg)
}

/// Sonda trivial de conectividad.
pub(crate) fn ping(provider: &dyn ConnectionProvider, sql: &str) -> Result<(), PersistenceError> {
    let mut conn = provider.connection()?;
    diesel::sql_query(sql).execute(&mut conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(is_retryable(&PersistenceError::SerializationConflict));
        assert!(is_retryable(&PersistenceError::TransientIo("pool".into())));
        assert!(is_retryable(&PersistenceError::Unknown("ERROR: deadlock detected".into())));
        assert!(!is_retryable(&PersistenceError::CheckViolation("x".into())));
        assert!(!is_retryable(&PersistenceError::NotFound));
    }

    #[test]
    fn with_retry_gives_up_after_three_retries() {
        let mut calls = 0;
        let r: Result<(), _> = with_retry("test", || {
            calls += 1;
            Err(PersistenceError::TransientIo("down".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn with_retry_does_not_repeat_permanent_errors() {
        let mut calls = 0;
        let r: Result<(), _> = with_retry("test", || {
            calls += 1;
            Err(PersistenceError::ForeignKeyViolation("employee".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls, 1);
    }
}
