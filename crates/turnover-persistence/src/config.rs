//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` y parámetros opcionales de pool.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env desde aplicaciones externas.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

/// Lee una variable opcional; un valor presente pero no parseable es error.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, PersistenceError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| PersistenceError::Config(format!("{key}='{raw}' no es válido")))
        }
        _ => Ok(default),
    }
}

/// Interpreta `true/false/1/0/yes/no` (sin distinguir mayúsculas).
pub fn env_flag(key: &str, default: bool) -> Result<bool, PersistenceError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(PersistenceError::Config(format!("{key}='{raw}' no es un booleano"))),
        },
        _ => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        init_dotenv();
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL no definido".into()))?;
        let min_connections = env_parse("DATABASE_MIN_CONNECTIONS", 2)?;
        let max_connections = env_parse("DATABASE_MAX_CONNECTIONS", 16)?;
        let timeout_secs: u64 = env_parse("DATABASE_CONNECT_TIMEOUT_SECS", 5)?;
        let run_migrations = env_flag("RUN_MIGRATIONS", true)?;
        Ok(Self { url,
                  min_connections,
                  max_connections,
                  connect_timeout: Duration::from_secs(timeout_secs.max(1)),
                  run_migrations })
    }
}
