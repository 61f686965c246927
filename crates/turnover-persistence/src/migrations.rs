//! Runner de migraciones embebidas (`migrations/` de este crate).

use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Aplica las migraciones pendientes y devuelve las versiones aplicadas.
pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<Vec<String>, PersistenceError> {
    let applied: Vec<String> = conn.run_pending_migrations(MIGRATIONS)
                                   .map_err(|e| PersistenceError::Unknown(format!("migration error: {e}")))?
                                   .into_iter()
                                   .map(|v| v.to_string())
                                   .collect();
    if !applied.is_empty() {
        info!("migraciones aplicadas: {applied:?}");
    }
    Ok(applied)
}
