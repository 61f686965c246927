//! CLI de operación: `turnover-cli migrate | latest [--limit N] | score --employee N`.
//!
//! Códigos de salida: 0 ok, 2 uso incorrecto, 4 no encontrado / rechazado,
//! 5 error de infraestructura.

use std::process::exit;
use std::sync::Arc;

use turnover_api::AppConfig;
use turnover_core::{CoreError, PredictionService, TurnoverModel};
use turnover_persistence::migrations::run_pending_migrations;
use turnover_persistence::{build_pool_with, DbConfig, PgFeatureStore, PgPool, PgPredictionLog, PoolProvider};

const USAGE: &str = "uso: turnover-cli migrate | latest [--limit N] | score --employee N";

fn fail(code: i32, msg: impl std::fmt::Display) -> ! {
    eprintln!("[turnover-cli] {msg}");
    exit(code)
}

/// Valor que sigue a `flag` en `args`, si existe.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).map(String::as_str)
}

fn pool(run_migrations: bool) -> PgPool {
    let mut cfg = DbConfig::from_env().unwrap_or_else(|e| fail(5, e));
    cfg.run_migrations = run_migrations;
    build_pool_with(&cfg).unwrap_or_else(|e| fail(5, format!("pool error: {e}")))
}

fn cmd_migrate() {
    let pool = pool(false);
    let mut conn = pool.get().unwrap_or_else(|e| fail(5, format!("conexión: {e}")));
    match run_pending_migrations(&mut conn) {
        Ok(applied) if applied.is_empty() => println!("sin migraciones pendientes"),
        Ok(applied) => applied.iter().for_each(|v| println!("aplicada {v}")),
        Err(e) => fail(5, e),
    }
}

fn service(provider: PoolProvider, model: Option<Arc<TurnoverModel>>) -> PredictionService {
    PredictionService::new(Arc::new(PgFeatureStore::new(provider.clone())),
                           Arc::new(PgPredictionLog::new(provider)),
                           model)
}

fn cmd_latest(args: &[String]) {
    let limit = match flag_value(args, "--limit") {
        None => None,
        Some(raw) => Some(raw.parse::<usize>().unwrap_or_else(|_| fail(2, format!("--limit inválido: {raw}")))),
    };
    let svc = service(PoolProvider { pool: pool(true) }, None);
    let records = svc.latest(limit).unwrap_or_else(|e| fail(5, e));
    for r in &records {
        match serde_json::to_string(r) {
            Ok(line) => println!("{line}"),
            Err(e) => fail(5, e),
        }
    }
}

fn cmd_score(args: &[String]) {
    let employee_id = flag_value(args, "--employee").and_then(|v| v.parse::<i64>().ok())
                                                    .unwrap_or_else(|| fail(2, USAGE));
    let config = AppConfig::from_env().unwrap_or_else(|e| fail(5, e));
    let model = TurnoverModel::load(&config.artifact_paths(), config.model_version.as_deref())
        .unwrap_or_else(|e| fail(5, format!("modelo: {e}")));
    let svc = service(PoolProvider { pool: pool(true) }, Some(Arc::new(model)));
    match svc.predict_by_id(employee_id) {
        Ok(outcome) => match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(5, e),
        },
        Err(CoreError::NotFound(msg)) => fail(4, format!("no encontrado: {msg}")),
        Err(CoreError::Validation(msg)) => fail(4, format!("rechazado: {msg}")),
        Err(e) => fail(5, e),
    }
}

fn main() {
    // Cargar .env si existe para obtener DATABASE_URL
    let _ = dotenvy::dotenv();
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("migrate") => cmd_migrate(),
        Some("latest") => cmd_latest(&args[2..]),
        Some("score") => cmd_score(&args[2..]),
        _ => fail(2, USAGE),
    }
}
