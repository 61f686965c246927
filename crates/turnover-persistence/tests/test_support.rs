#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, Ordering};

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, SmallInt, Text};
use once_cell::sync::Lazy;
use turnover_persistence::config::DbConfig;
use turnover_persistence::pg::{build_pool, PgPool};

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    if std::env::var("DATABASE_URL").is_err() {
        return None;
    }
    let cfg = DbConfig::from_env().ok()?;
    match build_pool(&cfg.url, 1, 2) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

pub fn with_pool<F, R>(f: F) -> Option<R>
    where F: FnOnce(&PgPool) -> R
{
    TEST_POOL.as_ref().map(f)
}

static NEXT_EXTERNAL: Lazy<AtomicI32> =
    Lazy::new(|| AtomicI32::new((chrono::Utc::now().timestamp_micros() % 1_000_000_000) as i32));

#[derive(QueryableByName)]
struct IdRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

/// Inserta un empleado con id externo único y devuelve su `id`.
pub fn insert_employee(conn: &mut PgConnection, departement: &str) -> i64 {
    let external = NEXT_EXTERNAL.fetch_add(1, Ordering::SeqCst);
    diesel::sql_query("INSERT INTO raw.employees (employee_external_id, departement, poste) \
                       VALUES ($1, $2, 'Consultant') RETURNING id")
        .bind::<Integer, _>(external)
        .bind::<Text, _>(departement)
        .get_result::<IdRow>(conn)
        .expect("insert employee")
        .id
}

/// Inserta una fila completa de features; sólo `age`, `satisfaction_moyenne`
/// y `statut_marital` varían entre llamadas.
pub fn insert_features(conn: &mut PgConnection, employee_id: i64, age: i16, satisfaction: f64, statut: &str) {
    diesel::sql_query("INSERT INTO clean.ml_features_employees (\
          employee_id, note_evaluation_precedente, niveau_hierarchique_poste, note_evaluation_actuelle, \
          heures_supplementaires, augmentation_salaire_precedente, age, genre, revenu_mensuel, \
          statut_marital, departement, poste, nombre_experiences_precedentes, annee_experience_totale, \
          annees_dans_l_entreprise, annees_dans_le_poste_actuel, a_quitte_l_entreprise, \
          nombre_participation_pee, nb_formations_suivies, distance_domicile_travail, niveau_education, \
          domaine_etude, frequence_deplacement, annees_depuis_la_derniere_promotion, \
          annees_sous_responsable_actuel, satisfaction_moyenne, nonlineaire_participation_pee, \
          ratio_heures_sup_salaire, nonlinaire_charge_contrainte, nonlinaire_surmenage_insatisfaction, \
          jeune_surcharge, anciennete_sans_promotion, mobilite_carriere, risque_global) \
        VALUES ($1, 3, 2, 3, 1, 11.00, $2, 0, 4200, $3, 'Commercial', 'Consultant', 2, 8, 4, 2, 0, \
                1, 3, 12, 3, 'Marketing', 1, 1, 2, CAST($4 AS NUMERIC(10, 4)), 0.5, 0.0002380952380952, 0.4, 0.3, 0, 0.25, 0.5, 0.35)")
        .bind::<BigInt, _>(employee_id)
        .bind::<SmallInt, _>(age)
        .bind::<Text, _>(statut)
        .bind::<Double, _>(satisfaction)
        .execute(conn)
        .expect("insert features");
}
