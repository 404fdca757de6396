// connexion BD

use sea_orm::{Database, DatabaseConnection, DbErr, SqlErr};
use std::env;

pub async fn establish_connection() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in .env file");

    Database::connect(&database_url).await
}

/// Détecte une violation de contrainte UNIQUE (code 23505 côté Postgres).
/// La contrainte BD est la seule source de vérité pour les doublons :
/// pas de check-then-insert dans les handlers.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
