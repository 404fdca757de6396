// Initialisation de la base : création des 5 tables + admin par défaut.
// À lancer une fois avant le serveur : cargo run --bin init_db

use sea_orm::{ConnectionTrait, Database, DbErr};
use std::env;

#[path = "../utils/password.rs"]
mod password;

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "admin" (
        id SERIAL PRIMARY KEY,
        admin_name VARCHAR(100) NOT NULL,
        email VARCHAR(100) UNIQUE NOT NULL,
        admin_password VARCHAR(255) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "user" (
        id SERIAL PRIMARY KEY,
        admin_id INTEGER REFERENCES "admin"(id) ON DELETE SET NULL,
        user_name VARCHAR(100) UNIQUE NOT NULL,
        user_password VARCHAR(255) NOT NULL,
        role VARCHAR(20) NOT NULL DEFAULT 'user',
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS exchanges (
        id SERIAL PRIMARY KEY,
        name VARCHAR(50) UNIQUE NOT NULL,
        display_name VARCHAR(100) NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stocks (
        id SERIAL PRIMARY KEY,
        exchange_id INTEGER NOT NULL REFERENCES exchanges(id) ON DELETE CASCADE,
        symbol VARCHAR(50) NOT NULL,
        name VARCHAR(100) NOT NULL,
        buy_price NUMERIC(14, 2) NOT NULL DEFAULT 0,
        sell_price NUMERIC(14, 2) NOT NULL DEFAULT 0,
        high NUMERIC(14, 2) NOT NULL DEFAULT 0,
        low NUMERIC(14, 2) NOT NULL DEFAULT 0,
        open NUMERIC(14, 2) NOT NULL DEFAULT 0,
        last NUMERIC(14, 2) NOT NULL DEFAULT 0,
        change NUMERIC(14, 2) NOT NULL DEFAULT 0,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (exchange_id, symbol)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_stocks (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
        symbol VARCHAR(50) NOT NULL,
        name VARCHAR(100) NOT NULL,
        buy_price NUMERIC(14, 2) NOT NULL DEFAULT 0,
        sell_price NUMERIC(14, 2) NOT NULL DEFAULT 0,
        high NUMERIC(14, 2) NOT NULL DEFAULT 0,
        low NUMERIC(14, 2) NOT NULL DEFAULT 0,
        open NUMERIC(14, 2) NOT NULL DEFAULT 0,
        last NUMERIC(14, 2) NOT NULL DEFAULT 0,
        change NUMERIC(14, 2) NOT NULL DEFAULT 0,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (user_id, symbol)
    )
    "#,
];

#[tokio::main]
async fn main() -> Result<(), DbErr> {
    dotenv::dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in .env file");

    println!("🔌 Connecting to database...");
    let db = Database::connect(&database_url).await?;

    // 1. Créer les tables
    for statement in CREATE_TABLES {
        db.execute_unprepared(statement).await?;
    }
    println!("✅ Database tables created successfully");

    // 2. Créer l'admin par défaut (mot de passe hashé normalement,
    //    pas de bypass en clair)
    let password_hash = password::hash_password("admin")
        .map_err(DbErr::Custom)?;

    let insert_admin = format!(
        r#"
        INSERT INTO "admin" (admin_name, email, admin_password)
        VALUES ('Default Admin', 'admin@gmail.com', '{}')
        ON CONFLICT (email) DO NOTHING
        "#,
        password_hash
    );

    let result = db.execute_unprepared(&insert_admin).await?;
    if result.rows_affected() > 0 {
        println!("✅ Default admin account created successfully");
    } else {
        println!("ℹ️  Admin account already exists");
    }

    println!("🎉 Database initialization complete");
    Ok(())
}
