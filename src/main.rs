mod models;
mod routes;
mod db;
mod services;
mod utils;
mod middleware;
use actix_cors::Cors;
use actix_web::{App, HttpServer, http, web};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    println!("🔌 Connecting to database...");
    let db = db::establish_connection()
        .await
        .expect("Failed to connect to database");
    println!("✅ Database connected!");

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    // Origine du frontend React (Vite en dev)
    let frontend_origin =
        env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

    println!("🚀 Starting server on http://127.0.0.1:{}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
            .supports_credentials();

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(db.clone()))
            .configure(routes::configure_routes)
    })
        .bind(("127.0.0.1", port))?
        .run()
        .await
}
