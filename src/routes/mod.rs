pub mod health;
pub mod auth;
pub mod users;
pub mod exchanges;
pub mod stocks;
pub mod user_stocks;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(users::user_admin_routes)
            .configure(exchanges::exchange_routes)
            .configure(stocks::stock_routes)
            .configure(user_stocks::user_stock_routes)
    );
}
