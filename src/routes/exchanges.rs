use actix_web::{post, get, put, delete, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set,
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::db::is_unique_violation;
use crate::middleware::AdminUser;
use crate::models::exchange::{Entity as Exchanges, Column as ExchangeColumn, ActiveModel as ExchangeActiveModel};
use crate::services::market_service::MarketService;

// DTO pour la création d'une place de marché
#[derive(Deserialize, Validate)]
pub struct CreateExchangeRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
}

// DTO pour la mise à jour
#[derive(Deserialize, Validate)]
pub struct UpdateExchangeRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
    pub active: bool,
}

/// GET /api/exchanges - Liste des places de marché (PUBLIC)
#[get("/exchanges")]
pub async fn get_exchanges(db: web::Data<DatabaseConnection>) -> HttpResponse {
    match Exchanges::find()
        .order_by_asc(ExchangeColumn::Id)
        .all(db.get_ref())
        .await
    {
        Ok(exchanges) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Exchanges fetched successfully",
            "exchanges": exchanges,
        })),
        Err(e) => {
            log::error!("Fetch exchanges error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// POST /api/admin/exchanges - Créer une place de marché (PROTÉGÉE admin)
/// Génère aussi 10 titres d'exemple avec des prix adaptés au type de place.
#[post("/admin/exchanges")]
pub async fn create_exchange(
    _admin_user: AdminUser,
    body: web::Json<CreateExchangeRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // 1. Insérer — la contrainte UNIQUE sur name détecte le doublon
    let new_exchange = ExchangeActiveModel {
        name: Set(body.name.clone()),
        display_name: Set(body.display_name.clone()),
        ..Default::default()
    };

    let exchange = match new_exchange.insert(db.get_ref()).await {
        Ok(exchange) => exchange,
        Err(e) if is_unique_violation(&e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Exchange with this name already exists"
            }));
        }
        Err(e) => {
            log::error!("Exchange creation error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Générer les titres d'exemple
    let stocks_created = match MarketService::seed_sample_stocks(
        db.get_ref(),
        exchange.id,
        &exchange.name,
        &exchange.display_name,
    )
    .await
    {
        Ok(count) => count,
        Err(e) => {
            log::error!("Sample stock seeding error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    HttpResponse::Created().json(serde_json::json!({
        "message": "Exchange created successfully with sample stocks",
        "exchange": exchange,
        "stocksCreated": stocks_created,
    }))
}

/// PUT /api/admin/exchanges/{id} - Mise à jour (PROTÉGÉE admin)
#[put("/admin/exchanges/{id}")]
pub async fn update_exchange(
    _admin_user: AdminUser,
    path: web::Path<i32>,
    body: web::Json<UpdateExchangeRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    let exchange_id = path.into_inner();

    let exchange = match Exchanges::find_by_id(exchange_id).one(db.get_ref()).await {
        Ok(Some(exchange)) => exchange,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Exchange not found"
            }));
        }
        Err(e) => {
            log::error!("Exchange update error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let mut active_model: ExchangeActiveModel = exchange.into();
    active_model.name = Set(body.name.clone());
    active_model.display_name = Set(body.display_name.clone());
    active_model.active = Set(body.active);
    active_model.updated_at = Set(Utc::now().fixed_offset());

    match active_model.update(db.get_ref()).await {
        Ok(exchange) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Exchange updated successfully",
            "exchange": exchange,
        })),
        Err(e) if is_unique_violation(&e) => HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Exchange name already exists"
        })),
        Err(e) => {
            log::error!("Exchange update error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// DELETE /api/admin/exchanges/{id} - Suppression (PROTÉGÉE admin)
/// Les titres de la place partent en cascade côté BD.
#[delete("/admin/exchanges/{id}")]
pub async fn delete_exchange(
    _admin_user: AdminUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let exchange_id = path.into_inner();

    let exchange = match Exchanges::find_by_id(exchange_id).one(db.get_ref()).await {
        Ok(Some(exchange)) => exchange,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Exchange not found"
            }));
        }
        Err(e) => {
            log::error!("Exchange deletion error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    match exchange.delete(db.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Exchange deleted successfully"
        })),
        Err(e) => {
            log::error!("Exchange deletion error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

pub fn exchange_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_exchanges)
        .service(create_exchange)
        .service(update_exchange)
        .service(delete_exchange);
}
