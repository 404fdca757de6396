use actix_web::{post, get, delete, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::middleware::AuthUser;
use crate::models::dto::{FormattedStock, PortfolioSummary};
use crate::models::user_stock::{self, Entity as UserStocks, Column as UserStockColumn, ActiveModel as UserStockActiveModel};

// DTO pour l'upsert d'un titre personnel
#[derive(Deserialize, Validate)]
pub struct UpsertUserStockRequest {
    #[validate(length(min = 1, message = "Symbol is required"))]
    pub symbol: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub open: Option<Decimal>,
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
}

/// POST /api/user/stocks - Upsert d'un titre personnel (PROTÉGÉE)
/// Si (user, symbol) existe déjà, la ligne est mise à jour en place.
#[post("/user/stocks")]
pub async fn upsert_user_stock(
    auth_user: AuthUser,
    body: web::Json<UpsertUserStockRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // 1. Chercher une ligne existante pour (user, symbol)
    let existing = match UserStocks::find()
        .filter(UserStockColumn::UserId.eq(auth_user.id))
        .filter(UserStockColumn::Symbol.eq(&body.symbol))
        .one(db.get_ref())
        .await
    {
        Ok(existing) => existing,
        Err(e) => {
            log::error!("User stock upsert error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2a. Mise à jour en place
    if let Some(stock) = existing {
        let mut active_model: UserStockActiveModel = stock.into();
        active_model.name = Set(body.name.clone());
        active_model.buy_price = Set(body.buy_price.unwrap_or(Decimal::ZERO));
        active_model.sell_price = Set(body.sell_price.unwrap_or(Decimal::ZERO));
        active_model.high = Set(body.high.unwrap_or(Decimal::ZERO));
        active_model.low = Set(body.low.unwrap_or(Decimal::ZERO));
        active_model.open = Set(body.open.unwrap_or(Decimal::ZERO));
        active_model.last = Set(body.last.unwrap_or(Decimal::ZERO));
        active_model.change = Set(body.change.unwrap_or(Decimal::ZERO));
        active_model.updated_at = Set(Utc::now().fixed_offset());

        return match active_model.update(db.get_ref()).await {
            Ok(stock) => HttpResponse::Ok().json(serde_json::json!({
                "message": "User stock updated successfully",
                "stock": stock,
            })),
            Err(e) => {
                log::error!("User stock update error: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }))
            }
        };
    }

    // 2b. Création
    let new_stock = UserStockActiveModel {
        user_id: Set(auth_user.id),
        symbol: Set(body.symbol.clone()),
        name: Set(body.name.clone()),
        buy_price: Set(body.buy_price.unwrap_or(Decimal::ZERO)),
        sell_price: Set(body.sell_price.unwrap_or(Decimal::ZERO)),
        high: Set(body.high.unwrap_or(Decimal::ZERO)),
        low: Set(body.low.unwrap_or(Decimal::ZERO)),
        open: Set(body.open.unwrap_or(Decimal::ZERO)),
        last: Set(body.last.unwrap_or(Decimal::ZERO)),
        change: Set(body.change.unwrap_or(Decimal::ZERO)),
        ..Default::default()
    };

    match new_stock.insert(db.get_ref()).await {
        Ok(stock) => HttpResponse::Created().json(serde_json::json!({
            "message": "User stock created successfully",
            "stock": stock,
        })),
        Err(e) => {
            log::error!("User stock creation error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// GET /api/user/stocks - Liste personnelle + résumé portefeuille (PROTÉGÉE)
#[get("/user/stocks")]
pub async fn get_user_stocks(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let stocks = match UserStocks::find()
        .filter(UserStockColumn::UserId.eq(auth_user.id))
        .order_by_asc(UserStockColumn::Symbol)
        .all(db.get_ref())
        .await
    {
        Ok(stocks) => stocks,
        Err(e) => {
            log::error!("Fetch user stocks error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let portfolio_summary = portfolio_summary(&stocks);

    let formatted_stocks: Vec<FormattedStock> = stocks
        .into_iter()
        .map(FormattedStock::from_user_stock)
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "message": "User stocks fetched successfully",
        "stocks": formatted_stocks,
        "portfolioSummary": portfolio_summary,
        "lastUpdated": Utc::now(),
    }))
}

/// DELETE /api/user/stocks/{id} - Suppression par son propriétaire (PROTÉGÉE)
/// La propriété est vérifiée en filtrant sur id ET user_id.
#[delete("/user/stocks/{id}")]
pub async fn delete_user_stock(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let stock_id = path.into_inner();

    let stock = match UserStocks::find()
        .filter(UserStockColumn::Id.eq(stock_id))
        .filter(UserStockColumn::UserId.eq(auth_user.id))
        .one(db.get_ref())
        .await
    {
        Ok(Some(stock)) => stock,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Stock not found or not owned by user"
            }));
        }
        Err(e) => {
            log::error!("Delete user stock error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    match stock.delete(db.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "message": "User stock deleted successfully"
        })),
        Err(e) => {
            log::error!("Delete user stock error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// Statistiques agrégées du portefeuille, calculées depuis les lignes chargées
fn portfolio_summary(stocks: &[user_stock::Model]) -> PortfolioSummary {
    let total_stocks = stocks.len() as u64;
    let up_stocks = stocks
        .iter()
        .filter(|s| s.change >= Decimal::ZERO)
        .count() as u64;

    let avg_change = if total_stocks > 0 {
        let sum: Decimal = stocks.iter().map(|s| s.change).sum();
        (sum / Decimal::from(total_stocks)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    // Valeur naïve du portefeuille : somme des derniers cours
    let portfolio_value: Decimal = stocks
        .iter()
        .map(|s| s.last)
        .sum::<Decimal>()
        .round_dp(2);

    PortfolioSummary {
        total_stocks,
        up_stocks,
        down_stocks: total_stocks - up_stocks,
        avg_change,
        last_updated: stocks.iter().map(|s| s.updated_at).max(),
        portfolio_value,
    }
}

pub fn user_stock_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upsert_user_stock)
        .service(get_user_stocks)
        .service(delete_user_stock);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn stock(id: i32, last: &str, change: &str) -> user_stock::Model {
        let now = Utc::now().fixed_offset();
        user_stock::Model {
            id,
            user_id: 1,
            symbol: format!("SYM-{}", id),
            name: format!("Stock {}", id),
            buy_price: d("100"),
            sell_price: d("101"),
            high: d("110"),
            low: d("90"),
            open: d("100"),
            last: d(last),
            change: d(change),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_portfolio_summary_counts_and_value() {
        let stocks = vec![
            stock(1, "105.50", "5.50"),
            stock(2, "98.25", "-1.75"),
            stock(3, "100.00", "0.00"),
        ];

        let summary = portfolio_summary(&stocks);

        assert_eq!(summary.total_stocks, 3);
        assert_eq!(summary.up_stocks, 2); // change >= 0 compte comme hausse
        assert_eq!(summary.down_stocks, 1);
        assert_eq!(summary.avg_change, d("1.25"));
        assert_eq!(summary.portfolio_value, d("303.75"));
        assert!(summary.last_updated.is_some());
    }

    #[test]
    fn test_portfolio_summary_empty() {
        let summary = portfolio_summary(&[]);

        assert_eq!(summary.total_stocks, 0);
        assert_eq!(summary.up_stocks, 0);
        assert_eq!(summary.down_stocks, 0);
        assert_eq!(summary.avg_change, Decimal::ZERO);
        assert_eq!(summary.portfolio_value, Decimal::ZERO);
        assert!(summary.last_updated.is_none());
    }
}
