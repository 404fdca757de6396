use actix_web::{post, get, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::is_unique_violation;
use crate::middleware::AdminUser;
use crate::models::dto::{ExchangeInfo, FormattedStock, MarketSummary};
use crate::models::exchange::{self, Entity as Exchanges, Column as ExchangeColumn};
use crate::models::stock::{self, Entity as Stocks, Column as StockColumn, ActiveModel as StockActiveModel};
use crate::services::market_service::{self, MarketService};

// DTO pour la création d'un titre
#[derive(Deserialize, Validate)]
pub struct CreateStockRequest {
    #[validate(length(min = 1, message = "Exchange is required"))]
    pub exchange_name: String,
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

// 1 titre d'une requête de création en masse
// (symbol/name optionnels: les éléments invalides sont signalés, pas rejetés)
#[derive(Deserialize)]
pub struct BulkStockItem {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub open: Option<Decimal>,
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
}

// DTO pour la création en masse
#[derive(Deserialize)]
pub struct BulkCreateStocksRequest {
    pub exchange_name: String,
    pub stocks: Vec<BulkStockItem>,
}

// DTO pour la simulation de tendance
#[derive(Deserialize)]
pub struct SimulateMarketRequest {
    pub exchange_name: String,
    pub trend: Option<String>,     // up / down / volatile / random (défaut)
    pub magnitude: Option<String>, // small / medium (défaut) / large / crash / boom
}

// Erreur par élément d'une création en masse
#[derive(Serialize)]
pub struct BulkStockError {
    pub symbol: Option<String>,
    pub error: String,
}

// Résumé de marché annoté de sa place, pour la vue admin globale
#[derive(Serialize)]
pub struct ExchangeSummary {
    pub exchange: String,
    pub display_name: String,
    #[serde(flatten)]
    pub summary: MarketSummary,
}

async fn find_exchange_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<exchange::Model>, DbErr> {
    Exchanges::find()
        .filter(ExchangeColumn::Name.eq(name))
        .one(db)
        .await
}

/// Titres formatés + résumé de marché d'une place, triés par symbole
async fn exchange_listing(
    db: &DatabaseConnection,
    exchange: &exchange::Model,
) -> Result<(Vec<FormattedStock>, MarketSummary), DbErr> {
    let stocks = Stocks::find()
        .filter(StockColumn::ExchangeId.eq(exchange.id))
        .order_by_asc(StockColumn::Symbol)
        .all(db)
        .await?;

    let summary = market_service::summarize(&stocks);
    let formatted = stocks
        .into_iter()
        .map(|s| FormattedStock::from_stock(s, &exchange.name))
        .collect();

    Ok((formatted, summary))
}

/// GET /api/stocks/update/{exchange} - Tick de prix (PUBLIC)
/// Applique une marche aléatoire ±2% à chaque titre de la place, puis
/// renvoie le listing complet plus les deltas pour l'animation UI.
#[get("/stocks/update/{exchange}")]
pub async fn update_stocks(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let exchange_name = path.into_inner();

    // 1. Résoudre la place de marché
    let exchange = match find_exchange_by_name(db.get_ref(), &exchange_name).await {
        Ok(Some(exchange)) => exchange,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Exchange not found"
            }));
        }
        Err(e) => {
            log::error!("Update stocks error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Tick sur tous les titres
    let stock_changes = match MarketService::tick_exchange(db.get_ref(), exchange.id).await {
        Ok(changes) => changes,
        Err(e) => {
            log::error!("Update stocks error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 3. Relire les titres mis à jour avec les champs formatés
    let (formatted_stocks, market_summary) =
        match exchange_listing(db.get_ref(), &exchange).await {
            Ok(listing) => listing,
            Err(e) => {
                log::error!("Update stocks error: {}", e);
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }));
            }
        };

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Stocks updated successfully",
        "exchange": ExchangeInfo {
            id: exchange.id,
            name: exchange.name,
            display_name: exchange.display_name,
        },
        "stocks": formatted_stocks,
        "stockChanges": stock_changes,
        "marketSummary": market_summary,
        "lastUpdated": Utc::now(),
    }))
}

/// GET /api/stocks/{exchange} - Listing d'une place (PUBLIC)
#[get("/stocks/{exchange}")]
pub async fn get_stocks(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let exchange_name = path.into_inner();

    let exchange = match find_exchange_by_name(db.get_ref(), &exchange_name).await {
        Ok(Some(exchange)) => exchange,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Exchange not found"
            }));
        }
        Err(e) => {
            log::error!("Fetch stocks error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let (formatted_stocks, market_summary) =
        match exchange_listing(db.get_ref(), &exchange).await {
            Ok(listing) => listing,
            Err(e) => {
                log::error!("Fetch stocks error: {}", e);
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }));
            }
        };

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Stocks fetched successfully",
        "exchange": ExchangeInfo {
            id: exchange.id,
            name: exchange.name,
            display_name: exchange.display_name,
        },
        "stocks": formatted_stocks,
        "marketSummary": market_summary,
        "lastUpdated": Utc::now(),
    }))
}

/// GET /api/admin/stocks - Tous les titres, toutes places (PROTÉGÉE admin)
#[get("/admin/stocks")]
pub async fn get_all_stocks(
    _admin_user: AdminUser,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let exchanges = match Exchanges::find()
        .order_by_asc(ExchangeColumn::Name)
        .all(db.get_ref())
        .await
    {
        Ok(exchanges) => exchanges,
        Err(e) => {
            log::error!("Fetch all stocks error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let mut all_stocks: Vec<FormattedStock> = Vec::new();
    let mut summaries: Vec<ExchangeSummary> = Vec::new();

    // 1 place à la fois, triée par code puis symbole
    for exchange in &exchanges {
        match exchange_listing(db.get_ref(), exchange).await {
            Ok((formatted, summary)) => {
                all_stocks.extend(formatted);
                summaries.push(ExchangeSummary {
                    exchange: exchange.name.clone(),
                    display_name: exchange.display_name.clone(),
                    summary,
                });
            }
            Err(e) => {
                log::error!("Fetch all stocks error: {}", e);
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }));
            }
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "message": "All stocks fetched successfully",
        "stocks": all_stocks,
        "marketSummary": summaries,
        "lastUpdated": Utc::now(),
    }))
}

/// POST /api/admin/stocks - Créer un titre (PROTÉGÉE admin)
#[post("/admin/stocks")]
pub async fn create_stock(
    _admin_user: AdminUser,
    body: web::Json<CreateStockRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(errors);
    }

    // 1. Résoudre la place de marché
    let exchange = match find_exchange_by_name(db.get_ref(), &body.exchange_name).await {
        Ok(Some(exchange)) => exchange,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Exchange not found"
            }));
        }
        Err(e) => {
            log::error!("Stock creation error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    // 2. Insérer — la contrainte UNIQUE (exchange_id, symbol) détecte le doublon
    let new_stock = StockActiveModel {
        exchange_id: Set(exchange.id),
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
            "message": "Stock created successfully",
            "stock": stock,
        })),
        Err(e) if is_unique_violation(&e) => HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Stock with this symbol already exists for this exchange"
        })),
        Err(e) => {
            log::error!("Stock creation error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// Insère un lot de titres dans une seule transaction.
/// Les éléments invalides ou en doublon sont sautés et signalés; les
/// insertions réussies sont validées ensemble au commit.
async fn bulk_insert_stocks(
    db: &DatabaseConnection,
    exchange_id: i32,
    items: Vec<BulkStockItem>,
) -> Result<(Vec<stock::Model>, Vec<BulkStockError>), DbErr> {
    let txn = db.begin().await?;
    let mut created = Vec::new();
    let mut errors = Vec::new();

    for item in items {
        let (symbol, name) = match (&item.symbol, &item.name) {
            (Some(s), Some(n)) if !s.is_empty() && !n.is_empty() => (s.clone(), n.clone()),
            _ => {
                errors.push(BulkStockError {
                    symbol: item.symbol.clone(),
                    error: "Symbol and name are required".to_string(),
                });
                continue;
            }
        };

        // Pré-check dans la transaction : un doublon doit être sauté sans
        // avorter la transaction entière (une violation de contrainte
        // avorterait la txn Postgres et perdrait les insertions déjà faites)
        let existing = Stocks::find()
            .filter(StockColumn::ExchangeId.eq(exchange_id))
            .filter(StockColumn::Symbol.eq(&symbol))
            .one(&txn)
            .await?;

        if existing.is_some() {
            errors.push(BulkStockError {
                symbol: Some(symbol),
                error: "Stock with this symbol already exists for this exchange".to_string(),
            });
            continue;
        }

        let new_stock = StockActiveModel {
            exchange_id: Set(exchange_id),
            symbol: Set(symbol),
            name: Set(name),
            buy_price: Set(item.buy_price.unwrap_or(Decimal::ZERO)),
            sell_price: Set(item.sell_price.unwrap_or(Decimal::ZERO)),
            high: Set(item.high.unwrap_or(Decimal::ZERO)),
            low: Set(item.low.unwrap_or(Decimal::ZERO)),
            open: Set(item.open.unwrap_or(Decimal::ZERO)),
            last: Set(item.last.unwrap_or(Decimal::ZERO)),
            change: Set(item.change.unwrap_or(Decimal::ZERO)),
            ..Default::default()
        };

        created.push(new_stock.insert(&txn).await?);
    }

    txn.commit().await?;

    Ok((created, errors))
}

/// POST /api/admin/stocks/bulk - Créer plusieurs titres (PROTÉGÉE admin)
#[post("/admin/stocks/bulk")]
pub async fn create_stocks_bulk(
    _admin_user: AdminUser,
    body: web::Json<BulkCreateStocksRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let body = body.into_inner();

    if body.exchange_name.is_empty() || body.stocks.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Exchange name and array of stocks are required"
        }));
    }

    let exchange = match find_exchange_by_name(db.get_ref(), &body.exchange_name).await {
        Ok(Some(exchange)) => exchange,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Exchange not found"
            }));
        }
        Err(e) => {
            log::error!("Bulk stock creation error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    match bulk_insert_stocks(db.get_ref(), exchange.id, body.stocks).await {
        Ok((created, errors)) => HttpResponse::Created().json(serde_json::json!({
            "message": format!("{} stocks created successfully", created.len()),
            "stocks": created,
            "errors": errors,
        })),
        Err(e) => {
            log::error!("Bulk stock creation error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// POST /api/admin/market/simulate - Simulation de tendance (PROTÉGÉE admin)
#[post("/admin/market/simulate")]
pub async fn simulate_market(
    _admin_user: AdminUser,
    body: web::Json<SimulateMarketRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let body = body.into_inner();

    if body.exchange_name.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Exchange name is required"
        }));
    }

    let trend = body.trend.unwrap_or_else(|| "random".to_string());
    let magnitude = body.magnitude.unwrap_or_else(|| "medium".to_string());

    let exchange = match find_exchange_by_name(db.get_ref(), &body.exchange_name).await {
        Ok(Some(exchange)) => exchange,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Exchange not found"
            }));
        }
        Err(e) => {
            log::error!("Market simulation error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let affected_stocks =
        match MarketService::simulate_market(db.get_ref(), exchange.id, &trend, &magnitude).await {
            Ok(affected) => affected,
            Err(e) => {
                log::error!("Market simulation error: {}", e);
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }));
            }
        };

    let market_summary = match MarketService::market_summary(db.get_ref(), exchange.id).await {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Market simulation error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "message": format!(
            "Market trend simulation ({}, {}) applied successfully",
            trend, magnitude
        ),
        "marketSummary": market_summary,
        "affectedStocks": affected_stocks,
        "trend": trend,
        "magnitude": magnitude,
        "timestamp": Utc::now(),
    }))
}

pub fn stock_routes(cfg: &mut web::ServiceConfig) {
    // update_stocks enregistré avant get_stocks : le chemin littéral
    // /stocks/update/... ne doit jamais être capturé par {exchange}
    cfg.service(update_stocks)
        .service(get_stocks)
        .service(get_all_stocks)
        .service(create_stock)
        .service(create_stocks_bulk)
        .service(simulate_market);
}
