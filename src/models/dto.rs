//pour les réponses structurées
use serde::Serialize;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use crate::models::{stock, user_stock};
use crate::utils::format::{decimal_to_f64, format_change, format_change_percent, format_price};

// Infos de la place de marché jointes aux listings de titres
#[derive(Debug, Serialize)]
pub struct ExchangeInfo {
    pub id: i32,
    pub name: String,
    pub display_name: String,
}

// 1 titre avec les champs dérivés pour l'affichage UI
#[derive(Debug, Serialize)]
pub struct FormattedStock {
    pub id: i32,
    pub symbol: String,
    pub name: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub open: Decimal,
    pub last: Decimal,
    pub change: Decimal,
    pub exchange: String,
    pub updated_at: DateTime<FixedOffset>,
    pub is_up: bool,
    pub buy_price_formatted: String,
    pub sell_price_formatted: String,
    pub high_formatted: String,
    pub low_formatted: String,
    pub open_formatted: String,
    pub last_formatted: String,
    pub change_formatted: String, // Signé: "+1.23" ou "-1.23"
    pub change_percent: String,   // change / open * 100, 2 décimales
}

impl FormattedStock {
    pub fn from_stock(stock: stock::Model, exchange: &str) -> Self {
        Self::build(
            stock.id,
            stock.symbol,
            stock.name,
            stock.buy_price,
            stock.sell_price,
            stock.high,
            stock.low,
            stock.open,
            stock.last,
            stock.change,
            exchange,
            stock.updated_at,
        )
    }

    pub fn from_user_stock(stock: user_stock::Model) -> Self {
        Self::build(
            stock.id,
            stock.symbol,
            stock.name,
            stock.buy_price,
            stock.sell_price,
            stock.high,
            stock.low,
            stock.open,
            stock.last,
            stock.change,
            "",
            stock.updated_at,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        id: i32,
        symbol: String,
        name: String,
        buy_price: Decimal,
        sell_price: Decimal,
        high: Decimal,
        low: Decimal,
        open: Decimal,
        last: Decimal,
        change: Decimal,
        exchange: &str,
        updated_at: DateTime<FixedOffset>,
    ) -> Self {
        FormattedStock {
            id,
            symbol,
            name,
            buy_price,
            sell_price,
            high,
            low,
            open,
            last,
            change,
            exchange: exchange.to_string(),
            updated_at,
            is_up: change >= Decimal::ZERO,
            buy_price_formatted: format_price(buy_price),
            sell_price_formatted: format_price(sell_price),
            high_formatted: format_price(high),
            low_formatted: format_price(low),
            open_formatted: format_price(open),
            last_formatted: format_price(last),
            change_formatted: format_change(change),
            change_percent: format_change_percent(change, open),
        }
    }
}

// Statistiques agrégées d'une place de marché
#[derive(Debug, Serialize)]
pub struct MarketSummary {
    pub total_stocks: u64,
    pub up_stocks: u64,   // change >= 0
    pub down_stocks: u64, // change < 0
    pub avg_change: Decimal,
    pub last_updated: Option<DateTime<FixedOffset>>,
}

// Delta d'un titre après un tick, pour l'animation côté client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub id: i32,
    pub symbol: String,
    pub old_value: f64,
    pub new_value: f64,
    pub direction: String, // 'up' ou 'down'
    pub percent_change: f64,
}

impl StockChange {
    pub fn new(stock: &stock::Model, new_last: f64, change_percent: f64) -> Self {
        StockChange {
            id: stock.id,
            symbol: stock.symbol.clone(),
            old_value: decimal_to_f64(stock.last),
            new_value: new_last,
            direction: if change_percent >= 0.0 { "up" } else { "down" }.to_string(),
            percent_change: change_percent * 100.0,
        }
    }
}

// Statistiques du portefeuille personnel d'un utilisateur
#[derive(Debug, Serialize)]
pub struct PortfolioSummary {
    pub total_stocks: u64,
    pub up_stocks: u64,
    pub down_stocks: u64,
    pub avg_change: Decimal,
    pub last_updated: Option<DateTime<FixedOffset>>,
    pub portfolio_value: Decimal, // Somme naïve des 'last'
}

// Utilisateur tel que listé par l'admin (hash masqué)
#[derive(Debug, Serialize)]
pub struct MaskedUser {
    pub id: i32,
    pub name: String,
    pub password: String, // Toujours "********"
    pub role: String,
    pub admin_id: Option<i32>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}
