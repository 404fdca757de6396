use sea_orm::*;
use rand::Rng;
use rust_decimal::Decimal;
use chrono::Utc;

use crate::models::stock;
use crate::models::dto::{MarketSummary, StockChange};
use crate::utils::format::{decimal_to_f64, f64_to_price};

pub struct MarketService;

/// Prix courants d'un titre, en f64 pour l'arithmétique du tick
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPrices {
    pub buy_price: f64,
    pub sell_price: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub last: f64,
}

impl CurrentPrices {
    pub fn from_stock(stock: &stock::Model) -> Self {
        CurrentPrices {
            buy_price: decimal_to_f64(stock.buy_price),
            sell_price: decimal_to_f64(stock.sell_price),
            high: decimal_to_f64(stock.high),
            low: decimal_to_f64(stock.low),
            open: decimal_to_f64(stock.open),
            last: decimal_to_f64(stock.last),
        }
    }
}

/// Prix recalculés après un tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickedPrices {
    pub buy_price: f64,
    pub sell_price: f64,
    pub high: f64,
    pub low: f64,
    pub last: f64,
    pub change: f64,
}

/// Applique une variation de prix à un titre (fonction pure).
/// change_percent est une fraction: 0.02 = +2%.
///
/// - buy/sell/last : ancien prix * (1 + change_percent)
/// - high/low : ratchets monotones (jamais réinitialisés)
/// - change : nouveau last - open (open est figé à la création)
pub fn apply_tick(prices: &CurrentPrices, change_percent: f64) -> TickedPrices {
    let new_last = prices.last * (1.0 + change_percent);

    TickedPrices {
        buy_price: prices.buy_price * (1.0 + change_percent),
        sell_price: prices.sell_price * (1.0 + change_percent),
        high: prices.high.max(new_last),
        low: prices.low.min(new_last),
        last: new_last,
        change: new_last - prices.open,
    }
}

/// Tirage du tick standard: uniforme entre -2% et +2%
pub fn random_walk_percent<R: Rng>(rng: &mut R) -> f64 {
    (rng.r#gen::<f64>() * 4.0 - 2.0) / 100.0
}

/// Bande [min, max] en pourcents pour un préréglage de magnitude.
/// Magnitude inconnue: retombe sur 'medium'.
pub fn magnitude_band(magnitude: &str) -> (f64, f64) {
    match magnitude {
        "small" => (-1.0, 1.0),
        "large" => (-5.0, 5.0),
        "crash" => (-15.0, -5.0),
        "boom" => (5.0, 15.0),
        _ => (-3.0, 3.0), // medium
    }
}

/// Tirage pour la simulation de marché admin, selon le profil de tendance.
/// Retourne une fraction (0.02 = +2%).
pub fn trend_change_percent<R: Rng>(trend: &str, magnitude: &str, rng: &mut R) -> f64 {
    let (min, max) = magnitude_band(magnitude);
    let r = rng.r#gen::<f64>();

    match trend {
        // Toujours positif
        "up" => (r * (max - 0.1) + 0.1) / 100.0,
        // Toujours négatif
        "down" => (r * (min + 0.1) - 0.1) / 100.0,
        // Amplitude renforcée dans les deux sens
        "volatile" => (r * (max - min) + min) * 1.5 / 100.0,
        // random - peut aller dans les deux sens
        _ => (r * (max - min) + min) / 100.0,
    }
}

/// (base, variance) des prix générés pour une nouvelle place de marché,
/// selon son code
pub fn sample_price_range(name: &str) -> (f64, f64) {
    match name {
        "BSE" | "NSE" => (500.0, 10000.0),
        "FUTURES" => (5000.0, 20000.0),
        "OPTIONS" => (100.0, 1000.0),
        "MCX" => (1000.0, 50000.0),
        "NCDEX" => (200.0, 5000.0),
        _ => (1000.0, 10000.0),
    }
}

/// Un titre d'exemple généré à la création d'une place de marché
#[derive(Debug, Clone)]
pub struct SampleStock {
    pub symbol: String,
    pub name: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub last: f64,
    pub change: f64,
}

/// Génère les 10 titres d'exemple d'une nouvelle place de marché.
/// open et last tombent dans [low, high]; change = last - open.
pub fn generate_sample_stocks<R: Rng>(
    name: &str,
    display_name: &str,
    rng: &mut R,
) -> Vec<SampleStock> {
    let (base, variance) = sample_price_range(name);
    let mut samples = Vec::with_capacity(10);

    for i in 1..=10 {
        let buy_price = rng.r#gen::<f64>() * variance + base;
        let sell_price = buy_price * (1.0 + rng.r#gen::<f64>() * 0.05);
        let high = sell_price * (1.0 + rng.r#gen::<f64>() * 0.03);
        let low = buy_price * (1.0 - rng.r#gen::<f64>() * 0.03);
        let open = low + rng.r#gen::<f64>() * (high - low);
        let last = low + rng.r#gen::<f64>() * (high - low);

        samples.push(SampleStock {
            symbol: format!("{}-{}", name, i),
            name: format!("{} Stock {}", display_name, i),
            buy_price,
            sell_price,
            high,
            low,
            open,
            last,
            change: last - open,
        });
    }

    samples
}

impl MarketService {
    /// Insère les titres d'exemple d'une place de marché fraîchement créée
    pub async fn seed_sample_stocks(
        db: &DatabaseConnection,
        exchange_id: i32,
        name: &str,
        display_name: &str,
    ) -> Result<usize, DbErr> {
        let samples = generate_sample_stocks(name, display_name, &mut rand::thread_rng());
        let count = samples.len();

        for sample in samples {
            let new_stock = stock::ActiveModel {
                exchange_id: Set(exchange_id),
                symbol: Set(sample.symbol),
                name: Set(sample.name),
                buy_price: Set(f64_to_price(sample.buy_price)),
                sell_price: Set(f64_to_price(sample.sell_price)),
                high: Set(f64_to_price(sample.high)),
                low: Set(f64_to_price(sample.low)),
                open: Set(f64_to_price(sample.open)),
                last: Set(f64_to_price(sample.last)),
                change: Set(f64_to_price(sample.change)),
                ..Default::default()
            };

            new_stock.insert(db).await?;
        }

        Ok(count)
    }

    /// Tick standard (±2%) sur tous les titres d'une place de marché.
    /// Retourne les deltas par titre pour l'animation côté client.
    ///
    /// Pas de verrou : deux ticks concurrents sur la même place peuvent
    /// s'entrelacer (valeurs simulées, perte d'update tolérée).
    pub async fn tick_exchange(
        db: &DatabaseConnection,
        exchange_id: i32,
    ) -> Result<Vec<StockChange>, DbErr> {
        let stocks = stock::Entity::find()
            .filter(stock::Column::ExchangeId.eq(exchange_id))
            .all(db)
            .await?;

        let mut stock_changes = Vec::with_capacity(stocks.len());

        for s in stocks {
            let change_percent = random_walk_percent(&mut rand::thread_rng());
            let ticked = apply_tick(&CurrentPrices::from_stock(&s), change_percent);

            stock_changes.push(StockChange::new(&s, ticked.last, change_percent));

            Self::persist_tick(db, s, &ticked).await?;
        }

        Ok(stock_changes)
    }

    /// Simulation de tendance (admin) sur tous les titres d'une place.
    /// Retourne le nombre de titres touchés.
    pub async fn simulate_market(
        db: &DatabaseConnection,
        exchange_id: i32,
        trend: &str,
        magnitude: &str,
    ) -> Result<u64, DbErr> {
        let stocks = stock::Entity::find()
            .filter(stock::Column::ExchangeId.eq(exchange_id))
            .all(db)
            .await?;

        let affected = stocks.len() as u64;

        for s in stocks {
            let change_percent = trend_change_percent(trend, magnitude, &mut rand::thread_rng());
            let ticked = apply_tick(&CurrentPrices::from_stock(&s), change_percent);

            Self::persist_tick(db, s, &ticked).await?;
        }

        Ok(affected)
    }

    /// Statistiques agrégées d'une place de marché, calculées en Rust
    /// depuis les lignes chargées
    pub async fn market_summary(
        db: &DatabaseConnection,
        exchange_id: i32,
    ) -> Result<MarketSummary, DbErr> {
        let stocks = stock::Entity::find()
            .filter(stock::Column::ExchangeId.eq(exchange_id))
            .all(db)
            .await?;

        Ok(summarize(&stocks))
    }

    async fn persist_tick(
        db: &DatabaseConnection,
        model: stock::Model,
        ticked: &TickedPrices,
    ) -> Result<(), DbErr> {
        let mut active: stock::ActiveModel = model.into();
        active.buy_price = Set(f64_to_price(ticked.buy_price));
        active.sell_price = Set(f64_to_price(ticked.sell_price));
        active.high = Set(f64_to_price(ticked.high));
        active.low = Set(f64_to_price(ticked.low));
        active.last = Set(f64_to_price(ticked.last));
        active.change = Set(f64_to_price(ticked.change));
        active.updated_at = Set(Utc::now().fixed_offset());

        active.update(db).await?;
        Ok(())
    }
}

/// Compte les hausses/baisses et moyenne les variations d'un lot de titres
pub fn summarize(stocks: &[stock::Model]) -> MarketSummary {
    let total_stocks = stocks.len() as u64;
    let up_stocks = stocks
        .iter()
        .filter(|s| s.change >= Decimal::ZERO)
        .count() as u64;
    let down_stocks = total_stocks - up_stocks;

    let avg_change = if total_stocks > 0 {
        let sum: Decimal = stocks.iter().map(|s| s.change).sum();
        (sum / Decimal::from(total_stocks)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let last_updated = stocks.iter().map(|s| s.updated_at).max();

    MarketSummary {
        total_stocks,
        up_stocks,
        down_stocks,
        avg_change,
        last_updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prices() -> CurrentPrices {
        CurrentPrices {
            buy_price: 100.0,
            sell_price: 102.0,
            high: 110.0,
            low: 95.0,
            open: 100.0,
            last: 105.0,
        }
    }

    #[test]
    fn test_apply_tick_change_equals_last_minus_open() {
        let ticked = apply_tick(&prices(), 0.015);

        assert!((ticked.change - (ticked.last - 100.0)).abs() < 1e-9);
        assert!((ticked.last - 105.0 * 1.015).abs() < 1e-9);
    }

    #[test]
    fn test_apply_tick_high_low_ratchet() {
        let mut current = prices();

        // Séquence de ticks: high ne descend jamais, low ne monte jamais
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let previous_high = current.high;
            let previous_low = current.low;

            let ticked = apply_tick(&current, random_walk_percent(&mut rng));
            assert!(ticked.high >= previous_high);
            assert!(ticked.low <= previous_low);

            current = CurrentPrices {
                buy_price: ticked.buy_price,
                sell_price: ticked.sell_price,
                high: ticked.high,
                low: ticked.low,
                open: current.open,
                last: ticked.last,
            };
        }
    }

    #[test]
    fn test_apply_tick_upward_extends_high() {
        let ticked = apply_tick(&prices(), 0.10);

        // 105 * 1.10 = 115.5 > ancien high 110
        assert!((ticked.high - 115.5).abs() < 1e-9);
        assert!((ticked.low - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_random_walk_percent_bounds() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let p = random_walk_percent(&mut rng);
            assert!(p >= -0.02 && p < 0.02);
        }
    }

    #[test]
    fn test_magnitude_bands() {
        assert_eq!(magnitude_band("small"), (-1.0, 1.0));
        assert_eq!(magnitude_band("medium"), (-3.0, 3.0));
        assert_eq!(magnitude_band("large"), (-5.0, 5.0));
        assert_eq!(magnitude_band("crash"), (-15.0, -5.0));
        assert_eq!(magnitude_band("boom"), (5.0, 15.0));
        // Inconnue: retombe sur medium
        assert_eq!(magnitude_band("gigantic"), (-3.0, 3.0));
    }

    #[test]
    fn test_trend_up_always_positive() {
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..1000 {
            let p = trend_change_percent("up", "medium", &mut rng);
            assert!(p > 0.0 && p <= 0.03);
        }
    }

    #[test]
    fn test_trend_down_always_negative() {
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..1000 {
            let p = trend_change_percent("down", "medium", &mut rng);
            assert!(p < 0.0 && p >= -0.03);
        }
    }

    #[test]
    fn test_trend_random_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..1000 {
            let p = trend_change_percent("random", "large", &mut rng);
            assert!(p >= -0.05 && p <= 0.05);
        }
    }

    #[test]
    fn test_trend_volatile_widens_band() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen_beyond_band = false;

        for _ in 0..1000 {
            let p = trend_change_percent("volatile", "medium", &mut rng);
            // Facteur 1.5: [-4.5%, +4.5%]
            assert!(p >= -0.045 && p <= 0.045);
            if p.abs() > 0.03 {
                seen_beyond_band = true;
            }
        }

        assert!(seen_beyond_band);
    }

    #[test]
    fn test_trend_crash_band() {
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..1000 {
            let p = trend_change_percent("random", "crash", &mut rng);
            assert!(p >= -0.15 && p <= -0.05);
        }
    }

    #[test]
    fn test_sample_price_ranges() {
        assert_eq!(sample_price_range("BSE"), (500.0, 10000.0));
        assert_eq!(sample_price_range("NSE"), (500.0, 10000.0));
        assert_eq!(sample_price_range("FUTURES"), (5000.0, 20000.0));
        assert_eq!(sample_price_range("OPTIONS"), (100.0, 1000.0));
        assert_eq!(sample_price_range("MCX"), (1000.0, 50000.0));
        assert_eq!(sample_price_range("NCDEX"), (200.0, 5000.0));
        assert_eq!(sample_price_range("AUTRE"), (1000.0, 10000.0));
    }

    #[test]
    fn test_generate_sample_stocks_invariants() {
        let mut rng = StdRng::seed_from_u64(9);
        let samples = generate_sample_stocks("BSE", "Bombay Stock Exchange", &mut rng);

        assert_eq!(samples.len(), 10);

        for (i, s) in samples.iter().enumerate() {
            assert_eq!(s.symbol, format!("BSE-{}", i + 1));
            assert_eq!(s.name, format!("Bombay Stock Exchange Stock {}", i + 1));

            assert!(s.buy_price >= 500.0 && s.buy_price <= 10500.0);
            assert!(s.high >= s.low);
            assert!(s.open >= s.low && s.open <= s.high);
            assert!(s.last >= s.low && s.last <= s.high);
            assert!((s.change - (s.last - s.open)).abs() < 1e-9);
        }
    }
}
