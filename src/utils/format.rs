// Helpers de formatage pour les champs dérivés des réponses API
// (équivalent du toFixed(2) côté UI)

use rust_decimal::Decimal;

/// Convertit un Decimal en f64 (les prix restent dans une plage sûre)
pub fn decimal_to_f64(decimal: Decimal) -> f64 {
    decimal.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Convertit un prix calculé en f64 vers un Decimal arrondi à 2 décimales
pub fn f64_to_price(value: f64) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

/// "1234.5" -> "1234.50"
pub fn format_price(value: Decimal) -> String {
    format!("{:.2}", decimal_to_f64(value))
}

/// Change signé: "+1.23" si >= 0, "-1.23" sinon
pub fn format_change(change: Decimal) -> String {
    let value = decimal_to_f64(change);
    if value >= 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// change / open * 100, 2 décimales ("0.00" si open est nul)
pub fn format_change_percent(change: Decimal, open: Decimal) -> String {
    let open = decimal_to_f64(open);
    if open == 0.0 {
        return "0.00".to_string();
    }
    format!("{:.2}", decimal_to_f64(change) / open * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_price_two_decimals() {
        assert_eq!(format_price(d("1234.5")), "1234.50");
        assert_eq!(format_price(d("0")), "0.00");
        assert_eq!(format_price(d("99.999")), "100.00");
    }

    #[test]
    fn test_format_change_signed() {
        assert_eq!(format_change(d("1.234")), "+1.23");
        assert_eq!(format_change(d("0")), "+0.00");
        assert_eq!(format_change(d("-2.5")), "-2.50");
    }

    #[test]
    fn test_change_percent() {
        // change=5, open=200 -> 2.50%
        assert_eq!(format_change_percent(d("5"), d("200")), "2.50");
        assert_eq!(format_change_percent(d("-5"), d("200")), "-2.50");
    }

    #[test]
    fn test_change_percent_zero_open() {
        assert_eq!(format_change_percent(d("5"), d("0")), "0.00");
    }

    #[test]
    fn test_f64_to_price_rounds() {
        assert_eq!(f64_to_price(12.346), d("12.35"));
        assert_eq!(f64_to_price(100.0), d("100"));
    }
}
