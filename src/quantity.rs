//! # Quantity Module
//!
//! Best-effort interpretation of free-text ingredient quantities such as
//! "2 cups", "1/2 tbsp", "1 1/2 cups", "200g" or "to taste".
//!
//! ## Features
//!
//! - Fractions, mixed numbers, decimals (dot or comma) and integers
//! - A default of `1` for quantities without digits, so aggregation never zeroes out
//! - Extraction of the unit token that follows the leading number
//! - Display formatting with at most two decimals
//!
//! Units are not normalized: "tbsp" and "tablespoon" are distinct units.

use lazy_static::lazy_static;
use regex::Regex;

/// Value used when a quantity contains no number ("to taste", "a pinch")
pub const DEFAULT_QUANTITY: f64 = 1.0;

lazy_static! {
    /// Optional whole part, numerator and denominator around the first slash
    static ref FRACTION_REGEX: Regex =
        Regex::new(r"(?:(\d+)\s+)?(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)")
            .expect("Fraction pattern should be valid");
    static ref NUMBER_REGEX: Regex =
        Regex::new(r"\d+(?:[.,]\d+)?").expect("Number pattern should be valid");
    /// Alphabetic token right after a run of digits, dots, slashes and whitespace
    static ref UNIT_REGEX: Regex = Regex::new(r"[0-9.,/\s]*[0-9][0-9.,/\s]*([a-zA-Z]+)")
        .expect("Unit pattern should be valid");
}

/// Plural units that read better in the singular next to a quantity of exactly 1
const SINGULAR_UNITS: &[(&str, &str)] = &[
    ("cups", "cup"),
    ("tablespoons", "tablespoon"),
    ("teaspoons", "teaspoon"),
    ("tbsps", "tbsp"),
    ("tsps", "tsp"),
    ("grams", "gram"),
    ("kilograms", "kilogram"),
    ("pounds", "pound"),
    ("lbs", "lb"),
    ("ounces", "ounce"),
    ("liters", "liter"),
    ("litres", "litre"),
    ("pints", "pint"),
    ("quarts", "quart"),
    ("gallons", "gallon"),
    ("cloves", "clove"),
    ("pieces", "piece"),
    ("slices", "slice"),
    ("cans", "can"),
    ("bottles", "bottle"),
    ("sticks", "stick"),
    ("packets", "packet"),
    ("pinches", "pinch"),
    ("dashes", "dash"),
];

fn parse_number(token: &str) -> Option<f64> {
    token.replace(',', ".").parse::<f64>().ok()
}

/// Parse a free-text quantity into a number
///
/// Precedence:
/// 1. A fraction around the first `/` (`"1/2 cup"` → 0.5, `"1 1/2 cups"` → 1.5) when the
///    denominator is non-zero
/// 2. The first decimal or integer token (`"2.5 kg"` → 2.5, `"1,5 l"` → 1.5)
/// 3. [`DEFAULT_QUANTITY`]
///
/// # Examples
///
/// ```rust
/// use easycook::quantity::parse_quantity;
///
/// assert_eq!(parse_quantity("3/4 cup"), 0.75);
/// assert_eq!(parse_quantity("2 cups"), 2.0);
/// assert_eq!(parse_quantity("to taste"), 1.0);
/// ```
pub fn parse_quantity(quantity: &str) -> f64 {
    if quantity.contains('/') {
        if let Some(caps) = FRACTION_REGEX.captures(quantity) {
            let numerator = caps.get(2).and_then(|m| parse_number(m.as_str()));
            let denominator = caps.get(3).and_then(|m| parse_number(m.as_str()));
            if let (Some(numerator), Some(denominator)) = (numerator, denominator) {
                if denominator != 0.0 {
                    let whole = caps
                        .get(1)
                        .and_then(|m| parse_number(m.as_str()))
                        .unwrap_or(0.0);
                    return whole + numerator / denominator;
                }
            }
        }
    }

    NUMBER_REGEX
        .find(quantity)
        .and_then(|m| parse_number(m.as_str()))
        .unwrap_or(DEFAULT_QUANTITY)
}

/// Extract the unit following the leading number of a quantity
///
/// Returns an empty string when no alphabetic token follows a number.
///
/// # Examples
///
/// ```rust
/// use easycook::quantity::extract_unit;
///
/// assert_eq!(extract_unit("2 cups"), "cups");
/// assert_eq!(extract_unit("200g"), "g");
/// assert_eq!(extract_unit("to taste"), "");
/// ```
pub fn extract_unit(quantity: &str) -> String {
    UNIT_REGEX
        .captures(quantity)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Format a number with at most two decimals, without trailing zeros
pub fn format_amount(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        return format!("{}", value.round() as i64);
    }

    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Format a merged quantity with its unit for display ("1 cup", "0.5 tsp", "3")
pub fn format_quantity(value: f64, unit: &str) -> String {
    let amount = format_amount(value);
    if unit.is_empty() {
        return amount;
    }

    let unit = if amount == "1" {
        SINGULAR_UNITS
            .iter()
            .find(|(plural, _)| plural.eq_ignore_ascii_case(unit))
            .map(|(_, singular)| *singular)
            .unwrap_or(unit)
    } else {
        unit
    };

    format!("{amount} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fraction() {
        assert_eq!(parse_quantity("1/2"), 0.5);
        assert_eq!(parse_quantity("1/2 tbsp"), 0.5);
        assert_eq!(parse_quantity("3 / 4 cup"), 0.75);
    }

    #[test]
    fn test_parse_mixed_number() {
        assert_eq!(parse_quantity("1 1/2 cups"), 1.5);
        assert_eq!(parse_quantity("2 1/4 tsp"), 2.25);
    }

    #[test]
    fn test_parse_zero_denominator_falls_back_to_first_number() {
        assert_eq!(parse_quantity("3/0 cups"), 3.0);
    }

    #[test]
    fn test_parse_decimal_and_integer() {
        assert_eq!(parse_quantity("2.5 kg"), 2.5);
        assert_eq!(parse_quantity("1,5 l"), 1.5);
        assert_eq!(parse_quantity("200g"), 200.0);
        assert_eq!(parse_quantity("about 3 medium"), 3.0);
    }

    #[test]
    fn test_parse_without_digits_defaults_to_one() {
        assert_eq!(parse_quantity("to taste"), DEFAULT_QUANTITY);
        assert_eq!(parse_quantity("a pinch"), DEFAULT_QUANTITY);
        assert_eq!(parse_quantity(""), DEFAULT_QUANTITY);
        assert_eq!(parse_quantity("and/or"), DEFAULT_QUANTITY);
    }

    #[test]
    fn test_extract_unit() {
        assert_eq!(extract_unit("2 cups"), "cups");
        assert_eq!(extract_unit("1/2 tbsp"), "tbsp");
        assert_eq!(extract_unit("200g"), "g");
        assert_eq!(extract_unit("2 medium-sized"), "medium");
        assert_eq!(extract_unit("1.5 kg"), "kg");
    }

    #[test]
    fn test_extract_unit_without_number() {
        assert_eq!(extract_unit("to taste"), "");
        assert_eq!(extract_unit("3"), "");
        assert_eq!(extract_unit(""), "");
    }

    #[test]
    fn test_units_are_not_normalized() {
        assert_ne!(extract_unit("1 tbsp"), extract_unit("1 tablespoon"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(4.0), "4");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_amount(1.0 / 3.0), "0.33");
        assert_eq!(format_amount(0.1 + 0.2), "0.3");
        assert_eq!(format_amount(2.999), "3");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(1.0, "cups"), "1 cup");
        assert_eq!(format_quantity(4.0, "cups"), "4 cups");
        assert_eq!(format_quantity(0.25, "tsp"), "0.25 tsp");
        assert_eq!(format_quantity(3.0, ""), "3");
        assert_eq!(format_quantity(1.0, "g"), "1 g");
    }
}
