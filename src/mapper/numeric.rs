//! Numeric sanitizers with plausibility filters for listing fields.

use crate::normalizer::{extract_numeric, normalize_whitespace};
use regex::Regex;
use std::sync::LazyLock;

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid year regex"));
static HP_UNIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)ch").expect("valid hp unit regex"));
static TORQUE_UNIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)nm").expect("valid torque unit regex"));
static VARIANT_CV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2,3})\s*cv").expect("valid variant cv regex"));

/// Odometer values sellers type when they do not want to give one.
const PLACEHOLDER_KM: &[u64] = &[1234, 12345, 123456, 1234567, 12345678, 1111, 2222, 11111, 22222];

/// Price in dinars. Two or three digit prices are read as thousands.
pub fn map_price(raw: Option<&str>) -> Option<i64> {
    let raw = raw.filter(|r| !r.is_empty())?;
    let price = extract_numeric(raw);
    let digits = price.to_string();

    if price == 0
        || digits.len() == 1
        || (digits.len() == 4 && !digits.contains("00"))
        || ["123", "111", "999"].iter().any(|junk| digits.contains(junk))
    {
        return None;
    }
    if digits.len() == 2 || digits.len() == 3 {
        return Some(price as i64 * 1000);
    }
    i64::try_from(price).ok()
}

/// Mileage, padded according to how old the car is. Sellers of older cars
/// often type "180" for 180 000 km.
pub fn map_km(raw: Option<&str>, year: i32, current_year: i32) -> Option<i64> {
    let km = extract_numeric(raw?);

    if year < current_year - 12 {
        match km {
            0..100 => return Some(400_000),
            100..1_000 => return Some(km as i64 * 1_000),
            1_000..10_000 => return Some(km as i64 * 100),
            10_000..25_000 => return Some(km as i64 * 10),
            _ => {}
        }
    }
    if year < current_year - 3 {
        match km {
            0 => return None,
            1..10 => return Some(km as i64 * 10_000),
            10..100 => return Some(km as i64 * 1_000),
            100..1_000 => return Some(km as i64 * 100),
            _ => {}
        }
    }

    if km.to_string().contains("999") || PLACEHOLDER_KM.contains(&km) {
        return None;
    }
    i64::try_from(km).ok()
}

/// Local 8-digit phone number, dropping any country prefix.
pub fn map_phone_number(raw: Option<&str>) -> Option<u32> {
    let raw = raw.filter(|r| !r.is_empty())?;
    let digits = extract_numeric(raw).to_string();
    if digits.len() < 8 {
        return None;
    }
    digits[digits.len() - 8..].parse().ok()
}

pub fn map_year(raw: Option<&str>) -> Option<i32> {
    YEAR.find(raw?).and_then(|m| m.as_str().parse().ok())
}

fn parse_unit_value(raw: &str, unit: &Regex) -> Option<i64> {
    let stripped = normalize_whitespace(&unit.replace_all(raw, ""));
    let value: f64 = if stripped.is_empty() { 0.0 } else { stripped.parse().ok()? };
    if value == 0.0 || !value.is_finite() {
        return None;
    }
    Some(value.round() as i64)
}

/// Horsepower from tuning tables ("150 ch").
pub fn extract_hp(raw: Option<&str>) -> Option<i64> {
    parse_unit_value(raw?, &HP_UNIT)
}

/// Torque from tuning tables ("320 Nm").
pub fn extract_torque(raw: Option<&str>) -> Option<i64> {
    parse_unit_value(raw?, &TORQUE_UNIT)
}

/// Horsepower written in a trim name, e.g. "1.6 TDI 115 cv".
pub fn hp_from_variant(variant: Option<&str>) -> Option<i64> {
    VARIANT_CV
        .captures(variant?)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|hp| *hp > 0)
}

/// Fiscal horsepower; zero means the field was junk.
pub fn map_fiscal_hp(raw: Option<&str>) -> Option<i64> {
    let raw = raw.filter(|r| !r.trim().is_empty())?;
    i64::try_from(extract_numeric(raw)).ok().filter(|cv| *cv > 0)
}
