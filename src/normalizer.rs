//! Text normalization for scraped car data.
//!
//! Everything here is pure: scraped strings in, cleaned strings (or `None`)
//! out. Field mappers compare against [`fold`]ed text; persisted identifiers
//! come from [`strip_diacritics_and_punctuation`].

use crate::model::NormalizeError;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static DECIMAL_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\.\d").expect("valid decimal pair regex"));

/// Marketing boilerplate removed from listing titles, applied in order.
const TITLE_NOISE: &[&str] = &[
    "VOITURE",
    "VEHICULE",
    "A VENDRE",
    "A VENTE",
    "VENTE",
    "AVENDRE",
    "AVANDRE",
    "AVANDR",
    "AVENDR",
    "A VANDRE",
    "VANDRE",
    "VOITUR",
    "TRES BELLE",
    "TRES BIEN",
    "BELLE",
    "BIEN",
];

const NULL_SENTINELS: &[&str] = &["null", "Null", "NULL"];

/// Collapses every whitespace run to a single space and trims the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Same as [`normalize_whitespace`] but `None` when nothing is left.
pub fn clean_or_none(s: Option<&str>) -> Option<String> {
    let cleaned = normalize_whitespace(s?);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

fn strip_marks(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Comparison form: accents removed, lowercased, whitespace collapsed.
pub fn fold(s: &str) -> String {
    normalize_whitespace(&strip_marks(s).to_lowercase())
}

/// True when the folded haystack contains any of the (already folded) needles.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let folded = fold(haystack);
    needles.iter().any(|n| folded.contains(n))
}

/// Slug identifier derived from a display name ("Land Rover" -> "land-rover").
///
/// Hyphens and underscores count as word separators so a slug maps to itself.
pub fn strip_diacritics_and_punctuation(s: &str) -> String {
    let kept: String = strip_marks(s)
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some(' ')
            } else {
                None
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Returns `None` for empty values and textual null sentinels, otherwise the
/// value stripped of backslashes, double quotes and tabs.
pub fn sanitize_for_persistence(s: Option<&str>) -> Option<String> {
    let s = s?;
    let trimmed = s.trim();
    if trimmed.is_empty()
        || trimmed == "N"
        || trimmed == "-"
        || NULL_SENTINELS.iter().any(|sentinel| s.contains(sentinel))
    {
        return None;
    }

    let sanitized: String = s
        .replace("\\t", "")
        .chars()
        .filter(|c| !matches!(c, '\\' | '"' | '\t'))
        .collect();
    Some(sanitized.trim().to_string())
}

/// Keeps the digits only and parses them; `0` when there are none.
pub fn extract_numeric(s: &str) -> u64 {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// First `D.D` occurrence, e.g. "2.0" out of "2.0 TDI 150".
pub fn extract_decimal_pair(s: &str) -> Option<String> {
    DECIMAL_PAIR.find(s).map(|m| m.as_str().to_string())
}

pub fn capitalize_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Converts a displacement in cm3 ("1968", "998 cm3") to litres ("2.0", "1.0").
///
/// Only the first four characters are considered and they must carry a
/// 3- or 4-digit number.
pub fn displacement_to_cylinder(raw: &str) -> Result<String, NormalizeError> {
    let head: String = raw.trim().chars().take(4).collect();
    let digits: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(NormalizeError::InvalidFormat(format!("no displacement digits in '{}'", raw)));
    }

    let cc: u32 = digits
        .parse()
        .map_err(|_| NormalizeError::InvalidFormat(format!("unparseable displacement '{}'", raw)))?;
    if !(100..=9999).contains(&cc) {
        return Err(NormalizeError::InvalidFormat(format!(
            "displacement '{}' must have 3 or 4 digits",
            raw
        )));
    }

    let tenths = ((cc as f64 / 100.0).round() as u32).min(99);
    Ok(format!("{}.{}", tenths / 10, tenths % 10))
}

/// Cleans a listing title for storage and duplicate detection.
pub fn clean_title(title: &str) -> Option<String> {
    let head: String = title.chars().take(75).collect();
    let mut upper = strip_marks(&sanitize_for_persistence(Some(&head))?).to_uppercase();

    upper = upper.replace("MERCEDESBENZ", "MERCEDES").replace("MERCEDES-BENZ", "MERCEDES");
    for noise in TITLE_NOISE {
        upper = upper.replacen(noise, "", 1);
    }

    let kept: String = upper
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let cleaned = normalize_whitespace(&kept);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_whitespace("  Golf \t 7\n GTI "), "Golf 7 GTI");
        assert_eq!(clean_or_none(Some("   ")), None);
        assert_eq!(clean_or_none(Some(" Clio ")), Some("Clio".into()));
    }

    #[test]
    fn slugs_display_names() {
        assert_eq!(strip_diacritics_and_punctuation("Land Rover"), "land-rover");
        assert_eq!(strip_diacritics_and_punctuation("Citroën"), "citroen");
        assert_eq!(strip_diacritics_and_punctuation("  Béja  Nord! "), "beja-nord");
        assert_eq!(strip_diacritics_and_punctuation("Mercedes-Benz"), "mercedes-benz");
        assert_eq!(strip_diacritics_and_punctuation("Garage l'Étoile"), "garage-letoile");
    }

    #[test]
    fn sanitizes_null_sentinels() {
        assert_eq!(sanitize_for_persistence(None), None);
        assert_eq!(sanitize_for_persistence(Some("  ")), None);
        assert_eq!(sanitize_for_persistence(Some("NULL")), None);
        assert_eq!(sanitize_for_persistence(Some(" N ")), None);
        assert_eq!(sanitize_for_persistence(Some("-")), None);
        assert_eq!(
            sanitize_for_persistence(Some(" 12 \"rue\" \\ de\tTunis ")),
            Some("12 rue  deTunis".into())
        );
    }

    #[test]
    fn extracts_numbers() {
        assert_eq!(extract_numeric("45 000 DT"), 45000);
        assert_eq!(extract_numeric("n/a"), 0);
        assert_eq!(extract_decimal_pair("2.0 TDI 150ch"), Some("2.0".into()));
        assert_eq!(extract_decimal_pair("TDI"), None);
    }

    #[test]
    fn capitalizes() {
        assert_eq!(capitalize_words("garage  EL amen"), "Garage El Amen");
    }

    #[test]
    fn converts_displacement() {
        assert_eq!(displacement_to_cylinder("1968").unwrap(), "2.0");
        assert_eq!(displacement_to_cylinder("1598 cm3").unwrap(), "1.6");
        assert_eq!(displacement_to_cylinder("998").unwrap(), "1.0");
        assert_eq!(displacement_to_cylinder("850").unwrap(), "0.9");
        assert_eq!(displacement_to_cylinder("901").unwrap(), "0.9");
        assert!(matches!(displacement_to_cylinder("12"), Err(NormalizeError::InvalidFormat(_))));
        assert!(matches!(displacement_to_cylinder("cm3"), Err(NormalizeError::InvalidFormat(_))));
    }

    #[test]
    fn cleans_titles() {
        assert_eq!(
            clean_title("Voiture à vendre Mercedes-Benz C220 très belle !!"),
            Some("MERCEDES C220".into())
        );
        assert_eq!(clean_title("🚗🚗"), None);
    }

    proptest! {
        #[test]
        fn slug_charset_and_idempotence(s in "\\PC{0,40}") {
            let once = strip_diacritics_and_punctuation(&s);
            prop_assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert_eq!(strip_diacritics_and_punctuation(&once), once.clone());
        }

        #[test]
        fn displacement_always_single_decimal(cc in 100u32..10000) {
            let cyl = displacement_to_cylinder(&cc.to_string()).unwrap();
            let re = Regex::new(r"^\d\.\d$").unwrap();
            prop_assert!(re.is_match(&cyl));
        }
    }
}
