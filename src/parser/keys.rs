//! Natural keys. One pure function per entity so every job derives ids the same way.

use crate::model::{EngineSource, PostSource};
use crate::normalizer::{normalize_whitespace, strip_diacritics_and_punctuation};

/// Merchant id used when a listing carries no seller.
pub const ANONYMOUS_MERCHANT_ID: &str = "62094646-5d1a-4ea1-8f6b-a786d6d2caf2";
pub const ANONYMOUS_MERCHANT_NAME: &str = "Anonyme";

/// Slug id of a make name. Some sites spell Land Rover as one word.
pub fn make_id(name: &str) -> String {
    strip_diacritics_and_punctuation(&name.replace("Landrover", "Land Rover"))
}

/// Slug id of a region name ("Ben Arous" -> "ben-arous").
pub fn region_id(name: &str) -> String {
    strip_diacritics_and_punctuation(name)
}

/// `<SITE>-<site id>`, with anything that is neither a word character nor whitespace replaced by `-`.
pub fn post_id(source: PostSource, source_id: &str) -> String {
    let cleaned: String = source_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c.is_whitespace() { c } else { '-' })
        .collect();
    format!("{}-{}", source.key(), cleaned)
}

/// Merchants without a site id are keyed by the slug of their display name.
pub fn merchant_id_from_name(name: &str) -> Option<String> {
    let id = strip_diacritics_and_punctuation(&normalize_whitespace(name));
    (!id.is_empty()).then_some(id)
}

/// Engines are upserted on their source url; the id is derived from it so reruns keep it stable.
pub fn engine_id(source: EngineSource, source_url: &str) -> String {
    let path = source_url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .replace(['/', '.', '?', '=', '&'], " ");
    format!("{}-{}", source.label(), strip_diacritics_and_punctuation(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_ids() {
        assert_eq!(make_id("Land Rover"), "land-rover");
        assert_eq!(make_id("Landrover"), "land-rover");
        assert_eq!(make_id("Citroën"), "citroen");
        assert_eq!(make_id("Mercedes-Benz"), "mercedes-benz");
    }

    #[test]
    fn post_ids_keep_word_characters() {
        assert_eq!(post_id(PostSource::Tayara, "65f1a2b3c4"), "TAYARA-65f1a2b3c4");
        assert_eq!(post_id(PostSource::Automobiletn, "golf/7.2019"), "AUTOMOBILETN-golf-7-2019");
    }

    #[test]
    fn merchant_ids_from_names() {
        assert_eq!(merchant_id_from_name("  Garage  Ali "), Some("garage-ali".to_string()));
        assert_eq!(merchant_id_from_name("!!!"), None);
    }

    #[test]
    fn engine_ids_are_stable_per_url() {
        let url = "https://www.br-performance.fr/reprogrammation/mg/zs/1.5-vti";
        assert_eq!(engine_id(EngineSource::BrPerf, url), engine_id(EngineSource::BrPerf, url));
        assert_eq!(
            engine_id(EngineSource::Shiftech, "https://shiftech.eu/a/b"),
            "shiftech-shiftech-eu-a-b"
        );
    }
}
