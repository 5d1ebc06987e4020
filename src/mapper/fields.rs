//! Free text to closed enums: fuel, gearbox, color, body, interior, transmission.

use super::rules::{Matcher, Rule, first_match, first_match_folded};
use crate::model::{BodyType, Color, EngineSource, Fuel, Gearbox, InteriorType, Transmission};
use crate::normalizer::{fold, normalize_whitespace, sanitize_for_persistence};
use regex::Regex;
use std::sync::LazyLock;

pub const FUEL_RULES: &[Rule<Fuel>] = &[
    Rule::new("plug-in", Matcher::Any(&["plug", "rechargeable"]), Fuel::PlugInHybrid),
    Rule::new("diesel-micro-hybrid", Matcher::Both(&["micro", "mild"], &["diesel"]), Fuel::DieselMicroHybrid),
    Rule::new("essence-micro-hybrid", Matcher::Any(&["micro", "mild"]), Fuel::EssenceMicroHybrid),
    Rule::new("diesel-hybrid", Matcher::All(&["hybrid", "diesel"]), Fuel::DieselHybrid),
    Rule::new("essence-hybrid", Matcher::Both(&["hybrid"], &["essence", "petrol"]), Fuel::EssenceHybrid),
    Rule::new("hybrid", Matcher::Any(&["hybrid", "electri"]), Fuel::Hybrid),
    Rule::new("gasoil", Matcher::Any(&["gasoil", "gazoil"]), Fuel::Diesel),
    Rule::new("essence", Matcher::Any(&["essence", "gas", "petro", "sans plomb"]), Fuel::Essence),
    Rule::new("diesel", Matcher::Any(&["diesel"]), Fuel::Diesel),
    Rule::new("gaz", Matcher::Any(&["gpl", "gaz"]), Fuel::Gaz),
    Rule::new("ethanol", Matcher::Any(&["ethanol", "e85"]), Fuel::Ethanol),
    Rule::new("hydrogen", Matcher::Any(&["hydrog"]), Fuel::Hydrogen),
];

const GEARBOX_FIELD_RULES: &[Rule<Gearbox>] = &[
    Rule::new("automatique", Matcher::Exact(&["automatique"]), Gearbox::Auto),
    Rule::new("manuelle", Matcher::Exact(&["manuelle"]), Gearbox::Manual),
];

const GEARBOX_CONTEXT_RULES: &[Rule<Gearbox>] = &[Rule::new(
    "bva",
    Matcher::Any(&["bva", "boite auto"]),
    Gearbox::Auto,
)];

pub const COLOR_RULES: &[Rule<Color>] = &[
    Rule::new("white", Matcher::Any(&["blanc", "white"]), Color::White),
    Rule::new("black", Matcher::Any(&["noir", "black"]), Color::Black),
    Rule::new("blue", Matcher::Any(&["bleu", "blu", "turq"]), Color::Blue),
    Rule::new("green", Matcher::Any(&["vert", "green"]), Color::Green),
    Rule::new("yellow", Matcher::Any(&["jaun", "yellow"]), Color::Yellow),
    Rule::new("orange", Matcher::Any(&["orange"]), Color::Orange),
    Rule::new("pink", Matcher::Any(&["rose", "pink"]), Color::Pink),
    Rule::new("purple", Matcher::Any(&["viole", "purple", "mauve", "indig"]), Color::Purple),
    Rule::new("red", Matcher::Any(&["rouge", "bordeaux", "red"]), Color::Red),
    Rule::new("grey", Matcher::Any(&["argent", "gris", "nardo", "chrom", "grey", "gray", "silver"]), Color::Grey),
    Rule::new("brown", Matcher::Any(&["beige", "crem", "camel", "brown", "or", "mar"]), Color::Brown),
];

pub const BODY_RULES: &[Rule<BodyType>] = &[
    Rule::new(
        "utility",
        Matcher::Any(&[
            "utilitaire", "partnair", "partner", "partenair", "kango", "berling", "doblo", "dok", "cady", "caddy",
        ]),
        BodyType::Utility,
    ),
    Rule::new("van", Matcher::Any(&["van", "hicace", "scenic", "monospace"]), BodyType::MonospaceVan),
    Rule::new("coupe", Matcher::Any(&["coupe"]), BodyType::Coupe),
    Rule::new("cabriolet", Matcher::Any(&["roadster", "cabrio", "decapo"]), BodyType::Cabriolet),
    Rule::new("break", Matcher::Any(&["break", "rs6"]), BodyType::Break),
    Rule::new(
        "compact",
        Matcher::Any(&["compacte", "polo", "ibiza", "golf", "leon", "rio", "kuv"]),
        BodyType::Compact,
    ),
    Rule::new("berline", Matcher::Any(&["berline", "e200"]), BodyType::Berline),
    Rule::new(
        "suv",
        Matcher::Any(&["suv", "4x4", "touareg", "cayenne", "tiguan", "macan", "sportage"]),
        BodyType::Suv,
    ),
    Rule::new("pickup", Matcher::Any(&["pick"]), BodyType::Pickup),
];

/// Catalog body labels that are not enum labels themselves.
const BODY_ALIASES: &[Rule<BodyType>] = &[
    Rule::new("citadine", Matcher::Exact(&["citadine"]), BodyType::Compact),
    Rule::new("limousine", Matcher::Exact(&["limousine"]), BodyType::Berline),
    Rule::new("convertible", Matcher::Exact(&["convertible", "convertible (spyder, cabriolet)"]), BodyType::Cabriolet),
    Rule::new("off-roader", Matcher::Exact(&["off-roader"]), BodyType::Suv),
];

pub const INTERIOR_RULES: &[Rule<InteriorType>] = &[
    Rule::new("leatherette", Matcher::Any(&["simili"]), InteriorType::Leatherette),
    Rule::new("leather", Matcher::Any(&["cuir"]), InteriorType::Leather),
    Rule::new("alcantara", Matcher::Any(&["alcant"]), InteriorType::Alcantara),
    Rule::new("fabric", Matcher::Any(&["tissu"]), InteriorType::Fabric),
];

pub const TRANSMISSION_RULES: &[Rule<Transmission>] = &[
    Rule::new(
        "awd",
        Matcher::Any(&[
            "integral", "4 motion", "4motion", "4matic", "4 matic", "x drive", "xdrive", "awd", "4wd", "4 wd", "4x4",
            "4 roue", "4roue", "quatre roue",
        ]),
        Transmission::Awd,
    ),
    Rule::new("fwd", Matcher::Any(&["tract"]), Transmission::Fwd),
    Rule::new("rwd", Matcher::Any(&["prop"]), Transmission::Rwd),
];

static MERCEDES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)mercedes[\s-]?benz").expect("valid mercedes regex"));
static LAND_ROVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bland\s?rover\b").expect("valid land rover regex"));

pub fn map_fuel(raw: Option<&str>) -> Option<Fuel> {
    first_match(FUEL_RULES, &sanitize_for_persistence(raw)?)
}

/// Exact fuel labels used by the tuning sites.
pub fn map_catalog_fuel(source: EngineSource, label: &str) -> Option<Fuel> {
    let label = normalize_whitespace(label);
    let fuel = match source {
        EngineSource::BrPerf => match label.as_str() {
            "Gasoline" => Fuel::Essence,
            "Diesel" => Fuel::Diesel,
            "Hybrid" => Fuel::Hybrid,
            "Gas" => Fuel::Gaz,
            "Petrol Micro Hybrid" | "Petrol Micro Hybrid 48V" => Fuel::EssenceMicroHybrid,
            "Diesel Micro Hybrid" | "Diesel Micro Hybrid 48V" => Fuel::DieselMicroHybrid,
            "Diesel Hybrid" => Fuel::DieselHybrid,
            "Electric" => Fuel::Electrique,
            "Petrol Hybrid" => Fuel::EssenceHybrid,
            "Multifuel Essence / E85" => Fuel::Ethanol,
            "Hydrogen" => Fuel::Hydrogen,
            _ => return None,
        },
        EngineSource::Shiftech => match label.as_str() {
            "petrol" => Fuel::Essence,
            "diesel" => Fuel::Diesel,
            "Hybrid" => Fuel::Hybrid,
            "gaz" | "gas" => Fuel::Gaz,
            "micro_hybrid_petrol" | "mild_hybrid_petrol" => Fuel::EssenceMicroHybrid,
            "micro_hybrid_diesel" | "mild_hybrid_diesel" => Fuel::DieselMicroHybrid,
            "hybrid_diesel" => Fuel::DieselHybrid,
            "electric" => Fuel::Electrique,
            "hybrid_petrol" => Fuel::EssenceHybrid,
            "ethanol" | "e85" => Fuel::Ethanol,
            "hydrogen" => Fuel::Hydrogen,
            _ => return None,
        },
    };
    Some(fuel)
}

/// Gearbox from the listing's gearbox field, else from its title and description.
pub fn map_gearbox(raw: Option<&str>, title_description: &str) -> Option<Gearbox> {
    if let Some(field) = sanitize_for_persistence(raw) {
        if let Some(gearbox) = first_match(GEARBOX_FIELD_RULES, &field) {
            return Some(gearbox);
        }
    }
    first_match(GEARBOX_CONTEXT_RULES, title_description)
}

pub fn map_color(raw: Option<&str>) -> Option<Color> {
    first_match(COLOR_RULES, &sanitize_for_persistence(raw)?)
}

/// Body type from model names found in the listing text, falling back to the
/// body field itself. Listings without a body field stay unmapped.
pub fn map_body(title_description: &str, body: Option<&str>) -> Option<BodyType> {
    let body = sanitize_for_persistence(body)?;
    let haystack = format!("{} {}", fold(title_description), fold(&body));
    if let Some(rule) = first_match_folded(BODY_RULES, &haystack) {
        return Some(rule.value);
    }

    let folded_body = fold(&body);
    BodyType::ALL
        .iter()
        .copied()
        .find(|b| fold(b.label()) == folded_body)
        .or_else(|| first_match(BODY_ALIASES, &folded_body))
}

pub fn map_interior_type(text: &str) -> Option<InteriorType> {
    first_match(INTERIOR_RULES, text)
}

pub fn map_transmission(text: &str) -> Option<Transmission> {
    first_match(TRANSMISSION_RULES, text)
}

/// Canonical spelling of a few makes that sites write inconsistently.
pub fn map_make(raw: Option<&str>) -> Option<String> {
    let cleaned = sanitize_for_persistence(raw)?;
    let cleaned = normalize_whitespace(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    let cleaned = MERCEDES.replace_all(&cleaned, "Mercedes");
    Some(LAND_ROVER.replace_all(&cleaned, "Land Rover").into_owned())
}
