//! Turns tuning-site rows into catalog engines.

use crate::mapper::{extract_hp, extract_torque, map_catalog_fuel};
use crate::model::{CanonicalEngine, EngineSource, ScrapedVehicleRecord, YearBound};
use crate::normalizer::{clean_or_none, extract_decimal_pair, normalize_whitespace};
use crate::parser::keys;
use regex::Regex;
use std::sync::LazyLock;

static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2})/(\d{4})").expect("valid month/year regex"));
static FOUR_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid year token regex"));
static YEAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("valid year token regex"));

const OPEN_MARKER: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeYears {
    pub engine_type: Option<String>,
    pub from_year: YearBound,
    pub to_year: YearBound,
}

/// Splits "<type> <from> <to>" as written by tuning sites.
///
/// Years may be `YYYY`, `MM/YYYY`, `...` for an open side or `All`.
/// `"2.0 TDI 150 2015 ..."` gives type `2.0 TDI 150`, from 2015, to present.
pub fn parse_type_years(text: &str) -> TypeYears {
    let cleaned = MONTH_YEAR.replace(text, "$2");
    let parts: Vec<&str> = cleaned.split_whitespace().collect();
    let unknown = TypeYears { engine_type: None, from_year: YearBound::Unknown, to_year: YearBound::Unknown };

    match parts.first() {
        None => return unknown,
        Some(first) if *first == "All" => return unknown,
        _ => {}
    }

    let type_len = parts
        .iter()
        .position(|p| FOUR_DIGITS.is_match(p) || *p == OPEN_MARKER || p.eq_ignore_ascii_case("all"))
        .unwrap_or(parts.len());
    let engine_type = (type_len > 0).then(|| parts[..type_len].join(" "));
    let years = &parts[type_len..];

    let (from_year, to_year) = match years {
        [single] if *single == OPEN_MARKER => (YearBound::Unknown, YearBound::Unknown),
        [single] if single.eq_ignore_ascii_case("all") => (YearBound::Unknown, YearBound::Unknown),
        [single] if FOUR_DIGITS.is_match(single) => (YearBound::parse(single), YearBound::Present),
        [first, second] if *first == OPEN_MARKER => (YearBound::Unknown, YearBound::parse(second)),
        [first, second] if *second == OPEN_MARKER => (YearBound::parse(first), YearBound::Present),
        [first, second] if FOUR_DIGITS.is_match(first) && FOUR_DIGITS.is_match(second) => {
            (YearBound::parse(first), YearBound::parse(second))
        }
        _ => (YearBound::Unknown, YearBound::Unknown),
    };

    TypeYears { engine_type, from_year, to_year }
}

/// Shiftech gives a bare year field: one year opens a range up to present.
pub fn parse_year_field(raw: Option<&str>) -> (YearBound, YearBound) {
    let years: Vec<i32> = raw
        .map(|r| YEAR_TOKEN.find_iter(r).filter_map(|m| m.as_str().parse().ok()).collect())
        .unwrap_or_default();
    match years.as_slice() {
        [] => (YearBound::Unknown, YearBound::Unknown),
        [from] => (YearBound::Year(*from), YearBound::Present),
        [from, to, ..] => (YearBound::Year(*from), YearBound::Year(*to)),
    }
}

/// Why a scraped row did not become an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSkip {
    UnmappedFuel(String),
    MissingUrl,
}

/// Builds the catalog engine for an already validated make id.
pub fn parse_engine_record(
    source: EngineSource,
    record: &ScrapedVehicleRecord,
    make_id: &str,
) -> Result<CanonicalEngine, EngineSkip> {
    let source_url = normalize_whitespace(&record.url_source);
    if source_url.is_empty() {
        return Err(EngineSkip::MissingUrl);
    }
    let fuel = map_catalog_fuel(source, &record.fuel).ok_or_else(|| EngineSkip::UnmappedFuel(record.fuel.clone()))?;
    let engine_name = clean_or_none(Some(&record.engine_name));

    let (model, type_years) = match source {
        EngineSource::BrPerf => {
            let model = normalize_whitespace(&record.model.replace(&record.make, ""));
            let rest = record.type_years.as_deref().unwrap_or_default().replace(&record.model, "");
            (model, parse_type_years(&rest))
        }
        EngineSource::Shiftech => {
            let (from_year, to_year) = parse_year_field(record.year.as_deref());
            let type_years = TypeYears {
                engine_type: clean_or_none(record.engine_type.as_deref()),
                from_year,
                to_year,
            };
            (normalize_whitespace(&record.model), type_years)
        }
    };

    Ok(CanonicalEngine {
        id: keys::engine_id(source, &source_url),
        make_id: make_id.to_string(),
        model,
        engine_type: type_years.engine_type,
        from_year: type_years.from_year,
        to_year: type_years.to_year,
        cylinder: engine_name.as_deref().and_then(extract_decimal_pair),
        engine_name,
        fuel,
        hp: extract_hp(record.hp.as_deref()),
        hp_stage1: extract_hp(record.hp_remap.as_deref()),
        hp_stage2: extract_hp(record.hp_stage2.as_deref()),
        torque: extract_torque(record.torque.as_deref()),
        torque_stage1: extract_torque(record.torque_remap.as_deref()),
        torque_stage2: extract_torque(record.torque_stage2.as_deref()),
        source_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fuel;

    fn type_years(t: Option<&str>, from: YearBound, to: YearBound) -> TypeYears {
        TypeYears { engine_type: t.map(str::to_string), from_year: from, to_year: to }
    }

    #[test]
    fn type_and_year_ranges() {
        assert_eq!(
            parse_type_years("1.5 VTi-TECH 2019 2023"),
            type_years(Some("1.5 VTi-TECH"), YearBound::Year(2019), YearBound::Year(2023))
        );
        assert_eq!(
            parse_type_years("2.0 TDI 150 2015 ..."),
            type_years(Some("2.0 TDI 150"), YearBound::Year(2015), YearBound::Present)
        );
        assert_eq!(
            parse_type_years("1.6 HDi ... 2012"),
            type_years(Some("1.6 HDi"), YearBound::Unknown, YearBound::Year(2012))
        );
        assert_eq!(
            parse_type_years("1.2 PureTech 10/2019 ..."),
            type_years(Some("1.2 PureTech"), YearBound::Year(2019), YearBound::Present)
        );
        assert_eq!(parse_type_years("1.4 T All"), type_years(Some("1.4 T"), YearBound::Unknown, YearBound::Unknown));
        assert_eq!(parse_type_years("All"), type_years(None, YearBound::Unknown, YearBound::Unknown));
        assert_eq!(parse_type_years("   "), type_years(None, YearBound::Unknown, YearBound::Unknown));
        assert_eq!(parse_type_years("e-Motion"), type_years(Some("e-Motion"), YearBound::Unknown, YearBound::Unknown));
    }

    #[test]
    fn shiftech_year_field() {
        assert_eq!(parse_year_field(Some("2018")), (YearBound::Year(2018), YearBound::Present));
        assert_eq!(parse_year_field(Some("2014 - 2018")), (YearBound::Year(2014), YearBound::Year(2018)));
        assert_eq!(parse_year_field(None), (YearBound::Unknown, YearBound::Unknown));
    }

    #[test]
    fn brperf_record() {
        let record = ScrapedVehicleRecord {
            make: "MG".to_string(),
            model: "MG ZS".to_string(),
            type_years: Some("MG ZS 1.5 VTi 106 2019 ...".to_string()),
            fuel: "Gasoline".to_string(),
            engine_name: " 1.5 VTi  106ch ".to_string(),
            hp: Some("106 ch".to_string()),
            hp_remap: Some("125 ch".to_string()),
            torque: Some("141 Nm".to_string()),
            torque_remap: Some("170 Nm".to_string()),
            url_source: "https://www.br-performance.fr/mg/zs/1-5-vti".to_string(),
            ..Default::default()
        };
        let engine = parse_engine_record(EngineSource::BrPerf, &record, "mg").unwrap();
        assert_eq!(engine.model, "ZS");
        assert_eq!(engine.engine_type.as_deref(), Some("1.5 VTi 106"));
        assert_eq!(engine.from_year, YearBound::Year(2019));
        assert_eq!(engine.to_year, YearBound::Present);
        assert_eq!(engine.cylinder.as_deref(), Some("1.5"));
        assert_eq!(engine.engine_name.as_deref(), Some("1.5 VTi 106ch"));
        assert_eq!(engine.fuel, Fuel::Essence);
        assert_eq!(engine.hp, Some(106));
        assert_eq!(engine.hp_stage1, Some(125));
        assert_eq!(engine.torque_stage1, Some(170));
        assert_eq!(engine.hp_stage2, None);
    }

    #[test]
    fn unmapped_fuel_is_skipped() {
        let record = ScrapedVehicleRecord {
            make: "Tesla".to_string(),
            model: "Model 3".to_string(),
            fuel: "Steam".to_string(),
            engine_name: "Long Range".to_string(),
            url_source: "https://shiftech.eu/tesla/model-3".to_string(),
            ..Default::default()
        };
        assert_eq!(
            parse_engine_record(EngineSource::Shiftech, &record, "tesla"),
            Err(EngineSkip::UnmappedFuel("Steam".to_string()))
        );
    }
}
