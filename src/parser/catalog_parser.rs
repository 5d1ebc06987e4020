//! Seed rows for the canonical make and model catalog.

use crate::model::{CanonicalMake, CanonicalModelTrim, Fuel, YearBound};
use crate::normalizer::{clean_or_none, displacement_to_cylinder, normalize_whitespace};
use crate::parser::keys;
use crate::parser::post_parser::text_or_number;
use serde::Deserialize;

const MERCEDES: &str = "mercedes";
const MERCEDES_AMG: &str = "mercedes-amg";
const MERCEDES_BENZ: &str = "mercedes-benz";
const AMG_SUFFIX: &str = " AMG";

#[derive(Debug, Clone, Deserialize)]
pub struct SeedMake {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub remap_eligible: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedModel {
    #[serde(alias = "uuid")]
    pub id: String,
    pub make_id: String,
    pub model: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub production_start_year: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub production_end_year: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub displacement: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub fuel: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub hp: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub torque: Option<String>,
}

/// Why a seed row did not become a model trim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSkip {
    MissingModel,
    UnmappedFuel(String),
    InvalidDisplacement(String),
}

pub fn parse_make(row: &SeedMake) -> CanonicalMake {
    let id = if row.id.trim().is_empty() { &row.name } else { &row.id };
    CanonicalMake {
        id: keys::make_id(id),
        name: normalize_whitespace(&row.name),
        category: clean_or_none(row.category.as_deref()),
        remap_eligible: row.remap_eligible,
    }
}

/// Folds the Mercedes sub-brands into one make. AMG trims keep the marker in
/// their model name.
fn canonical_make(make_id: String, model: String) -> (String, String) {
    match make_id.as_str() {
        MERCEDES_AMG if model.to_uppercase().contains("AMG") => (MERCEDES.to_string(), model),
        MERCEDES_AMG => (MERCEDES.to_string(), format!("{}{}", model, AMG_SUFFIX)),
        MERCEDES_BENZ => (MERCEDES.to_string(), model),
        _ => (make_id, model),
    }
}

fn positive(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse::<i64>().ok().filter(|v| *v > 0)
}

fn year_bound(raw: Option<&str>) -> YearBound {
    raw.map(YearBound::parse).unwrap_or(YearBound::Unknown)
}

pub fn parse_model(row: &SeedModel) -> Result<CanonicalModelTrim, ModelSkip> {
    let model = normalize_whitespace(&row.model);
    if model.is_empty() {
        return Err(ModelSkip::MissingModel);
    }
    let fuel_label = row.fuel.as_deref().unwrap_or_default();
    let fuel = Fuel::from_label(fuel_label).ok_or_else(|| ModelSkip::UnmappedFuel(fuel_label.to_string()))?;

    let displacement = clean_or_none(row.displacement.as_deref());
    let cylinder = displacement
        .as_deref()
        .map(displacement_to_cylinder)
        .transpose()
        .map_err(|_| ModelSkip::InvalidDisplacement(displacement.clone().unwrap_or_default()))?;

    let (make_id, model) = canonical_make(keys::make_id(&row.make_id), model);
    Ok(CanonicalModelTrim {
        id: row.id.trim().to_string(),
        make_id,
        model,
        from_year: year_bound(row.production_start_year.as_deref()),
        to_year: year_bound(row.production_end_year.as_deref()),
        displacement,
        cylinder,
        body: clean_or_none(row.body.as_deref()),
        fuel,
        hp: positive(row.hp.as_deref()),
        torque: positive(row.torque.as_deref()),
    })
}
