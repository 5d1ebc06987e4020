//! Picks the catalog engine a classified post most likely carries.
//!
//! Retrieval is fuzzy (trigram similarity in the store), precision comes from
//! an additive score over year, power and displacement. Nothing is rejected
//! at scoring time: the best candidate wins even with a score of zero.

use crate::matching::interval::cylinder_score;
use crate::model::{CanonicalEngine, ClassifiedPost, Fuel, StorageError, YearBound};
use crate::storage::EngineCatalog;
use tracing::debug;

/// Fiscal horsepower to metric horsepower.
pub const CV_TO_HP: i64 = 16;
pub const HP_SCORE_MARGIN: i64 = 25;

/// The fields of a post the resolver looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    pub fuel: Option<Fuel>,
    pub year: Option<i32>,
    pub cv: Option<i64>,
    pub cylinder: Option<String>,
}

impl From<&ClassifiedPost> for VehicleQuery {
    fn from(post: &ClassifiedPost) -> Self {
        Self {
            make: post.make.clone(),
            model: post.model.clone(),
            fuel: post.fuel,
            year: post.year,
            cv: post.cv,
            cylinder: post.cylinder.clone(),
        }
    }
}

/// Catalog make ids drop the "-Benz" suffix.
pub fn make_id_for_lookup(make: &str) -> String {
    make.replace("-Benz", "").replace("-benz", "")
}

fn year_score(year: i32, engine: &CanonicalEngine) -> u32 {
    let Some(from) = engine.from_year.year() else {
        return 0;
    };
    if let YearBound::Year(to) = engine.to_year {
        if (year - to).abs() > 2 {
            return 0;
        }
    }
    match year - from {
        0..=2 => 2,
        3..=4 => 1,
        _ => 0,
    }
}

fn hp_score(cv: Option<i64>, engine_hp: Option<i64>) -> u32 {
    match (cv, engine_hp) {
        (Some(cv), Some(hp)) if cv > 0 => match cv.checked_mul(CV_TO_HP) {
            Some(estimated) if estimated.abs_diff(hp) <= HP_SCORE_MARGIN as u64 => 1,
            _ => 0,
        },
        _ => 0,
    }
}

pub fn score_engine(query: &VehicleQuery, engine: &CanonicalEngine) -> u32 {
    let year = query.year.map_or(0, |y| year_score(y, engine));
    let hp = hp_score(query.cv, engine.hp);
    let cylinder = cylinder_score(query.cylinder.as_deref(), engine.cylinder.as_deref());
    year + hp + cylinder
}

/// Highest scoring candidate with its score. Ties keep the earlier one.
pub fn best_engine<'a>(query: &VehicleQuery, candidates: &'a [CanonicalEngine]) -> Option<(&'a CanonicalEngine, u32)> {
    let mut best: Option<(&CanonicalEngine, u32)> = None;
    for engine in candidates {
        let score = score_engine(query, engine);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((engine, score));
        }
    }
    best
}

/// Resolves the catalog engine id for a post, or `None` when there is nothing to match.
pub fn resolve_engine<C: EngineCatalog + ?Sized>(
    catalog: &C,
    query: &VehicleQuery,
) -> Result<Option<String>, StorageError> {
    let (Some(make), Some(model)) = (
        query.make.as_deref().filter(|m| !m.trim().is_empty()),
        query.model.as_deref().filter(|m| !m.trim().is_empty()),
    ) else {
        return Ok(None);
    };
    // A missing fuel never passes the catalog's fuel similarity filter.
    let Some(fuel) = query.fuel else {
        return Ok(None);
    };

    let candidates = catalog.engine_candidates(&make_id_for_lookup(make), model, fuel)?;
    let resolved = best_engine(query, &candidates).map(|(engine, score)| {
        debug!(engine_id = %engine.id, score, candidates = candidates.len(), "engine resolved");
        engine.id.clone()
    });
    Ok(resolved)
}
