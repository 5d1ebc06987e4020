//! Links catalog engines to every model trim they plausibly power.

use crate::matching::interval::{
    confidence_coefficient, cylinder_within_tolerance, end_year, hp_within_tolerance, intervals_intersect, start_year,
    torque_within_tolerance,
};
use crate::model::{CanonicalEngine, CanonicalModelTrim, EngineModelAssociation, Fuel, StorageError, YearBound};
use crate::storage::ModelCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info, warn};

/// Why a candidate trim was dropped. Only used for debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Hp,
    Torque,
    Cylinder,
    Years,
}

/// Hard filters between an engine and one candidate trim.
pub fn check_model(engine: &CanonicalEngine, model: &CanonicalModelTrim) -> Result<(), Rejection> {
    let all_model_years = engine.from_year.is_unknown() && engine.to_year.is_unknown();
    let coefficient = confidence_coefficient(engine.from_year, engine.to_year);

    if !hp_within_tolerance(engine.hp, model.hp, coefficient) {
        return Err(Rejection::Hp);
    }
    if !torque_within_tolerance(engine.torque, model.torque, coefficient) {
        return Err(Rejection::Torque);
    }
    if !cylinder_within_tolerance(engine.cylinder.as_deref(), model.cylinder.as_deref()) {
        return Err(Rejection::Cylinder);
    }

    let years_match = intervals_intersect(
        start_year(engine.from_year),
        end_year(engine.to_year),
        start_year(model.from_year),
        end_year(model.to_year),
    );
    if !all_model_years && !years_match {
        return Err(Rejection::Years);
    }
    Ok(())
}

/// Every candidate surviving the hard filters, in candidate order.
pub fn filter_models<'a>(engine: &CanonicalEngine, candidates: &'a [CanonicalModelTrim]) -> Vec<&'a CanonicalModelTrim> {
    candidates
        .iter()
        .filter(|model| match check_model(engine, model) {
            Ok(()) => true,
            Err(reason) => {
                debug!(engine_id = %engine.id, model_id = %model.id, ?reason, "candidate rejected");
                false
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEngine {
    pub id: String,
    pub make_id: String,
    pub model: String,
    pub engine_type: Option<String>,
    pub from_year: YearBound,
    pub to_year: YearBound,
    pub cylinder: Option<String>,
    pub fuel: Fuel,
    pub hp: Option<i64>,
    pub torque: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditModel {
    pub id: String,
    pub make_id: String,
    pub model: String,
    pub from_year: YearBound,
    pub to_year: YearBound,
    pub cylinder: Option<String>,
    pub fuel: Fuel,
    pub hp: Option<i64>,
    pub torque: Option<i64>,
    /// Already linked to an engine earlier in the run.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub car_engine: AuditEngine,
    pub potential_models: Vec<AuditModel>,
}

/// Matched pairs kept for manual review, written out as a JSON array.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    seen_models: HashSet<String>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, engine: &CanonicalEngine, models: &[&CanonicalModelTrim]) {
        let potential_models = models
            .iter()
            .map(|m| AuditModel {
                id: m.id.clone(),
                make_id: m.make_id.clone(),
                model: m.model.clone(),
                from_year: m.from_year,
                to_year: m.to_year,
                cylinder: m.cylinder.clone(),
                fuel: m.fuel,
                hp: m.hp,
                torque: m.torque,
                repeated: !self.seen_models.insert(m.id.clone()),
            })
            .collect();

        self.entries.push(AuditEntry {
            car_engine: AuditEngine {
                id: engine.id.clone(),
                make_id: engine.make_id.clone(),
                model: engine.model.clone(),
                engine_type: engine.engine_type.clone(),
                from_year: engine.from_year,
                to_year: engine.to_year,
                cylinder: engine.cylinder.clone(),
                fuel: engine.fuel,
                hp: engine.hp,
                torque: engine.torque,
            },
            potential_models,
        });
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let file = File::create(path)
            .map_err(|e| StorageError::InvalidValue(format!("cannot write audit log {}: {}", path.display(), e)))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.entries)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub engines: usize,
    pub matched_engines: usize,
    pub matched_models: usize,
    pub new_links: usize,
    pub errors: usize,
}

/// Links one engine to all surviving trims. Returns the number of trims matched.
pub fn reconcile_engine<C: ModelCatalog + ?Sized>(
    catalog: &C,
    engine: &CanonicalEngine,
    audit: &mut AuditLog,
    stats: &mut ReconcileStats,
) -> Result<usize, StorageError> {
    let candidates = catalog.model_candidates(engine)?;
    let matched = filter_models(engine, &candidates);
    if matched.is_empty() {
        return Ok(0);
    }

    audit.record(engine, &matched);
    stats.matched_engines += 1;
    stats.matched_models += matched.len();
    for model in &matched {
        let link = EngineModelAssociation { car_engine_id: engine.id.clone(), car_model_id: model.id.clone() };
        if catalog.link_engine_model(&link)? {
            stats.new_links += 1;
        }
    }
    Ok(matched.len())
}

/// Runs the reconciliation over a batch. A failing engine is logged and skipped.
pub fn reconcile_all<C: ModelCatalog + ?Sized>(
    catalog: &C,
    engines: &[CanonicalEngine],
    audit: &mut AuditLog,
) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    for engine in engines {
        stats.engines += 1;
        match reconcile_engine(catalog, engine, audit, &mut stats) {
            Ok(n) if n > 0 => debug!(engine_id = %engine.id, models = n, "engine linked"),
            Ok(_) => {}
            Err(e) => {
                stats.errors += 1;
                warn!(engine_id = %engine.id, "reconcile failed: {}", e);
            }
        }
    }
    info!(
        "Matched models {} / matched engines {} ({} new links)",
        stats.matched_models, stats.matched_engines, stats.new_links
    );
    stats
}
