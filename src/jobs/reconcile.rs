use crate::config::AppConfig;
use crate::jobs::RunStats;
use crate::matching::{AuditLog, reconcile_all};
use crate::model::JobError;
use crate::storage::SqliteStorage;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::info;

/// Links every catalog engine to its model trims and writes the review file.
pub async fn map_models_to_engines(
    storage: &Mutex<SqliteStorage>,
    config: &AppConfig,
    stats: &mut RunStats,
) -> Result<(), JobError> {
    let mut audit = AuditLog::new();
    let reconcile = {
        let storage = storage.lock().await;
        let engines = storage.all_engines()?;
        info!("🔗 Mapping {} engines to models", engines.len());
        reconcile_all(&*storage, &engines, &mut audit)
    };

    audit.save(Path::new(&config.audit_log_path))?;
    info!("Audit log written to {} ({} entries)", config.audit_log_path, audit.entries().len());

    stats.errors += reconcile.errors;
    stats.reconcile = Some(reconcile);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobType;
    use crate::matching::reconciler::AuditEntry;
    use crate::model::{CanonicalEngine, CanonicalModelTrim, Fuel, YearBound};

    fn engine(id: &str, hp: i64) -> CanonicalEngine {
        CanonicalEngine {
            id: id.to_string(),
            make_id: "peugeot".to_string(),
            model: "208".to_string(),
            engine_type: None,
            from_year: YearBound::Year(2012),
            to_year: YearBound::Year(2019),
            engine_name: Some("1.2 PureTech 82".to_string()),
            cylinder: Some("1.2".to_string()),
            fuel: Fuel::Essence,
            hp: Some(hp),
            hp_stage1: None,
            hp_stage2: None,
            torque: None,
            torque_stage1: None,
            torque_stage2: None,
            source_url: format!("https://www.shiftech.eu/peugeot/208/{}", id),
        }
    }

    fn trim(id: &str, hp: i64) -> CanonicalModelTrim {
        CanonicalModelTrim {
            id: id.to_string(),
            make_id: "peugeot".to_string(),
            model: "208".to_string(),
            from_year: YearBound::Year(2015),
            to_year: YearBound::Present,
            displacement: Some("1199".to_string()),
            cylinder: Some("1.2".to_string()),
            body: None,
            fuel: Fuel::Essence,
            hp: Some(hp),
            torque: None,
        }
    }

    #[tokio::test]
    async fn links_engines_and_writes_audit() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        storage.upsert_engine(&engine("e82", 82)).unwrap();
        storage.upsert_engine(&engine("e130", 130)).unwrap();
        storage.upsert_model(&trim("208-active", 82)).unwrap();
        storage.upsert_model(&trim("208-allure", 84)).unwrap();
        let storage = Mutex::new(storage);

        let dir = tempfile::tempdir().unwrap();
        let audit_path = dir.path().join("matching.json");
        let config = AppConfig {
            audit_log_path: audit_path.to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        let mut stats = RunStats::new(JobType::MapCarModelsToEngines);

        map_models_to_engines(&storage, &config, &mut stats).await.unwrap();

        let reconcile = stats.reconcile.clone().unwrap();
        assert_eq!(reconcile.engines, 2);
        assert_eq!(reconcile.matched_engines, 1);
        assert_eq!(reconcile.new_links, 2);
        assert_eq!(stats.errors, 0);
        let linked: Vec<String> =
            storage.lock().await.linked_models("e82").unwrap().into_iter().map(|link| link.car_model_id).collect();
        assert_eq!(linked, vec!["208-active".to_string(), "208-allure".to_string()]);

        let written: Vec<AuditEntry> = serde_json::from_str(&std::fs::read_to_string(&audit_path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].car_engine.id, "e82");
        assert_eq!(written[0].potential_models.len(), 2);

        let mut rerun = RunStats::new(JobType::MapCarModelsToEngines);
        map_models_to_engines(&storage, &config, &mut rerun).await.unwrap();
        assert_eq!(rerun.reconcile.unwrap().new_links, 0);
    }
}
