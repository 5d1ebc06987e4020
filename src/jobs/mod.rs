//! Batch jobs wiring feeds, parsers, matching and storage together.

pub mod clean_posts;
pub mod import_engines;
pub mod ingest_posts;
pub mod reconcile;
pub mod seed_catalog;

use crate::config::AppConfig;
use crate::matching::ReconcileStats;
use crate::model::{EngineSource, JobError, ScrapedVehicleRecord};
use crate::parser::{AutomobiletnListing, SeedMake, SeedModel, TayaraListing};
use crate::scraper::JsonDumpFeed;
use crate::storage::SqliteStorage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    ScrapTayara,
    ScrapAutomobiletn,
    UpdateCarEnginesBrperf,
    UpdateCarEnginesShiftech,
    MapCarModelsToEngines,
    SeedCarCatalog,
    CleanCarPosts,
}

impl JobType {
    /// The seed comes before the engine imports that check its makes, and the
    /// imports before the model mapping that reads them.
    pub const ALL: &'static [JobType] = &[
        JobType::SeedCarCatalog,
        JobType::UpdateCarEnginesBrperf,
        JobType::UpdateCarEnginesShiftech,
        JobType::MapCarModelsToEngines,
        JobType::CleanCarPosts,
        JobType::ScrapTayara,
        JobType::ScrapAutomobiletn,
    ];
}

/// Summary of one job run. Each run owns its counters.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub job: JobType,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub success: bool,
    pub error: Option<String>,
    pub errors: usize,
    pub pages: usize,
    pub known_posts: usize,
    pub skipped_posts: usize,
    pub duplicate_posts: usize,
    pub new_posts: usize,
    pub resolved_engines: usize,
    pub skipped_regions: BTreeSet<String>,
    pub imported_engines: usize,
    pub skipped_engines: usize,
    pub skipped_makes: BTreeSet<String>,
    pub reconcile: Option<ReconcileStats>,
    pub seeded_makes: usize,
    pub seeded_models: usize,
    pub skipped_models: usize,
    pub deleted_posts: usize,
}

impl RunStats {
    pub fn new(job: JobType) -> Self {
        Self {
            job,
            started_at: Utc::now(),
            duration_ms: 0,
            success: true,
            error: None,
            errors: 0,
            pages: 0,
            known_posts: 0,
            skipped_posts: 0,
            duplicate_posts: 0,
            new_posts: 0,
            resolved_engines: 0,
            skipped_regions: BTreeSet::new(),
            imported_engines: 0,
            skipped_engines: 0,
            skipped_makes: BTreeSet::new(),
            reconcile: None,
            seeded_makes: 0,
            seeded_models: 0,
            skipped_models: 0,
            deleted_posts: 0,
        }
    }

    /// Marks the whole run as failed.
    pub fn fail(&mut self, err: &JobError) {
        self.success = false;
        self.error = Some(err.to_string());
    }

    pub fn finish(mut self) -> Self {
        self.duration_ms = (Utc::now() - self.started_at).num_milliseconds();
        self
    }
}

/// Runs one configured job against the shared storage.
pub async fn run_job(job: JobType, storage: Arc<Mutex<SqliteStorage>>, config: Arc<AppConfig>) -> RunStats {
    info!("▶️ Starting job {:?}", job);
    let mut stats = RunStats::new(job);
    let page_size = config.feeds.page_size;

    let outcome = match job {
        JobType::ScrapTayara => {
            let feed: JsonDumpFeed<TayaraListing> = JsonDumpFeed::new(&config.feeds.tayara, page_size);
            ingest_posts::ingest_posts(&feed, &storage, &config, &mut stats).await
        }
        JobType::ScrapAutomobiletn => {
            let feed: JsonDumpFeed<AutomobiletnListing> = JsonDumpFeed::new(&config.feeds.automobiletn, page_size);
            ingest_posts::ingest_posts(&feed, &storage, &config, &mut stats).await
        }
        JobType::UpdateCarEnginesBrperf => {
            let feed: JsonDumpFeed<ScrapedVehicleRecord> = JsonDumpFeed::new(&config.feeds.brperf, page_size);
            let allowed = config.brperf_make_set();
            import_engines::import_engines(EngineSource::BrPerf, &feed, &storage, Some(&allowed), &mut stats).await
        }
        JobType::UpdateCarEnginesShiftech => {
            let feed: JsonDumpFeed<ScrapedVehicleRecord> = JsonDumpFeed::new(&config.feeds.shiftech, page_size);
            import_engines::import_engines(EngineSource::Shiftech, &feed, &storage, None, &mut stats).await
        }
        JobType::MapCarModelsToEngines => reconcile::map_models_to_engines(&storage, &config, &mut stats).await,
        JobType::SeedCarCatalog => {
            let makes: JsonDumpFeed<SeedMake> = JsonDumpFeed::new(&config.feeds.car_makes, page_size);
            let models: JsonDumpFeed<SeedModel> = JsonDumpFeed::new(&config.feeds.car_models, page_size);
            seed_catalog::seed_catalog(&makes, &models, &storage, &mut stats).await
        }
        JobType::CleanCarPosts => {
            clean_posts::clean_posts(&storage, config.post_retention_days, Utc::now(), &mut stats).await
        }
    };

    if let Err(e) = outcome {
        error!("Job {:?} failed: {}", job, e);
        stats.fail(&e);
    }

    let stats = stats.finish();
    info!(
        job = ?stats.job,
        success = stats.success,
        errors = stats.errors,
        duration_ms = stats.duration_ms,
        "✅ Job finished"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeedError;

    #[test]
    fn job_types_use_upper_snake_names() {
        let parsed: Vec<JobType> =
            serde_json::from_str(r#"["SCRAP_TAYARA", "SEED_CAR_CATALOG", "MAP_CAR_MODELS_TO_ENGINES", "CLEAN_CAR_POSTS"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                JobType::ScrapTayara,
                JobType::SeedCarCatalog,
                JobType::MapCarModelsToEngines,
                JobType::CleanCarPosts
            ]
        );
    }

    #[test]
    fn failed_run_keeps_message() {
        let mut stats = RunStats::new(JobType::ScrapTayara);
        let err = JobError::from(FeedError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")));
        stats.fail(&err);
        let stats = stats.finish();
        assert!(!stats.success);
        assert!(stats.error.unwrap().contains("gone"));
        assert!(stats.duration_ms >= 0);
    }

    #[tokio::test]
    async fn clean_job_runs_against_shared_storage() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new(":memory:").unwrap()));
        let stats = run_job(JobType::CleanCarPosts, storage, Arc::new(AppConfig::default())).await;
        assert!(stats.success);
        assert_eq!(stats.deleted_posts, 0);
    }

    #[tokio::test]
    async fn missing_dump_fails_the_run() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new(":memory:").unwrap()));
        let mut config = AppConfig::default();
        config.feeds.shiftech = "/nonexistent/shiftech.json".to_string();

        let stats = run_job(JobType::UpdateCarEnginesShiftech, storage, Arc::new(config)).await;
        assert!(!stats.success);
        assert!(stats.error.is_some());
    }
}
