use car_matcher::config::{AppConfig, load_config};
use car_matcher::jobs::{JobType, RunStats, run_job};
use car_matcher::storage::SqliteStorage;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    info!("🚀 Running {} jobs against {}", config.jobs.len(), config.db_path);

    // Catalog jobs feed each other, so they run in order. Listing scrapes only read the catalog.
    let (scraps, catalog): (Vec<JobType>, Vec<JobType>) = config
        .jobs
        .iter()
        .copied()
        .partition(|job| matches!(job, JobType::ScrapTayara | JobType::ScrapAutomobiletn));

    let mut results = Vec::new();
    for job in catalog {
        results.push(run_job(job, storage.clone(), config.clone()).await);
    }
    let tasks: Vec<_> = scraps.into_iter().map(|job| run_job(job, storage.clone(), config.clone())).collect();
    results.extend(join_all(tasks).await);

    report(&results);
}

fn report(results: &[RunStats]) {
    for stats in results {
        match serde_json::to_string(stats) {
            Ok(json) => info!("{}", json),
            Err(e) => warn!("Could not serialize stats for {:?}: {}", stats.job, e),
        }
    }
    let failed = results.iter().filter(|s| !s.success).count();
    if failed > 0 {
        warn!("{} of {} jobs failed", failed, results.len());
    } else {
        info!("🏁 All {} jobs done", results.len());
    }
}
