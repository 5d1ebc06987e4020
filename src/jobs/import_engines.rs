use crate::jobs::RunStats;
use crate::model::{EngineSource, JobError, ScrapedVehicleRecord};
use crate::parser::{keys, parse_engine_record};
use crate::scraper::ScrapeFeed;
use crate::storage::SqliteStorage;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Imports a tuning site's engine dump into the catalog.
///
/// Only makes already present in the catalog are imported; `allowed_makes`
/// narrows that further to the makes this source is trusted for.
pub async fn import_engines<F>(
    source: EngineSource,
    feed: &F,
    storage: &Mutex<SqliteStorage>,
    allowed_makes: Option<&HashSet<String>>,
    stats: &mut RunStats,
) -> Result<(), JobError>
where
    F: ScrapeFeed<ScrapedVehicleRecord> + ?Sized,
{
    let records = feed.fetch_all().await?;
    info!("🔧 {} engine records from {}", records.len(), source);

    let storage = storage.lock().await;
    let known_makes = storage.known_make_ids()?;

    for record in &records {
        let make_id = keys::make_id(&record.make);
        let allowed = known_makes.contains(&make_id) && allowed_makes.is_none_or(|makes| makes.contains(&make_id));
        if !allowed {
            stats.skipped_makes.insert(record.make.clone());
            continue;
        }

        let engine = match parse_engine_record(source, record, &make_id) {
            Ok(engine) => engine,
            Err(reason) => {
                debug!(url = %record.url_source, ?reason, "engine skipped");
                stats.skipped_engines += 1;
                continue;
            }
        };

        match storage.upsert_engine(&engine) {
            Ok(()) => stats.imported_engines += 1,
            Err(e) => {
                warn!("Failed to store engine {}: {}", engine.source_url, e);
                stats.errors += 1;
            }
        }
    }

    info!(
        source = %source,
        imported = stats.imported_engines,
        skipped = stats.skipped_engines,
        skipped_makes = stats.skipped_makes.len(),
        "Engines imported"
    );
    Ok(())
}
