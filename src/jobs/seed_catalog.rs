use crate::jobs::RunStats;
use crate::model::JobError;
use crate::parser::{SeedMake, SeedModel, parse_make, parse_model};
use crate::scraper::ScrapeFeed;
use crate::storage::SqliteStorage;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Loads the canonical makes, then the model trims of those makes.
pub async fn seed_catalog<M, T>(
    makes: &M,
    models: &T,
    storage: &Mutex<SqliteStorage>,
    stats: &mut RunStats,
) -> Result<(), JobError>
where
    M: ScrapeFeed<SeedMake> + ?Sized,
    T: ScrapeFeed<SeedModel> + ?Sized,
{
    let make_rows = makes.fetch_all().await?;
    let model_rows = models.fetch_all().await?;
    info!("🌱 Seeding {} makes and {} models", make_rows.len(), model_rows.len());

    let storage = storage.lock().await;
    for row in &make_rows {
        let make = parse_make(row);
        match storage.upsert_make(&make) {
            Ok(()) => stats.seeded_makes += 1,
            Err(e) => {
                warn!("Failed to store make {}: {}", make.id, e);
                stats.errors += 1;
            }
        }
    }

    let known_makes = storage.known_make_ids()?;
    for row in &model_rows {
        let model = match parse_model(row) {
            Ok(model) => model,
            Err(reason) => {
                debug!(id = %row.id, ?reason, "model skipped");
                stats.skipped_models += 1;
                continue;
            }
        };
        if !known_makes.contains(&model.make_id) {
            stats.skipped_makes.insert(model.make_id);
            continue;
        }

        match storage.upsert_model(&model) {
            Ok(()) => stats.seeded_models += 1,
            Err(e) => {
                warn!("Failed to store model {}: {}", model.id, e);
                stats.errors += 1;
            }
        }
    }

    info!(
        makes = stats.seeded_makes,
        models = stats.seeded_models,
        skipped = stats.skipped_models,
        skipped_makes = stats.skipped_makes.len(),
        "Catalog seeded"
    );
    Ok(())
}
